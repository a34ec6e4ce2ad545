//! Message reassembly for incoming WebSocket frames (RFC 6455).
//!
//! Compression applies to whole messages, so fragments are collected here
//! first and inflated only once the final fragment arrives.

use bytes::{Bytes, BytesMut};

use crate::config::Limits;
use crate::error::{Error, Result};
use crate::protocol::{Frame, OpCode};

/// Reassembles fragmented WebSocket messages.
pub struct MessageAssembler {
    buffer: BytesMut,
    fragment_count: usize,
    opcode: Option<OpCode>,
    compressed: bool,
    limits: Limits,
}

impl MessageAssembler {
    pub fn new(limits: Limits) -> Self {
        Self {
            buffer: BytesMut::new(),
            fragment_count: 0,
            opcode: None,
            compressed: false,
            limits,
        }
    }

    /// Add a data frame to the message being assembled.
    /// Returns Some(complete_message) when FIN=1, None otherwise.
    ///
    /// Control frames are ignored; the caller handles them directly.
    pub fn push(&mut self, frame: Frame) -> Result<Option<AssembledMessage>> {
        if frame.opcode.is_control() {
            return Ok(None);
        }

        if frame.opcode == OpCode::Continuation {
            if self.opcode.is_none() {
                return Err(Error::ProtocolViolation(
                    "Unexpected continuation frame".into(),
                ));
            }
            if frame.rsv1 {
                return Err(Error::ProtocolViolation(
                    "RSV1 set on continuation frame".into(),
                ));
            }
        } else {
            if self.opcode.is_some() {
                return Err(Error::ProtocolViolation(
                    "Expected continuation frame".into(),
                ));
            }
            self.opcode = Some(frame.opcode);
            self.compressed = frame.rsv1;
        }

        self.limits.check_fragment_count(self.fragment_count + 1)?;

        let new_size = self.buffer.len() + frame.payload().len();
        self.limits.check_message_size(new_size)?;

        self.buffer.extend_from_slice(frame.payload());
        self.fragment_count += 1;

        if !frame.fin {
            return Ok(None);
        }

        let Some(opcode) = self.opcode.take() else {
            return Err(Error::ProtocolViolation(
                "Final fragment without message start".into(),
            ));
        };
        let message = AssembledMessage {
            opcode,
            payload: self.buffer.split().freeze(),
            compressed: self.compressed,
        };
        self.fragment_count = 0;
        self.compressed = false;
        Ok(Some(message))
    }

    pub fn is_assembling(&self) -> bool {
        self.opcode.is_some()
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
        self.fragment_count = 0;
        self.opcode = None;
        self.compressed = false;
    }
}

/// A fully reassembled message, still in wire form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledMessage {
    pub opcode: OpCode,
    pub payload: Bytes,
    /// RSV1 was set on the first fragment.
    pub compressed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_limits() -> Limits {
        Limits::new(100, 3)
    }

    #[test]
    fn test_single_frame_message() {
        let mut assembler = MessageAssembler::new(Limits::default());

        let msg = assembler.push(Frame::text("Hello")).unwrap().unwrap();
        assert_eq!(msg.opcode, OpCode::Text);
        assert_eq!(&msg.payload[..], b"Hello");
        assert!(!msg.compressed);
        assert!(!assembler.is_assembling());
    }

    #[test]
    fn test_compressed_flag_taken_from_first_fragment() {
        let mut assembler = MessageAssembler::new(Limits::default());

        let first = Frame::new(false, OpCode::Binary, vec![1, 2]).with_rsv1(true);
        assert!(assembler.push(first).unwrap().is_none());

        let last = Frame::new(true, OpCode::Continuation, vec![3, 4]);
        let msg = assembler.push(last).unwrap().unwrap();
        assert!(msg.compressed);
        assert_eq!(&msg.payload[..], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_rsv1_on_continuation_fails() {
        let mut assembler = MessageAssembler::new(Limits::default());

        let first = Frame::new(false, OpCode::Text, "Hel");
        assembler.push(first).unwrap();

        let last = Frame::new(true, OpCode::Continuation, "lo").with_rsv1(true);
        assert!(matches!(
            assembler.push(last),
            Err(Error::ProtocolViolation(_))
        ));
    }

    #[test]
    fn test_interleaved_control_frame() {
        let mut assembler = MessageAssembler::new(Limits::default());

        let frame1 = Frame::new(false, OpCode::Text, "Hel");
        assert!(assembler.push(frame1).unwrap().is_none());

        assert!(assembler.push(Frame::ping("ping")).unwrap().is_none());
        assert!(assembler.is_assembling());

        let frame2 = Frame::new(true, OpCode::Continuation, "lo");
        let msg = assembler.push(frame2).unwrap().unwrap();
        assert_eq!(&msg.payload[..], b"Hello");
    }

    #[test]
    fn test_max_message_size_exceeded() {
        let mut assembler = MessageAssembler::new(small_limits());

        let result = assembler.push(Frame::binary(vec![0u8; 150]));
        assert!(matches!(result, Err(Error::MessageTooLarge { .. })));
    }

    #[test]
    fn test_max_fragment_count_exceeded() {
        let mut assembler = MessageAssembler::new(small_limits());

        let f1 = Frame::new(false, OpCode::Binary, vec![1]);
        let f2 = Frame::new(false, OpCode::Continuation, vec![2]);
        let f3 = Frame::new(false, OpCode::Continuation, vec![3]);
        let f4 = Frame::new(true, OpCode::Continuation, vec![4]);

        assert!(assembler.push(f1).is_ok());
        assert!(assembler.push(f2).is_ok());
        assert!(assembler.push(f3).is_ok());

        let result = assembler.push(f4);
        assert!(matches!(result, Err(Error::TooManyFragments { .. })));
    }

    #[test]
    fn test_continuation_without_start_fails() {
        let mut assembler = MessageAssembler::new(Limits::default());

        let frame = Frame::new(true, OpCode::Continuation, "data");
        assert!(matches!(
            assembler.push(frame),
            Err(Error::ProtocolViolation(_))
        ));
    }

    #[test]
    fn test_new_message_without_continuation_fails() {
        let mut assembler = MessageAssembler::new(Limits::default());

        assembler
            .push(Frame::new(false, OpCode::Text, "first"))
            .unwrap();

        let result = assembler.push(Frame::new(true, OpCode::Text, "second"));
        assert!(matches!(result, Err(Error::ProtocolViolation(_))));
    }

    #[test]
    fn test_reset() {
        let mut assembler = MessageAssembler::new(Limits::default());

        assembler
            .push(Frame::new(false, OpCode::Text, "partial").with_rsv1(true))
            .unwrap();
        assert!(assembler.is_assembling());

        assembler.reset();
        assert!(!assembler.is_assembling());

        let msg = assembler.push(Frame::text("fresh")).unwrap().unwrap();
        assert!(!msg.compressed);
    }
}
