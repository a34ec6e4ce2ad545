//! Outbound half of the frame codec.

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::extensions::deflate::{Compressor, ContextParams};
use crate::message::Message;
use crate::protocol::{Frame, MessageFragmenter, OpCode};

/// A message payload ready for the frame layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPayload {
    /// Set RSV1 on the first frame of the message.
    pub compressed: bool,
    pub payload: Bytes,
}

/// Compresses outgoing messages and splits them into frames.
///
/// Owns the outbound compression context; nothing else touches it.
pub struct Encoder {
    compressor: Option<Compressor>,
    fragment_size: usize,
}

impl Encoder {
    pub(crate) fn new(compressor: Option<Compressor>, fragment_size: usize) -> Self {
        Self {
            compressor,
            fragment_size,
        }
    }

    /// Whether permessage-deflate is in force for this direction.
    pub fn is_compressing(&self) -> bool {
        self.compressor.is_some()
    }

    /// Parameters of the outbound context, if compressing.
    pub fn compressor_params(&self) -> Option<ContextParams> {
        self.compressor.as_ref().map(Compressor::params)
    }

    /// Compress one complete data message payload.
    ///
    /// Empty messages, and every message when the extension is not in
    /// force, are returned unchanged with `compressed == false`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Compression`] if the deflate engine fails. The
    /// outbound stream is unusable afterwards.
    pub fn compress_payload(&mut self, payload: Bytes) -> Result<EncodedPayload> {
        match self.compressor.as_mut() {
            Some(compressor) if !payload.is_empty() => Ok(EncodedPayload {
                compressed: true,
                payload: compressor.compress(&payload)?,
            }),
            _ => Ok(EncodedPayload {
                compressed: false,
                payload,
            }),
        }
    }

    /// Encode a message into frames of at most the configured fragment size.
    ///
    /// Control frames are passed through as a single uncompressed frame.
    ///
    /// # Errors
    ///
    /// - [`Error::ProtocolViolation`] for a continuation opcode
    /// - [`Error::Compression`] if the deflate engine fails
    pub fn encode_message(&mut self, opcode: OpCode, payload: impl Into<Bytes>) -> Result<Vec<Frame>> {
        let payload = payload.into();
        if opcode.is_control() {
            return Ok(vec![Frame::new(true, opcode, payload)]);
        }
        if opcode == OpCode::Continuation {
            return Err(Error::ProtocolViolation(
                "A message cannot start with a continuation frame".into(),
            ));
        }

        let encoded = self.compress_payload(payload)?;
        Ok(MessageFragmenter::new(encoded.payload, opcode, self.fragment_size)
            .compressed(encoded.compressed)
            .collect())
    }

    /// Encode a [`Message`] into frames.
    ///
    /// # Errors
    ///
    /// See [`Encoder::encode_message`].
    pub fn encode(&mut self, message: Message) -> Result<Vec<Frame>> {
        let opcode = message.opcode();
        self.encode_message(opcode, message.into_payload())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compressing(fragment_size: usize) -> Encoder {
        Encoder::new(
            Some(Compressor::new(ContextParams::default(), 6)),
            fragment_size,
        )
    }

    #[test]
    fn test_passthrough_without_compressor() {
        let mut encoder = Encoder::new(None, 1024);
        let payload = Bytes::from_static(b"unchanged");

        let encoded = encoder.compress_payload(payload.clone()).unwrap();
        assert!(!encoded.compressed);
        assert_eq!(encoded.payload, payload);

        let frames = encoder.encode_message(OpCode::Text, payload.clone()).unwrap();
        assert_eq!(frames, vec![Frame::text(payload)]);
    }

    #[test]
    fn test_compressed_message_sets_rsv1() {
        let mut encoder = compressing(1024);
        let frames = encoder.encode(Message::text("Hello")).unwrap();

        assert_eq!(frames.len(), 1);
        assert!(frames[0].rsv1);
        assert_eq!(frames[0].payload(), &[0xf2, 0x48, 0xcd, 0xc9, 0xc9, 0x07, 0x00]);
    }

    #[test]
    fn test_empty_message_not_compressed() {
        let mut encoder = compressing(1024);
        let frames = encoder.encode_message(OpCode::Binary, Bytes::new()).unwrap();
        assert_eq!(frames.len(), 1);
        assert!(!frames[0].rsv1);
        assert!(frames[0].payload().is_empty());
    }

    #[test]
    fn test_control_frames_never_compressed() {
        let mut encoder = compressing(1024);
        for opcode in [OpCode::Ping, OpCode::Pong, OpCode::Close] {
            let frames = encoder.encode_message(opcode, &b"control data"[..]).unwrap();
            assert_eq!(frames.len(), 1);
            assert!(!frames[0].rsv1);
            assert_eq!(frames[0].payload(), b"control data");
        }
    }

    #[test]
    fn test_compressed_message_fragmented_after_compression() {
        let mut encoder = compressing(16);
        let payload: Vec<u8> = (0..4096u32).map(|i| (i * 7 % 256) as u8).collect();
        let frames = encoder.encode_message(OpCode::Binary, payload).unwrap();

        assert!(frames.len() > 1);
        assert!(frames[0].rsv1);
        assert_eq!(frames[0].opcode, OpCode::Binary);
        assert!(frames[1..].iter().all(|f| !f.rsv1 && f.opcode == OpCode::Continuation));
        assert!(frames.last().unwrap().fin);
    }

    #[test]
    fn test_continuation_rejected() {
        let mut encoder = Encoder::new(None, 1024);
        assert!(matches!(
            encoder.encode_message(OpCode::Continuation, &b"x"[..]),
            Err(Error::ProtocolViolation(_))
        ));
    }
}
