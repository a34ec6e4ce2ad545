//! Inbound half of the frame codec.

use bytes::Bytes;

use crate::config::Limits;
use crate::error::{Error, Result};
use crate::extensions::deflate::{ContextParams, Decompressor};
use crate::message::Message;
use crate::protocol::{Frame, MessageAssembler, OpCode};

/// Reassembles incoming frames and inflates compressed messages.
///
/// Owns the inbound compression context; nothing else touches it.
pub struct Decoder {
    decompressor: Option<Decompressor>,
    assembler: MessageAssembler,
}

impl Decoder {
    pub(crate) fn new(decompressor: Option<Decompressor>, limits: Limits) -> Self {
        Self {
            decompressor,
            assembler: MessageAssembler::new(limits),
        }
    }

    /// Whether permessage-deflate is in force for this direction.
    pub fn is_compressing(&self) -> bool {
        self.decompressor.is_some()
    }

    /// Parameters of the inbound context, if compressing.
    pub fn decompressor_params(&self) -> Option<ContextParams> {
        self.decompressor.as_ref().map(Decompressor::params)
    }

    /// A fragmented message is partially received.
    pub fn is_assembling(&self) -> bool {
        self.assembler.is_assembling()
    }

    /// Feed one incoming frame.
    ///
    /// Returns the complete message once its final fragment arrives. Control
    /// frames are checked and yield `None`; the caller handles them itself.
    ///
    /// # Errors
    ///
    /// - [`Error::ProtocolViolation`] for reserved bits that are not allowed
    ///   on this frame, or bad fragment sequencing
    /// - [`Error::Compression`] for a corrupt deflate stream
    /// - [`Error::MessageTooLarge`] / [`Error::TooManyFragments`] past the limits
    /// - [`Error::InvalidUtf8`] for a text message that is not UTF-8
    pub fn decode_frame(&mut self, frame: Frame) -> Result<Option<Message>> {
        if frame.rsv2 || frame.rsv3 {
            return Err(Error::ProtocolViolation(format!(
                "RSV2/RSV3 set on {} frame",
                frame.opcode
            )));
        }
        if frame.opcode.is_control() {
            if frame.rsv1 {
                return Err(Error::ProtocolViolation(format!(
                    "RSV1 set on {} frame",
                    frame.opcode
                )));
            }
            return Ok(None);
        }
        if frame.rsv1 && self.decompressor.is_none() {
            return Err(Error::ProtocolViolation(
                "RSV1 set but permessage-deflate is not in use".into(),
            ));
        }

        let Some(assembled) = self.assembler.push(frame)? else {
            return Ok(None);
        };

        let payload = self.decompress_payload(assembled.compressed, assembled.payload)?;
        match assembled.opcode {
            OpCode::Text => {
                let text = std::str::from_utf8(&payload)?;
                Ok(Some(Message::Text(text.to_owned())))
            }
            _ => Ok(Some(Message::Binary(payload))),
        }
    }

    /// Inflate a message payload the frame layer has already reassembled.
    ///
    /// Uncompressed payloads are returned unchanged.
    ///
    /// # Errors
    ///
    /// - [`Error::ProtocolViolation`] if `compressed` is set but the
    ///   extension is not in force
    /// - [`Error::Compression`] / [`Error::MessageTooLarge`] from inflating
    pub fn decompress_payload(&mut self, compressed: bool, payload: Bytes) -> Result<Bytes> {
        if !compressed {
            return Ok(payload);
        }
        match self.decompressor.as_mut() {
            Some(decompressor) => decompressor.decompress(&payload),
            None => Err(Error::ProtocolViolation(
                "Compressed message without permessage-deflate".into(),
            )),
        }
    }

    /// Drop a partially received message.
    pub fn reset(&mut self) {
        self.assembler.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inflating() -> Decoder {
        Decoder::new(
            Some(Decompressor::new(ContextParams::default(), 1 << 20)),
            Limits::default(),
        )
    }

    fn hello_frame() -> Frame {
        Frame::text(Bytes::from_static(&[0xf2, 0x48, 0xcd, 0xc9, 0xc9, 0x07, 0x00])).with_rsv1(true)
    }

    #[test]
    fn test_decode_compressed_text() {
        let mut decoder = inflating();
        let msg = decoder.decode_frame(hello_frame()).unwrap().unwrap();
        assert_eq!(msg, Message::text("Hello"));
    }

    #[test]
    fn test_decode_fragmented_compressed() {
        // RFC 7692 Section 7.2.3.1, split across two frames.
        let mut decoder = inflating();
        let first = Frame::new(false, OpCode::Text, Bytes::from_static(&[0xf2, 0x48, 0xcd])).with_rsv1(true);
        let last = Frame::new(true, OpCode::Continuation, Bytes::from_static(&[0xc9, 0xc9, 0x07, 0x00]));

        assert!(decoder.decode_frame(first).unwrap().is_none());
        assert!(decoder.is_assembling());
        let msg = decoder.decode_frame(last).unwrap().unwrap();
        assert_eq!(msg.as_text(), Some("Hello"));
    }

    #[test]
    fn test_uncompressed_message_with_extension_in_force() {
        let mut decoder = inflating();
        let msg = decoder.decode_frame(Frame::binary(vec![1u8, 2, 3])).unwrap().unwrap();
        assert_eq!(msg, Message::binary(vec![1u8, 2, 3]));
    }

    #[test]
    fn test_rsv1_without_extension() {
        let mut decoder = Decoder::new(None, Limits::default());
        assert!(matches!(
            decoder.decode_frame(hello_frame()),
            Err(Error::ProtocolViolation(_))
        ));
    }

    #[test]
    fn test_rsv1_on_control_frame() {
        let mut decoder = inflating();
        let ping = Frame::ping(&b"test"[..]).with_rsv1(true);
        assert!(matches!(
            decoder.decode_frame(ping),
            Err(Error::ProtocolViolation(_))
        ));
        assert!(decoder.decode_frame(Frame::ping(&b"ok"[..])).unwrap().is_none());
    }

    #[test]
    fn test_rsv2_rejected() {
        let mut decoder = inflating();
        let mut frame = Frame::binary(vec![0u8]);
        frame.rsv2 = true;
        assert!(matches!(
            decoder.decode_frame(frame),
            Err(Error::ProtocolViolation(_))
        ));
    }

    #[test]
    fn test_corrupt_deflate_is_compression_error() {
        let mut decoder = inflating();
        let frame = Frame::binary(vec![0xffu8; 8]).with_rsv1(true);
        let err = decoder.decode_frame(frame).unwrap_err();
        assert!(matches!(err, Error::Compression(_)));
        assert_eq!(err.close_code(), Some(1002));
    }

    #[test]
    fn test_invalid_utf8_after_inflate() {
        let mut compressor =
            crate::extensions::deflate::Compressor::new(ContextParams::default(), 6);
        let compressed = compressor.compress(&[0xc3, 0x28]).unwrap();

        let mut decoder = inflating();
        let frame = Frame::text(compressed).with_rsv1(true);
        assert_eq!(decoder.decode_frame(frame), Err(Error::InvalidUtf8));
    }

    #[test]
    fn test_decompress_payload_requires_extension() {
        let mut decoder = Decoder::new(None, Limits::default());
        let raw = Bytes::from_static(b"raw");
        assert_eq!(decoder.decompress_payload(false, raw.clone()).unwrap(), raw);
        assert!(decoder.decompress_payload(true, raw).is_err());
    }
}
