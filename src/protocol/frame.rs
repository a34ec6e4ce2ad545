//! WebSocket frames as seen by the compression layer.
//!
//! Wire serialization, masking and header parsing belong to the frame
//! assembly layer that sits below this crate. What the compression layer
//! needs is the logical frame: FIN, the reserved bits (RSV1 is the
//! permessage-deflate "compressed" flag), the opcode and the payload.

use bytes::Bytes;

use crate::protocol::OpCode;

/// A logical WebSocket frame (RFC 6455 Section 5.2).
///
/// ```text
///  0 1 2 3 4 5 6 7
/// +-+-+-+-+-------+
/// |F|R|R|R| opcode|
/// |I|S|S|S|  (4)  |
/// |N|V|V|V|       |
/// | |1|2|3|       |
/// +-+-+-+-+-------+
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Final fragment flag. True if this is the last fragment of a message.
    pub fin: bool,
    /// Reserved bit 1. Marks the first frame of a compressed message.
    pub rsv1: bool,
    /// Reserved bit 2. Must be 0.
    pub rsv2: bool,
    /// Reserved bit 3. Must be 0.
    pub rsv3: bool,
    /// Frame opcode defining the interpretation of payload data.
    pub opcode: OpCode,
    payload: Bytes,
}

impl Frame {
    /// Create a new frame with all reserved bits clear.
    #[must_use]
    pub fn new(fin: bool, opcode: OpCode, payload: impl Into<Bytes>) -> Self {
        Self {
            fin,
            rsv1: false,
            rsv2: false,
            rsv3: false,
            opcode,
            payload: payload.into(),
        }
    }

    /// Create a text frame.
    #[must_use]
    pub fn text(data: impl Into<Bytes>) -> Self {
        Self::new(true, OpCode::Text, data)
    }

    /// Create a binary frame.
    #[must_use]
    pub fn binary(data: impl Into<Bytes>) -> Self {
        Self::new(true, OpCode::Binary, data)
    }

    /// Create a close frame with optional status code and reason.
    #[must_use]
    pub fn close(code: Option<u16>, reason: &str) -> Self {
        let payload = if let Some(code) = code {
            let mut data = code.to_be_bytes().to_vec();
            data.extend_from_slice(reason.as_bytes());
            data
        } else {
            Vec::new()
        };
        Self::new(true, OpCode::Close, payload)
    }

    /// Create a ping frame.
    #[must_use]
    pub fn ping(data: impl Into<Bytes>) -> Self {
        Self::new(true, OpCode::Ping, data)
    }

    /// Create a pong frame.
    #[must_use]
    pub fn pong(data: impl Into<Bytes>) -> Self {
        Self::new(true, OpCode::Pong, data)
    }

    /// Set the RSV1 ("compressed") bit.
    #[must_use]
    pub fn with_rsv1(mut self, rsv1: bool) -> Self {
        self.rsv1 = rsv1;
        self
    }

    /// Get the payload bytes.
    #[inline]
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Take ownership of the payload.
    #[must_use]
    pub fn into_payload(self) -> Bytes {
        self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_frame_has_clear_reserved_bits() {
        let frame = Frame::new(false, OpCode::Binary, vec![1, 2, 3]);
        assert!(!frame.fin);
        assert!(!frame.rsv1);
        assert!(!frame.rsv2);
        assert!(!frame.rsv3);
        assert_eq!(frame.payload(), &[1, 2, 3]);
    }

    #[test]
    fn test_close_frame_payload() {
        let frame = Frame::close(Some(1002), "bad");
        assert_eq!(frame.opcode, OpCode::Close);
        assert_eq!(frame.payload(), &[0x03, 0xea, b'b', b'a', b'd']);

        let empty = Frame::close(None, "ignored");
        assert!(empty.payload().is_empty());
    }

    #[test]
    fn test_with_rsv1() {
        let frame = Frame::text("hi").with_rsv1(true);
        assert!(frame.rsv1);
        assert_eq!(frame.into_payload(), Bytes::from_static(b"hi"));
    }
}
