//! Complete data messages as delivered to and accepted from the application.

use bytes::Bytes;

use crate::protocol::OpCode;

/// A complete, uncompressed WebSocket data message.
///
/// Control frames never reach this type; the connection layer handles them
/// frame by frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// A text message (UTF-8 validated).
    Text(String),
    /// A binary message (arbitrary bytes).
    Binary(Bytes),
}

impl Message {
    /// Create a text message.
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        Message::Text(s.into())
    }

    /// Create a binary message.
    #[must_use]
    pub fn binary(data: impl Into<Bytes>) -> Self {
        Message::Binary(data.into())
    }

    /// Opcode of the first frame carrying this message.
    #[must_use]
    pub const fn opcode(&self) -> OpCode {
        match self {
            Message::Text(_) => OpCode::Text,
            Message::Binary(_) => OpCode::Binary,
        }
    }

    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self, Message::Text(_))
    }

    #[must_use]
    pub const fn is_binary(&self) -> bool {
        matches!(self, Message::Binary(_))
    }

    /// Payload bytes regardless of message type.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Message::Text(s) => s.as_bytes(),
            Message::Binary(data) => &data[..],
        }
    }

    /// Consume the message into its payload.
    #[must_use]
    pub fn into_payload(self) -> Bytes {
        match self {
            Message::Text(s) => Bytes::from(s),
            Message::Binary(data) => data,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }

    /// Borrow the text content, if this is a text message.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Message::Text(s) => Some(s.as_str()),
            Message::Binary(_) => None,
        }
    }

    /// Consume and return the text content, if this is a text message.
    #[must_use]
    pub fn into_text(self) -> Option<String> {
        match self {
            Message::Text(s) => Some(s),
            Message::Binary(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_text_creation() {
        let msg = Message::text("hello");
        assert!(msg.is_text());
        assert_eq!(msg.opcode(), OpCode::Text);
        assert_eq!(msg.as_text(), Some("hello"));
        assert_eq!(msg.into_text(), Some("hello".to_string()));
    }

    #[test]
    fn test_message_binary_creation() {
        let msg = Message::binary(vec![1u8, 2, 3]);
        assert!(msg.is_binary());
        assert_eq!(msg.opcode(), OpCode::Binary);
        assert_eq!(msg.as_bytes(), &[1, 2, 3]);
        assert_eq!(msg.as_text(), None);
    }

    #[test]
    fn test_message_into_payload() {
        assert_eq!(&Message::text("abc").into_payload()[..], b"abc");
        assert_eq!(
            Message::binary(Bytes::from_static(b"\x00\xff")).into_payload(),
            Bytes::from_static(b"\x00\xff")
        );
    }

    #[test]
    fn test_message_len() {
        assert!(Message::text("").is_empty());
        assert_eq!(Message::binary(vec![0u8; 7]).len(), 7);
    }
}
