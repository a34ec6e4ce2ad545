//! Message fragmentation for outgoing WebSocket messages (RFC 6455).

use bytes::Bytes;

use crate::protocol::{Frame, OpCode};

/// Iterator that produces frames from a (possibly compressed) message payload.
///
/// Splits the payload into frames of at most `fragment_size` bytes. The first
/// frame carries the message opcode and the compressed flag; continuation
/// frames use `OpCode::Continuation` and never set RSV1 (RFC 7692 Section 6.1).
pub struct MessageFragmenter {
    payload: Bytes,
    opcode: OpCode,
    compressed: bool,
    fragment_size: usize,
    offset: usize,
    is_first: bool,
}

impl MessageFragmenter {
    /// Create a new fragmenter for the given payload.
    #[inline]
    #[must_use]
    pub fn new(payload: Bytes, opcode: OpCode, fragment_size: usize) -> Self {
        Self {
            payload,
            opcode,
            compressed: false,
            fragment_size: fragment_size.max(1),
            offset: 0,
            is_first: true,
        }
    }

    /// Mark the message as compressed, setting RSV1 on the first frame.
    #[inline]
    #[must_use]
    pub fn compressed(mut self, compressed: bool) -> Self {
        self.compressed = compressed;
        self
    }

    /// Check if fragmentation is needed (payload exceeds fragment_size).
    #[inline]
    #[must_use]
    pub fn needs_fragmentation(&self) -> bool {
        self.payload.len() > self.fragment_size
    }

    /// Get remaining bytes to send.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.payload.len().saturating_sub(self.offset)
    }
}

impl Iterator for MessageFragmenter {
    type Item = Frame;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.payload.len() {
            // An empty message still needs one frame.
            if self.is_first && self.payload.is_empty() {
                self.is_first = false;
                return Some(Frame::new(true, self.opcode, Bytes::new()).with_rsv1(self.compressed));
            }
            return None;
        }

        let remaining = self.payload.len() - self.offset;
        let chunk_size = remaining.min(self.fragment_size);
        let is_final = self.offset + chunk_size >= self.payload.len();

        let chunk = self.payload.slice(self.offset..self.offset + chunk_size);
        self.offset += chunk_size;

        let frame = if self.is_first {
            self.is_first = false;
            Frame::new(is_final, self.opcode, chunk).with_rsv1(self.compressed)
        } else {
            Frame::new(is_final, OpCode::Continuation, chunk)
        };

        Some(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_fragmentation_needed() {
        let frag = MessageFragmenter::new(Bytes::from_static(b"Hello"), OpCode::Text, 1024);

        assert!(!frag.needs_fragmentation());

        let frames: Vec<_> = frag.collect();
        assert_eq!(frames.len(), 1);
        assert!(frames[0].fin);
        assert!(!frames[0].rsv1);
        assert_eq!(frames[0].opcode, OpCode::Text);
        assert_eq!(frames[0].payload(), b"Hello");
    }

    #[test]
    fn test_exact_fragmentation() {
        let payload = Bytes::from(vec![0xAB; 30]);
        let frag = MessageFragmenter::new(payload, OpCode::Binary, 10);

        assert!(frag.needs_fragmentation());

        let frames: Vec<_> = frag.collect();
        assert_eq!(frames.len(), 3);

        assert!(!frames[0].fin);
        assert_eq!(frames[0].opcode, OpCode::Binary);
        assert_eq!(frames[0].payload().len(), 10);

        assert!(!frames[1].fin);
        assert_eq!(frames[1].opcode, OpCode::Continuation);

        assert!(frames[2].fin);
        assert_eq!(frames[2].opcode, OpCode::Continuation);
        assert_eq!(frames[2].payload().len(), 10);
    }

    #[test]
    fn test_compressed_flag_only_on_first_frame() {
        let payload = Bytes::from(vec![0xCD; 25]);
        let frames: Vec<_> = MessageFragmenter::new(payload, OpCode::Binary, 10)
            .compressed(true)
            .collect();

        assert_eq!(frames.len(), 3);
        assert!(frames[0].rsv1);
        assert!(!frames[1].rsv1);
        assert!(!frames[2].rsv1);
        assert_eq!(frames[2].payload().len(), 5);
    }

    #[test]
    fn test_empty_payload() {
        let frag = MessageFragmenter::new(Bytes::new(), OpCode::Text, 1024);

        let frames: Vec<_> = frag.collect();
        assert_eq!(frames.len(), 1);
        assert!(frames[0].fin);
        assert_eq!(frames[0].payload().len(), 0);
    }

    #[test]
    fn test_payload_equals_fragment_size() {
        let payload = Bytes::from(vec![0xEF; 100]);
        let frag = MessageFragmenter::new(payload, OpCode::Binary, 100);

        assert!(!frag.needs_fragmentation());

        let frames: Vec<_> = frag.collect();
        assert_eq!(frames.len(), 1);
        assert!(frames[0].fin);
    }

    #[test]
    fn test_remaining_bytes() {
        let payload = Bytes::from(vec![0xAB; 30]);
        let mut frag = MessageFragmenter::new(payload, OpCode::Binary, 10);

        assert_eq!(frag.remaining(), 30);
        frag.next();
        assert_eq!(frag.remaining(), 20);
        frag.next();
        assert_eq!(frag.remaining(), 10);
        frag.next();
        assert_eq!(frag.remaining(), 0);
    }
}
