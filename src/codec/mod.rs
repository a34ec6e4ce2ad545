//! Per-connection frame codec applying the negotiated compression.
//!
//! A [`FrameCodec`] is built once negotiation has a result. It holds one
//! compression context per direction and can be [`split`](FrameCodec::split)
//! so the send and receive paths own their halves independently.

mod decoder;
mod encoder;

pub use decoder::Decoder;
pub use encoder::{EncodedPayload, Encoder};

use bytes::Bytes;

use crate::config::Config;
use crate::error::Result;
use crate::extensions::deflate::{Compressor, ContextParams, Decompressor};
use crate::extensions::negotiation::NegotiationResult;
use crate::message::Message;
use crate::protocol::{Frame, OpCode, Role};

/// Outbound and inbound halves for one connection.
pub struct FrameCodec {
    role: Role,
    encoder: Encoder,
    decoder: Decoder,
}

impl FrameCodec {
    /// Build the codec for a negotiation outcome.
    ///
    /// With [`NegotiationResult::Accepted`] both directions compress; any
    /// other outcome yields a pass-through codec.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`](crate::Error::InvalidConfig) if the
    /// local deflate config does not validate.
    pub fn new(result: &NegotiationResult, role: Role, config: Config) -> Result<Self> {
        let (compressor, decompressor) = match result.params() {
            Some(params) => {
                let deflate = config.deflate.clone().unwrap_or_default();
                deflate.validate()?;

                let outbound = ContextParams::for_direction(params, role.outbound())
                    .restrict_to(&deflate, role.outbound());
                let inbound = ContextParams::for_direction(params, role.inbound());
                tracing::debug!(
                    %role,
                    ?outbound,
                    ?inbound,
                    "compression contexts ready"
                );

                (
                    Some(Compressor::new(outbound, deflate.compression_level)),
                    Some(Decompressor::new(inbound, config.limits.max_message_size)),
                )
            }
            None => (None, None),
        };

        Ok(Self {
            role,
            encoder: Encoder::new(compressor, config.fragment_size),
            decoder: Decoder::new(decompressor, config.limits),
        })
    }

    /// A codec that never compresses.
    pub fn passthrough(role: Role, config: Config) -> Self {
        Self {
            role,
            encoder: Encoder::new(None, config.fragment_size),
            decoder: Decoder::new(None, config.limits),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Whether permessage-deflate is in force.
    pub fn is_compressing(&self) -> bool {
        self.encoder.is_compressing()
    }

    /// See [`Encoder::encode_message`].
    ///
    /// # Errors
    ///
    /// See [`Encoder::encode_message`].
    pub fn encode_message(&mut self, opcode: OpCode, payload: impl Into<Bytes>) -> Result<Vec<Frame>> {
        self.encoder.encode_message(opcode, payload)
    }

    /// See [`Encoder::encode`].
    ///
    /// # Errors
    ///
    /// See [`Encoder::encode_message`].
    pub fn encode(&mut self, message: Message) -> Result<Vec<Frame>> {
        self.encoder.encode(message)
    }

    /// See [`Decoder::decode_frame`].
    ///
    /// # Errors
    ///
    /// See [`Decoder::decode_frame`].
    pub fn decode_frame(&mut self, frame: Frame) -> Result<Option<Message>> {
        self.decoder.decode_frame(frame)
    }

    /// Separate the send and receive halves.
    pub fn split(self) -> (Encoder, Decoder) {
        (self.encoder, self.decoder)
    }
}
