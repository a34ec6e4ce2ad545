//! # rsws-deflate - permessage-deflate for WebSocket endpoints
//!
//! Negotiation and per-message compression for the WebSocket
//! `permessage-deflate` extension (RFC 7692), written to sit between an
//! HTTP upgrade layer and a frame layer.
//!
//! ## Features
//!
//! - **Strict negotiation**: responses are validated against the offer;
//!   unknown, unsolicited and out-of-range parameters are told apart
//! - **Graceful degradation**: a rejected negotiation leaves the connection
//!   running uncompressed
//! - **Per-direction contexts** honoring `*_no_context_takeover` and
//!   `*_max_window_bits`
//! - **Split codec**: send and receive halves are independent and `Send`
//! - **Resource limits** against oversized and decompression-bomb messages
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rsws_deflate::{Config, Message, Negotiator, Role};
//! use rsws_deflate::extensions::ExtensionOffer;
//!
//! // Client side of the handshake
//! let mut negotiator = Negotiator::new(Role::Client, Config::new());
//! let offer = negotiator.offer()?;
//! // ... send `offer.to_string()` as Sec-WebSocket-Extensions ...
//! let response = ExtensionOffer::parse_header(server_header)?;
//! negotiator.receive_response(&response)?;
//!
//! let (mut tx, mut rx) = negotiator.into_codec()?.split();
//! let frames = tx.encode(Message::text("hello"))?;
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod extensions;
pub mod message;
pub mod protocol;

pub use codec::{Decoder, EncodedPayload, Encoder, FrameCodec};
pub use config::{Config, Limits};
pub use error::{Error, RejectReason, Result};
pub use extensions::{
    DeflateConfig, ExtensionOffer, ExtensionParam, NegotiationResult, NegotiationState,
    Negotiator, ParamName, ParameterSet, validate,
};
pub use message::Message;
pub use protocol::{Direction, Frame, OpCode, Role};

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn test_public_types_are_send() {
        assert_send::<Error>();
        assert_send::<Config>();
        assert_send::<Limits>();
        assert_send::<Message>();
        assert_send::<Negotiator>();
        assert_send::<NegotiationResult>();
        assert_send::<FrameCodec>();
        assert_send::<Encoder>();
        assert_send::<Decoder>();
        assert_send::<Role>();
    }

    #[test]
    fn test_public_types_are_sync() {
        assert_sync::<Error>();
        assert_sync::<Config>();
        assert_sync::<Limits>();
        assert_sync::<Message>();
        assert_sync::<Negotiator>();
        assert_sync::<NegotiationResult>();
        assert_sync::<ParameterSet>();
        assert_sync::<Role>();
    }
}
