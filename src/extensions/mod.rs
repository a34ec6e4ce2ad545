//! permessage-deflate negotiation and compression (RFC 7692).
//!
//! The handshake layer hands this module the `Sec-WebSocket-Extensions`
//! header already split into [`ExtensionOffer`] tokens. From there:
//!
//! - [`params`] turns a token list into a typed [`ParameterSet`],
//! - [`validate`] checks a peer response against the offer that was sent,
//! - [`negotiation`] drives the one-shot offer/response state machine,
//! - [`deflate`] holds the per-direction compression contexts.
//!
//! # Example
//!
//! ```rust,ignore
//! use rsws_deflate::{Config, Negotiator, Role};
//! use rsws_deflate::extensions::ExtensionOffer;
//!
//! let mut client = Negotiator::new(Role::Client, Config::new());
//! let offer = client.offer()?;
//! // ... send `offer.to_string()` in Sec-WebSocket-Extensions ...
//!
//! let responses = ExtensionOffer::parse_header(&header_from_server)?;
//! let result = client.receive_response(&responses)?;
//! let codec = client.into_codec()?;
//! ```

pub mod deflate;
pub mod negotiation;
pub mod params;
pub mod validate;

pub use deflate::{Compressor, ContextParams, DeflateConfig, Decompressor};
pub use negotiation::{NegotiationResult, NegotiationState, Negotiator};
pub use params::{ParamName, ParamValue, ParameterSet};
pub use validate::{validate, validate_tokens};

use crate::error::{RejectReason, Result};
use std::fmt;

/// Registered extension token for permessage-deflate.
pub const PERMESSAGE_DEFLATE: &str = "permessage-deflate";

/// Represents a single extension parameter.
///
/// Extension parameters follow the format: `name; param1=value1; param2`
/// For example: `permessage-deflate; client_max_window_bits=15; server_no_context_takeover`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionParam {
    /// Parameter name (e.g., "client_max_window_bits").
    pub name: String,
    /// Optional parameter value. None for boolean parameters.
    pub value: Option<String>,
}

impl ExtensionParam {
    /// Create a new parameter with a value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    /// Create a boolean/flag parameter (no value).
    pub fn flag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    /// Parse a single parameter from a string (e.g., "param=value" or "param").
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if let Some((name, value)) = s.split_once('=') {
            Self {
                name: name.trim().to_string(),
                value: Some(value.trim().trim_matches('"').to_string()),
            }
        } else {
            Self::flag(s)
        }
    }
}

impl fmt::Display for ExtensionParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => write!(f, "{}={}", self.name, v),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Parsed extension offer/response from Sec-WebSocket-Extensions header.
///
/// Represents a single extension with its name and parameters.
/// For example: `permessage-deflate; client_max_window_bits=15`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionOffer {
    /// Extension name (e.g., "permessage-deflate").
    pub name: String,
    /// Extension parameters, in header order.
    pub params: Vec<ExtensionParam>,
}

impl ExtensionOffer {
    /// Create a new extension offer with no parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    /// Create a new extension offer with parameters.
    pub fn with_params(name: impl Into<String>, params: Vec<ExtensionParam>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    /// Parse a single extension offer from a string.
    ///
    /// Format: `extension-name; param1=value1; param2`
    ///
    /// # Errors
    ///
    /// Returns [`RejectReason::MalformedParameter`] if the extension name or a
    /// parameter name is empty.
    pub fn parse(s: &str) -> Result<Self> {
        let mut parts = s.split(';');
        let name = parts.next().unwrap_or_default().trim().to_string();

        if name.is_empty() {
            return Err(RejectReason::malformed("Empty extension name").into());
        }

        let params: Vec<ExtensionParam> = parts.map(ExtensionParam::parse).collect();
        if params.iter().any(|p| p.name.is_empty()) {
            return Err(RejectReason::malformed(format!(
                "Empty parameter name in '{}'",
                name
            ))
            .into());
        }

        Ok(Self { name, params })
    }

    /// Parse multiple extension offers from a Sec-WebSocket-Extensions header value.
    ///
    /// Extensions are comma-separated, parameters are semicolon-separated.
    ///
    /// # Errors
    ///
    /// Returns [`RejectReason::MalformedParameter`] if any extension in the
    /// header is malformed.
    pub fn parse_header(header: &str) -> Result<Vec<Self>> {
        header
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| Self::parse(s.trim()))
            .collect()
    }

    /// Whether this token names permessage-deflate.
    pub fn is_permessage_deflate(&self) -> bool {
        self.name.eq_ignore_ascii_case(PERMESSAGE_DEFLATE)
    }
}

impl fmt::Display for ExtensionOffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for param in &self.params {
            write!(f, "; {}", param)?;
        }
        Ok(())
    }
}
