//! Error types for permessage-deflate negotiation and compression.
//!
//! Negotiation problems are described by [`RejectReason`]. They never tear
//! down a connection: the negotiator records them and the connection falls
//! back to uncompressed frames. Everything else is an [`Error`] returned to
//! the caller.

use thiserror::Error;

/// Result type alias for extension operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a permessage-deflate offer or response was not accepted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RejectReason {
    /// A parameter is structurally invalid: duplicated, a flag carrying a
    /// value, a missing or non-numeric window size, or an empty name.
    #[error("Malformed parameter: {0}")]
    MalformedParameter(String),

    /// A parameter name that permessage-deflate does not define.
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    /// A window size outside 8-15, or above the bound that was offered.
    #[error("Invalid range for {name}: {value}")]
    InvalidRange {
        /// Parameter name.
        name: String,
        /// Offending value as received.
        value: String,
    },

    /// A recognized parameter the peer was never asked for and may not add
    /// on its own.
    #[error("Unsolicited parameter: {0}")]
    Unsolicited(String),
}

impl RejectReason {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        RejectReason::MalformedParameter(msg.into())
    }

    pub(crate) fn out_of_range(name: &str, value: impl ToString) -> Self {
        RejectReason::InvalidRange {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

/// Errors that can occur while negotiating or processing compressed messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// Negotiation input was rejected.
    #[error("Negotiation rejected: {0}")]
    Negotiation(#[from] RejectReason),

    /// Operation is not allowed in the current negotiation state.
    #[error("Invalid state: cannot {operation} while {state}")]
    InvalidState {
        /// Operation attempted.
        operation: &'static str,
        /// State the negotiator was in.
        state: &'static str,
    },

    /// The deflate stream is corrupt or the engine failed.
    #[error("Compression error: {0}")]
    Compression(String),

    /// Protocol violation detected on an incoming frame.
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// Message size exceeds configured maximum.
    #[error("Message too large: {size} bytes (max: {max})")]
    MessageTooLarge {
        /// Actual (or lower bound of) message size.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },

    /// Too many fragments in a single message.
    #[error("Too many fragments: {count} (max: {max})")]
    TooManyFragments {
        /// Actual fragment count.
        count: usize,
        /// Maximum allowed fragments.
        max: usize,
    },

    /// Invalid UTF-8 in a text message.
    #[error("Invalid UTF-8 in text message")]
    InvalidUtf8,

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Close status code (RFC 6455 Section 7.4.1) the connection layer should
    /// use when this error terminates a connection.
    ///
    /// Returns `None` for errors that are the caller's own fault rather than
    /// the peer's.
    #[must_use]
    pub const fn close_code(&self) -> Option<u16> {
        match self {
            Error::Negotiation(_)
            | Error::Compression(_)
            | Error::ProtocolViolation(_)
            | Error::TooManyFragments { .. } => Some(1002),
            Error::InvalidUtf8 => Some(1007),
            Error::MessageTooLarge { .. } => Some(1009),
            Error::InvalidState { .. } | Error::InvalidConfig(_) => None,
        }
    }
}

impl From<flate2::CompressError> for Error {
    fn from(err: flate2::CompressError) -> Self {
        Error::Compression(format!("Compression failed: {}", err))
    }
}

impl From<flate2::DecompressError> for Error {
    fn from(err: flate2::DecompressError) -> Self {
        Error::Compression(format!("Decompression failed: {}", err))
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(_: std::str::Utf8Error) -> Self {
        Error::InvalidUtf8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::MessageTooLarge {
            size: 20_000_000,
            max: 16_000_000,
        };
        assert_eq!(
            err.to_string(),
            "Message too large: 20000000 bytes (max: 16000000)"
        );
    }

    #[test]
    fn test_reject_reason_display() {
        let reason = RejectReason::out_of_range("client_max_window_bits", 16);
        assert_eq!(
            reason.to_string(),
            "Invalid range for client_max_window_bits: 16"
        );

        let reason = RejectReason::Unsolicited("s2c_max_window_bits".into());
        assert_eq!(reason.to_string(), "Unsolicited parameter: s2c_max_window_bits");
    }

    #[test]
    fn test_reject_reason_into_error() {
        let err: Error = RejectReason::UnknownParameter("x_foo".into()).into();
        assert!(matches!(
            err,
            Error::Negotiation(RejectReason::UnknownParameter(_))
        ));
    }

    #[test]
    fn test_close_codes() {
        assert_eq!(Error::Compression("bad".into()).close_code(), Some(1002));
        assert_eq!(Error::InvalidUtf8.close_code(), Some(1007));
        assert_eq!(
            Error::MessageTooLarge { size: 2, max: 1 }.close_code(),
            Some(1009)
        );
        assert_eq!(
            Error::InvalidState {
                operation: "offer",
                state: "Accepted"
            }
            .close_code(),
            None
        );
    }

    #[test]
    fn test_error_clone() {
        let err = Error::InvalidUtf8;
        let cloned = err.clone();
        assert_eq!(err, cloned);
    }
}
