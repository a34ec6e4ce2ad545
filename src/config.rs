//! Configuration and limits for compressed WebSocket message processing.

use crate::extensions::deflate::DeflateConfig;

/// Resource limits applied while reassembling and inflating messages.
///
/// These limits bound memory usage and defeat decompression bombs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum size of a complete message in bytes.
    ///
    /// Applies both to the reassembled (possibly compressed) payload and to
    /// the inflated output.
    ///
    /// Default: 64 MB (64 * 1024 * 1024)
    pub max_message_size: usize,

    /// Maximum number of fragments in a single message.
    ///
    /// Default: 128
    pub max_fragment_count: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_message_size: 64 * 1024 * 1024, // 64 MB
            max_fragment_count: 128,
        }
    }
}

impl Limits {
    /// Create new limits with custom values.
    #[must_use]
    pub const fn new(max_message_size: usize, max_fragment_count: usize) -> Self {
        Self {
            max_message_size,
            max_fragment_count,
        }
    }

    /// Create limits suitable for small embedded systems.
    ///
    /// - Max message: 256 KB
    /// - Max fragments: 16
    #[must_use]
    pub const fn embedded() -> Self {
        Self {
            max_message_size: 256 * 1024,
            max_fragment_count: 16,
        }
    }

    /// Validate that message size is within limits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MessageTooLarge`](crate::Error::MessageTooLarge) if `size` exceeds the configured maximum.
    pub const fn check_message_size(&self, size: usize) -> Result<(), crate::Error> {
        if size > self.max_message_size {
            Err(crate::Error::MessageTooLarge {
                size,
                max: self.max_message_size,
            })
        } else {
            Ok(())
        }
    }

    /// Validate that fragment count is within limits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TooManyFragments`](crate::Error::TooManyFragments) if `count` exceeds the configured maximum.
    pub const fn check_fragment_count(&self, count: usize) -> Result<(), crate::Error> {
        if count > self.max_fragment_count {
            Err(crate::Error::TooManyFragments {
                count,
                max: self.max_fragment_count,
            })
        } else {
            Ok(())
        }
    }
}

/// Per-connection configuration for the permessage-deflate layer.
#[derive(Debug, Clone)]
pub struct Config {
    /// Resource limits.
    pub limits: Limits,

    /// Fragment size for outgoing messages (in bytes).
    ///
    /// Compressed messages larger than this are split into multiple frames.
    ///
    /// Default: 16 KB (16 * 1024)
    pub fragment_size: usize,

    /// Local deflate policy.
    ///
    /// `None` opts out of compression entirely: the negotiator starts
    /// disabled and never offers or accepts the extension.
    ///
    /// Default: `Some(DeflateConfig::default())`
    pub deflate: Option<DeflateConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            limits: Limits::default(),
            fragment_size: 16 * 1024,
            deflate: Some(DeflateConfig::default()),
        }
    }
}

impl Config {
    /// Create a new configuration with default limits and compression enabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set custom limits.
    #[must_use]
    pub const fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Set fragment size for outgoing messages.
    #[must_use]
    pub const fn with_fragment_size(mut self, size: usize) -> Self {
        self.fragment_size = size;
        self
    }

    /// Set the local deflate policy.
    #[must_use]
    pub fn with_deflate(mut self, deflate: DeflateConfig) -> Self {
        self.deflate = Some(deflate);
        self
    }

    /// Opt out of permessage-deflate.
    #[must_use]
    pub fn without_compression(mut self) -> Self {
        self.deflate = None;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_default() {
        let limits = Limits::default();
        assert_eq!(limits.max_message_size, 64 * 1024 * 1024);
        assert_eq!(limits.max_fragment_count, 128);
    }

    #[test]
    fn test_limits_embedded() {
        let limits = Limits::embedded();
        assert_eq!(limits.max_message_size, 256 * 1024);
        assert_eq!(limits.max_fragment_count, 16);
    }

    #[test]
    fn test_limits_check_message_size() {
        let limits = Limits::default();
        assert!(limits.check_message_size(1024).is_ok());
        assert!(limits.check_message_size(64 * 1024 * 1024).is_ok());
        assert!(limits.check_message_size(100 * 1024 * 1024).is_err());
    }

    #[test]
    fn test_limits_check_fragment_count() {
        let limits = Limits::default();
        assert!(limits.check_fragment_count(50).is_ok());
        assert!(limits.check_fragment_count(200).is_err());
    }

    #[test]
    fn test_config_default_enables_compression() {
        let config = Config::default();
        assert_eq!(config.fragment_size, 16 * 1024);
        assert!(config.deflate.is_some());
    }

    #[test]
    fn test_config_without_compression() {
        let config = Config::new().without_compression();
        assert!(config.deflate.is_none());
    }

    #[test]
    fn test_config_builder() {
        let deflate = DeflateConfig::new().server_no_context_takeover(true);
        let config = Config::new()
            .with_limits(Limits::embedded())
            .with_fragment_size(4096)
            .with_deflate(deflate);

        assert_eq!(config.fragment_size, 4096);
        assert_eq!(config.limits.max_message_size, 256 * 1024);
        assert!(config.deflate.unwrap().server_no_context_takeover);
    }
}
