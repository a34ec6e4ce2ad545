//! Permessage-deflate compression contexts (RFC 7692 Section 7).
//!
//! Each direction of a connection owns one context: the sender compresses
//! with a [`Compressor`], the receiver inflates with a [`Decompressor`].
//! The two ends of a direction must agree on whether the LZ77 window
//! survives between messages, which is what [`ContextParams`] captures.

use bytes::Bytes;
use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};

use crate::error::{Error, RejectReason, Result};
use crate::extensions::params::{MAX_WINDOW_BITS, MIN_WINDOW_BITS, ParamName, ParameterSet};
use crate::protocol::Direction;

/// Empty stored block emitted by a sync flush. Stripped from outgoing
/// messages and re-appended before inflating (RFC 7692 Section 7.2.1).
pub const DEFLATE_TRAILER: [u8; 4] = [0x00, 0x00, 0xff, 0xff];

const DEFAULT_WINDOW_BITS: u8 = MAX_WINDOW_BITS;
const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// zlib refuses an 8-bit raw deflate window; 9 is the smallest it supports.
const MIN_ENGINE_WINDOW_BITS: u8 = 9;

/// Local permessage-deflate policy.
///
/// Controls what a client offers and what a server is willing to accept.
/// Window sizes are upper bounds: the negotiated value may be smaller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeflateConfig {
    /// Ask (client) or require (server) that the server resets its context
    /// after every message.
    pub server_no_context_takeover: bool,
    /// Ask (server) or promise (client) that the client resets its context
    /// after every message.
    pub client_no_context_takeover: bool,
    /// Largest window the server may use for server-to-client messages.
    pub server_max_window_bits: u8,
    /// Largest window the client may use for client-to-server messages.
    pub client_max_window_bits: u8,
    /// zlib compression level, 0-9.
    pub compression_level: u32,
}

impl Default for DeflateConfig {
    fn default() -> Self {
        Self {
            server_no_context_takeover: false,
            client_no_context_takeover: false,
            server_max_window_bits: DEFAULT_WINDOW_BITS,
            client_max_window_bits: DEFAULT_WINDOW_BITS,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

impl DeflateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn server_no_context_takeover(mut self, value: bool) -> Self {
        self.server_no_context_takeover = value;
        self
    }

    pub fn client_no_context_takeover(mut self, value: bool) -> Self {
        self.client_no_context_takeover = value;
        self
    }

    pub fn server_max_window_bits(mut self, bits: u8) -> Result<Self> {
        check_window_bits("server_max_window_bits", bits)?;
        self.server_max_window_bits = bits;
        Ok(self)
    }

    pub fn client_max_window_bits(mut self, bits: u8) -> Result<Self> {
        check_window_bits("client_max_window_bits", bits)?;
        self.client_max_window_bits = bits;
        Ok(self)
    }

    pub fn compression_level(mut self, level: u32) -> Result<Self> {
        if level > 9 {
            return Err(Error::InvalidConfig(format!(
                "compression_level must be 0-9, got {}",
                level
            )));
        }
        self.compression_level = level;
        Ok(self)
    }

    /// Re-check every field. The fields are public, so a config may have
    /// been built without going through the validating setters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        check_window_bits("server_max_window_bits", self.server_max_window_bits)?;
        check_window_bits("client_max_window_bits", self.client_max_window_bits)?;
        if self.compression_level > 9 {
            return Err(Error::InvalidConfig(format!(
                "compression_level must be 0-9, got {}",
                self.compression_level
            )));
        }
        Ok(())
    }

    /// Window bound configured for one direction.
    pub fn max_window_bits(&self, direction: Direction) -> u8 {
        match direction {
            Direction::ServerToClient => self.server_max_window_bits,
            Direction::ClientToServer => self.client_max_window_bits,
        }
    }

    /// Context-takeover preference configured for one direction.
    pub fn no_context_takeover(&self, direction: Direction) -> bool {
        match direction {
            Direction::ServerToClient => self.server_no_context_takeover,
            Direction::ClientToServer => self.client_no_context_takeover,
        }
    }

    /// Parameters a client sends in its offer.
    ///
    /// `client_max_window_bits` is always present so the server knows it
    /// may bound the client's window; it carries a value only when the
    /// local bound is below the default.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the config does not validate.
    pub fn offer_params(&self) -> Result<ParameterSet> {
        self.validate()?;
        build_offer(self).map_err(|reason| Error::InvalidConfig(reason.to_string()))
    }
}

fn build_offer(config: &DeflateConfig) -> std::result::Result<ParameterSet, RejectReason> {
    let mut set = ParameterSet::new();
    if config.client_max_window_bits < MAX_WINDOW_BITS {
        set = set.with_window_bits(ParamName::ClientMaxWindowBits, config.client_max_window_bits)?;
    } else {
        set = set.with_flag(ParamName::ClientMaxWindowBits)?;
    }
    if config.server_max_window_bits < MAX_WINDOW_BITS {
        set = set.with_window_bits(ParamName::ServerMaxWindowBits, config.server_max_window_bits)?;
    }
    if config.client_no_context_takeover {
        set = set.with_flag(ParamName::ClientNoContextTakeover)?;
    }
    if config.server_no_context_takeover {
        set = set.with_flag(ParamName::ServerNoContextTakeover)?;
    }
    Ok(set)
}

fn check_window_bits(name: &str, bits: u8) -> Result<()> {
    if !(MIN_WINDOW_BITS..=MAX_WINDOW_BITS).contains(&bits) {
        return Err(Error::InvalidConfig(format!(
            "{} must be {}-{}, got {}",
            name, MIN_WINDOW_BITS, MAX_WINDOW_BITS, bits
        )));
    }
    Ok(())
}

/// Context parameters for one direction of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextParams {
    /// Reset the LZ77 window after every message.
    pub no_context_takeover: bool,
    /// Negotiated window size, 8-15.
    pub window_bits: u8,
}

impl Default for ContextParams {
    fn default() -> Self {
        Self {
            no_context_takeover: false,
            window_bits: DEFAULT_WINDOW_BITS,
        }
    }
}

impl ContextParams {
    /// Derive the context for `direction` from an accepted parameter set.
    ///
    /// Missing window sizes (including a valueless `client_max_window_bits`)
    /// mean 15.
    pub fn for_direction(params: &ParameterSet, direction: Direction) -> Self {
        let (takeover, bits) = match direction {
            Direction::ServerToClient => (
                ParamName::ServerNoContextTakeover,
                ParamName::ServerMaxWindowBits,
            ),
            Direction::ClientToServer => (
                ParamName::ClientNoContextTakeover,
                ParamName::ClientMaxWindowBits,
            ),
        };
        Self {
            no_context_takeover: params.contains(&takeover),
            window_bits: params.window_bits(&bits).unwrap_or(DEFAULT_WINDOW_BITS),
        }
    }

    /// Tighten a sending context with the local policy.
    ///
    /// A sender may always reset more often and use a smaller window than
    /// agreed; the receiver still decodes it.
    pub fn restrict_to(self, config: &DeflateConfig, direction: Direction) -> Self {
        Self {
            no_context_takeover: self.no_context_takeover || config.no_context_takeover(direction),
            window_bits: self.window_bits.min(config.max_window_bits(direction)),
        }
    }

    fn engine_window_bits(&self) -> u8 {
        self.window_bits.max(MIN_ENGINE_WINDOW_BITS)
    }
}

/// Compressing half of a permessage-deflate context.
pub struct Compressor {
    compress: Compress,
    params: ContextParams,
}

impl Compressor {
    /// Create a compressor for the given context and zlib level (0-9).
    pub fn new(params: ContextParams, level: u32) -> Self {
        Self {
            compress: Compress::new_with_window_bits(
                Compression::new(level.min(9)),
                false,
                params.engine_window_bits(),
            ),
            params,
        }
    }

    pub fn params(&self) -> ContextParams {
        self.params
    }

    /// Compress one complete message payload.
    ///
    /// The output is a sync-flushed deflate stream with the trailing
    /// `00 00 ff ff` removed. Without context takeover the LZ77 window is
    /// reset afterwards, so the next message starts from an empty window.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Compression`] if the deflate engine fails.
    pub fn compress(&mut self, input: &[u8]) -> Result<Bytes> {
        let mut output = Vec::with_capacity(input.len() / 2 + 64);
        let mut remaining = input;

        loop {
            if output.len() == output.capacity() {
                output.reserve(input.len().max(1024));
            }

            let before_in = self.compress.total_in();
            let before_out = self.compress.total_out();

            let status = self
                .compress
                .compress_vec(remaining, &mut output, FlushCompress::Sync)?;

            let consumed = (self.compress.total_in() - before_in) as usize;
            remaining = &remaining[consumed..];

            match status {
                Status::Ok | Status::BufError => {
                    if before_out == self.compress.total_out() && remaining.is_empty() {
                        break;
                    }
                }
                Status::StreamEnd => {
                    return Err(Error::Compression("Unexpected end of deflate stream".into()));
                }
            }
        }

        if output.ends_with(&DEFLATE_TRAILER) {
            output.truncate(output.len() - DEFLATE_TRAILER.len());
        }

        if self.params.no_context_takeover {
            self.compress.reset();
        }

        tracing::trace!(
            input = input.len(),
            output = output.len(),
            reset = self.params.no_context_takeover,
            "deflated message"
        );

        Ok(Bytes::from(output))
    }
}

/// Inflating half of a permessage-deflate context.
pub struct Decompressor {
    decompress: Decompress,
    params: ContextParams,
    max_message_size: usize,
}

impl Decompressor {
    /// Create a decompressor that refuses to produce more than
    /// `max_message_size` bytes for a single message.
    pub fn new(params: ContextParams, max_message_size: usize) -> Self {
        Self {
            decompress: Self::engine(&params),
            params,
            max_message_size,
        }
    }

    fn engine(params: &ContextParams) -> Decompress {
        Decompress::new_with_window_bits(false, params.engine_window_bits())
    }

    pub fn params(&self) -> ContextParams {
        self.params
    }

    /// Inflate one complete message payload (trailer already stripped by
    /// the peer).
    ///
    /// # Errors
    ///
    /// - [`Error::Compression`] if the payload is not valid deflate data
    /// - [`Error::MessageTooLarge`] if the inflated output would exceed the
    ///   configured maximum
    pub fn decompress(&mut self, input: &[u8]) -> Result<Bytes> {
        if input.is_empty() {
            return Ok(Bytes::new());
        }

        let max = self.max_message_size;
        let mut output = Vec::with_capacity(input.len().saturating_mul(2).clamp(64, max.max(64)));
        let mut stream_ended = false;

        'chunks: for (from_peer, chunk) in [(true, input), (false, &DEFLATE_TRAILER[..])] {
            let mut remaining = chunk;
            loop {
                if output.len() == output.capacity() {
                    let grow = output.capacity().max(1024).min(max.saturating_add(1) - output.len());
                    output.reserve(grow);
                }

                let before_in = self.decompress.total_in();
                let before_out = self.decompress.total_out();

                let status =
                    self.decompress
                        .decompress_vec(remaining, &mut output, FlushDecompress::Sync)?;

                let consumed = (self.decompress.total_in() - before_in) as usize;
                remaining = &remaining[consumed..];

                if output.len() > max {
                    self.reset();
                    return Err(Error::MessageTooLarge {
                        size: output.len(),
                        max,
                    });
                }

                match status {
                    Status::StreamEnd => {
                        if from_peer && !remaining.is_empty() {
                            self.reset();
                            return Err(Error::Compression(format!(
                                "{} bytes after the final deflate block",
                                remaining.len()
                            )));
                        }
                        stream_ended = true;
                        break 'chunks;
                    }
                    Status::Ok | Status::BufError => {
                        let produced = self.decompress.total_out() != before_out;
                        if !produced && (remaining.is_empty() || consumed == 0) {
                            break;
                        }
                    }
                }
            }
        }

        // A final block ends the stream; the next message needs a fresh one.
        if stream_ended || self.params.no_context_takeover {
            self.reset();
        }

        tracing::trace!(
            input = input.len(),
            output = output.len(),
            reset = self.params.no_context_takeover,
            "inflated message"
        );

        Ok(Bytes::from(output))
    }

    /// Drop the LZ77 window.
    pub fn reset(&mut self) {
        self.decompress = Self::engine(&self.params);
    }
}
