//! Typed permessage-deflate parameter sets.
//!
//! A [`ParameterSet`] is the typed form of one offer or one response: each
//! parameter name appears at most once, flags carry no value and window
//! sizes are integers in 8-15. Names outside RFC 7692 are kept (as
//! [`ParamName::Draft`] or [`ParamName::Unknown`]) so the validator can
//! report exactly what the peer sent.

use std::fmt;

use crate::error::RejectReason;
use crate::extensions::{ExtensionOffer, ExtensionParam, PERMESSAGE_DEFLATE};

/// Smallest LZ77 window size a peer may negotiate (256 bytes).
pub const MIN_WINDOW_BITS: u8 = 8;
/// Largest LZ77 window size, also the default (32 KB).
pub const MAX_WINDOW_BITS: u8 = 15;

const CLIENT_NO_CONTEXT_TAKEOVER: &str = "client_no_context_takeover";
const SERVER_NO_CONTEXT_TAKEOVER: &str = "server_no_context_takeover";
const CLIENT_MAX_WINDOW_BITS: &str = "client_max_window_bits";
const SERVER_MAX_WINDOW_BITS: &str = "server_max_window_bits";

/// Parameter names used by pre-RFC drafts of the compression extension,
/// where `s2c`/`c2s` stood for the server-to-client and client-to-server
/// directions. No RFC 7692 endpoint offers them.
const DRAFT_NAMES: [&str; 4] = [
    "s2c_no_context_takeover",
    "s2c_max_window_bits",
    "c2s_no_context_takeover",
    "c2s_max_window_bits",
];

/// Name of a permessage-deflate parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamName {
    /// `client_no_context_takeover`
    ClientNoContextTakeover,
    /// `server_no_context_takeover`
    ServerNoContextTakeover,
    /// `client_max_window_bits`
    ClientMaxWindowBits,
    /// `server_max_window_bits`
    ServerMaxWindowBits,
    /// A draft-era `s2c_*` / `c2s_*` name.
    Draft(&'static str),
    /// Anything else, as received.
    Unknown(String),
}

impl ParamName {
    /// Classify a raw parameter name.
    pub fn parse(name: &str) -> Self {
        let name = name.trim();
        if name.eq_ignore_ascii_case(CLIENT_NO_CONTEXT_TAKEOVER) {
            ParamName::ClientNoContextTakeover
        } else if name.eq_ignore_ascii_case(SERVER_NO_CONTEXT_TAKEOVER) {
            ParamName::ServerNoContextTakeover
        } else if name.eq_ignore_ascii_case(CLIENT_MAX_WINDOW_BITS) {
            ParamName::ClientMaxWindowBits
        } else if name.eq_ignore_ascii_case(SERVER_MAX_WINDOW_BITS) {
            ParamName::ServerMaxWindowBits
        } else if let Some(draft) = DRAFT_NAMES
            .into_iter()
            .find(|draft| name.eq_ignore_ascii_case(draft))
        {
            ParamName::Draft(draft)
        } else {
            ParamName::Unknown(name.to_string())
        }
    }

    /// Header spelling of this name.
    pub fn as_str(&self) -> &str {
        match self {
            ParamName::ClientNoContextTakeover => CLIENT_NO_CONTEXT_TAKEOVER,
            ParamName::ServerNoContextTakeover => SERVER_NO_CONTEXT_TAKEOVER,
            ParamName::ClientMaxWindowBits => CLIENT_MAX_WINDOW_BITS,
            ParamName::ServerMaxWindowBits => SERVER_MAX_WINDOW_BITS,
            ParamName::Draft(name) => *name,
            ParamName::Unknown(name) => name.as_str(),
        }
    }

    /// One of the four names RFC 7692 defines.
    pub fn is_recognized(&self) -> bool {
        !matches!(self, ParamName::Draft(_) | ParamName::Unknown(_))
    }

    fn is_flag(&self) -> bool {
        matches!(
            self,
            ParamName::ClientNoContextTakeover | ParamName::ServerNoContextTakeover
        )
    }

    fn is_window_bits(&self) -> bool {
        matches!(
            self,
            ParamName::ClientMaxWindowBits | ParamName::ServerMaxWindowBits
        )
    }
}

impl fmt::Display for ParamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value attached to a parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// A validated window size (8-15).
    WindowBits(u8),
    /// Raw value of a draft or unknown parameter.
    Token(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::WindowBits(bits) => write!(f, "{}", bits),
            ParamValue::Token(token) => f.write_str(token),
        }
    }
}

/// Parse a window-bits value (`1*DIGIT`, no leading zero, 8-15).
pub(crate) fn parse_window_bits(name: &ParamName, raw: &str) -> Result<u8, RejectReason> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RejectReason::malformed(format!(
            "{} value is not an integer: '{}'",
            name, raw
        )));
    }
    if raw.len() > 1 && raw.starts_with('0') {
        return Err(RejectReason::malformed(format!(
            "{} value has a leading zero: '{}'",
            name, raw
        )));
    }
    raw.parse::<u8>()
        .ok()
        .filter(|bits| (MIN_WINDOW_BITS..=MAX_WINDOW_BITS).contains(bits))
        .ok_or_else(|| RejectReason::out_of_range(name.as_str(), raw))
}

/// The parameters of one permessage-deflate offer or response.
///
/// Insertion order is preserved so a set renders back into the same header
/// it was parsed from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSet {
    entries: Vec<(ParamName, Option<ParamValue>)>,
}

impl ParameterSet {
    /// An empty set (a bare `permessage-deflate`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse header tokens into a parameter set.
    ///
    /// # Errors
    ///
    /// - [`RejectReason::MalformedParameter`] for a duplicated name, a flag
    ///   with a value, a missing `server_max_window_bits` value or a
    ///   non-integer window size
    /// - [`RejectReason::InvalidRange`] for a window size outside 8-15
    pub fn parse(params: &[ExtensionParam]) -> Result<Self, RejectReason> {
        let mut set = Self::new();
        for param in params {
            let name = ParamName::parse(&param.name);
            let value = match (&param.value, name.is_window_bits()) {
                (None, _) => None,
                (Some(raw), true) => Some(ParamValue::WindowBits(parse_window_bits(&name, raw)?)),
                (Some(raw), false) => Some(ParamValue::Token(raw.clone())),
            };
            set.insert(name, value)?;
        }
        Ok(set)
    }

    /// Parse the parameters of a `permessage-deflate` header element.
    ///
    /// # Errors
    ///
    /// Same as [`ParameterSet::parse`]; additionally rejects elements naming
    /// another extension.
    pub fn from_offer(offer: &ExtensionOffer) -> Result<Self, RejectReason> {
        if !offer.is_permessage_deflate() {
            return Err(RejectReason::malformed(format!(
                "'{}' is not {}",
                offer.name, PERMESSAGE_DEFLATE
            )));
        }
        Self::parse(&offer.params)
    }

    /// Add a parameter, enforcing the set invariants.
    ///
    /// # Errors
    ///
    /// See [`ParameterSet::parse`].
    pub fn insert(&mut self, name: ParamName, value: Option<ParamValue>) -> Result<(), RejectReason> {
        if self.contains(&name) {
            return Err(RejectReason::malformed(format!("Duplicate parameter {}", name)));
        }

        let value = match value {
            Some(ParamValue::Token(raw)) if name.is_window_bits() => {
                Some(ParamValue::WindowBits(parse_window_bits(&name, &raw)?))
            }
            other => other,
        };

        match (&name, &value) {
            (n, Some(_)) if n.is_flag() => {
                return Err(RejectReason::malformed(format!("{} takes no value", n)));
            }
            (ParamName::ServerMaxWindowBits, None) => {
                return Err(RejectReason::malformed(format!("{} requires a value", name)));
            }
            (n, Some(ParamValue::WindowBits(bits)))
                if !(MIN_WINDOW_BITS..=MAX_WINDOW_BITS).contains(bits) =>
            {
                return Err(RejectReason::out_of_range(n.as_str(), bits));
            }
            _ => {}
        }

        self.entries.push((name, value));
        Ok(())
    }

    /// Builder form of [`ParameterSet::insert`] for a flag.
    ///
    /// # Errors
    ///
    /// See [`ParameterSet::insert`].
    pub fn with_flag(mut self, name: ParamName) -> Result<Self, RejectReason> {
        self.insert(name, None)?;
        Ok(self)
    }

    /// Builder form of [`ParameterSet::insert`] for a window size.
    ///
    /// # Errors
    ///
    /// See [`ParameterSet::insert`].
    pub fn with_window_bits(mut self, name: ParamName, bits: u8) -> Result<Self, RejectReason> {
        self.insert(name, Some(ParamValue::WindowBits(bits)))?;
        Ok(self)
    }

    /// Presence and value of a parameter.
    ///
    /// `None` if absent, `Some(None)` for a present flag or valueless
    /// `client_max_window_bits`, `Some(Some(v))` otherwise.
    pub fn get(&self, name: &ParamName) -> Option<Option<&ParamValue>> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value.as_ref())
    }

    /// Whether a parameter is present.
    pub fn contains(&self, name: &ParamName) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// The window size carried by a window-bits parameter, if any.
    pub fn window_bits(&self, name: &ParamName) -> Option<u8> {
        match self.get(name) {
            Some(Some(ParamValue::WindowBits(bits))) => Some(*bits),
            _ => None,
        }
    }

    /// Iterate over the parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&ParamName, Option<&ParamValue>)> {
        self.entries.iter().map(|(n, v)| (n, v.as_ref()))
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// A bare `permessage-deflate` with no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Convert back into header tokens.
    pub fn to_params(&self) -> Vec<ExtensionParam> {
        self.entries
            .iter()
            .map(|(name, value)| match value {
                Some(v) => ExtensionParam::new(name.as_str(), v.to_string()),
                None => ExtensionParam::flag(name.as_str()),
            })
            .collect()
    }

    /// Render as a `permessage-deflate` header element.
    pub fn to_offer(&self) -> ExtensionOffer {
        ExtensionOffer::with_params(PERMESSAGE_DEFLATE, self.to_params())
    }
}

impl fmt::Display for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_offer())
    }
}
