//! One-shot permessage-deflate negotiation for a single connection.
//!
//! ```text
//!            offer() / receive_offers()
//!   Idle ──────────────────────────────▶ Offered
//!    │                                    │   │
//!    │ disable()                 valid    │   │ invalid
//!    ▼                                    ▼   ▼
//! Disabled                         Accepted   Rejected
//! ```
//!
//! A client that receives a `permessage-deflate` response without having
//! offered one goes straight to `Rejected`.

use crate::codec::FrameCodec;
use crate::config::Config;
use crate::error::{Error, RejectReason, Result};
use crate::extensions::deflate::DeflateConfig;
use crate::extensions::params::{MAX_WINDOW_BITS, ParamName, ParameterSet};
use crate::extensions::validate::validate;
use crate::extensions::{ExtensionOffer, PERMESSAGE_DEFLATE};
use crate::protocol::Role;

/// Where a connection is in the negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiationState {
    /// Nothing sent or received yet.
    Idle,
    /// An offer is outstanding.
    Offered(ParameterSet),
    /// The extension is in force with these parameters.
    Accepted(ParameterSet),
    /// The peer's answer was not acceptable; frames stay uncompressed.
    Rejected(RejectReason),
    /// The extension is off for this connection, either by local policy or
    /// because the peer never took it up.
    Disabled,
}

impl NegotiationState {
    /// Short state name, as reported in [`Error::InvalidState`].
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            NegotiationState::Idle => "Idle",
            NegotiationState::Offered(_) => "Offered",
            NegotiationState::Accepted(_) => "Accepted",
            NegotiationState::Rejected(_) => "Rejected",
            NegotiationState::Disabled => "Disabled",
        }
    }

    /// No further negotiation step is possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            NegotiationState::Accepted(_) | NegotiationState::Rejected(_) | NegotiationState::Disabled
        )
    }
}

/// Outcome of negotiation, fixed for the life of the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiationResult {
    /// Compress with the effective parameter set.
    Accepted(ParameterSet),
    /// Negotiation failed; frames pass through unmodified.
    Rejected(RejectReason),
    /// The extension was never in play.
    NotOffered,
}

impl NegotiationResult {
    /// Whether compression is in force.
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, NegotiationResult::Accepted(_))
    }

    /// The effective parameters, if accepted.
    pub fn params(&self) -> Option<&ParameterSet> {
        match self {
            NegotiationResult::Accepted(params) => Some(params),
            _ => None,
        }
    }
}

/// Drives permessage-deflate negotiation for one connection.
///
/// Clients call [`offer`](Self::offer) then
/// [`receive_response`](Self::receive_response); servers call
/// [`receive_offers`](Self::receive_offers). Either side then turns the
/// negotiator into a [`FrameCodec`].
#[derive(Debug)]
pub struct Negotiator {
    role: Role,
    config: Config,
    state: NegotiationState,
}

impl Negotiator {
    /// Start a negotiation. A config without deflate starts `Disabled`.
    pub fn new(role: Role, config: Config) -> Self {
        let state = if config.deflate.is_some() {
            NegotiationState::Idle
        } else {
            NegotiationState::Disabled
        };
        Self {
            role,
            config,
            state,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> &NegotiationState {
        &self.state
    }

    /// Opt out before anything has been offered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] once negotiation has started.
    pub fn disable(&mut self) -> Result<()> {
        match self.state {
            NegotiationState::Idle | NegotiationState::Disabled => {
                self.state = NegotiationState::Disabled;
                Ok(())
            }
            _ => Err(self.invalid("disable")),
        }
    }

    /// Build the client's offer.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidState`] on a server, or outside `Idle`
    /// - [`Error::InvalidConfig`] if the local [`DeflateConfig`] is invalid
    pub fn offer(&mut self) -> Result<ExtensionOffer> {
        self.require_role(Role::Client, "offer")?;
        if self.state != NegotiationState::Idle {
            return Err(self.invalid("offer"));
        }

        let params = self.deflate_config().offer_params()?;
        let offer = params.to_offer();
        tracing::debug!(offer = %offer, "offering {}", PERMESSAGE_DEFLATE);

        self.state = NegotiationState::Offered(params);
        Ok(offer)
    }

    /// Process the server's `Sec-WebSocket-Extensions` response.
    ///
    /// Elements naming other extensions are ignored. Negotiation problems
    /// never fail this call: they end in [`NegotiationResult::Rejected`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] on a server, or when a result has
    /// already been reached.
    pub fn receive_response(&mut self, responses: &[ExtensionOffer]) -> Result<NegotiationResult> {
        self.require_role(Role::Client, "receive a response")?;

        let deflate: Vec<&ExtensionOffer> = responses
            .iter()
            .filter(|r| r.is_permessage_deflate())
            .collect();

        match &self.state {
            NegotiationState::Offered(offer) => {
                let offer = offer.clone();
                self.state = match deflate.as_slice() {
                    [] => {
                        tracing::debug!("server declined {}", PERMESSAGE_DEFLATE);
                        NegotiationState::Disabled
                    }
                    [response] => Self::settle(
                        ParameterSet::from_offer(response).and_then(|r| validate(&offer, &r)),
                    ),
                    _ => Self::settle(Err(RejectReason::malformed(format!(
                        "{} responses for a single {} offer",
                        deflate.len(),
                        PERMESSAGE_DEFLATE
                    )))),
                };
            }
            NegotiationState::Idle | NegotiationState::Disabled => {
                // The handshake is over either way; no offer may follow.
                self.state = if deflate.is_empty() {
                    NegotiationState::Disabled
                } else {
                    Self::settle(Err(RejectReason::Unsolicited(
                        PERMESSAGE_DEFLATE.to_string(),
                    )))
                };
            }
            NegotiationState::Accepted(_) | NegotiationState::Rejected(_) => {
                return Err(self.invalid("receive a response"));
            }
        }

        Ok(self.current_result())
    }

    /// Choose a response to the client's offers.
    ///
    /// Offers are tried in order; the first acceptable `permessage-deflate`
    /// offer wins and its response is returned for the handshake layer to
    /// send. `None` means the extension is not used.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] on a client, or outside `Idle` and
    /// `Disabled`.
    pub fn receive_offers(&mut self, offers: &[ExtensionOffer]) -> Result<Option<ExtensionOffer>> {
        self.require_role(Role::Server, "receive offers")?;
        match self.state {
            NegotiationState::Idle => {}
            NegotiationState::Disabled => return Ok(None),
            _ => return Err(self.invalid("receive offers")),
        }

        let config = self.deflate_config();
        let mut last_reason = None;

        for offer in offers.iter().filter(|o| o.is_permessage_deflate()) {
            let offered = match ParameterSet::from_offer(offer).and_then(|o| check_offer(&o).map(|_| o)) {
                Ok(offered) => offered,
                Err(reason) => {
                    tracing::debug!(offer = %offer, %reason, "skipping offer");
                    last_reason = Some(reason);
                    continue;
                }
            };

            self.state = NegotiationState::Offered(offered.clone());
            match respond(&offered, &config).and_then(|r| validate(&offered, &r)) {
                Ok(response) => {
                    let rendered = response.to_offer();
                    self.state = Self::settle(Ok(response));
                    return Ok(Some(rendered));
                }
                Err(reason) => {
                    tracing::debug!(offer = %offer, %reason, "cannot answer offer");
                    last_reason = Some(reason);
                }
            }
        }

        self.state = match last_reason {
            Some(reason) => Self::settle(Err(reason)),
            None => NegotiationState::Disabled,
        };
        Ok(None)
    }

    /// The outcome, or `None` while an offer is outstanding.
    pub fn result(&self) -> Option<NegotiationResult> {
        match self.state {
            NegotiationState::Offered(_) => None,
            _ => Some(self.current_result()),
        }
    }

    /// Finish negotiation and build the per-connection codec.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] while an offer is outstanding.
    pub fn into_codec(self) -> Result<FrameCodec> {
        let Some(result) = self.result() else {
            return Err(self.invalid("build a codec"));
        };
        FrameCodec::new(&result, self.role, self.config)
    }

    fn current_result(&self) -> NegotiationResult {
        match &self.state {
            NegotiationState::Accepted(params) => NegotiationResult::Accepted(params.clone()),
            NegotiationState::Rejected(reason) => NegotiationResult::Rejected(reason.clone()),
            _ => NegotiationResult::NotOffered,
        }
    }

    fn settle(outcome: std::result::Result<ParameterSet, RejectReason>) -> NegotiationState {
        match outcome {
            Ok(params) => {
                tracing::debug!(params = %params, "{} accepted", PERMESSAGE_DEFLATE);
                NegotiationState::Accepted(params)
            }
            Err(reason) => {
                tracing::warn!(%reason, "{} rejected, continuing uncompressed", PERMESSAGE_DEFLATE);
                NegotiationState::Rejected(reason)
            }
        }
    }

    fn deflate_config(&self) -> DeflateConfig {
        self.config.deflate.clone().unwrap_or_default()
    }

    fn require_role(&self, role: Role, operation: &'static str) -> Result<()> {
        if self.role != role {
            return Err(Error::InvalidState {
                operation,
                state: match self.role {
                    Role::Client => "acting as client",
                    Role::Server => "acting as server",
                },
            });
        }
        Ok(())
    }

    fn invalid(&self, operation: &'static str) -> Error {
        Error::InvalidState {
            operation,
            state: self.state.name(),
        }
    }
}

/// Offers may only use the four RFC 7692 names.
fn check_offer(offer: &ParameterSet) -> std::result::Result<(), RejectReason> {
    match offer.iter().find(|(name, _)| !name.is_recognized()) {
        Some((name, _)) => Err(RejectReason::UnknownParameter(name.to_string())),
        None => Ok(()),
    }
}

/// Server policy: answer `offer` within the limits of `config`.
fn respond(
    offer: &ParameterSet,
    config: &DeflateConfig,
) -> std::result::Result<ParameterSet, RejectReason> {
    let mut response = ParameterSet::new();

    if offer.contains(&ParamName::ServerNoContextTakeover) || config.server_no_context_takeover {
        response.insert(ParamName::ServerNoContextTakeover, None)?;
    }
    if offer.contains(&ParamName::ClientNoContextTakeover) || config.client_no_context_takeover {
        response.insert(ParamName::ClientNoContextTakeover, None)?;
    }

    let server_bits = offer
        .window_bits(&ParamName::ServerMaxWindowBits)
        .unwrap_or(MAX_WINDOW_BITS)
        .min(config.server_max_window_bits);
    if server_bits < MAX_WINDOW_BITS || offer.contains(&ParamName::ServerMaxWindowBits) {
        response = response.with_window_bits(ParamName::ServerMaxWindowBits, server_bits)?;
    }

    // The client's window can only be bounded if it said it supports that.
    if offer.contains(&ParamName::ClientMaxWindowBits) {
        let client_bits = offer
            .window_bits(&ParamName::ClientMaxWindowBits)
            .unwrap_or(MAX_WINDOW_BITS)
            .min(config.client_max_window_bits);
        if client_bits < MAX_WINDOW_BITS
            || offer.window_bits(&ParamName::ClientMaxWindowBits).is_some()
        {
            response = response.with_window_bits(ParamName::ClientMaxWindowBits, client_bits)?;
        }
    }

    Ok(response)
}
