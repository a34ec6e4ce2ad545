//! Checking a permessage-deflate response against the offer it answers.

use crate::error::RejectReason;
use crate::extensions::ExtensionParam;
use crate::extensions::params::{MAX_WINDOW_BITS, ParamName, ParamValue, ParameterSet};

/// Decide whether `response` is a legal answer to `offer`.
///
/// On success the response is returned unchanged; it is the effective
/// parameter set for the connection.
///
/// A server may always add `server_no_context_takeover`,
/// `client_no_context_takeover` and `server_max_window_bits`. It may only
/// bound the client's window if the client offered `client_max_window_bits`,
/// and never above a window size the client offered.
///
/// # Errors
///
/// - [`RejectReason::UnknownParameter`] for a name outside RFC 7692
/// - [`RejectReason::Unsolicited`] for a draft-era `s2c_*`/`c2s_*` name, or
///   `client_max_window_bits` that was not offered
/// - [`RejectReason::InvalidRange`] for a window size above the offered one,
///   including a missing `server_max_window_bits` the client bounded
/// - [`RejectReason::MalformedParameter`] for a valueless
///   `client_max_window_bits`, or a requested `server_no_context_takeover`
///   left out of the response
pub fn validate(offer: &ParameterSet, response: &ParameterSet) -> Result<ParameterSet, RejectReason> {
    for (name, value) in response.iter() {
        match name {
            ParamName::Unknown(raw) => {
                return Err(RejectReason::UnknownParameter(raw.clone()));
            }
            ParamName::Draft(raw) => {
                return Err(RejectReason::Unsolicited((*raw).to_string()));
            }
            ParamName::ServerNoContextTakeover | ParamName::ClientNoContextTakeover => {}
            ParamName::ServerMaxWindowBits => {
                check_bound(offer, name, value)?;
            }
            ParamName::ClientMaxWindowBits => {
                if !offer.contains(name) {
                    return Err(RejectReason::Unsolicited(name.to_string()));
                }
                if value.is_none() {
                    return Err(RejectReason::malformed(format!(
                        "{} in a response requires a value",
                        name
                    )));
                }
                check_bound(offer, name, value)?;
            }
        }
    }
    check_server_requests(offer, response)?;
    Ok(response.clone())
}

/// What the client asked of the server's own stream is binding: a
/// requested `server_no_context_takeover` must be echoed, and an offered
/// `server_max_window_bits` bound must be answered with a value within it.
/// An absent window size means 15.
fn check_server_requests(offer: &ParameterSet, response: &ParameterSet) -> Result<(), RejectReason> {
    let takeover = ParamName::ServerNoContextTakeover;
    if offer.contains(&takeover) && !response.contains(&takeover) {
        return Err(RejectReason::malformed(format!(
            "{} was requested but not granted",
            takeover
        )));
    }

    let bits = ParamName::ServerMaxWindowBits;
    if let Some(offered) = offer.window_bits(&bits) {
        let answered = response.window_bits(&bits).unwrap_or(MAX_WINDOW_BITS);
        if answered > offered {
            return Err(RejectReason::out_of_range(bits.as_str(), answered));
        }
    }
    Ok(())
}

/// Parse raw response tokens and [`validate`] them in one step.
///
/// # Errors
///
/// Parse failures from [`ParameterSet::parse`] or any [`validate`] failure.
pub fn validate_tokens(
    offer: &ParameterSet,
    response: &[ExtensionParam],
) -> Result<ParameterSet, RejectReason> {
    let response = ParameterSet::parse(response)?;
    validate(offer, &response)
}

fn check_bound(
    offer: &ParameterSet,
    name: &ParamName,
    value: Option<&ParamValue>,
) -> Result<(), RejectReason> {
    let (Some(ParamValue::WindowBits(answered)), Some(offered)) = (value, offer.window_bits(name))
    else {
        return Ok(());
    };
    if *answered > offered {
        return Err(RejectReason::out_of_range(name.as_str(), answered));
    }
    Ok(())
}
