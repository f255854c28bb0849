//! Response validation and fallback synthesis.
//!
//! The validator is the last gate before text reaches the transcript
//! channel and the TTS sink: whatever happens upstream, the user hears a
//! sentence. Every fallback returned here passes `validate` itself.

use vl_domain::error::RejectReason;

/// Check a candidate assistant reply.
///
/// Rejects the empty string, replies with fewer than 3 non-whitespace
/// characters, and replies without a single alphanumeric character.
pub fn validate(text: &str) -> Result<(), RejectReason> {
    if text.trim().is_empty() {
        return Err(RejectReason::Empty);
    }
    if text.chars().filter(|c| !c.is_whitespace()).count() < 3 {
        return Err(RejectReason::TooShort);
    }
    if !text.chars().any(|c| c.is_alphanumeric()) {
        return Err(RejectReason::NoAlphanumeric);
    }
    Ok(())
}

/// The failure context a fallback sentence is synthesized for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackContext {
    /// A guarded call ran out of attempts on timeouts.
    Timeout,
    /// The circuit breaker rejected the call without touching the network.
    BreakerOpen,
    /// The health probe failed; the memory service is not reachable.
    HealthCheckFailed,
    /// The dependency answered but the reply failed validation.
    EmptyResponse,
    /// Anything else (protocol noise, server errors, missing agent).
    Failure,
}

/// Deterministic, user-friendly fallback sentence for a context.
pub fn fallback_for(ctx: FallbackContext) -> &'static str {
    match ctx {
        FallbackContext::Timeout => {
            "My processing system is taking longer than expected. Please try again in a moment."
        }
        FallbackContext::BreakerOpen => {
            "My processing system needs a moment to recover. Please try again shortly."
        }
        FallbackContext::HealthCheckFailed => {
            "I can't connect to my processing system. Please check if the Letta server is running."
        }
        FallbackContext::EmptyResponse => {
            "I didn't generate a response. Could you rephrase that?"
        }
        FallbackContext::Failure => {
            "I ran into a problem processing that. Please try again."
        }
    }
}

/// Map a terminal turn error to its fallback context.
pub fn context_for_error(err: &vl_domain::Error) -> FallbackContext {
    use vl_domain::Error;
    match err.root_cause() {
        Error::BreakerOpen => FallbackContext::BreakerOpen,
        Error::Timeout(_) => FallbackContext::Timeout,
        Error::Unreachable(_) => FallbackContext::HealthCheckFailed,
        Error::Rejected(_) => FallbackContext::EmptyResponse,
        _ => FallbackContext::Failure,
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
