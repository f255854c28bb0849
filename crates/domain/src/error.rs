use std::fmt;

/// Reasons the response validator rejects a candidate reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The reply is empty.
    Empty,
    /// Fewer than 3 non-whitespace characters.
    TooShort,
    /// No alphanumeric character at all (punctuation-only noise).
    NoAlphanumeric,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RejectReason::Empty => "empty response",
            RejectReason::TooShort => "response too short",
            RejectReason::NoAlphanumeric => "no alphanumeric content",
        };
        f.write_str(s)
    }
}

/// Shared error type used across all VoiceLoop crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    // ── Dependency errors (memory service / LLM provider) ───────────
    #[error("unreachable: {0}")]
    Unreachable(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("protocol: {0}")]
    Protocol(String),

    #[error("status {status}: {message}")]
    Server { status: u16, message: String },

    #[error("not found: {0}")]
    NotFound(String),

    // ── Reliability-derived errors ───────────────────────────────────
    #[error("circuit breaker open")]
    BreakerOpen,

    #[error("retries exhausted after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<Error>,
    },

    // ── Validation errors ────────────────────────────────────────────
    #[error("invalid response: {0}")]
    Rejected(RejectReason),

    // ── Dispatch / conflict errors ───────────────────────────────────
    #[error("room {room} already assigned to agent {agent_id} (session {session_id})")]
    DuplicateRoom {
        room: String,
        agent_id: String,
        session_id: String,
    },

    #[error("job requested agent \"{requested}\" but this process serves \"{configured}\"")]
    WrongAgent {
        requested: String,
        configured: String,
    },

    #[error("room {room} has {count} non-local agent participants")]
    RoomConflict { room: String, count: usize },

    // ── Ambient ──────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(String),

    #[error("transport: {0}")]
    Transport(String),
}

impl Error {
    /// Whether the retry executor may try the operation again.
    ///
    /// Timeouts, connect failures, wire/decode noise and 5xx statuses are
    /// transient. 4xx statuses, missing agents, open breakers and
    /// validation rejections are permanent at the turn level.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Unreachable(_) | Error::Timeout(_) | Error::Protocol(_) => true,
            Error::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Unwrap `RetriesExhausted` to the underlying cause.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::RetriesExhausted { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
