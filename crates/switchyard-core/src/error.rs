//! Backend failure type and the error-kind taxonomy.
//!
//! Every provider call resolves to either a typed response or a
//! [`BackendError`]. The router itself never matches on individual error
//! variants; it asks for the classified [`ErrorKind`] and decides
//! retryability from that.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classified failure taxonomy.
///
/// Classification is deterministic: the same error value always yields the
/// same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Authentication,
    RateLimit,
    QuotaExceeded,
    InvalidRequest,
    ServerError,
    NetworkError,
    Timeout,
    ContentFilter,
    Unknown,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::Authentication => "authentication",
            ErrorKind::RateLimit => "rate_limit",
            ErrorKind::QuotaExceeded => "quota_exceeded",
            ErrorKind::InvalidRequest => "invalid_request",
            ErrorKind::ServerError => "server_error",
            ErrorKind::NetworkError => "network_error",
            ErrorKind::Timeout => "timeout",
            ErrorKind::ContentFilter => "content_filter",
            ErrorKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// A failure reported by a backend provider.
///
/// Adapters that already know what went wrong use the structured variants.
/// Adapters wrapping an opaque transport error use [`BackendError::Http`]
/// (status code plus message) or [`BackendError::Other`] (message only) and
/// let the classifier work it out.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("server error: {0}")]
    Server(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("content filtered: {0}")]
    ContentFiltered(String),

    /// An HTTP-level failure with a status code the adapter did not map.
    #[error("http {status}: {message}")]
    Http { status: u16, message: String },

    /// Anything else; classified from the message text.
    #[error("{0}")]
    Other(String),
}

impl BackendError {
    /// Classify this failure into the fixed taxonomy.
    ///
    /// Structured variants map directly. `Http` maps by status code first
    /// and falls back to the message text; `Other` is classified from the
    /// message text alone.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BackendError::Auth(_) => ErrorKind::Authentication,
            BackendError::RateLimited(_) => ErrorKind::RateLimit,
            BackendError::QuotaExceeded(_) => ErrorKind::QuotaExceeded,
            BackendError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            BackendError::Server(_) => ErrorKind::ServerError,
            BackendError::Network(_) => ErrorKind::NetworkError,
            BackendError::Timeout(_) => ErrorKind::Timeout,
            BackendError::ContentFiltered(_) => ErrorKind::ContentFilter,
            BackendError::Http { status, message } => match status {
                401 | 403 => ErrorKind::Authentication,
                429 => ErrorKind::RateLimit,
                400 | 422 => ErrorKind::InvalidRequest,
                s if *s >= 500 => ErrorKind::ServerError,
                _ => classify_message(message),
            },
            BackendError::Other(message) => classify_message(message),
        }
    }
}

/// Classify an untyped failure message by well-known substrings.
///
/// Checks are ordered from most to least specific so that, e.g., a
/// "rate limit quota" message lands on the rate-limit kind consistently.
pub fn classify_message(message: &str) -> ErrorKind {
    let text = message.to_lowercase();

    if text.contains("unauthorized")
        || text.contains("api key")
        || text.contains("authentication")
        || text.contains("forbidden")
    {
        ErrorKind::Authentication
    } else if text.contains("rate limit") || text.contains("too many requests") {
        ErrorKind::RateLimit
    } else if text.contains("quota") || text.contains("billing") || text.contains("credit") {
        ErrorKind::QuotaExceeded
    } else if text.contains("timeout") || text.contains("timed out") {
        ErrorKind::Timeout
    } else if text.contains("connection")
        || text.contains("dns")
        || text.contains("unreachable")
        || text.contains("network")
    {
        ErrorKind::NetworkError
    } else if text.contains("internal error")
        || text.contains("internal server")
        || text.contains("bad gateway")
        || text.contains("unavailable")
        || text.contains("overloaded")
    {
        ErrorKind::ServerError
    } else if text.contains("content filter")
        || text.contains("policy")
        || text.contains("safety")
        || text.contains("moderation")
    {
        ErrorKind::ContentFilter
    } else if text.contains("bad request")
        || text.contains("invalid request")
        || text.contains("malformed")
    {
        ErrorKind::InvalidRequest
    } else {
        ErrorKind::Unknown
    }
}

/// Result alias for provider calls.
pub type BackendResult<T> = Result<T, BackendError>;
