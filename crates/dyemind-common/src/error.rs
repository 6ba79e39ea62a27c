use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DyeMindError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network sandbox rejected request: {0}")]
    Sandbox(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, DyeMindError>;

/// How a single provider lookup failed.
/// See ARCHITECTURE.md §3.2 for the full classification table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No response within the per-provider deadline. Never retried.
    Timeout,
    /// Well-formed "no data" answer (empty result set, HTTP 404). Terminal, not a fault.
    NotFound,
    /// The provider signalled throttling (HTTP 429, warm-up responses).
    RateLimited,
    /// DNS/connection failure or an unexpected non-2xx status.
    Transport,
    /// The response arrived but its shape was not recognised.
    Unknown,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Timeout     => "timeout",
            FailureKind::NotFound    => "not_found",
            FailureKind::RateLimited => "rate_limited",
            FailureKind::Transport   => "transport",
            FailureKind::Unknown     => "unknown",
        }
    }

    /// Transport faults and throttling are worth another attempt;
    /// everything else is a terminal outcome.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FailureKind::Transport | FailureKind::RateLimited)
    }
}

/// A classified provider failure, produced at the provider boundary the
/// moment a raw response (or transport error) is received.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{}: {message}", .kind.as_str())]
pub struct ProviderError {
    pub kind: FailureKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Timeout, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(FailureKind::NotFound, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(FailureKind::RateLimited, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Transport, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Unknown, message)
    }

    /// Classify a non-2xx HTTP status.
    ///
    /// 404 is a well-formed "no such record" from every provider we talk
    /// to, 429 is throttling, and anything else is treated as a transient
    /// transport fault so the retry loop gets a chance at it.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = if body.trim().is_empty() {
            format!("HTTP {status}")
        } else {
            format!("HTTP {status}: {}", truncate(body, 200))
        };
        match status.as_u16() {
            404 => Self::not_found(message),
            429 => Self::rate_limited(message),
            _   => Self::transport(message),
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::unknown(err.to_string())
        } else {
            // connect/DNS/request-level failures, plus anything reqwest
            // itself could not categorise
            Self::transport(err.to_string())
        }
    }
}

impl From<DyeMindError> for ProviderError {
    fn from(err: DyeMindError) -> Self {
        match err {
            DyeMindError::Http(e) => e.into(),
            other => Self::unknown(other.to_string()),
        }
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_status_classification() {
        assert_eq!(
            ProviderError::from_status(StatusCode::NOT_FOUND, "").kind,
            FailureKind::NotFound
        );
        assert_eq!(
            ProviderError::from_status(StatusCode::TOO_MANY_REQUESTS, "slow down").kind,
            FailureKind::RateLimited
        );
        assert_eq!(
            ProviderError::from_status(StatusCode::BAD_GATEWAY, "").kind,
            FailureKind::Transport
        );
        assert_eq!(
            ProviderError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "").kind,
            FailureKind::Transport
        );
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(FailureKind::Transport.is_retryable());
        assert!(FailureKind::RateLimited.is_retryable());
        assert!(!FailureKind::Timeout.is_retryable());
        assert!(!FailureKind::NotFound.is_retryable());
        assert!(!FailureKind::Unknown.is_retryable());
    }

    #[test]
    fn test_status_message_is_truncated() {
        let body = "x".repeat(500);
        let err = ProviderError::from_status(StatusCode::BAD_GATEWAY, &body);
        assert!(err.message.len() < 300);
    }

    #[test]
    fn test_display_includes_kind() {
        let err = ProviderError::not_found("no compound matched");
        assert_eq!(err.to_string(), "not_found: no compound matched");
    }
}
