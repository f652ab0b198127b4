//! Provider error types and HTTP status classification.
//!
//! Adapters never retry internally; they classify failures so the retry
//! policy upstream can decide. 429/502/503 and transport failures are
//! retryable, everything else is fatal.

use thiserror::Error;

pub type ProviderResult<T> = Result<T, ProviderError>;

/// How much upstream error body to keep in messages.
const MAX_ERROR_BODY: usize = 300;

/// Classification of a provider failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Transient throttling/unavailability; safe to retry
    Retryable,
    /// Bad request or unrecoverable upstream failure
    Fatal,
    /// Syntactically valid but semantically incomplete provider output
    InvalidOutputShape,
}

/// Error from an external provider call.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
    pub http_status: Option<u16>,
}

impl ProviderError {
    pub fn retryable(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Retryable,
            message: message.into(),
            http_status: None,
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Fatal,
            message: message.into(),
            http_status: None,
        }
    }

    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::InvalidOutputShape,
            message: message.into(),
            http_status: None,
        }
    }

    /// Classify a non-success HTTP response.
    pub fn from_status(provider: &str, status: u16, body: &str) -> Self {
        let message = format!(
            "{} returned {}: {}",
            provider,
            status,
            truncate_body(body)
        );
        let kind = match status {
            429 | 502 | 503 => ProviderErrorKind::Retryable,
            _ => ProviderErrorKind::Fatal,
        };
        Self {
            kind,
            message,
            http_status: Some(status),
        }
    }

    /// Wrap a transport-level failure (connect/timeout/TLS).
    pub fn from_transport(provider: &str, err: &reqwest::Error) -> Self {
        Self {
            kind: ProviderErrorKind::Retryable,
            message: format!("{} request failed: {}", provider, err),
            http_status: None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self.kind, ProviderErrorKind::Retryable)
    }

    pub fn is_invalid_output(&self) -> bool {
        matches!(self.kind, ProviderErrorKind::InvalidOutputShape)
    }
}

/// Truncate an upstream error body for diagnosis without flooding logs.
fn truncate_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.len() <= MAX_ERROR_BODY {
        trimmed.to_string()
    } else {
        let cut = trimmed
            .char_indices()
            .take_while(|(i, _)| *i < MAX_ERROR_BODY)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        format!("{}...", &trimmed[..cut])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throttling_statuses_are_retryable() {
        for status in [429u16, 502, 503] {
            let err = ProviderError::from_status("speech", status, "busy");
            assert!(err.is_retryable(), "{status} should be retryable");
            assert_eq!(err.http_status, Some(status));
        }
    }

    #[test]
    fn test_client_and_server_errors_are_fatal() {
        for status in [400u16, 401, 404, 422, 500] {
            let err = ProviderError::from_status("speech", status, "nope");
            assert!(!err.is_retryable(), "{status} should be fatal");
        }
    }

    #[test]
    fn test_body_is_truncated() {
        let body = "x".repeat(1000);
        let err = ProviderError::from_status("content", 400, &body);
        assert!(err.message.len() < 400);
        assert!(err.message.ends_with("..."));
    }
}
