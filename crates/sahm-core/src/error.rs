use std::fmt::{Display, Formatter};

use thiserror::Error;

/// Validation errors for locally constructed values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },

    #[error("invalid sort order '{value}', expected one of asc, desc")]
    InvalidSortOrder { value: String },

    #[error("page limit must be greater than zero")]
    ZeroLimit,

    #[error("base url cannot be empty")]
    EmptyBaseUrl,
}

/// Client error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientErrorKind {
    MissingCredential,
    RateLimited,
    Unauthorized,
    RequestFailed,
}

/// Structured error surfaced by the stock data client.
///
/// The client never retries; `retryable` only tells the caller whether
/// repeating the same operation can succeed without a configuration change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientError {
    kind: ClientErrorKind,
    message: String,
}

impl ClientError {
    pub fn missing_credential() -> Self {
        Self {
            kind: ClientErrorKind::MissingCredential,
            message: String::from(
                "API key required. Set SAHM_POLYGON_API_KEY (or POLYGON_API_KEY) in the environment",
            ),
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: ClientErrorKind::RateLimited,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            kind: ClientErrorKind::Unauthorized,
            message: message.into(),
        }
    }

    pub fn request_failed(message: impl Into<String>) -> Self {
        Self {
            kind: ClientErrorKind::RequestFailed,
            message: message.into(),
        }
    }

    pub const fn kind(&self) -> ClientErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn is_rate_limited(&self) -> bool {
        matches!(self.kind, ClientErrorKind::RateLimited)
    }

    pub const fn retryable(&self) -> bool {
        matches!(
            self.kind,
            ClientErrorKind::RateLimited | ClientErrorKind::RequestFailed
        )
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            ClientErrorKind::MissingCredential => "client.missing_credential",
            ClientErrorKind::RateLimited => "client.rate_limited",
            ClientErrorKind::Unauthorized => "client.unauthorized",
            ClientErrorKind::RequestFailed => "client.request_failed",
        }
    }
}

impl Display for ClientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for ClientError {}

impl From<ValidationError> for ClientError {
    fn from(value: ValidationError) -> Self {
        Self::request_failed(value.to_string())
    }
}

const RATE_LIMIT_SIGNATURES: [&str; 2] = ["rate limit", "exceeded the maximum requests"];

/// Returns true when an upstream message reads like a rate-limit rejection.
pub fn has_rate_limit_signature(message: &str) -> bool {
    let lowered = message.to_ascii_lowercase();
    RATE_LIMIT_SIGNATURES
        .iter()
        .any(|signature| lowered.contains(signature))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_rate_limit_signatures_case_insensitively() {
        assert!(has_rate_limit_signature(
            "You've exceeded the maximum requests per minute"
        ));
        assert!(has_rate_limit_signature("Rate Limit exceeded"));
        assert!(!has_rate_limit_signature("internal server error"));
    }

    #[test]
    fn retryable_flags_follow_kind() {
        assert!(ClientError::rate_limited("slow down").retryable());
        assert!(ClientError::request_failed("timeout").retryable());
        assert!(!ClientError::unauthorized("bad key").retryable());
        assert!(!ClientError::missing_credential().retryable());
    }

    #[test]
    fn display_includes_code() {
        let error = ClientError::unauthorized("bad key");
        assert_eq!(error.to_string(), "bad key (client.unauthorized)");
    }
}
