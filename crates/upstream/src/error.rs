use carehub_core::failure::{self, Failure, FailureKind};
use serde_json::Value;

/// Shown when the upstream API cannot be reached at all.
pub const UNREACHABLE_MESSAGE: &str = "Der Server ist derzeit nicht erreichbar.";

/// Errors from the upstream REST layer.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The upstream API returned a non-2xx status code.
    #[error("Upstream API error ({status}): {message}")]
    Api {
        status: u16,
        /// Classified, user-facing message.
        message: String,
        /// Leniently parsed response body.
        body: Value,
    },

    #[error("Invalid upstream configuration: {0}")]
    Config(String),
}

impl UpstreamError {
    pub fn api(status: u16, body: Value) -> Self {
        let message = failure::classify(status, &body).message;
        Self::Api {
            status,
            message,
            body,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Request(err) => err.status().map(|s| s.as_u16()),
            Self::Config(_) => None,
        }
    }

    /// Classify into the taxonomy the screens act on.
    pub fn failure(&self) -> Failure {
        match self {
            Self::Api { status, body, .. } => failure::classify(*status, body),
            Self::Request(_) | Self::Config(_) => Failure {
                kind: FailureKind::Other,
                status: 502,
                message: UNREACHABLE_MESSAGE.to_string(),
            },
        }
    }

    /// Transport failures and gateway statuses are worth another attempt
    /// for idempotent requests.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            Self::Api { status, .. } => matches!(status, 502 | 503 | 504),
            Self::Config(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn api_error_carries_classified_message() {
        let err = UpstreamError::api(403, json!({ "message": "LOCKED_AFTER_SIGNATURE" }));
        assert_eq!(err.failure().kind, FailureKind::LockedAfterSignature);
        assert_eq!(err.status(), Some(403));
        assert!(!err.is_retryable());
    }

    #[test]
    fn gateway_statuses_are_retryable() {
        assert!(UpstreamError::api(503, json!({})).is_retryable());
        assert!(!UpstreamError::api(500, json!({})).is_retryable());
    }
}
