//! Classification of upstream failures.
//!
//! Turns an HTTP status and response body into the small taxonomy the
//! screens act on. The two application sentinels are matched anywhere in
//! the body's `message`, `error` or `code` fields, regardless of status.

use serde::Serialize;
use serde_json::Value;

use crate::lifecycle::CONFIRM_FIRST_MESSAGE;

/// Sentinel returned when a time or km write targets a signed day.
pub const LOCKED_AFTER_SIGNATURE: &str = "LOCKED_AFTER_SIGNATURE";

/// Sentinel returned when a km write precedes confirmation.
pub const ASSIGNMENT_NOT_CONFIRMED: &str = "ASSIGNMENT_NOT_CONFIRMED";

/// Shown instead of a generic error once a day turns out to be locked.
pub const LOCKED_MESSAGE: &str = "Dieser Tag ist nach der Unterschrift gesperrt. \
     Änderungen sind nur noch über die Korrekturen der Verwaltung möglich.";

pub const NO_ACCESS_MESSAGE: &str = "Kein Zugriff.";

pub const SESSION_EXPIRED_MESSAGE: &str = "Sitzung abgelaufen. Bitte erneut anmelden.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    /// 401: redirect to login, never continue silently.
    Unauthorized,
    /// 403 without a sentinel: static "no access" panel.
    Forbidden,
    LockedAfterSignature,
    AssignmentNotConfirmed,
    NotFound,
    /// Everything else: message shown verbatim near the control.
    Other,
}

/// A classified upstream failure, ready to become local UI state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub status: u16,
    pub message: String,
}

impl Failure {
    pub fn is_lock(&self) -> bool {
        self.kind == FailureKind::LockedAfterSignature
    }
}

/// Pull a human-readable message out of an error body.
///
/// Accepts `message` as a string or an array of strings (joined with
/// `"; "`), then falls back to `error`.
pub fn extract_message(body: &Value) -> Option<String> {
    let from_field = |key: &str| -> Option<String> {
        match body.get(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Array(parts) => {
                let joined = parts
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join("; ");
                (!joined.is_empty()).then_some(joined)
            }
            _ => None,
        }
    };
    from_field("message").or_else(|| from_field("error"))
}

fn mentions(body: &Value, sentinel: &str) -> bool {
    ["message", "error", "code"].iter().any(|key| match body.get(*key) {
        Some(Value::String(s)) => s.contains(sentinel),
        Some(Value::Array(parts)) => parts
            .iter()
            .filter_map(Value::as_str)
            .any(|s| s.contains(sentinel)),
        _ => false,
    }) || body.as_str().is_some_and(|s| s.contains(sentinel))
}

/// Classify an upstream error response.
pub fn classify(status: u16, body: &Value) -> Failure {
    let upstream_message = extract_message(body);

    let (kind, message) = if mentions(body, LOCKED_AFTER_SIGNATURE) {
        (FailureKind::LockedAfterSignature, LOCKED_MESSAGE.to_string())
    } else if mentions(body, ASSIGNMENT_NOT_CONFIRMED) {
        (
            FailureKind::AssignmentNotConfirmed,
            CONFIRM_FIRST_MESSAGE.to_string(),
        )
    } else {
        match status {
            401 => (
                FailureKind::Unauthorized,
                SESSION_EXPIRED_MESSAGE.to_string(),
            ),
            403 => (FailureKind::Forbidden, NO_ACCESS_MESSAGE.to_string()),
            404 => (
                FailureKind::NotFound,
                upstream_message.unwrap_or_else(|| "Nicht gefunden.".to_string()),
            ),
            _ => (
                FailureKind::Other,
                upstream_message
                    .unwrap_or_else(|| format!("Anfrage fehlgeschlagen (HTTP {status}).")),
            ),
        }
    };

    Failure {
        kind,
        status,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lock_sentinel_in_403_message_is_not_forbidden() {
        let f = classify(403, &json!({ "message": "LOCKED_AFTER_SIGNATURE" }));
        assert_eq!(f.kind, FailureKind::LockedAfterSignature);
        assert!(f.is_lock());
        assert_eq!(f.message, LOCKED_MESSAGE);
    }

    #[test]
    fn lock_sentinel_found_in_code_field() {
        let f = classify(409, &json!({ "code": "LOCKED_AFTER_SIGNATURE", "message": "x" }));
        assert_eq!(f.kind, FailureKind::LockedAfterSignature);
    }

    #[test]
    fn not_confirmed_sentinel_gets_guidance_message() {
        let f = classify(400, &json!({ "message": ["ASSIGNMENT_NOT_CONFIRMED"] }));
        assert_eq!(f.kind, FailureKind::AssignmentNotConfirmed);
        assert_eq!(f.message, CONFIRM_FIRST_MESSAGE);
    }

    #[test]
    fn plain_statuses_map_to_taxonomy() {
        assert_eq!(classify(401, &json!({})).kind, FailureKind::Unauthorized);
        assert_eq!(classify(403, &json!({ "message": "nope" })).kind, FailureKind::Forbidden);
        assert_eq!(classify(404, &json!({})).kind, FailureKind::NotFound);
    }

    #[test]
    fn generic_error_keeps_upstream_message_verbatim() {
        let f = classify(400, &json!({ "message": ["km must not be negative", "date required"] }));
        assert_eq!(f.kind, FailureKind::Other);
        assert_eq!(f.message, "km must not be negative; date required");
    }

    #[test]
    fn generic_error_without_body_mentions_status() {
        let f = classify(502, &json!({}));
        assert_eq!(f.message, "Anfrage fehlgeschlagen (HTTP 502).");
    }
}
