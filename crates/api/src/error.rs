use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use carehub_core::error::CoreError;
use carehub_core::failure::{FailureKind, NO_ACCESS_MESSAGE};
use carehub_core::lifecycle::AssignmentStatus;
use carehub_core::signature::SignatureError;
use carehub_upstream::UpstreamError;
use serde_json::json;

use crate::session;

/// Where the browser goes after a 401.
pub const LOGIN_REDIRECT: &str = "/login";

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors, [`UpstreamError`] for failures of
/// the proxied API, and adds HTTP-specific variants. Implements
/// [`IntoResponse`] to produce consistent `{ "error", "code" }` bodies.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `carehub_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The upstream API failed or rejected the call.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// A signature could not be accepted.
    #[error(transparent)]
    Signature(#[from] SignatureError),

    /// Request body failed `validator` rules.
    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

const INTERNAL_MESSAGE: &str = "An internal error occurred";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
                CoreError::LockedAfterSignature(msg) => {
                    (StatusCode::FORBIDDEN, "LOCKED_AFTER_SIGNATURE", msg.clone())
                }
                CoreError::AssignmentNotConfirmed(msg) => {
                    (StatusCode::CONFLICT, "ASSIGNMENT_NOT_CONFIRMED", msg.clone())
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        INTERNAL_MESSAGE.to_string(),
                    )
                }
            },

            // --- Upstream errors ---
            AppError::Upstream(err) => classify_upstream_error(err),

            // --- Signature errors ---
            AppError::Signature(err) => match err {
                SignatureError::Empty | SignatureError::InvalidDataUri(_) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", err.to_string())
                }
                SignatureError::NotAllowed(AssignmentStatus::Assigned) => (
                    StatusCode::CONFLICT,
                    "ASSIGNMENT_NOT_CONFIRMED",
                    carehub_core::lifecycle::CONFIRM_FIRST_MESSAGE.to_string(),
                ),
                SignatureError::NotAllowed(_) => {
                    (StatusCode::CONFLICT, "CONFLICT", err.to_string())
                }
                SignatureError::InvalidSurface(_) | SignatureError::Encode(_) => {
                    tracing::error!(error = %err, "Signature rendering error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        INTERNAL_MESSAGE.to_string(),
                    )
                }
            },

            // --- HTTP-specific errors ---
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                errors.to_string(),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    INTERNAL_MESSAGE.to_string(),
                )
            }
        };

        if status == StatusCode::UNAUTHORIZED {
            let body = json!({
                "error": message,
                "code": code,
                "redirect": LOGIN_REDIRECT,
            });
            return (
                status,
                [(SET_COOKIE, session::clear_cookie(false))],
                axum::Json(body),
            )
                .into_response();
        }

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Map an upstream failure onto the browser-facing status and code.
///
/// - Sentinels keep the upstream status and get their own code.
/// - 401/403/404 map one-to-one.
/// - Other 4xx keep their status and message.
/// - 5xx becomes 502; unreachable becomes 502 `UPSTREAM_UNAVAILABLE`.
fn classify_upstream_error(err: &UpstreamError) -> (StatusCode, &'static str, String) {
    match err {
        UpstreamError::Request(_) => {
            let failure = err.failure();
            (StatusCode::BAD_GATEWAY, "UPSTREAM_UNAVAILABLE", failure.message)
        }
        UpstreamError::Config(msg) => {
            tracing::error!(error = %msg, "Upstream configuration error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                INTERNAL_MESSAGE.to_string(),
            )
        }
        UpstreamError::Api { status, .. } => {
            let failure = err.failure();
            let upstream_status =
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY);
            match failure.kind {
                FailureKind::Unauthorized => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", failure.message)
                }
                FailureKind::Forbidden => (
                    StatusCode::FORBIDDEN,
                    "FORBIDDEN",
                    NO_ACCESS_MESSAGE.to_string(),
                ),
                FailureKind::LockedAfterSignature => {
                    (client_status(upstream_status), "LOCKED_AFTER_SIGNATURE", failure.message)
                }
                FailureKind::AssignmentNotConfirmed => (
                    client_status(upstream_status),
                    "ASSIGNMENT_NOT_CONFIRMED",
                    failure.message,
                ),
                FailureKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND", failure.message),
                FailureKind::Other => match upstream_status {
                    StatusCode::BAD_REQUEST => {
                        (StatusCode::BAD_REQUEST, "BAD_REQUEST", failure.message)
                    }
                    StatusCode::UNPROCESSABLE_ENTITY => (
                        StatusCode::UNPROCESSABLE_ENTITY,
                        "VALIDATION_ERROR",
                        failure.message,
                    ),
                    StatusCode::CONFLICT => (StatusCode::CONFLICT, "CONFLICT", failure.message),
                    s if s.is_client_error() => (s, "UPSTREAM_ERROR", failure.message),
                    _ => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", failure.message),
                },
            }
        }
    }
}

/// Sentinel rejections are client errors even if upstream reported 5xx.
fn client_status(status: StatusCode) -> StatusCode {
    if status.is_client_error() {
        status
    } else {
        StatusCode::CONFLICT
    }
}
