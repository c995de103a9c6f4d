//! Handlers for the `/auth` resource (login, logout, current identity).

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use carehub_core::entities::CurrentUser;
use carehub_core::error::CoreError;
use carehub_upstream::{RequestContext, UpstreamError};
use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::Session;
use crate::response::DataResponse;
use crate::session;
use crate::state::AppState;

const INVALID_CREDENTIALS: &str = "E-Mail oder Passwort ist falsch.";

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`.
#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/auth/login
///
/// Exchange credentials for an upstream token and store it in the
/// `be_access` cookie. Returns the resolved identity.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    let body = state
        .upstream
        .login(input.email.trim(), &input.password)
        .await
        .map_err(|err| match err.status() {
            Some(400 | 401) => {
                tracing::info!(email = %input.email, "Login rejected upstream");
                AppError::Core(CoreError::Unauthorized(INVALID_CREDENTIALS.into()))
            }
            _ => AppError::Upstream(err),
        })?;

    let token = extract_token(&body).ok_or_else(|| {
        AppError::Upstream(UpstreamError::Config(
            "Login response carried no access token".into(),
        ))
    })?;
    if !session::is_cookie_safe(&token) {
        return Err(AppError::InternalError(
            "Upstream token cannot be stored in a cookie".into(),
        ));
    }

    let user = state
        .upstream
        .current_user(&RequestContext::new(token.clone()))
        .await?;
    tracing::info!(user_id = %user.id, role = %user.role, "User logged in");

    let cookie = session::session_cookie(&token, state.config.session_cookie_secure);
    Ok((
        StatusCode::OK,
        [(SET_COOKIE, cookie)],
        Json(DataResponse { data: user }),
    ))
}

/// POST /api/auth/logout
///
/// Clears the session cookie. Works without a valid session.
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [(
            SET_COOKIE,
            session::clear_cookie(state.config.session_cookie_secure),
        )],
    )
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Json<DataResponse<CurrentUser>>> {
    let user = state.upstream.current_user(&session.ctx).await?;
    Ok(Json(DataResponse { data: user }))
}

/// `accessToken` or `access_token`, at the top level or under `data`.
fn extract_token(body: &Value) -> Option<String> {
    let find = |v: &Value| {
        ["accessToken", "access_token"]
            .iter()
            .find_map(|key| v.get(*key).and_then(Value::as_str))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    };
    find(body).or_else(|| body.get("data").and_then(find))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn token_field_variants() {
        assert_eq!(
            extract_token(&json!({ "accessToken": "a" })).as_deref(),
            Some("a")
        );
        assert_eq!(
            extract_token(&json!({ "access_token": "b" })).as_deref(),
            Some("b")
        );
        assert_eq!(
            extract_token(&json!({ "data": { "accessToken": "c" } })).as_deref(),
            Some("c")
        );
        assert_eq!(extract_token(&json!({ "accessToken": "" })), None);
        assert_eq!(extract_token(&json!({})), None);
    }
}
