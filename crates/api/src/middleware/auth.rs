//! Session extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use carehub_core::error::CoreError;
use carehub_core::failure::SESSION_EXPIRED_MESSAGE;
use carehub_upstream::RequestContext;

use crate::error::AppError;
use crate::session;
use crate::state::AppState;

/// Header set by `SetRequestIdLayer` and forwarded upstream.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// The caller's session, as an explicit upstream [`RequestContext`].
///
/// No role check happens here; the upstream API decides what the token may
/// do. Use [`RequireAdmin`](super::rbac::RequireAdmin) for admin routes.
///
/// ```ignore
/// async fn my_handler(session: Session) -> AppResult<Json<()>> {
///     let me = state.upstream.current_user(&session.ctx).await?;
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Session {
    pub ctx: RequestContext,
}

impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session::token_from_headers(&parts.headers).ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(SESSION_EXPIRED_MESSAGE.into()))
        })?;

        let mut ctx = RequestContext::new(token);
        if let Some(request_id) = parts
            .headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            ctx = ctx.with_request_id(request_id);
        }

        Ok(Session { ctx })
    }
}
