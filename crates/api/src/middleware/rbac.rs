//! Role-based access control (RBAC) extractors.
//!
//! Roles are not trusted from the browser: each extractor resolves the
//! caller through upstream `GET /users/me` and rejects mismatches before
//! anything else is forwarded.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use carehub_core::entities::CurrentUser;
use carehub_core::error::CoreError;
use carehub_core::failure::NO_ACCESS_MESSAGE;
use carehub_core::roles::ROLE_EMPLOYEE;

use super::auth::Session;
use crate::error::AppError;
use crate::state::AppState;

async fn resolve(parts: &mut Parts, state: &AppState) -> Result<(Session, CurrentUser), AppError> {
    let session = Session::from_request_parts(parts, state).await?;
    let user = state.upstream.current_user(&session.ctx).await?;
    Ok((session, user))
}

/// Requires the `ADMIN` role. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn admin_only(admin: RequireAdmin) -> AppResult<Json<()>> {
///     // admin.user is guaranteed to be an admin here
///     Ok(Json(()))
/// }
/// ```
pub struct RequireAdmin {
    pub session: Session,
    pub user: CurrentUser,
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let (session, user) = resolve(parts, state).await?;
        if !user.is_admin() {
            tracing::warn!(user_id = %user.id, role = %user.role, "Admin route refused");
            return Err(AppError::Core(CoreError::Forbidden(
                NO_ACCESS_MESSAGE.into(),
            )));
        }
        Ok(RequireAdmin { session, user })
    }
}

/// Requires the `EMPLOYEE` role. Rejects with 403 Forbidden otherwise.
pub struct RequireEmployee {
    pub session: Session,
    pub user: CurrentUser,
}

impl FromRequestParts<AppState> for RequireEmployee {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let (session, user) = resolve(parts, state).await?;
        if !user.role.trim().eq_ignore_ascii_case(ROLE_EMPLOYEE) {
            return Err(AppError::Core(CoreError::Forbidden(
                NO_ACCESS_MESSAGE.into(),
            )));
        }
        Ok(RequireEmployee { session, user })
    }
}
