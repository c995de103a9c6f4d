//! Handlers for employee account management (`/admin/users`).

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use carehub_core::error::CoreError;
use carehub_core::lenient;
use carehub_core::roles::{ROLE_ADMIN, ROLE_EMPLOYEE};
use carehub_upstream::api::path_segment;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use super::ForwardQuery;
use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /admin/users`.
#[derive(Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 8))]
    pub password: String,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    ROLE_EMPLOYEE.to_string()
}

/// Request body for `POST /admin/users/{id}/password`.
#[derive(Deserialize, Serialize, Validate)]
pub struct PasswordResetRequest {
    #[validate(length(min = 8))]
    pub password: String,
}

fn normalize_role(role: &str) -> Result<String, CoreError> {
    let role = role.trim().to_ascii_uppercase();
    if role == ROLE_ADMIN || role == ROLE_EMPLOYEE {
        Ok(role)
    } else {
        Err(CoreError::Validation(format!("Unknown role '{role}'")))
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/admin/users
pub async fn list(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Query(query): Query<ForwardQuery>,
) -> AppResult<Json<DataResponse<Vec<Value>>>> {
    let raw = state
        .upstream
        .get(&admin.session.ctx, "/admin/users", &query)
        .await?;
    Ok(Json(DataResponse {
        data: lenient::list_values(raw),
    }))
}

/// POST /api/admin/users
pub async fn create(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Json(mut input): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Value>>)> {
    input.validate()?;
    input.role = normalize_role(&input.role)?;

    let created = state
        .upstream
        .post(&admin.session.ctx, "/admin/users", &input)
        .await?;
    tracing::info!(email = %input.email, role = %input.role, admin_id = %admin.user.id, "User created");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: lenient::unwrap_data(created),
        }),
    ))
}

/// POST /api/admin/users/{id}/password
pub async fn reset_password(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<String>,
    Json(input): Json<PasswordResetRequest>,
) -> AppResult<StatusCode> {
    input.validate()?;
    let path = format!("/admin/users/{}/password", path_segment(&id));
    state
        .upstream
        .post(&admin.session.ctx, &path, &input)
        .await?;
    tracing::info!(user_id = %id, admin_id = %admin.user.id, "Password reset");
    Ok(StatusCode::NO_CONTENT)
}
