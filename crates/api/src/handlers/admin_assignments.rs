//! Handlers for admin assignment management (`/admin/assignments`).

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use carehub_core::day_lock::Viewer;
use carehub_core::entities::Assignment;
use carehub_core::entries::validate_schedule;
use carehub_core::error::CoreError;
use carehub_core::lenient;
use carehub_core::lifecycle::{state_machine, AssignmentStatus};
use carehub_upstream::api::path_segment;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use super::me_assignments::{assignment_detail, AssignmentDetail};
use super::{assignment_list, require_object, with_permissions, ForwardQuery};
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /admin/assignments`.
#[derive(Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssignmentRequest {
    #[validate(length(min = 1))]
    pub customer_id: String,
    #[validate(length(min = 1))]
    pub employee_id: String,
    pub start_at: String,
    pub end_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AssignmentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

fn assignment_path(id: &str) -> String {
    format!("/assignments/{}", path_segment(id))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/admin/assignments
pub async fn list(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Query(query): Query<ForwardQuery>,
) -> AppResult<Json<DataResponse<Vec<Value>>>> {
    let raw = state
        .upstream
        .get(&admin.session.ctx, "/assignments", &query)
        .await?;
    Ok(Json(DataResponse {
        data: assignment_list(raw),
    }))
}

/// POST /api/admin/assignments
///
/// New assignments start as PLANNED or ASSIGNED; `endAt` must follow
/// `startAt`.
pub async fn create(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Json(input): Json<CreateAssignmentRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Value>>)> {
    input.validate()?;
    validate_schedule(&input.start_at, &input.end_at)?;
    if let Some(status) = input.status {
        if !matches!(status, AssignmentStatus::Planned | AssignmentStatus::Assigned) {
            return Err(AppError::Core(CoreError::Validation(format!(
                "A new assignment cannot start as {status}"
            ))));
        }
    }

    let created = state
        .upstream
        .post(&admin.session.ctx, "/assignments", &input)
        .await?;
    tracing::info!(
        employee_id = %input.employee_id,
        customer_id = %input.customer_id,
        admin_id = %admin.user.id,
        "Assignment created",
    );
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: with_permissions(lenient::unwrap_data(created)),
        }),
    ))
}

/// GET /api/admin/assignments/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<AssignmentDetail>>> {
    let raw = state
        .upstream
        .get(&admin.session.ctx, &assignment_path(&id), &[])
        .await?;
    Ok(Json(DataResponse {
        data: assignment_detail(raw, Viewer::Admin, &state.config.calendar),
    }))
}

/// PATCH /api/admin/assignments/{id}
///
/// A `status` change must be a valid lifecycle edge; a schedule change must
/// keep `endAt` after `startAt`. Other fields pass through.
pub async fn update(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<String>,
    Json(input): Json<Value>,
) -> AppResult<Json<DataResponse<Value>>> {
    require_object(&input)?;
    let ctx = &admin.session.ctx;
    let path = assignment_path(&id);

    let wants_status = input.get("status").is_some();
    let wants_schedule = input.get("startAt").is_some() || input.get("endAt").is_some();

    if wants_status || wants_schedule {
        let current: Assignment =
            lenient::decode(lenient::unwrap_data(state.upstream.get(ctx, &path, &[]).await?));

        if wants_status {
            let to = input
                .get("status")
                .and_then(Value::as_str)
                .map(AssignmentStatus::parse)
                .unwrap_or_default();
            state_machine::validate_transition(current.status, to)
                .map_err(|e| AppError::Core(CoreError::Conflict(e)))?;
        }

        if wants_schedule {
            let field = |key: &str, fallback: &Option<String>| {
                input
                    .get(key)
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .or_else(|| fallback.clone())
                    .unwrap_or_default()
            };
            let start_at = field("startAt", &current.start_at);
            let end_at = field("endAt", &current.end_at);
            validate_schedule(&start_at, &end_at)?;
        }
    }

    let updated = state.upstream.patch(ctx, &path, &input).await?;
    tracing::info!(assignment_id = %id, admin_id = %admin.user.id, "Assignment updated");
    Ok(Json(DataResponse {
        data: with_permissions(lenient::unwrap_data(updated)),
    }))
}

/// GET /api/admin/assignments/{id}/signatures
pub async fn list_signatures(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<Vec<Value>>>> {
    let path = format!("{}/signatures", assignment_path(&id));
    let raw = state.upstream.get(&admin.session.ctx, &path, &[]).await?;
    Ok(Json(DataResponse {
        data: lenient::list_values(raw),
    }))
}
