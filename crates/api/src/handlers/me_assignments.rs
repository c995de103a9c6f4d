//! Handlers for the employee's own assignments (`/me/assignments`).
//!
//! Every action re-checks the lifecycle against a fresh upstream read,
//! forwards the call, and answers with a re-fetched detail view.

use axum::extract::{Path, Query, State};
use axum::Json;
use carehub_core::calendar::DayCalendar;
use carehub_core::day_lock::{edit_mode, DayKey, DayLockState, DayLockView, EditMode, Viewer};
use carehub_core::entities::Assignment;
use carehub_core::lenient;
use carehub_core::lifecycle::{self, AckAction, EmployeeAction, Permissions};
use carehub_core::signature::{self, SignatureSubmission};
use carehub_upstream::api::path_segment;
use carehub_upstream::traits::EmployeeApi;
use carehub_upstream::RequestContext;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{assignment_list, ForwardQuery};
use crate::error::AppResult;
use crate::middleware::auth::Session;
use crate::middleware::rbac::RequireEmployee;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /me/assignments/{id}/ack`.
#[derive(Debug, Deserialize)]
pub struct AckRequest {
    pub action: AckAction,
    pub reason: Option<String>,
}

/// Request body for `POST /me/assignments/{id}/signatures`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureRequest {
    pub signature_data: String,
}

/// One assignment with everything the browser needs to render it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentDetail {
    /// Upstream payload, unknown fields included.
    pub assignment: Value,
    pub permissions: Permissions,
    pub day_lock: DayLockView,
    pub edit_mode: EditMode,
}

/// Build the detail view from a raw upstream payload.
pub fn assignment_detail(raw: Value, viewer: Viewer, calendar: &DayCalendar) -> AssignmentDetail {
    let raw = lenient::unwrap_data(raw);
    let assignment: Assignment = lenient::decode(raw.clone());
    let lock = DayLockState::from_assignment(&assignment);
    let key = DayKey::for_assignment(&assignment, calendar);

    AssignmentDetail {
        permissions: Permissions::for_status(assignment.status),
        day_lock: lock.view(key.as_ref()),
        edit_mode: edit_mode(viewer, assignment.status, &lock, key.as_ref()),
        assignment: raw,
    }
}

async fn load_detail(
    state: &AppState,
    ctx: &RequestContext,
    id: &str,
) -> AppResult<AssignmentDetail> {
    let path = format!("/me/assignments/{}", path_segment(id));
    let raw = state.upstream.get(ctx, &path, &[]).await?;
    Ok(assignment_detail(raw, Viewer::Employee, &state.config.calendar))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/me/assignments
pub async fn list(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ForwardQuery>,
) -> AppResult<Json<DataResponse<Vec<Value>>>> {
    let raw = state
        .upstream
        .get(&session.ctx, "/me/assignments", &query)
        .await?;
    Ok(Json(DataResponse {
        data: assignment_list(raw),
    }))
}

/// GET /api/me/assignments/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<AssignmentDetail>>> {
    let detail = load_detail(&state, &session.ctx, &id).await?;
    Ok(Json(DataResponse { data: detail }))
}

/// POST /api/me/assignments/{id}/ack
///
/// CONFIRM or DECLINE. The status after DECLINE is decided upstream, so the
/// response is always a fresh read.
pub async fn acknowledge(
    State(state): State<AppState>,
    employee: RequireEmployee,
    Path(id): Path<String>,
    Json(input): Json<AckRequest>,
) -> AppResult<Json<DataResponse<AssignmentDetail>>> {
    let ctx = &employee.session.ctx;
    let current = state.upstream.load_assignment(ctx, &id).await?;
    lifecycle::ensure_allowed(input.action.into(), current.status)?;

    state
        .upstream
        .acknowledge(ctx, &id, input.action, input.reason.as_deref())
        .await?;
    tracing::info!(assignment_id = %id, action = ?input.action, "Assignment acknowledged");

    let detail = load_detail(&state, ctx, &id).await?;
    Ok(Json(DataResponse { data: detail }))
}

/// POST /api/me/assignments/{id}/done
///
/// Allowed for CONFIRMED and, idempotently, for DONE.
pub async fn mark_done(
    State(state): State<AppState>,
    employee: RequireEmployee,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<AssignmentDetail>>> {
    let ctx = &employee.session.ctx;
    let current = state.upstream.load_assignment(ctx, &id).await?;
    lifecycle::ensure_allowed(EmployeeAction::MarkDone, current.status)?;

    state.upstream.mark_done(ctx, &id).await?;
    tracing::info!(assignment_id = %id, from = %current.status, "Assignment marked done");

    let detail = load_detail(&state, ctx, &id).await?;
    Ok(Json(DataResponse { data: detail }))
}

/// POST /api/me/assignments/{id}/signatures
///
/// The data URI is decoded and checked for ink before it is forwarded.
pub async fn submit_signature(
    State(state): State<AppState>,
    employee: RequireEmployee,
    Path(id): Path<String>,
    Json(input): Json<SignatureRequest>,
) -> AppResult<Json<DataResponse<AssignmentDetail>>> {
    let ctx = &employee.session.ctx;
    let validated = signature::validate_data_uri(&input.signature_data)?;

    let current = state.upstream.load_assignment(ctx, &id).await?;
    lifecycle::ensure_allowed(EmployeeAction::Sign, current.status)?;

    let submission = SignatureSubmission {
        signature_data: input.signature_data,
    };
    state.upstream.submit_signature(ctx, &id, &submission).await?;
    tracing::info!(
        assignment_id = %id,
        width = validated.width,
        height = validated.height,
        "Signature captured",
    );

    let detail = load_detail(&state, ctx, &id).await?;
    Ok(Json(DataResponse { data: detail }))
}
