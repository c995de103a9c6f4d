//! Handlers for employee time and kilometer entries.
//!
//! Writes tied to an assignment are checked against its edit mode first, so
//! a signed or unconfirmed day is refused without an upstream write.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use carehub_core::calendar::DayCalendar;
use carehub_core::day_lock::{edit_mode, DayLockState, Viewer};
use carehub_core::entries::{KmEntryInput, TimeEntryInput};
use carehub_core::error::CoreError;
use carehub_core::lenient;
use carehub_upstream::traits::EmployeeApi;
use carehub_upstream::RequestContext;
use serde::Deserialize;
use serde_json::Value;

use super::ForwardQuery;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::Session;
use crate::middleware::rbac::RequireEmployee;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /me/time-entries`: either `date` + `minutes` or
/// `startAt` + `endAt`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateTimeEntryRequest {
    pub assignment_id: String,
    pub date: Option<String>,
    #[serde(deserialize_with = "lenient::opt_number")]
    pub minutes: Option<f64>,
    pub start_at: Option<String>,
    pub end_at: Option<String>,
    pub notes: Option<String>,
}

impl CreateTimeEntryRequest {
    fn into_input(self, calendar: &DayCalendar) -> Result<TimeEntryInput, CoreError> {
        match (self.minutes, self.start_at, self.end_at) {
            (Some(minutes), _, _) => {
                let date = self
                    .date
                    .ok_or_else(|| CoreError::Validation("date is required".into()))?;
                TimeEntryInput::from_minutes(
                    &self.assignment_id,
                    &date,
                    minutes.round() as i64,
                    self.notes,
                )
            }
            (None, Some(start_at), Some(end_at)) => {
                TimeEntryInput::from_span(&self.assignment_id, &start_at, &end_at, self.notes, calendar)
            }
            _ => Err(CoreError::Validation(
                "Either minutes or startAt and endAt are required".into(),
            )),
        }
    }
}

/// Request body for `POST /me/km-entries`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateKmEntryRequest {
    pub date: String,
    #[serde(deserialize_with = "lenient::opt_number")]
    pub km: Option<f64>,
    pub assignment_id: Option<String>,
}

/// Query of `DELETE /me/time-entries`.
#[derive(Debug, Deserialize)]
pub struct DeleteEntryQuery {
    pub id: Option<String>,
}

async fn ensure_assignment_writable(
    state: &AppState,
    ctx: &RequestContext,
    assignment_id: &str,
) -> AppResult<()> {
    let assignment = state.upstream.load_assignment(ctx, assignment_id).await?;
    let lock = DayLockState::from_assignment(&assignment);
    edit_mode(Viewer::Employee, assignment.status, &lock, None)
        .ensure_writable(assignment.status)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Time entries
// ---------------------------------------------------------------------------

/// GET /api/me/time-entries
pub async fn list_time_entries(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ForwardQuery>,
) -> AppResult<Json<DataResponse<Vec<Value>>>> {
    let raw = state
        .upstream
        .get(&session.ctx, "/me/time-entries", &query)
        .await?;
    Ok(Json(DataResponse {
        data: lenient::list_values(raw),
    }))
}

/// POST /api/me/time-entries
pub async fn create_time_entry(
    State(state): State<AppState>,
    employee: RequireEmployee,
    Json(input): Json<CreateTimeEntryRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Value>>)> {
    let ctx = &employee.session.ctx;
    let entry = input.into_input(&state.config.calendar)?;
    ensure_assignment_writable(&state, ctx, &entry.assignment_id).await?;

    let created = state.upstream.post(ctx, "/me/time-entries", &entry).await?;
    tracing::info!(
        assignment_id = %entry.assignment_id,
        minutes = entry.minutes,
        "Time entry recorded",
    );
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: lenient::unwrap_data(created),
        }),
    ))
}

/// DELETE /api/me/time-entries?id=
pub async fn delete_time_entry(
    State(state): State<AppState>,
    employee: RequireEmployee,
    Query(query): Query<DeleteEntryQuery>,
) -> AppResult<StatusCode> {
    let id = query
        .id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest("Query parameter 'id' is required".into()))?;

    state
        .upstream
        .delete(
            &employee.session.ctx,
            "/me/time-entries",
            &[("id".to_string(), id.clone())],
        )
        .await?;
    tracing::info!(time_entry_id = %id, "Time entry deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Km entries
// ---------------------------------------------------------------------------

/// GET /api/me/km-entries
pub async fn list_km_entries(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ForwardQuery>,
) -> AppResult<Json<DataResponse<Vec<Value>>>> {
    let raw = state
        .upstream
        .get(&session.ctx, "/me/km-entries", &query)
        .await?;
    Ok(Json(DataResponse {
        data: lenient::list_values(raw),
    }))
}

/// POST /api/me/km-entries
pub async fn create_km_entry(
    State(state): State<AppState>,
    employee: RequireEmployee,
    Json(input): Json<CreateKmEntryRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Value>>)> {
    let ctx = &employee.session.ctx;
    let entry = KmEntryInput::new(&input.date, input.km, input.assignment_id)?;
    if let Some(assignment_id) = &entry.assignment_id {
        ensure_assignment_writable(&state, ctx, assignment_id).await?;
    }

    let created = state.upstream.post(ctx, "/me/km-entries", &entry).await?;
    tracing::info!(date = %entry.date, km = entry.km, "Km entry recorded");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: lenient::unwrap_data(created),
        }),
    ))
}

// ---------------------------------------------------------------------------
// Customers
// ---------------------------------------------------------------------------

/// GET /api/me/customers
pub async fn list_my_customers(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ForwardQuery>,
) -> AppResult<Json<DataResponse<Vec<Value>>>> {
    let raw = state
        .upstream
        .get(&session.ctx, "/me/customers", &query)
        .await?;
    Ok(Json(DataResponse {
        data: lenient::list_values(raw),
    }))
}
