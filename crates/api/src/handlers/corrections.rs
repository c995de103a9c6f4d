//! Handlers for the admin correction ledger.
//!
//! Adjustments never touch employee entries: they are appended upstream
//! and the whole day is re-fetched afterwards.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use carehub_core::calendar;
use carehub_core::day_lock::{DayKey, DayLockState, DayLockView};
use carehub_core::entities::DayBundle;
use carehub_core::error::CoreError;
use carehub_core::ledger::{self, DaySummary, KmAdjustmentDraft, TimeAdjustmentDraft};
use carehub_core::lenient;
use carehub_upstream::traits::CorrectionsApi;
use carehub_upstream::RequestContext;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Query of `GET /admin/corrections/day`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayQuery {
    pub employee_id: Option<String>,
    pub date: Option<String>,
}

/// Shared body of both adjustment routes.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdjustmentRequest {
    pub assignment_id: Option<String>,
    pub user_id: String,
    pub date: String,
    #[serde(deserialize_with = "lenient::opt_number")]
    pub delta_minutes: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_number")]
    pub delta_km: Option<f64>,
    pub reason: String,
}

/// One employee day: the five collections, derived totals and lock state.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayCorrections {
    #[serde(flatten)]
    pub bundle: DayBundle,
    pub summary: DaySummary,
    pub day_lock: DayLockView,
}

fn parse_day_query(query: &DayQuery) -> Result<(String, NaiveDate), CoreError> {
    let employee_id = query
        .employee_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| CoreError::Validation("employeeId is required".into()))?;
    let raw_date = query.date.as_deref().unwrap_or_default();
    let date = calendar::parse_date(raw_date)
        .ok_or_else(|| CoreError::Validation(format!("Invalid date '{raw_date}', expected YYYY-MM-DD")))?;
    Ok((employee_id.to_string(), date))
}

/// Load one day and derive its summary and lock view.
pub async fn load_day_corrections(
    api: &impl CorrectionsApi,
    ctx: &RequestContext,
    employee_id: &str,
    date: NaiveDate,
) -> AppResult<DayCorrections> {
    let mut bundle = api.load_day(ctx, employee_id, date).await?;
    bundle.audit_logs = ledger::audit_trail(&bundle.audit_logs);

    let summary = ledger::summarize(&bundle);
    let lock = DayLockState::from_bundle(&bundle);
    let key = DayKey::new(employee_id, date);

    Ok(DayCorrections {
        summary,
        day_lock: lock.view(Some(&key)),
        bundle,
    })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/admin/corrections/day?employeeId=&date=
pub async fn get_day(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Query(query): Query<DayQuery>,
) -> AppResult<Json<DataResponse<DayCorrections>>> {
    let (employee_id, date) = parse_day_query(&query)?;
    let day =
        load_day_corrections(state.upstream.as_ref(), &admin.session.ctx, &employee_id, date)
            .await?;
    Ok(Json(DataResponse { data: day }))
}

/// POST /api/admin/time-adjustments
///
/// Answers with the re-fetched day.
pub async fn create_time_adjustment(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Json(input): Json<AdjustmentRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<DayCorrections>>)> {
    let draft = TimeAdjustmentDraft::new(
        input.assignment_id,
        &input.user_id,
        &input.date,
        input.delta_minutes,
        &input.reason,
    )?;
    let ctx = &admin.session.ctx;
    state.upstream.create_time_adjustment(ctx, &draft).await?;
    tracing::info!(
        user_id = %draft.user_id,
        date = %draft.date,
        delta_minutes = draft.delta_minutes,
        admin_id = %admin.user.id,
        "Time adjustment created",
    );

    let day = load_day_corrections(state.upstream.as_ref(), ctx, &draft.user_id, draft.date).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: day })))
}

/// POST /api/admin/km-adjustments
///
/// Answers with the re-fetched day.
pub async fn create_km_adjustment(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Json(input): Json<AdjustmentRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<DayCorrections>>)> {
    let draft = KmAdjustmentDraft::new(
        input.assignment_id,
        &input.user_id,
        &input.date,
        input.delta_km,
        &input.reason,
    )?;
    let ctx = &admin.session.ctx;
    state.upstream.create_km_adjustment(ctx, &draft).await?;
    tracing::info!(
        user_id = %draft.user_id,
        date = %draft.date,
        delta_km = draft.delta_km,
        admin_id = %admin.user.id,
        "Km adjustment created",
    );

    let day = load_day_corrections(state.upstream.as_ref(), ctx, &draft.user_id, draft.date).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: day })))
}
