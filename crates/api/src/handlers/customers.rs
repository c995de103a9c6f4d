//! Handlers for customer master data and emergency contacts
//! (`/admin/customers`). Bodies pass through to the upstream API.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use carehub_core::error::CoreError;
use carehub_core::lenient;
use carehub_upstream::api::path_segment;
use serde_json::Value;

use super::{require_object, ForwardQuery};
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

fn customer_path(id: &str) -> String {
    format!("/admin/customers/{}", path_segment(id))
}

fn contacts_path(customer_id: &str) -> String {
    format!("{}/emergency-contacts", customer_path(customer_id))
}

fn contact_path(customer_id: &str, contact_id: &str) -> String {
    format!("{}/{}", contacts_path(customer_id), path_segment(contact_id))
}

/// `name` must be present and non-blank on create.
fn require_name(body: &Value) -> Result<(), AppError> {
    require_object(body)?;
    let has_name = body
        .get("name")
        .and_then(Value::as_str)
        .is_some_and(|n| !n.trim().is_empty());
    if has_name {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::Validation("name is required".into())))
    }
}

fn data(value: Value) -> Json<DataResponse<Value>> {
    Json(DataResponse {
        data: lenient::unwrap_data(value),
    })
}

// ---------------------------------------------------------------------------
// Customers
// ---------------------------------------------------------------------------

/// GET /api/admin/customers
pub async fn list(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Query(query): Query<ForwardQuery>,
) -> AppResult<Json<DataResponse<Vec<Value>>>> {
    let raw = state
        .upstream
        .get(&admin.session.ctx, "/customers", &query)
        .await?;
    Ok(Json(DataResponse {
        data: lenient::list_values(raw),
    }))
}

/// POST /api/admin/customers
pub async fn create(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Json(input): Json<Value>,
) -> AppResult<(StatusCode, Json<DataResponse<Value>>)> {
    require_name(&input)?;
    let created = state
        .upstream
        .post(&admin.session.ctx, "/customers", &input)
        .await?;
    tracing::info!(admin_id = %admin.user.id, "Customer created");
    Ok((StatusCode::CREATED, data(created)))
}

/// PATCH /api/admin/customers/{id}
pub async fn update(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<String>,
    Json(input): Json<Value>,
) -> AppResult<Json<DataResponse<Value>>> {
    require_object(&input)?;
    let updated = state
        .upstream
        .patch(&admin.session.ctx, &customer_path(&id), &input)
        .await?;
    tracing::info!(customer_id = %id, "Customer updated");
    Ok(data(updated))
}

/// PATCH /api/admin/customers/{id}/deactivate
pub async fn deactivate(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<Value>>> {
    let path = format!("{}/deactivate", customer_path(&id));
    let updated = state.upstream.patch_empty(&admin.session.ctx, &path).await?;
    tracing::info!(customer_id = %id, "Customer deactivated");
    Ok(data(updated))
}

/// PATCH /api/admin/customers/{id}/reactivate
pub async fn reactivate(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<Value>>> {
    let path = format!("{}/reactivate", customer_path(&id));
    let updated = state.upstream.patch_empty(&admin.session.ctx, &path).await?;
    tracing::info!(customer_id = %id, "Customer reactivated");
    Ok(data(updated))
}

// ---------------------------------------------------------------------------
// Emergency contacts
// ---------------------------------------------------------------------------

/// GET /api/admin/customers/{id}/emergency-contacts
pub async fn list_contacts(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<Vec<Value>>>> {
    let raw = state
        .upstream
        .get(&admin.session.ctx, &contacts_path(&id), &[])
        .await?;
    Ok(Json(DataResponse {
        data: lenient::list_values(raw),
    }))
}

/// POST /api/admin/customers/{id}/emergency-contacts
pub async fn create_contact(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<String>,
    Json(input): Json<Value>,
) -> AppResult<(StatusCode, Json<DataResponse<Value>>)> {
    require_name(&input)?;
    let created = state
        .upstream
        .post(&admin.session.ctx, &contacts_path(&id), &input)
        .await?;
    tracing::info!(customer_id = %id, "Emergency contact created");
    Ok((StatusCode::CREATED, data(created)))
}

/// PATCH /api/admin/customers/{id}/emergency-contacts/{contact_id}
pub async fn update_contact(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path((id, contact_id)): Path<(String, String)>,
    Json(input): Json<Value>,
) -> AppResult<Json<DataResponse<Value>>> {
    require_object(&input)?;
    let updated = state
        .upstream
        .patch(&admin.session.ctx, &contact_path(&id, &contact_id), &input)
        .await?;
    tracing::info!(customer_id = %id, contact_id = %contact_id, "Emergency contact updated");
    Ok(data(updated))
}

/// DELETE /api/admin/customers/{id}/emergency-contacts/{contact_id}
pub async fn delete_contact(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path((id, contact_id)): Path<(String, String)>,
) -> AppResult<StatusCode> {
    state
        .upstream
        .delete(&admin.session.ctx, &contact_path(&id, &contact_id), &[])
        .await?;
    tracing::info!(customer_id = %id, contact_id = %contact_id, "Emergency contact deleted");
    Ok(StatusCode::NO_CONTENT)
}
