//! Async client seams for the screen models.
//!
//! [`UpstreamApi`] implements both traits; tests substitute in-memory fakes
//! with controlled completion order.

use async_trait::async_trait;
use carehub_core::entities::{Assignment, DayBundle};
use carehub_core::entries::{KmEntryInput, TimeEntryInput};
use carehub_core::ledger::{KmAdjustmentDraft, TimeAdjustmentDraft};
use carehub_core::lenient;
use carehub_core::lifecycle::AckAction;
use carehub_core::signature::SignatureSubmission;
use chrono::NaiveDate;
use serde_json::{json, Value};

use crate::api::{path_segment, UpstreamApi};
use crate::context::RequestContext;
use crate::error::UpstreamError;

/// Calls made by the employee assignment screen.
#[async_trait]
pub trait EmployeeApi: Send + Sync {
    async fn load_assignment(
        &self,
        ctx: &RequestContext,
        id: &str,
    ) -> Result<Assignment, UpstreamError>;

    async fn acknowledge(
        &self,
        ctx: &RequestContext,
        id: &str,
        action: AckAction,
        reason: Option<&str>,
    ) -> Result<(), UpstreamError>;

    async fn mark_done(&self, ctx: &RequestContext, id: &str) -> Result<(), UpstreamError>;

    async fn submit_signature(
        &self,
        ctx: &RequestContext,
        id: &str,
        submission: &SignatureSubmission,
    ) -> Result<(), UpstreamError>;

    async fn save_time_entry(
        &self,
        ctx: &RequestContext,
        entry: &TimeEntryInput,
    ) -> Result<(), UpstreamError>;

    async fn save_km_entry(
        &self,
        ctx: &RequestContext,
        entry: &KmEntryInput,
    ) -> Result<(), UpstreamError>;
}

/// Calls made by the admin corrections screen.
#[async_trait]
pub trait CorrectionsApi: Send + Sync {
    async fn load_day(
        &self,
        ctx: &RequestContext,
        employee_id: &str,
        date: NaiveDate,
    ) -> Result<DayBundle, UpstreamError>;

    async fn create_time_adjustment(
        &self,
        ctx: &RequestContext,
        draft: &TimeAdjustmentDraft,
    ) -> Result<(), UpstreamError>;

    async fn create_km_adjustment(
        &self,
        ctx: &RequestContext,
        draft: &KmAdjustmentDraft,
    ) -> Result<(), UpstreamError>;
}

/// Query pairs for `GET /admin/corrections/day`.
pub fn day_query(employee_id: &str, date: NaiveDate) -> Vec<(String, String)> {
    vec![
        ("employeeId".to_string(), employee_id.to_string()),
        ("date".to_string(), date.format("%Y-%m-%d").to_string()),
    ]
}

fn decode_or_default<T: serde::de::DeserializeOwned + Default>(value: Value) -> T {
    lenient::decode(lenient::unwrap_data(value))
}

#[async_trait]
impl EmployeeApi for UpstreamApi {
    async fn load_assignment(
        &self,
        ctx: &RequestContext,
        id: &str,
    ) -> Result<Assignment, UpstreamError> {
        let path = format!("/me/assignments/{}", path_segment(id));
        Ok(decode_or_default(self.get(ctx, &path, &[]).await?))
    }

    async fn acknowledge(
        &self,
        ctx: &RequestContext,
        id: &str,
        action: AckAction,
        reason: Option<&str>,
    ) -> Result<(), UpstreamError> {
        let path = format!("/me/assignments/{}/ack", path_segment(id));
        let mut body = json!({ "action": action });
        if let Some(reason) = reason.map(str::trim).filter(|r| !r.is_empty()) {
            body["reason"] = Value::String(reason.to_string());
        }
        self.post(ctx, &path, &body).await.map(drop)
    }

    async fn mark_done(&self, ctx: &RequestContext, id: &str) -> Result<(), UpstreamError> {
        let path = format!("/me/assignments/{}/done", path_segment(id));
        self.post(ctx, &path, &json!({})).await.map(drop)
    }

    async fn submit_signature(
        &self,
        ctx: &RequestContext,
        id: &str,
        submission: &SignatureSubmission,
    ) -> Result<(), UpstreamError> {
        let path = format!("/me/assignments/{}/signatures", path_segment(id));
        self.post(ctx, &path, submission).await.map(drop)
    }

    async fn save_time_entry(
        &self,
        ctx: &RequestContext,
        entry: &TimeEntryInput,
    ) -> Result<(), UpstreamError> {
        self.post(ctx, "/me/time-entries", entry).await.map(drop)
    }

    async fn save_km_entry(
        &self,
        ctx: &RequestContext,
        entry: &KmEntryInput,
    ) -> Result<(), UpstreamError> {
        self.post(ctx, "/me/km-entries", entry).await.map(drop)
    }
}

#[async_trait]
impl CorrectionsApi for UpstreamApi {
    async fn load_day(
        &self,
        ctx: &RequestContext,
        employee_id: &str,
        date: NaiveDate,
    ) -> Result<DayBundle, UpstreamError> {
        let query = day_query(employee_id, date);
        Ok(decode_or_default(
            self.get(ctx, "/admin/corrections/day", &query).await?,
        ))
    }

    async fn create_time_adjustment(
        &self,
        ctx: &RequestContext,
        draft: &TimeAdjustmentDraft,
    ) -> Result<(), UpstreamError> {
        self.post(ctx, "/admin/time-adjustments", draft)
            .await
            .map(drop)
    }

    async fn create_km_adjustment(
        &self,
        ctx: &RequestContext,
        draft: &KmAdjustmentDraft,
    ) -> Result<(), UpstreamError> {
        self.post(ctx, "/admin/km-adjustments", draft)
            .await
            .map(drop)
    }
}
