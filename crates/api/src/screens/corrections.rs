//! Admin corrections screen.
//!
//! Switching employee or date issues a new ticket; a response for an
//! earlier selection is dropped even if it arrives last.

use std::sync::Arc;

use carehub_core::concurrency::{ActionGate, RequestSequence};
use carehub_core::day_lock::{DayKey, DayLockState, DayLockView};
use carehub_core::entities::DayBundle;
use carehub_core::ledger::{self, DaySummary, KmAdjustmentDraft, TimeAdjustmentDraft};
use carehub_core::types::EntityId;
use carehub_upstream::traits::CorrectionsApi;
use carehub_upstream::{RequestContext, UpstreamError};
use chrono::NaiveDate;
use tokio::sync::Mutex;

use super::{refusal_text, ActionOutcome, LoadOutcome, Notice};

const SELECT_DAY_FIRST: &str = "Bitte wählen Sie zuerst Mitarbeiter und Tag.";

#[derive(Debug, Default)]
struct View {
    selection: Option<DayKey>,
    loaded: Option<DayKey>,
    bundle: DayBundle,
    summary: Option<DaySummary>,
    lock: DayLockState,
    notice: Option<Notice>,
}

/// Working copy of one employee day for an admin.
pub struct CorrectionsScreen<C> {
    client: Arc<C>,
    ctx: RequestContext,
    loads: RequestSequence,
    view: Mutex<View>,
    time_gate: ActionGate,
    km_gate: ActionGate,
}

impl<C: CorrectionsApi> CorrectionsScreen<C> {
    pub fn new(client: Arc<C>, ctx: RequestContext) -> Self {
        Self {
            client,
            ctx,
            loads: RequestSequence::new(),
            view: Mutex::new(View::default()),
            time_gate: ActionGate::new(),
            km_gate: ActionGate::new(),
        }
    }

    // ---- snapshot ----

    /// The day whose data is currently shown.
    pub async fn loaded_day(&self) -> Option<DayKey> {
        self.view.lock().await.loaded.clone()
    }

    pub async fn bundle(&self) -> DayBundle {
        self.view.lock().await.bundle.clone()
    }

    pub async fn summary(&self) -> Option<DaySummary> {
        self.view.lock().await.summary.clone()
    }

    pub async fn lock_view(&self) -> DayLockView {
        let view = self.view.lock().await;
        view.lock.view(view.loaded.as_ref())
    }

    pub async fn notice(&self) -> Option<Notice> {
        self.view.lock().await.notice.clone()
    }

    pub fn is_time_busy(&self) -> bool {
        self.time_gate.is_busy()
    }

    pub fn is_km_busy(&self) -> bool {
        self.km_gate.is_busy()
    }

    pub fn close(&self) {
        self.loads.close();
    }

    // ---- loading ----

    /// Choose an employee day and load it.
    pub async fn select(&self, employee_id: impl Into<EntityId>, date: NaiveDate) -> LoadOutcome {
        let key = DayKey::new(employee_id, date);
        self.view.lock().await.selection = Some(key.clone());
        self.fetch(key).await
    }

    /// Reload the current selection.
    pub async fn refresh(&self) -> LoadOutcome {
        let selection = self.view.lock().await.selection.clone();
        match selection {
            Some(key) => self.fetch(key).await,
            None => LoadOutcome::Skipped,
        }
    }

    async fn fetch(&self, key: DayKey) -> LoadOutcome {
        if self.loads.is_closed() {
            return LoadOutcome::Stale;
        }
        let ticket = self.loads.issue();
        let result = tokio::select! {
            _ = self.loads.closed() => None,
            result = self
                .client
                .load_day(&self.ctx, &key.employee_id, key.date) => Some(result),
        };
        let Some(result) = result.filter(|_| self.loads.is_current(ticket)) else {
            tracing::debug!(
                ticket = ticket.value(),
                employee_id = %key.employee_id,
                date = %key.date,
                "Discarding stale day bundle",
            );
            return LoadOutcome::Stale;
        };

        let mut view = self.view.lock().await;
        match result {
            Ok(mut bundle) => {
                bundle.audit_logs = ledger::audit_trail(&bundle.audit_logs);
                if view.loaded.as_ref() == Some(&key) {
                    view.lock.observe_bundle(&bundle);
                } else {
                    view.lock = DayLockState::from_bundle(&bundle);
                }
                view.summary = Some(ledger::summarize(&bundle));
                view.bundle = bundle;
                view.loaded = Some(key);
                LoadOutcome::Applied
            }
            Err(err) => {
                let failure = err.failure();
                view.notice = Some(Notice::Failure(failure.clone()));
                LoadOutcome::Failed(failure)
            }
        }
    }

    // ---- actions ----

    /// Append a time delta for the selected day, then re-fetch everything.
    pub async fn add_time_adjustment(
        &self,
        assignment_id: Option<EntityId>,
        delta_minutes: Option<f64>,
        reason: &str,
    ) -> ActionOutcome {
        let Some(_permit) = self.time_gate.try_acquire() else {
            return ActionOutcome::Busy;
        };
        let selection = self.view.lock().await.selection.clone();
        let Some(key) = selection else {
            return self.refuse(SELECT_DAY_FIRST.to_string()).await;
        };
        let draft = match TimeAdjustmentDraft::new(
            assignment_id,
            &key.employee_id,
            &key.date.format("%Y-%m-%d").to_string(),
            delta_minutes,
            reason,
        ) {
            Ok(draft) => draft,
            Err(err) => return self.refuse(refusal_text(err)).await,
        };

        let result = self.client.create_time_adjustment(&self.ctx, &draft).await;
        self.finish(result, "Zeitkorrektur gespeichert.").await
    }

    /// Append a km delta for the selected day, then re-fetch everything.
    pub async fn add_km_adjustment(
        &self,
        assignment_id: Option<EntityId>,
        delta_km: Option<f64>,
        reason: &str,
    ) -> ActionOutcome {
        let Some(_permit) = self.km_gate.try_acquire() else {
            return ActionOutcome::Busy;
        };
        let selection = self.view.lock().await.selection.clone();
        let Some(key) = selection else {
            return self.refuse(SELECT_DAY_FIRST.to_string()).await;
        };
        let draft = match KmAdjustmentDraft::new(
            assignment_id,
            &key.employee_id,
            &key.date.format("%Y-%m-%d").to_string(),
            delta_km,
            reason,
        ) {
            Ok(draft) => draft,
            Err(err) => return self.refuse(refusal_text(err)).await,
        };

        let result = self.client.create_km_adjustment(&self.ctx, &draft).await;
        self.finish(result, "Kilometerkorrektur gespeichert.").await
    }

    // ---- private helpers ----

    async fn refuse(&self, text: String) -> ActionOutcome {
        if !self.loads.is_closed() {
            self.view.lock().await.notice = Some(Notice::Refused(text.clone()));
        }
        ActionOutcome::Refused(text)
    }

    async fn finish(&self, result: Result<(), UpstreamError>, success_text: &str) -> ActionOutcome {
        match result {
            Ok(()) => {
                if !self.loads.is_closed() {
                    self.view.lock().await.notice =
                        Some(Notice::Success(success_text.to_string()));
                    self.refresh().await;
                }
                ActionOutcome::Completed
            }
            Err(err) => {
                let failure = err.failure();
                if !self.loads.is_closed() {
                    self.view.lock().await.notice = Some(Notice::Failure(failure.clone()));
                }
                ActionOutcome::Failed(failure)
            }
        }
    }
}
