//! Employee assignment screen.

use std::sync::Arc;

use carehub_core::calendar::DayCalendar;
use carehub_core::concurrency::{ActionGate, RequestSequence};
use carehub_core::day_lock::{edit_mode, DayKey, DayLockState, DayLockView, EditMode, Viewer, WriteKind};
use carehub_core::entities::Assignment;
use carehub_core::entries::{KmEntryInput, TimeEntryInput};
use carehub_core::lifecycle::{self, AckAction, AssignmentStatus, EmployeeAction, Permissions};
use carehub_core::signature::SignaturePad;
use carehub_core::types::EntityId;
use carehub_upstream::traits::EmployeeApi;
use carehub_upstream::{RequestContext, UpstreamError};
use tokio::sync::Mutex;

use super::{refusal_text, ActionOutcome, LoadOutcome, Notice};

/// Controls that own an in-flight flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenAction {
    Acknowledge,
    MarkDone,
    Sign,
    SaveTime,
    SaveKm,
}

#[derive(Debug, Default)]
struct View {
    assignment: Option<Assignment>,
    lock: DayLockState,
    notice: Option<Notice>,
}

/// Working copy of one assignment as seen by its employee.
pub struct AssignmentScreen<C> {
    client: Arc<C>,
    ctx: RequestContext,
    assignment_id: EntityId,
    calendar: DayCalendar,
    loads: RequestSequence,
    view: Mutex<View>,
    ack_gate: ActionGate,
    done_gate: ActionGate,
    sign_gate: ActionGate,
    time_gate: ActionGate,
    km_gate: ActionGate,
}

impl<C: EmployeeApi> AssignmentScreen<C> {
    pub fn new(
        client: Arc<C>,
        ctx: RequestContext,
        assignment_id: impl Into<EntityId>,
        calendar: DayCalendar,
    ) -> Self {
        Self {
            client,
            ctx,
            assignment_id: assignment_id.into(),
            calendar,
            loads: RequestSequence::new(),
            view: Mutex::new(View::default()),
            ack_gate: ActionGate::new(),
            done_gate: ActionGate::new(),
            sign_gate: ActionGate::new(),
            time_gate: ActionGate::new(),
            km_gate: ActionGate::new(),
        }
    }

    // ---- snapshot ----

    pub async fn assignment(&self) -> Option<Assignment> {
        self.view.lock().await.assignment.clone()
    }

    /// UNKNOWN until the first successful load.
    pub async fn status(&self) -> AssignmentStatus {
        self.view
            .lock()
            .await
            .assignment
            .as_ref()
            .map(|a| a.status)
            .unwrap_or_default()
    }

    pub async fn permissions(&self) -> Permissions {
        Permissions::for_status(self.status().await)
    }

    pub async fn lock_view(&self) -> DayLockView {
        let view = self.view.lock().await;
        view.lock.view(self.day_key(&view).as_ref())
    }

    pub async fn edit_mode(&self) -> EditMode {
        let view = self.view.lock().await;
        Self::mode_of(&view, self.day_key(&view).as_ref())
    }

    pub async fn notice(&self) -> Option<Notice> {
        self.view.lock().await.notice.clone()
    }

    pub fn is_busy(&self, action: ScreenAction) -> bool {
        self.gate(action).is_busy()
    }

    /// The screen went away; late results are dropped from now on.
    pub fn close(&self) {
        self.loads.close();
    }

    // ---- loading ----

    pub async fn load(&self) -> LoadOutcome {
        if self.loads.is_closed() {
            return LoadOutcome::Stale;
        }
        let ticket = self.loads.issue();
        let result = tokio::select! {
            _ = self.loads.closed() => None,
            result = self
                .client
                .load_assignment(&self.ctx, &self.assignment_id) => Some(result),
        };
        let Some(result) = result.filter(|_| self.loads.is_current(ticket)) else {
            tracing::debug!(ticket = ticket.value(), "Discarding stale assignment load");
            return LoadOutcome::Stale;
        };

        let mut view = self.view.lock().await;
        match result {
            Ok(assignment) => {
                view.lock.observe_assignment(&assignment);
                view.assignment = Some(assignment);
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

    pub async fn acknowledge(&self, action: AckAction, reason: Option<&str>) -> ActionOutcome {
        let Some(_permit) = self.ack_gate.try_acquire() else {
            return ActionOutcome::Busy;
        };
        if let Err(err) = lifecycle::ensure_allowed(action.into(), self.status().await) {
            return self.refuse(refusal_text(err)).await;
        }

        let result = self
            .client
            .acknowledge(&self.ctx, &self.assignment_id, action, reason)
            .await;
        let text = match action {
            AckAction::Confirm => "Termin bestätigt.",
            AckAction::Decline => "Termin abgelehnt.",
        };
        self.finish(result, None, text).await
    }

    /// Repeating it on a DONE assignment only re-fetches.
    pub async fn mark_done(&self) -> ActionOutcome {
        let Some(_permit) = self.done_gate.try_acquire() else {
            return ActionOutcome::Busy;
        };
        if let Err(err) = lifecycle::ensure_allowed(EmployeeAction::MarkDone, self.status().await) {
            return self.refuse(refusal_text(err)).await;
        }

        let result = self.client.mark_done(&self.ctx, &self.assignment_id).await;
        self.finish(result, None, "Termin abgeschlossen.").await
    }

    /// A blank pad is refused without a network call.
    pub async fn sign(&self, pad: &SignaturePad) -> ActionOutcome {
        let Some(_permit) = self.sign_gate.try_acquire() else {
            return ActionOutcome::Busy;
        };
        let submission = match pad.submission(self.status().await) {
            Ok(submission) => submission,
            Err(err) => return self.refuse(err.to_string()).await,
        };

        let result = self
            .client
            .submit_signature(&self.ctx, &self.assignment_id, &submission)
            .await;
        if result.is_ok() && !self.loads.is_closed() {
            self.view.lock().await.lock.record_signature_captured();
        }
        self.finish(result, None, "Unterschrift gespeichert.").await
    }

    pub async fn save_time_entry(&self, entry: &TimeEntryInput) -> ActionOutcome {
        let Some(_permit) = self.time_gate.try_acquire() else {
            return ActionOutcome::Busy;
        };
        if let Err(text) = self.ensure_writable().await {
            return self.refuse(text).await;
        }

        let result = self.client.save_time_entry(&self.ctx, entry).await;
        self.finish(result, Some(WriteKind::Time), "Zeit gespeichert.")
            .await
    }

    pub async fn save_km_entry(&self, entry: &KmEntryInput) -> ActionOutcome {
        let Some(_permit) = self.km_gate.try_acquire() else {
            return ActionOutcome::Busy;
        };
        if let Err(text) = self.ensure_writable().await {
            return self.refuse(text).await;
        }

        let result = self.client.save_km_entry(&self.ctx, entry).await;
        self.finish(result, Some(WriteKind::Km), "Kilometer gespeichert.")
            .await
    }

    // ---- private helpers ----

    fn gate(&self, action: ScreenAction) -> &ActionGate {
        match action {
            ScreenAction::Acknowledge => &self.ack_gate,
            ScreenAction::MarkDone => &self.done_gate,
            ScreenAction::Sign => &self.sign_gate,
            ScreenAction::SaveTime => &self.time_gate,
            ScreenAction::SaveKm => &self.km_gate,
        }
    }

    fn day_key(&self, view: &View) -> Option<DayKey> {
        view.assignment
            .as_ref()
            .and_then(|a| DayKey::for_assignment(a, &self.calendar))
    }

    fn mode_of(view: &View, key: Option<&DayKey>) -> EditMode {
        let status = view
            .assignment
            .as_ref()
            .map(|a| a.status)
            .unwrap_or_default();
        edit_mode(Viewer::Employee, status, &view.lock, key)
    }

    async fn ensure_writable(&self) -> Result<(), String> {
        let view = self.view.lock().await;
        let status = view
            .assignment
            .as_ref()
            .map(|a| a.status)
            .unwrap_or_default();
        Self::mode_of(&view, None)
            .ensure_writable(status)
            .map_err(refusal_text)
    }

    async fn refuse(&self, text: String) -> ActionOutcome {
        if !self.loads.is_closed() {
            self.view.lock().await.notice = Some(Notice::Refused(text.clone()));
        }
        ActionOutcome::Refused(text)
    }

    /// Record the outcome of an upstream call and re-fetch on success.
    async fn finish(
        &self,
        result: Result<(), UpstreamError>,
        write: Option<WriteKind>,
        success_text: &str,
    ) -> ActionOutcome {
        match result {
            Ok(()) => {
                if self.loads.is_closed() {
                    return ActionOutcome::Completed;
                }
                self.view.lock().await.notice = Some(Notice::Success(success_text.to_string()));
                self.load().await;
                ActionOutcome::Completed
            }
            Err(err) => {
                let failure = err.failure();
                if !self.loads.is_closed() {
                    let mut view = self.view.lock().await;
                    if let Some(kind) = write {
                        if view.lock.record_rejection(kind, &failure) {
                            tracing::info!(
                                assignment_id = %self.assignment_id,
                                ?kind,
                                "Day turned out to be locked by a signature",
                            );
                        }
                    }
                    view.notice = Some(Notice::Failure(failure.clone()));
                }
                ActionOutcome::Failed(failure)
            }
        }
    }
}
