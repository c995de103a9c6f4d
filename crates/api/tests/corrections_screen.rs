//! Admin corrections screen against an in-memory client.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use async_trait::async_trait;
use carehub_api::screens::{ActionOutcome, CorrectionsScreen, LoadOutcome, Notice};
use carehub_core::day_lock::DayKey;
use carehub_core::entities::DayBundle;
use carehub_core::ledger::{KmAdjustmentDraft, TimeAdjustmentDraft};
use carehub_upstream::traits::CorrectionsApi;
use carehub_upstream::{RequestContext, UpstreamError};
use chrono::NaiveDate;
use serde_json::json;
use tokio::sync::Notify;

// ---------------------------------------------------------------------------
// Fake client
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FakeCorrections {
    /// Dates whose load waits for `release`.
    held: Mutex<HashSet<NaiveDate>>,
    release: Notify,
    locked: AtomicBool,
    loads: Mutex<Vec<NaiveDate>>,
    time_drafts: Mutex<Vec<TimeAdjustmentDraft>>,
    km_drafts: Mutex<Vec<KmAdjustmentDraft>>,
    /// Adjustment writes wait for `release`.
    hold_writes: AtomicBool,
}

impl FakeCorrections {
    fn loads(&self) -> Vec<NaiveDate> {
        self.loads.lock().unwrap().clone()
    }
}

#[async_trait]
impl CorrectionsApi for FakeCorrections {
    async fn load_day(
        &self,
        _ctx: &RequestContext,
        employee_id: &str,
        date: NaiveDate,
    ) -> Result<DayBundle, UpstreamError> {
        self.loads.lock().unwrap().push(date);
        let held = self.held.lock().unwrap().remove(&date);
        if held {
            self.release.notified().await;
        }

        let day = date.format("%Y-%m-%d").to_string();
        let adjustments: Vec<_> = self
            .time_drafts
            .lock()
            .unwrap()
            .iter()
            .map(|d| json!({ "id": "ta", "deltaMinutes": d.delta_minutes, "reason": d.reason }))
            .collect();
        let bundle = json!({
            "assignments": [{
                "id": format!("a-{day}"),
                "employeeId": employee_id,
                "startAt": format!("{day}T08:00:00Z"),
                "endAt": format!("{day}T16:00:00Z"),
                "status": "DONE",
                "kilometers": 30
            }],
            "timeEntries": [{ "id": "t1", "minutes": 450 }],
            "timeAdjustments": adjustments,
            "kmAdjustments": [],
            "auditLogs": [
                { "id": "old", "createdAt": "2026-03-01T10:00:00Z" },
                { "id": "new", "createdAt": "2026-03-05T10:00:00Z" }
            ],
            "lockedBySignature": self.locked.load(Ordering::SeqCst)
        });
        Ok(serde_json::from_value(bundle).unwrap())
    }

    async fn create_time_adjustment(
        &self,
        _ctx: &RequestContext,
        draft: &TimeAdjustmentDraft,
    ) -> Result<(), UpstreamError> {
        if self.hold_writes.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
        self.time_drafts.lock().unwrap().push(draft.clone());
        Ok(())
    }

    async fn create_km_adjustment(
        &self,
        _ctx: &RequestContext,
        draft: &KmAdjustmentDraft,
    ) -> Result<(), UpstreamError> {
        if draft.reason == "fail" {
            return Err(UpstreamError::api(400, json!({ "message": "deltaKm out of range" })));
        }
        self.km_drafts.lock().unwrap().push(draft.clone());
        Ok(())
    }
}

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
}

fn screen(client: &Arc<FakeCorrections>) -> CorrectionsScreen<FakeCorrections> {
    CorrectionsScreen::new(Arc::clone(client), RequestContext::new("admin-token"))
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[tokio::test]
async fn selected_day_is_summarized() {
    let client = Arc::new(FakeCorrections::default());
    let screen = screen(&client);

    assert_eq!(screen.select("u1", date(2)).await, LoadOutcome::Applied);

    let summary = screen.summary().await.unwrap();
    assert_eq!(summary.planned_minutes, 480);
    assert_eq!(summary.recorded_minutes, 450);
    assert_eq!(summary.final_minutes, 450);
    assert_eq!(summary.km_recorded, Some(30.0));

    let bundle = screen.bundle().await;
    assert_eq!(bundle.audit_logs[0].id, "new");
    assert_eq!(screen.loaded_day().await, Some(DayKey::new("u1", date(2))));
}

#[tokio::test]
async fn refresh_without_selection_is_skipped() {
    let client = Arc::new(FakeCorrections::default());
    let screen = screen(&client);

    assert_eq!(screen.refresh().await, LoadOutcome::Skipped);
    assert!(client.loads().is_empty());
}

#[tokio::test]
async fn only_the_latest_date_is_applied() {
    let client = Arc::new(FakeCorrections::default());
    client.held.lock().unwrap().insert(date(1));
    let screen = screen(&client);

    let (first, second) = tokio::join!(screen.select("u1", date(1)), async {
        let second = screen.select("u1", date(2)).await;
        client.release.notify_one();
        second
    });

    assert_eq!(first, LoadOutcome::Stale);
    assert_eq!(second, LoadOutcome::Applied);
    assert_eq!(client.loads(), vec![date(1), date(2)]);

    let loaded = screen.loaded_day().await.unwrap();
    assert_eq!(loaded.date, date(2));
    assert_eq!(screen.bundle().await.assignments[0].id, "a-2026-03-02");
}

#[tokio::test]
async fn closed_screen_drops_the_pending_day() {
    let client = Arc::new(FakeCorrections::default());
    client.held.lock().unwrap().insert(date(2));
    let screen = screen(&client);

    let (outcome, ()) = tokio::join!(screen.select("u1", date(2)), async {
        screen.close();
        client.release.notify_one();
    });

    assert_eq!(outcome, LoadOutcome::Stale);
    assert!(screen.loaded_day().await.is_none());
    assert!(screen.summary().await.is_none());
}

#[tokio::test]
async fn close_abandons_a_load_that_never_returns() {
    let client = Arc::new(FakeCorrections::default());
    client.held.lock().unwrap().insert(date(2));
    let screen = screen(&client);

    let (outcome, ()) = tokio::join!(screen.select("u1", date(2)), async {
        screen.close();
    });

    assert_eq!(outcome, LoadOutcome::Stale);
    assert!(screen.loaded_day().await.is_none());
}

#[tokio::test]
async fn lock_never_clears_while_the_same_day_is_shown() {
    let client = Arc::new(FakeCorrections::default());
    client.locked.store(true, Ordering::SeqCst);
    let screen = screen(&client);

    screen.select("u1", date(2)).await;
    assert!(screen.lock_view().await.is_locked);

    client.locked.store(false, Ordering::SeqCst);
    screen.refresh().await;
    assert!(screen.lock_view().await.is_locked);

    // A different day starts from its own data.
    screen.select("u1", date(3)).await;
    assert!(!screen.lock_view().await.is_locked);
}

#[tokio::test]
async fn lock_view_links_to_the_loaded_day() {
    let client = Arc::new(FakeCorrections::default());
    client.locked.store(true, Ordering::SeqCst);
    let screen = screen(&client);
    screen.select("u1", date(2)).await;

    assert_eq!(
        screen.lock_view().await.corrections_path.as_deref(),
        Some("/admin/corrections?employeeId=u1&date=2026-03-02")
    );
}

// ---------------------------------------------------------------------------
// Adjustments
// ---------------------------------------------------------------------------

#[tokio::test]
async fn time_adjustment_is_appended_and_totals_recomputed() {
    let client = Arc::new(FakeCorrections::default());
    let screen = screen(&client);
    screen.select("u1", date(2)).await;

    let outcome = screen
        .add_time_adjustment(Some("a-2026-03-02".into()), Some(15.0), "Übergabe")
        .await;
    assert_eq!(outcome, ActionOutcome::Completed);

    let draft = client.time_drafts.lock().unwrap()[0].clone();
    assert_eq!(draft.user_id, "u1");
    assert_eq!(draft.date, date(2));
    assert_eq!(draft.delta_minutes, 15);

    assert_eq!(client.loads().len(), 2);
    let summary = screen.summary().await.unwrap();
    assert_eq!(summary.adjusted_minutes, 15);
    assert_eq!(summary.final_minutes, 465);
    assert_eq!(summary.planned_minutes, 480);
    assert_eq!(
        screen.notice().await,
        Some(Notice::Success("Zeitkorrektur gespeichert.".to_string()))
    );
}

#[tokio::test]
async fn adjustment_needs_a_selected_day() {
    let client = Arc::new(FakeCorrections::default());
    let screen = screen(&client);

    assert_matches!(
        screen.add_time_adjustment(None, Some(10.0), "x").await,
        ActionOutcome::Refused(_)
    );
    assert!(client.time_drafts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn blank_reason_is_refused_locally() {
    let client = Arc::new(FakeCorrections::default());
    let screen = screen(&client);
    screen.select("u1", date(2)).await;

    assert_eq!(
        screen.add_km_adjustment(None, Some(-2.0), "  ").await,
        ActionOutcome::Refused("Bitte geben Sie einen Grund an.".to_string())
    );
    assert!(client.km_drafts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn non_numeric_delta_is_refused_locally() {
    let client = Arc::new(FakeCorrections::default());
    let screen = screen(&client);
    screen.select("u1", date(2)).await;

    assert_matches!(
        screen.add_time_adjustment(None, None, "Grund").await,
        ActionOutcome::Refused(_)
    );
    assert!(client.time_drafts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn upstream_rejection_is_shown_without_reload() {
    let client = Arc::new(FakeCorrections::default());
    let screen = screen(&client);
    screen.select("u1", date(2)).await;

    let outcome = screen.add_km_adjustment(None, Some(900.0), "fail").await;
    assert_matches!(outcome, ActionOutcome::Failed(ref f) if f.message == "deltaKm out of range");
    assert_matches!(screen.notice().await, Some(Notice::Failure(_)));
    assert_eq!(client.loads().len(), 1);
}

#[tokio::test]
async fn second_time_adjustment_while_saving_is_busy() {
    let client = Arc::new(FakeCorrections::default());
    let screen = screen(&client);
    screen.select("u1", date(2)).await;
    client.hold_writes.store(true, Ordering::SeqCst);

    let (first, second) = tokio::join!(
        screen.add_time_adjustment(None, Some(5.0), "eins"),
        async {
            let second = screen.add_time_adjustment(None, Some(5.0), "zwei").await;
            assert!(screen.is_time_busy());
            assert!(!screen.is_km_busy());
            client.hold_writes.store(false, Ordering::SeqCst);
            client.release.notify_one();
            second
        }
    );

    assert_eq!(first, ActionOutcome::Completed);
    assert_eq!(second, ActionOutcome::Busy);
    assert_eq!(client.time_drafts.lock().unwrap().len(), 1);
}
