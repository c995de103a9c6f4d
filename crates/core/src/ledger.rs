//! Correction ledger read model and admin correction drafts.
//!
//! [`summarize`] is a pure reducer over the five collections of a day
//! bundle. It is recomputed from scratch after every fetch; nothing is
//! patched incrementally.

use chrono::NaiveDate;
use serde::Serialize;

use crate::calendar::{self, minutes_between, parse_instant};
use crate::entities::{Assignment, AuditLogEntry, DayBundle, KmAdjustment, TimeAdjustment, TimeEntry};
use crate::error::CoreError;
use crate::types::EntityId;

/// Per-day totals for the read-only summary panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySummary {
    pub planned_minutes: i64,
    pub recorded_minutes: i64,
    pub adjusted_minutes: i64,
    pub final_minutes: i64,
    /// `None` when no assignment of the day carries a numeric km value,
    /// as opposed to `Some(0.0)` for "recorded as zero".
    pub km_recorded: Option<f64>,
    pub km_adjusted: f64,
    pub km_final: f64,
}

/// Minute totals saturate at the `i64` bounds.
fn total(minutes: impl Iterator<Item = i64>) -> i64 {
    minutes.fold(0, i64::saturating_add)
}

/// Σ (endAt − startAt) over the day's assignments, each clamped at zero.
pub fn planned_minutes(assignments: &[Assignment]) -> i64 {
    total(
        assignments
            .iter()
            .map(|a| minutes_between(a.start_at.as_deref(), a.end_at.as_deref())),
    )
}

/// Minutes of one entry: the explicit value as sent, or the span between
/// its timestamps (clamped at zero).
pub fn entry_minutes(entry: &TimeEntry) -> i64 {
    match entry.minutes {
        Some(minutes) => minutes,
        None => minutes_between(entry.start_at.as_deref(), entry.end_at.as_deref()),
    }
}

pub fn recorded_minutes(entries: &[TimeEntry]) -> i64 {
    total(entries.iter().map(entry_minutes))
}

pub fn adjusted_minutes(adjustments: &[TimeAdjustment]) -> i64 {
    total(adjustments.iter().map(|a| a.delta_minutes))
}

pub fn km_recorded(assignments: &[Assignment]) -> Option<f64> {
    assignments
        .iter()
        .filter_map(|a| a.kilometers)
        .fold(None, |acc, km| Some(acc.unwrap_or(0.0) + km))
}

pub fn km_adjusted(adjustments: &[KmAdjustment]) -> f64 {
    adjustments.iter().map(|a| a.delta_km).sum()
}

pub fn summarize_parts(
    assignments: &[Assignment],
    time_entries: &[TimeEntry],
    time_adjustments: &[TimeAdjustment],
    km_adjustments: &[KmAdjustment],
) -> DaySummary {
    let recorded = recorded_minutes(time_entries);
    let adjusted = adjusted_minutes(time_adjustments);
    let km_recorded = km_recorded(assignments);
    let km_adjusted = km_adjusted(km_adjustments);

    DaySummary {
        planned_minutes: planned_minutes(assignments),
        recorded_minutes: recorded,
        adjusted_minutes: adjusted,
        final_minutes: recorded.saturating_add(adjusted),
        km_recorded,
        km_adjusted,
        km_final: km_recorded.unwrap_or(0.0) + km_adjusted,
    }
}

pub fn summarize(bundle: &DayBundle) -> DaySummary {
    summarize_parts(
        &bundle.assignments,
        &bundle.time_entries,
        &bundle.time_adjustments,
        &bundle.km_adjustments,
    )
}

/// Audit entries newest first; entries without a parseable timestamp last.
pub fn audit_trail(entries: &[AuditLogEntry]) -> Vec<AuditLogEntry> {
    let mut sorted = entries.to_vec();
    sorted.sort_by_key(|e| {
        std::cmp::Reverse(e.created_at.as_deref().and_then(parse_instant))
    });
    sorted
}

// ---------------------------------------------------------------------------
// Correction drafts
// ---------------------------------------------------------------------------

/// Body of `POST /admin/time-adjustments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeAdjustmentDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignment_id: Option<EntityId>,
    pub user_id: EntityId,
    pub date: NaiveDate,
    pub delta_minutes: i64,
    pub reason: String,
}

/// Body of `POST /admin/km-adjustments`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KmAdjustmentDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignment_id: Option<EntityId>,
    pub user_id: EntityId,
    pub date: NaiveDate,
    pub delta_km: f64,
    pub reason: String,
}

fn validate_common(user_id: &str, date: &str, reason: &str) -> Result<(EntityId, NaiveDate, String), CoreError> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(CoreError::Validation("userId is required".into()));
    }
    let day = calendar::parse_date(date)
        .ok_or_else(|| CoreError::Validation(format!("Invalid date '{date}', expected YYYY-MM-DD")))?;
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(CoreError::Validation("Bitte geben Sie einen Grund an.".into()));
    }
    Ok((user_id.to_string(), day, reason.to_string()))
}

fn normalize_assignment_id(assignment_id: Option<EntityId>) -> Option<EntityId> {
    assignment_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
}

impl TimeAdjustmentDraft {
    /// `delta` is `None` when the submitted value was not a number.
    pub fn new(
        assignment_id: Option<EntityId>,
        user_id: &str,
        date: &str,
        delta: Option<f64>,
        reason: &str,
    ) -> Result<Self, CoreError> {
        let (user_id, date, reason) = validate_common(user_id, date, reason)?;
        let delta = delta
            .filter(|d| d.is_finite())
            .ok_or_else(|| CoreError::Validation("deltaMinutes must be a number".into()))?;
        if delta.fract() != 0.0 {
            return Err(CoreError::Validation(
                "deltaMinutes must be a whole number of minutes".into(),
            ));
        }
        Ok(Self {
            assignment_id: normalize_assignment_id(assignment_id),
            user_id,
            date,
            delta_minutes: delta as i64,
            reason,
        })
    }
}

impl KmAdjustmentDraft {
    pub fn new(
        assignment_id: Option<EntityId>,
        user_id: &str,
        date: &str,
        delta: Option<f64>,
        reason: &str,
    ) -> Result<Self, CoreError> {
        let (user_id, date, reason) = validate_common(user_id, date, reason)?;
        let delta_km = delta
            .filter(|d| d.is_finite())
            .ok_or_else(|| CoreError::Validation("deltaKm must be a number".into()))?;
        Ok(Self {
            assignment_id: normalize_assignment_id(assignment_id),
            user_id,
            date,
            delta_km,
            reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn bundle(value: serde_json::Value) -> DayBundle {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn planned_worked_and_adjusted_totals() {
        let b = bundle(json!({
            "assignments": [
                { "id": "a1", "startAt": "2026-03-02T07:00:00Z", "endAt": "2026-03-02T11:00:00Z" },
                { "id": "a2", "startAt": "2026-03-02T12:00:00Z", "endAt": "2026-03-02T16:00:00Z" },
            ],
            "timeEntries": [{ "id": "t1", "minutes": 450 }],
            "timeAdjustments": [{ "id": "x1", "deltaMinutes": 15, "reason": "Übergabe" }],
        }));
        let s = summarize(&b);
        assert_eq!(s.planned_minutes, 480);
        assert_eq!(s.recorded_minutes, 450);
        assert_eq!(s.adjusted_minutes, 15);
        assert_eq!(s.final_minutes, 465);
    }

    #[test]
    fn final_minutes_is_recorded_plus_adjusted_with_negative_deltas() {
        let b = bundle(json!({
            "timeEntries": [{ "id": "t1", "minutes": 90 }, { "id": "t2", "minutes": 30 }],
            "timeAdjustments": [
                { "id": "x1", "deltaMinutes": -45, "reason": "Pause" },
                { "id": "x2", "deltaMinutes": 5, "reason": "Fahrt" },
            ],
        }));
        let s = summarize(&b);
        assert_eq!(s.final_minutes, s.recorded_minutes + s.adjusted_minutes);
        assert_eq!(s.final_minutes, 80);
    }

    #[test]
    fn malformed_or_inverted_assignments_contribute_zero() {
        let b = bundle(json!({
            "assignments": [
                { "id": "a1", "startAt": "kaputt", "endAt": "2026-03-02T11:00:00Z" },
                { "id": "a2", "startAt": "2026-03-02T12:00:00Z", "endAt": "2026-03-02T10:00:00Z" },
                { "id": "a3" },
                { "id": "a4", "startAt": "2026-03-02T12:00:00Z", "endAt": "2026-03-02T12:45:00Z" },
            ],
        }));
        assert_eq!(summarize(&b).planned_minutes, 45);
    }

    #[test]
    fn entry_minutes_derived_from_timestamps() {
        let b = bundle(json!({
            "timeEntries": [
                { "id": "t1", "startAt": "2026-03-02T08:00:00Z", "endAt": "2026-03-02T09:15:00Z" },
                { "id": "t2", "minutes": 20 },
            ],
        }));
        assert_eq!(summarize(&b).recorded_minutes, 95);
    }

    #[test]
    fn explicit_minutes_are_summed_as_sent() {
        let b = bundle(json!({
            "timeEntries": [{ "id": "t1", "minutes": 60 }, { "id": "t2", "minutes": -20 }],
        }));
        assert_eq!(summarize(&b).recorded_minutes, 40);
    }

    #[test]
    fn huge_deltas_saturate_instead_of_overflowing() {
        let b = bundle(json!({
            "timeEntries": [{ "id": "t1", "minutes": 30 }],
            "timeAdjustments": [
                { "id": "x1", "deltaMinutes": i64::MAX, "reason": "a" },
                { "id": "x2", "deltaMinutes": 1, "reason": "b" },
            ],
        }));
        let s = summarize(&b);
        assert_eq!(s.adjusted_minutes, i64::MAX);
        assert_eq!(s.final_minutes, i64::MAX);

        let b = bundle(json!({
            "timeAdjustments": [
                { "id": "x1", "deltaMinutes": i64::MIN, "reason": "a" },
                { "id": "x2", "deltaMinutes": -1, "reason": "b" },
            ],
        }));
        assert_eq!(summarize(&b).adjusted_minutes, i64::MIN);
    }

    #[test]
    fn km_recorded_is_none_without_numeric_kilometers() {
        let b = bundle(json!({
            "assignments": [{ "id": "a1" }, { "id": "a2", "kilometers": null }],
            "kmAdjustments": [{ "id": "k1", "deltaKm": 4.5, "reason": "Umweg" }],
        }));
        let s = summarize(&b);
        assert_eq!(s.km_recorded, None);
        assert_eq!(s.km_adjusted, 4.5);
        assert_eq!(s.km_final, 4.5);
    }

    #[test]
    fn km_recorded_distinguishes_zero_from_absent() {
        let b = bundle(json!({ "assignments": [{ "id": "a1", "kilometers": 0 }, { "id": "a2" }] }));
        assert_eq!(summarize(&b).km_recorded, Some(0.0));
    }

    #[test]
    fn km_final_adds_adjustments_to_recorded() {
        let b = bundle(json!({
            "assignments": [{ "id": "a1", "kilometers": 12.0 }, { "id": "a2", "kilometers": 8.5 }],
            "kmAdjustments": [{ "id": "k1", "deltaKm": -2.5, "reason": "Doppelt erfasst" }],
        }));
        let s = summarize(&b);
        assert_eq!(s.km_recorded, Some(20.5));
        assert_eq!(s.km_final, 18.0);
    }

    #[test]
    fn audit_trail_sorts_newest_first() {
        let entries: Vec<AuditLogEntry> = serde_json::from_value(json!([
            { "id": "1", "createdAt": "2026-03-02T08:00:00Z" },
            { "id": "2" },
            { "id": "3", "createdAt": "2026-03-02T09:00:00Z" },
        ]))
        .unwrap();
        let ids: Vec<_> = audit_trail(&entries).into_iter().map(|e| e.id).collect();
        assert_eq!(ids, ["3", "1", "2"]);
    }

    #[test]
    fn draft_requires_reason() {
        let err = TimeAdjustmentDraft::new(None, "emp-1", "2026-03-02", Some(15.0), "   ");
        assert_matches!(err, Err(CoreError::Validation(_)));
    }

    #[test]
    fn draft_requires_numeric_delta() {
        assert_matches!(
            KmAdjustmentDraft::new(None, "emp-1", "2026-03-02", None, "Umweg"),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            TimeAdjustmentDraft::new(None, "emp-1", "2026-03-02", Some(7.5), "Pause"),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn draft_serializes_upstream_body() {
        let draft = TimeAdjustmentDraft::new(
            Some(" ".into()),
            "emp-1",
            "2026-03-02",
            Some(-30.0),
            " Pause vergessen ",
        )
        .unwrap();
        assert_eq!(
            serde_json::to_value(&draft).unwrap(),
            json!({ "userId": "emp-1", "date": "2026-03-02", "deltaMinutes": -30, "reason": "Pause vergessen" })
        );
    }
}
