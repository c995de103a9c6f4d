//! Employee write payloads and their client-side checks.
//!
//! The upstream API stays authoritative; these checks only catch input
//! that could never succeed before it leaves the browser's session.

use chrono::NaiveDate;
use serde::Serialize;

use crate::calendar::{minutes_between, parse_date, parse_instant, DayCalendar};
use crate::error::CoreError;
use crate::types::EntityId;

/// Body of `POST /me/time-entries`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntryInput {
    pub assignment_id: EntityId,
    pub date: NaiveDate,
    pub minutes: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl TimeEntryInput {
    /// Entry given as a (date, minutes) pair.
    pub fn from_minutes(
        assignment_id: &str,
        date: &str,
        minutes: i64,
        notes: Option<String>,
    ) -> Result<Self, CoreError> {
        let assignment_id = required_id(assignment_id)?;
        let date = parse_date(date)
            .ok_or_else(|| CoreError::Validation(format!("Invalid date '{date}'")))?;
        if minutes <= 0 {
            return Err(CoreError::Validation("minutes must be greater than 0".into()));
        }
        Ok(Self {
            assignment_id,
            date,
            minutes,
            notes: clean_notes(notes),
        })
    }

    /// Entry given as a (startAt, endAt) pair. The date is the start's day
    /// on `calendar`, the same day the lock for the entry keys on.
    pub fn from_span(
        assignment_id: &str,
        start_at: &str,
        end_at: &str,
        notes: Option<String>,
        calendar: &DayCalendar,
    ) -> Result<Self, CoreError> {
        validate_schedule(start_at, end_at)?;
        let date = calendar
            .day_of_str(start_at)
            .ok_or_else(|| CoreError::Validation(format!("Invalid startAt '{start_at}'")))?;
        let minutes = minutes_between(Some(start_at), Some(end_at));
        Self::from_minutes(assignment_id, &date.format("%Y-%m-%d").to_string(), minutes, notes)
    }
}

/// Body of `POST /me/km-entries`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KmEntryInput {
    pub date: NaiveDate,
    pub km: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignment_id: Option<EntityId>,
}

impl KmEntryInput {
    pub fn new(date: &str, km: Option<f64>, assignment_id: Option<EntityId>) -> Result<Self, CoreError> {
        let date = parse_date(date)
            .ok_or_else(|| CoreError::Validation(format!("Invalid date '{date}'")))?;
        let km = km
            .filter(|k| k.is_finite())
            .ok_or_else(|| CoreError::Validation("km must be a number".into()))?;
        if km < 0.0 {
            return Err(CoreError::Validation("km must not be negative".into()));
        }
        Ok(Self {
            date,
            km,
            assignment_id: assignment_id.filter(|id| !id.trim().is_empty()),
        })
    }
}

/// `endAt` must be strictly after `startAt`.
pub fn validate_schedule(start_at: &str, end_at: &str) -> Result<(), CoreError> {
    let start = parse_instant(start_at)
        .ok_or_else(|| CoreError::Validation(format!("Invalid startAt '{start_at}'")))?;
    let end = parse_instant(end_at)
        .ok_or_else(|| CoreError::Validation(format!("Invalid endAt '{end_at}'")))?;
    if end <= start {
        return Err(CoreError::Validation(
            "Das Ende muss nach dem Beginn liegen.".into(),
        ));
    }
    Ok(())
}

fn required_id(id: &str) -> Result<EntityId, CoreError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(CoreError::Validation("assignmentId is required".into()));
    }
    Ok(id.to_string())
}

fn clean_notes(notes: Option<String>) -> Option<String> {
    notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn utc() -> DayCalendar {
        DayCalendar::parse("UTC").unwrap()
    }

    #[test]
    fn span_entry_derives_minutes_and_date() {
        let entry =
            TimeEntryInput::from_span(
                "a1",
                "2026-03-02T08:00:00Z",
                "2026-03-02T10:30:00Z",
                None,
                &utc(),
            )
            .unwrap();
        assert_eq!(entry.minutes, 150);
        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            json!({ "assignmentId": "a1", "date": "2026-03-02", "minutes": 150 })
        );
    }

    #[test]
    fn span_entry_lands_on_the_local_day() {
        let calendar = DayCalendar::parse("+01:00").unwrap();
        let entry = TimeEntryInput::from_span(
            "a1",
            "2026-03-01T23:30:00Z",
            "2026-03-02T01:00:00Z",
            None,
            &calendar,
        )
        .unwrap();
        assert_eq!(entry.date, NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
        assert_eq!(entry.minutes, 90);
        assert_eq!(calendar.day_of_str("2026-03-01T23:30:00Z"), Some(entry.date));
    }

    #[test]
    fn inverted_span_is_rejected_before_submission() {
        assert_matches!(
            TimeEntryInput::from_span(
                "a1",
                "2026-03-02T10:00:00Z",
                "2026-03-02T09:00:00Z",
                None,
                &utc()
            ),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn zero_minutes_rejected() {
        assert_matches!(
            TimeEntryInput::from_minutes("a1", "2026-03-02", 0, None),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn negative_km_rejected() {
        assert_matches!(
            KmEntryInput::new("2026-03-02", Some(-1.0), None),
            Err(CoreError::Validation(_))
        );
        assert!(KmEntryInput::new("2026-03-02", Some(0.0), None).is_ok());
    }

    #[test]
    fn schedule_requires_end_after_start() {
        assert!(validate_schedule("2026-03-02T08:00:00Z", "2026-03-02T09:00:00Z").is_ok());
        assert!(validate_schedule("2026-03-02T08:00:00Z", "2026-03-02T08:00:00Z").is_err());
        assert!(validate_schedule("morgen", "2026-03-02T08:00:00Z").is_err());
    }
}
