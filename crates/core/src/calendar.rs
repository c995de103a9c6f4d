//! Instant and calendar-day parsing.
//!
//! A day lock is keyed by the calendar date of an assignment's `startAt`
//! in the business's local time, so the same instant can belong to
//! different days depending on the configured calendar.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, Offset, Utc};

/// Which wall clock turns instants into calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DayCalendar {
    /// The host's local time zone (follows `TZ`, including DST).
    #[default]
    Local,
    Fixed(FixedOffset),
}

impl DayCalendar {
    /// Parse `local`, `UTC`/`Z`, or an offset such as `+01:00` / `-0530`.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("local") {
            return Ok(Self::Local);
        }
        if raw.eq_ignore_ascii_case("utc") || raw == "Z" {
            return Ok(Self::Fixed(Utc.fix()));
        }

        let (sign, rest) = match raw.as_bytes().first() {
            Some(b'+') => (1, &raw[1..]),
            Some(b'-') => (-1, &raw[1..]),
            _ => return Err(format!("Invalid timezone offset '{raw}'")),
        };
        let digits: String = rest.chars().filter(|c| *c != ':').collect();
        if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(format!("Invalid timezone offset '{raw}'"));
        }
        let hours: i32 = digits[..2].parse().map_err(|_| format!("Invalid hours in '{raw}'"))?;
        let minutes: i32 = digits[2..].parse().map_err(|_| format!("Invalid minutes in '{raw}'"))?;
        if hours > 14 || minutes > 59 {
            return Err(format!("Timezone offset out of range '{raw}'"));
        }
        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
            .map(Self::Fixed)
            .ok_or_else(|| format!("Timezone offset out of range '{raw}'"))
    }

    pub fn day_of(&self, instant: &DateTime<Utc>) -> NaiveDate {
        match self {
            Self::Local => instant.with_timezone(&Local).date_naive(),
            Self::Fixed(offset) => instant.with_timezone(offset).date_naive(),
        }
    }

    /// Calendar day of a raw timestamp, `None` if unparseable.
    pub fn day_of_str(&self, raw: &str) -> Option<NaiveDate> {
        parse_instant(raw).map(|t| self.day_of(&t))
    }
}

/// Parse an RFC 3339 instant. Offset-less timestamps are read as UTC.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
        .ok()
        .map(|naive| naive.and_utc())
}

/// Parse a `YYYY-MM-DD` date, also accepting the date prefix of a timestamp.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let prefix = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

/// Whole minutes from `start` to `end`, rounded to the nearest minute.
///
/// Unparseable input or `end <= start` yields 0, never a negative value.
pub fn minutes_between(start: Option<&str>, end: Option<&str>) -> i64 {
    let (Some(start), Some(end)) = (start.and_then(parse_instant), end.and_then(parse_instant))
    else {
        return 0;
    };
    if end <= start {
        return 0;
    }
    let millis = (end - start).num_milliseconds();
    (millis as f64 / 60_000.0).round() as i64
}
