//! Signature-driven day lock.
//!
//! A signature for an (employee, date) pair freezes every time and km entry
//! of that pair. The state here is learned two ways: from signature data
//! embedded in a load payload, or after the fact when a write is rejected
//! with [`LOCKED_AFTER_SIGNATURE`](crate::failure::LOCKED_AFTER_SIGNATURE).
//!
//! The state is monotonic. No method can turn a flag back off; the only way
//! to change totals once locked is the admin correction ledger.

use chrono::NaiveDate;
use serde::Serialize;

use crate::calendar::DayCalendar;
use crate::entities::{Assignment, DayBundle};
use crate::error::CoreError;
use crate::failure::{Failure, LOCKED_MESSAGE};
use crate::lifecycle::{self, AssignmentStatus, CONFIRM_FIRST_MESSAGE};
use crate::types::EntityId;

/// Browser route of the admin corrections screen.
pub const CORRECTIONS_PATH: &str = "/admin/corrections";

// ---------------------------------------------------------------------------
// Day key
// ---------------------------------------------------------------------------

/// The (employee, calendar day) pair a lock applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayKey {
    pub employee_id: EntityId,
    pub date: NaiveDate,
}

impl DayKey {
    pub fn new(employee_id: impl Into<EntityId>, date: NaiveDate) -> Self {
        Self {
            employee_id: employee_id.into(),
            date,
        }
    }

    /// Derive the key from an assignment's owner and the local date of its
    /// `startAt`. `None` if either is missing or unparseable.
    pub fn for_assignment(assignment: &Assignment, calendar: &DayCalendar) -> Option<Self> {
        let employee_id = assignment.employee()?.to_string();
        let date = calendar.day_of_str(assignment.start_at.as_deref()?)?;
        Some(Self { employee_id, date })
    }

    /// Link to the corrections screen pre-filtered to this day.
    pub fn corrections_path(&self) -> String {
        format!(
            "{CORRECTIONS_PATH}?employeeId={}&date={}",
            self.employee_id,
            self.date.format("%Y-%m-%d")
        )
    }
}

// ---------------------------------------------------------------------------
// Lock state
// ---------------------------------------------------------------------------

/// Which kind of write was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Time,
    Km,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayLockState {
    has_signature: bool,
    km_locked_by_signature: bool,
    time_locked_by_signature: bool,
}

impl DayLockState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_assignment(assignment: &Assignment) -> Self {
        let mut state = Self::new();
        state.observe_assignment(assignment);
        state
    }

    pub fn from_bundle(bundle: &DayBundle) -> Self {
        let mut state = Self::new();
        state.observe_bundle(bundle);
        state
    }

    /// Fold in the signature data of a (re)loaded assignment.
    pub fn observe_assignment(&mut self, assignment: &Assignment) {
        self.has_signature |= assignment.has_signature();
    }

    /// Fold in the explicit flags and signatures of a day bundle.
    pub fn observe_bundle(&mut self, bundle: &DayBundle) {
        self.has_signature |= !bundle.signatures.is_empty()
            || bundle.locked_by_signature == Some(true)
            || bundle.assignments.iter().any(Assignment::has_signature);
        self.km_locked_by_signature |= bundle.km_locked_by_signature == Some(true);
        self.time_locked_by_signature |= bundle.time_locked_by_signature == Some(true);
    }

    /// A signature was just captured successfully.
    pub fn record_signature_captured(&mut self) {
        self.has_signature = true;
    }

    /// Inspect a failed write. Returns `true` if it revealed a lock, in
    /// which case the matching flag is now set.
    pub fn record_rejection(&mut self, kind: WriteKind, failure: &Failure) -> bool {
        if !failure.is_lock() {
            return false;
        }
        match kind {
            WriteKind::Km => self.km_locked_by_signature = true,
            WriteKind::Time => self.time_locked_by_signature = true,
        }
        true
    }

    pub fn is_locked(&self) -> bool {
        self.has_signature || self.km_locked_by_signature || self.time_locked_by_signature
    }

    pub fn has_signature(&self) -> bool {
        self.has_signature
    }

    /// Snapshot for the browser.
    pub fn view(&self, key: Option<&DayKey>) -> DayLockView {
        let locked = self.is_locked();
        DayLockView {
            is_locked: locked,
            has_signature: self.has_signature,
            is_km_locked_by_signature: self.km_locked_by_signature,
            is_time_locked_by_signature: self.time_locked_by_signature,
            message: locked.then_some(LOCKED_MESSAGE),
            corrections_path: key.map(DayKey::corrections_path),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayLockView {
    pub is_locked: bool,
    pub has_signature: bool,
    pub is_km_locked_by_signature: bool,
    pub is_time_locked_by_signature: bool,
    pub message: Option<&'static str>,
    pub corrections_path: Option<String>,
}

// ---------------------------------------------------------------------------
// Rendering contract
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    Employee,
    Admin,
}

/// How the time/km inputs of an assignment must be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "SCREAMING_SNAKE_CASE", rename_all_fields = "camelCase")]
pub enum EditMode {
    Editable,
    /// Not acknowledged yet: inputs disabled with the confirm-first hint.
    ConfirmFirst { message: &'static str },
    /// Signed: last known values read-only, link to corrections.
    Locked {
        message: &'static str,
        corrections_path: Option<String>,
    },
    /// Admins never edit employee entries directly.
    AdminReadOnly { corrections_path: Option<String> },
    /// PLANNED, CANCELLED or unknown status.
    Closed,
}

impl EditMode {
    /// Refuse a time or km write that this mode does not allow.
    pub fn ensure_writable(&self, status: AssignmentStatus) -> Result<(), CoreError> {
        match self {
            Self::Editable => Ok(()),
            Self::Locked { message, .. } => Err(CoreError::LockedAfterSignature((*message).into())),
            Self::ConfirmFirst { message } => {
                Err(CoreError::AssignmentNotConfirmed((*message).into()))
            }
            Self::AdminReadOnly { .. } => Err(CoreError::Forbidden(
                "Admins correct entries through the correction ledger".into(),
            )),
            Self::Closed => Err(CoreError::Conflict(format!(
                "Entries cannot be recorded while the assignment is {status}"
            ))),
        }
    }
}

/// Decide the edit mode. The admin rule wins over everything, the lock
/// wins over the lifecycle.
pub fn edit_mode(
    viewer: Viewer,
    status: AssignmentStatus,
    lock: &DayLockState,
    key: Option<&DayKey>,
) -> EditMode {
    let corrections_path = key.map(DayKey::corrections_path);
    if viewer == Viewer::Admin {
        return EditMode::AdminReadOnly { corrections_path };
    }
    if lock.is_locked() {
        return EditMode::Locked {
            message: LOCKED_MESSAGE,
            corrections_path,
        };
    }
    match status {
        AssignmentStatus::Assigned => EditMode::ConfirmFirst {
            message: CONFIRM_FIRST_MESSAGE,
        },
        s if lifecycle::can_add_time_entry(s) => EditMode::Editable,
        _ => EditMode::Closed,
    }
}
