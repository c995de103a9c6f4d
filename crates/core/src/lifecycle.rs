//! Assignment lifecycle: status parsing, permission predicates and the
//! transition table.
//!
//! Every screen and proxy route derives its action availability from the
//! functions here instead of inspecting status strings on its own.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CoreError;

pub const STATUS_PLANNED: &str = "PLANNED";
pub const STATUS_ASSIGNED: &str = "ASSIGNED";
pub const STATUS_CONFIRMED: &str = "CONFIRMED";
pub const STATUS_DONE: &str = "DONE";
pub const STATUS_CANCELLED: &str = "CANCELLED";

/// Guidance shown wherever time or kilometer input is blocked because the
/// employee has not acknowledged the assignment yet.
pub const CONFIRM_FIRST_MESSAGE: &str = "Bitte bestätigen Sie den Termin zuerst.";

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle stage of an assignment.
///
/// Parsing never fails: unrecognized upstream values become [`Unknown`],
/// which renders as a neutral display state and permits nothing.
///
/// [`Unknown`]: AssignmentStatus::Unknown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentStatus {
    Planned,
    Assigned,
    Confirmed,
    Done,
    Cancelled,
    #[default]
    Unknown,
}

impl AssignmentStatus {
    /// Case-insensitive parse, surrounding whitespace ignored.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            STATUS_PLANNED => Self::Planned,
            STATUS_ASSIGNED => Self::Assigned,
            STATUS_CONFIRMED => Self::Confirmed,
            STATUS_DONE => Self::Done,
            STATUS_CANCELLED => Self::Cancelled,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Planned => STATUS_PLANNED,
            Self::Assigned => STATUS_ASSIGNED,
            Self::Confirmed => STATUS_CONFIRMED,
            Self::Done => STATUS_DONE,
            Self::Cancelled => STATUS_CANCELLED,
            Self::Unknown => "UNKNOWN",
        }
    }

    /// DONE and CANCELLED accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Cancelled)
    }

    /// Display label for status pills.
    pub fn label(self) -> &'static str {
        match self {
            Self::Planned => "Geplant",
            Self::Assigned => "Zugewiesen",
            Self::Confirmed => "Bestätigt",
            Self::Done => "Erledigt",
            Self::Cancelled => "Storniert",
            Self::Unknown => "Unbekannt",
        }
    }

    /// Short guidance line for the employee view, if the state has one.
    pub fn hint(self) -> Option<&'static str> {
        match self {
            Self::Planned => Some("Der Termin ist noch nicht zugewiesen."),
            Self::Assigned => Some(CONFIRM_FIRST_MESSAGE),
            Self::Confirmed => Some("Zeiten und Kilometer können jetzt erfasst werden."),
            Self::Done => Some("Der Termin ist abgeschlossen."),
            Self::Cancelled => Some("Der Termin wurde storniert."),
            Self::Unknown => None,
        }
    }
}

impl From<&str> for AssignmentStatus {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl std::fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AssignmentStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Ok(raw.as_str().map_or(Self::Unknown, Self::parse))
    }
}

// ---------------------------------------------------------------------------
// Permission predicates
// ---------------------------------------------------------------------------

/// The employee may confirm or decline.
pub fn ack_allowed(status: AssignmentStatus) -> bool {
    status == AssignmentStatus::Assigned
}

pub fn can_sign(status: AssignmentStatus) -> bool {
    matches!(
        status,
        AssignmentStatus::Confirmed | AssignmentStatus::Done
    )
}

/// Whether the drawing surface is enabled.
///
/// Deliberately identical to [`can_sign`]; there is exactly one rule for
/// when ink may be captured.
pub fn signature_allowed(status: AssignmentStatus) -> bool {
    can_sign(status)
}

/// Lifecycle half of the time-entry gate. Callers must still consult the
/// day lock before rendering editable inputs.
pub fn can_add_time_entry(status: AssignmentStatus) -> bool {
    matches!(
        status,
        AssignmentStatus::Confirmed | AssignmentStatus::Done
    )
}

/// DONE stays allowed so a repeated mark-done is a no-op plus reload.
pub fn mark_done_allowed(status: AssignmentStatus) -> bool {
    matches!(
        status,
        AssignmentStatus::Confirmed | AssignmentStatus::Done
    )
}

/// All permission flags for one status, serialized for the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Permissions {
    pub status: AssignmentStatus,
    pub label: &'static str,
    pub hint: Option<&'static str>,
    pub ack_allowed: bool,
    pub mark_done_allowed: bool,
    pub can_sign: bool,
    pub signature_allowed: bool,
    pub can_add_time_entry: bool,
}

impl Permissions {
    pub fn for_status(status: AssignmentStatus) -> Self {
        Self {
            status,
            label: status.label(),
            hint: status.hint(),
            ack_allowed: ack_allowed(status),
            mark_done_allowed: mark_done_allowed(status),
            can_sign: can_sign(status),
            signature_allowed: signature_allowed(status),
            can_add_time_entry: can_add_time_entry(status),
        }
    }
}

// ---------------------------------------------------------------------------
// Employee actions
// ---------------------------------------------------------------------------

/// Body value of `POST /me/assignments/{id}/ack`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AckAction {
    Confirm,
    Decline,
}

/// Actions the employee app can trigger on one assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmployeeAction {
    Confirm,
    Decline,
    MarkDone,
    Sign,
}

impl From<AckAction> for EmployeeAction {
    fn from(action: AckAction) -> Self {
        match action {
            AckAction::Confirm => Self::Confirm,
            AckAction::Decline => Self::Decline,
        }
    }
}

/// Check an employee action against the current status before anything is
/// sent upstream.
pub fn ensure_allowed(action: EmployeeAction, status: AssignmentStatus) -> Result<(), CoreError> {
    let allowed = match action {
        EmployeeAction::Confirm | EmployeeAction::Decline => ack_allowed(status),
        EmployeeAction::MarkDone => mark_done_allowed(status),
        EmployeeAction::Sign => signature_allowed(status),
    };
    if allowed {
        return Ok(());
    }

    match (action, status) {
        (EmployeeAction::MarkDone | EmployeeAction::Sign, AssignmentStatus::Assigned) => Err(
            CoreError::AssignmentNotConfirmed(CONFIRM_FIRST_MESSAGE.to_string()),
        ),
        _ => Err(CoreError::Conflict(format!(
            "Action {action:?} is not available while the assignment is {status}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Admin-side status changes.
///
/// The upstream API owns the lifecycle rules; locally only a change out of
/// a terminal state and a target this layer cannot name are refused.
pub mod state_machine {
    use super::AssignmentStatus::{self, Unknown};

    /// Validate a status change requested through an admin update.
    ///
    /// Re-sending the current status is accepted as a no-op. An `Unknown`
    /// current status (one set upstream that this layer does not know)
    /// counts as non-terminal.
    pub fn validate_transition(from: AssignmentStatus, to: AssignmentStatus) -> Result<(), String> {
        if to == Unknown {
            return Err("Unknown target status".to_string());
        }
        if from == to || !from.is_terminal() {
            Ok(())
        } else {
            Err(format!("Invalid transition: {from} -> {to}"))
        }
    }
}
