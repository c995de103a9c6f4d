//! Screen models.
//!
//! Each model owns the working copy of one browser screen and applies the
//! lifecycle, day-lock, action-gate and request-sequence rules against an
//! async client trait. Nothing is cached across screens; every load goes
//! upstream.

pub mod assignment;
pub mod corrections;

use carehub_core::error::CoreError;
use carehub_core::failure::Failure;

pub use assignment::{AssignmentScreen, ScreenAction};
pub use corrections::CorrectionsScreen;

/// Message shown next to the triggering control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    /// Local refusal, e.g. the confirm-first hint.
    Refused(String),
    Failure(Failure),
}

/// Result of a (re)load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// Superseded by a newer request or the screen was closed; discarded.
    Stale,
    /// Nothing to load yet.
    Skipped,
    Failed(Failure),
}

/// Result of a user-triggered action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Completed,
    /// The same action is already in flight; this trigger was dropped.
    Busy,
    /// Refused locally; nothing was sent upstream.
    Refused(String),
    Failed(Failure),
}

/// The user-facing text of a local refusal.
pub(crate) fn refusal_text(err: CoreError) -> String {
    match err {
        CoreError::Validation(msg)
        | CoreError::Conflict(msg)
        | CoreError::Unauthorized(msg)
        | CoreError::Forbidden(msg)
        | CoreError::LockedAfterSignature(msg)
        | CoreError::AssignmentNotConfirmed(msg)
        | CoreError::Internal(msg) => msg,
        other @ CoreError::NotFound { .. } => other.to_string(),
    }
}
