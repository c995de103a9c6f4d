//! Transient copies of upstream entities.
//!
//! Every struct decodes leniently: missing fields take their defaults and
//! numeric fields go through [`crate::lenient`]. Timestamps that feed
//! arithmetic stay as raw strings so a malformed value degrades to "no
//! contribution" in the ledger instead of failing the whole payload.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::lenient;
use crate::lifecycle::AssignmentStatus;
use crate::types::EntityId;

// ---------------------------------------------------------------------------
// Assignment
// ---------------------------------------------------------------------------

/// A scheduled visit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Assignment {
    #[serde(deserialize_with = "lenient::id")]
    pub id: EntityId,
    #[serde(deserialize_with = "lenient::opt_id")]
    pub customer_id: Option<EntityId>,
    #[serde(deserialize_with = "lenient::opt_id")]
    pub employee_id: Option<EntityId>,
    /// Older payloads name the employee `userId`.
    #[serde(deserialize_with = "lenient::opt_id", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<EntityId>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub start_at: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub end_at: Option<String>,
    pub status: AssignmentStatus,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub notes: Option<String>,
    /// Recorded kilometers. `None` means "never recorded", not zero.
    #[serde(deserialize_with = "lenient::opt_number")]
    pub kilometers: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_number")]
    pub km_adjusted: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_number")]
    pub km_final: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_record")]
    pub latest_signature: Option<DaySignature>,
    #[serde(deserialize_with = "lenient::list")]
    pub signatures: Vec<DaySignature>,
    #[serde(deserialize_with = "lenient::opt_record")]
    pub km_entry: Option<KmEntry>,
    /// Fields this layer does not interpret, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Assignment {
    /// The assigned employee, under either of its upstream names.
    pub fn employee(&self) -> Option<&str> {
        self.employee_id.as_deref().or(self.user_id.as_deref())
    }

    /// Whether the load payload already carries a signature for this
    /// assignment's day.
    pub fn has_signature(&self) -> bool {
        self.latest_signature.is_some()
            || !self.signatures.is_empty()
            || self.extra.get("hasSignature").and_then(Value::as_bool) == Some(true)
    }
}

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

/// One handwritten signature for an employee's calendar day.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawSignature")]
pub struct DaySignature {
    pub id: EntityId,
    /// `signedAt`, or `createdAt` for payloads that only carry the row time.
    pub signed_at: Option<String>,
    /// Opaque raster data, usually a PNG data URI.
    pub signature_data: Option<String>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawSignature {
    #[serde(deserialize_with = "lenient::id")]
    id: EntityId,
    #[serde(deserialize_with = "lenient::opt_string")]
    signed_at: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    created_at: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    signature_data: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    image: Option<String>,
}

impl From<RawSignature> for DaySignature {
    fn from(raw: RawSignature) -> Self {
        Self {
            id: raw.id,
            signed_at: raw.signed_at.or(raw.created_at),
            signature_data: raw.signature_data.or(raw.image),
        }
    }
}

// ---------------------------------------------------------------------------
// Time / km entries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimeEntry {
    #[serde(deserialize_with = "lenient::id")]
    pub id: EntityId,
    #[serde(deserialize_with = "lenient::opt_id")]
    pub assignment_id: Option<EntityId>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub date: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub start_at: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub end_at: Option<String>,
    /// Given directly, or derived from `start_at`/`end_at` when absent.
    #[serde(deserialize_with = "lenient::opt_minutes")]
    pub minutes: Option<i64>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KmEntry {
    #[serde(deserialize_with = "lenient::id")]
    pub id: EntityId,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub date: Option<String>,
    #[serde(deserialize_with = "lenient::opt_number")]
    pub km: Option<f64>,
}

// ---------------------------------------------------------------------------
// Admin ledger
// ---------------------------------------------------------------------------

/// Signed minute correction entered by an admin. Append-only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimeAdjustment {
    #[serde(deserialize_with = "lenient::id")]
    pub id: EntityId,
    #[serde(deserialize_with = "lenient::opt_id")]
    pub assignment_id: Option<EntityId>,
    #[serde(deserialize_with = "lenient::minutes_or_zero")]
    pub delta_minutes: i64,
    #[serde(deserialize_with = "lenient::string")]
    pub reason: String,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub created_at: Option<String>,
    #[serde(deserialize_with = "lenient::opt_id")]
    pub created_by_id: Option<EntityId>,
}

/// Signed kilometer correction entered by an admin. Append-only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KmAdjustment {
    #[serde(deserialize_with = "lenient::id")]
    pub id: EntityId,
    #[serde(deserialize_with = "lenient::opt_id")]
    pub assignment_id: Option<EntityId>,
    #[serde(deserialize_with = "lenient::number_or_zero")]
    pub delta_km: f64,
    #[serde(deserialize_with = "lenient::string")]
    pub reason: String,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub created_at: Option<String>,
    #[serde(deserialize_with = "lenient::opt_id")]
    pub created_by_id: Option<EntityId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuditLogEntry {
    #[serde(deserialize_with = "lenient::id")]
    pub id: EntityId,
    #[serde(deserialize_with = "lenient::string")]
    pub action: String,
    #[serde(deserialize_with = "lenient::string")]
    pub entity: String,
    #[serde(deserialize_with = "lenient::opt_id")]
    pub entity_id: Option<EntityId>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub reason: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub created_at: Option<String>,
    #[serde(deserialize_with = "lenient::opt_id")]
    pub actor_id: Option<EntityId>,
}

// ---------------------------------------------------------------------------
// Day bundle
// ---------------------------------------------------------------------------

/// Aggregated admin view of one employee's day, as returned by
/// `GET /admin/corrections/day`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawDayBundle")]
pub struct DayBundle {
    pub assignments: Vec<Assignment>,
    pub time_entries: Vec<TimeEntry>,
    pub time_adjustments: Vec<TimeAdjustment>,
    pub km_adjustments: Vec<KmAdjustment>,
    pub audit_logs: Vec<AuditLogEntry>,
    pub signatures: Vec<DaySignature>,
    /// Set when any of `lockedBySignature`, `isLocked` or `locked` is true.
    pub locked_by_signature: Option<bool>,
    pub km_locked_by_signature: Option<bool>,
    pub time_locked_by_signature: Option<bool>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawDayBundle {
    #[serde(deserialize_with = "lenient::list")]
    assignments: Vec<Assignment>,
    #[serde(deserialize_with = "lenient::list")]
    time_entries: Vec<TimeEntry>,
    #[serde(deserialize_with = "lenient::list")]
    time_adjustments: Vec<TimeAdjustment>,
    #[serde(deserialize_with = "lenient::list")]
    km_adjustments: Vec<KmAdjustment>,
    #[serde(deserialize_with = "lenient::list")]
    audit_logs: Vec<AuditLogEntry>,
    #[serde(deserialize_with = "lenient::list")]
    audit_log: Vec<AuditLogEntry>,
    #[serde(deserialize_with = "lenient::list")]
    signatures: Vec<DaySignature>,
    #[serde(deserialize_with = "lenient::opt_bool")]
    locked_by_signature: Option<bool>,
    #[serde(deserialize_with = "lenient::opt_bool")]
    is_locked: Option<bool>,
    #[serde(deserialize_with = "lenient::opt_bool")]
    locked: Option<bool>,
    #[serde(deserialize_with = "lenient::opt_bool")]
    km_locked_by_signature: Option<bool>,
    #[serde(deserialize_with = "lenient::opt_bool")]
    time_locked_by_signature: Option<bool>,
}

impl From<RawDayBundle> for DayBundle {
    fn from(raw: RawDayBundle) -> Self {
        let flags = [raw.locked_by_signature, raw.is_locked, raw.locked];
        let locked_by_signature = if flags.contains(&Some(true)) {
            Some(true)
        } else {
            flags.into_iter().flatten().next()
        };

        let mut audit_logs = raw.audit_logs;
        audit_logs.extend(raw.audit_log);

        Self {
            assignments: raw.assignments,
            time_entries: raw.time_entries,
            time_adjustments: raw.time_adjustments,
            km_adjustments: raw.km_adjustments,
            audit_logs,
            signatures: raw.signatures,
            locked_by_signature,
            km_locked_by_signature: raw.km_locked_by_signature,
            time_locked_by_signature: raw.time_locked_by_signature,
        }
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Response of `GET /users/me`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CurrentUser {
    #[serde(deserialize_with = "lenient::id")]
    pub id: EntityId,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub email: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub role: String,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        crate::roles::is_admin(&self.role)
    }
}
