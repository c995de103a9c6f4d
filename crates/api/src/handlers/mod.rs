pub mod admin_assignments;
pub mod auth;
pub mod corrections;
pub mod customers;
pub mod entries;
pub mod me_assignments;
pub mod users;

use carehub_core::lenient;
use carehub_core::lifecycle::{AssignmentStatus, Permissions};
use serde_json::Value;

use crate::error::AppError;

/// Query string pairs passed through to the upstream API unchanged.
pub type ForwardQuery = Vec<(String, String)>;

/// Attach the derived `permissions` object to one raw assignment.
pub(crate) fn with_permissions(mut value: Value) -> Value {
    let status = value
        .get("status")
        .and_then(Value::as_str)
        .map(AssignmentStatus::parse)
        .unwrap_or_default();
    if let Value::Object(map) = &mut value {
        if let Ok(permissions) = serde_json::to_value(Permissions::for_status(status)) {
            map.insert("permissions".into(), permissions);
        }
    }
    value
}

/// Lenient list of assignments, each with its `permissions`.
pub(crate) fn assignment_list(value: Value) -> Vec<Value> {
    lenient::list_values(value)
        .into_iter()
        .map(with_permissions)
        .collect()
}

/// Reject bodies that are not JSON objects before forwarding them.
pub(crate) fn require_object(body: &Value) -> Result<(), AppError> {
    if body.is_object() {
        Ok(())
    } else {
        Err(AppError::BadRequest("Request body must be a JSON object".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn permissions_follow_status() {
        let value = with_permissions(json!({ "id": "a1", "status": "ASSIGNED" }));
        assert_eq!(value["permissions"]["ackAllowed"], true);
        assert_eq!(value["permissions"]["canAddTimeEntry"], false);
        assert_eq!(value["id"], "a1");
    }

    #[test]
    fn unknown_status_gets_closed_permissions() {
        let value = with_permissions(json!({ "id": "a1" }));
        assert_eq!(value["permissions"]["status"], "UNKNOWN");
        assert_eq!(value["permissions"]["markDoneAllowed"], false);
    }

    #[test]
    fn list_accepts_wrapped_payloads() {
        let items = assignment_list(json!({ "data": [{ "status": "DONE" }] }));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["permissions"]["canSign"], true);
    }
}
