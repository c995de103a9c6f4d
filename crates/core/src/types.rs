/// Upstream identifiers are opaque strings (the API issues them, we never parse them).
pub type EntityId = String;
