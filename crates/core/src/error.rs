#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A time or kilometer write hit a day that is frozen by a signature.
    #[error("Day is locked after signature: {0}")]
    LockedAfterSignature(String),

    /// A write that requires a confirmed assignment was attempted too early.
    #[error("Assignment not confirmed: {0}")]
    AssignmentNotConfirmed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
