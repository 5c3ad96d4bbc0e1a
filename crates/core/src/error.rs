use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// The request would have no visible effect because the active window
    /// excludes the current instant.
    #[error("Outside active window: {0}")]
    OutOfWindow(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
