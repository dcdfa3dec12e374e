use thiserror::Error;
use uuid::Uuid;

use almoner_core::error::CoreError;
use almoner_core::validation::{ValidationError, ValidationErrors};
use almoner_storage::error::StorageError;

#[derive(Debug, Error)]
pub enum CaseError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: Uuid },

    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// Stale ETag or a uniqueness clash.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The record's current state does not allow the operation.
    #[error("{0}")]
    InvalidState(String),

    #[error("core error: {0}")]
    Core(CoreError),

    #[error("storage error: {0}")]
    Storage(StorageError),

    #[error("audit error: {0}")]
    Audit(#[from] almoner_audit::error::AuditError),
}

impl CaseError {
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        CaseError::Validation(ValidationErrors(vec![ValidationError::new(field, message)]))
    }
}

impl From<StorageError> for CaseError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::PreconditionFailed { key } => {
                CaseError::Conflict(format!("{key} was modified concurrently"))
            }
            other => CaseError::Storage(other),
        }
    }
}

impl From<CoreError> for CaseError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(errors) => CaseError::Validation(errors),
            other => CaseError::Core(other),
        }
    }
}
