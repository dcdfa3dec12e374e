use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("storage error: {0}")]
    Storage(#[from] almoner_storage::error::StorageError),

    #[error("invalid filter: {0}")]
    InvalidFilter(String),
}
