use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("index not found in the document store")]
    IndexNotFound,

    #[error("index corrupted: {0}")]
    IndexCorrupted(String),

    #[error("tantivy error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),

    #[error("query parse error: {0}")]
    QueryParse(String),

    #[error("storage error: {0}")]
    Storage(#[from] almoner_storage::error::StorageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ETag mismatch: index was modified by another writer")]
    ETagMismatch,
}
