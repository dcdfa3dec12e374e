use async_trait::async_trait;

use crate::error::StorageError;

/// Condition a write must satisfy against the object's current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    /// Unconditional.
    None,
    /// The object must exist with exactly this ETag.
    IfMatch(String),
    /// The object must not exist.
    IfAbsent,
}

/// An object body together with the ETag it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub etag: String,
}

/// Key/value document storage with ETag-based optimistic locking.
///
/// Keys follow the layout in `almoner_core::keys`. Implementations must
/// report failed preconditions as [`StorageError::PreconditionFailed`] and
/// missing objects on read as [`StorageError::NotFound`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<StoredObject, StorageError>;

    /// Write an object and return its new ETag.
    async fn put(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
        precondition: Precondition,
    ) -> Result<String, StorageError>;

    /// Delete an object. Deleting a missing object is a no-op unless an
    /// `IfMatch` precondition was given.
    async fn delete(&self, key: &str, precondition: Precondition) -> Result<(), StorageError>;

    /// Keys under a prefix, in lexical order.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Delete every object under a prefix. Returns the number deleted.
    async fn delete_prefix(&self, prefix: &str) -> Result<usize, StorageError> {
        let keys = self.list(prefix).await?;
        for key in &keys {
            self.delete(key, Precondition::None).await?;
        }
        Ok(keys.len())
    }
}
