use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use almoner_core::keys::JSON_CONTENT_TYPE;
use almoner_core::models::Document;

use crate::claim::Claim;
use crate::error::StorageError;
use crate::store::{DocumentStore, Precondition, StoredObject};

enum Operation {
    Put {
        key: String,
        body: Vec<u8>,
        precondition: Precondition,
    },
    Delete {
        key: String,
        precondition: Precondition,
    },
}

impl Operation {
    fn key(&self) -> &str {
        match self {
            Operation::Put { key, .. } | Operation::Delete { key, .. } => key,
        }
    }
}

/// What a write replaced, so it can be put back.
struct Applied {
    key: String,
    prior: Option<StoredObject>,
}

/// New ETags of the documents written by a committed unit of work.
#[derive(Debug, Default)]
pub struct CommitReceipt {
    etags: HashMap<String, String>,
}

impl CommitReceipt {
    pub fn etag(&self, key: &str) -> Option<&str> {
        self.etags.get(key).map(String::as_str)
    }

    pub fn etag_of<T: Document>(&self, doc: &T) -> Option<&str> {
        self.etag(&doc.key())
    }
}

/// A batch of document writes applied all-or-nothing.
///
/// The store has no multi-object transactions, so atomicity is emulated:
/// each write snapshots the object it touches, and a failed commit restores
/// those snapshots in reverse order. Concurrent readers may observe the
/// intermediate state, and a compensating write can clobber a concurrent
/// writer that slipped in between.
pub struct UnitOfWork {
    store: Arc<dyn DocumentStore>,
    operations: Vec<Operation>,
}

impl UnitOfWork {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            operations: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Stage a new document; the commit fails if it already exists.
    pub fn insert<T: Document>(&mut self, doc: &T) -> Result<(), StorageError> {
        self.put_json(doc.key(), doc, Precondition::IfAbsent)
    }

    /// Stage an overwrite of a document last read at `etag`.
    pub fn replace<T: Document>(
        &mut self,
        doc: &T,
        etag: impl Into<String>,
    ) -> Result<(), StorageError> {
        self.put_json(doc.key(), doc, Precondition::IfMatch(etag.into()))
    }

    pub fn delete<T: Document>(&mut self, id: Uuid, etag: Option<String>) {
        let precondition = match etag {
            Some(etag) => Precondition::IfMatch(etag),
            None => Precondition::None,
        };
        self.operations.push(Operation::Delete {
            key: T::key_for(id),
            precondition,
        });
    }

    /// Stage a claim on a unique value; the commit fails if it is taken.
    pub fn claim(&mut self, key: impl Into<String>, owner: Uuid) -> Result<(), StorageError> {
        self.put_json(key, &Claim { owner }, Precondition::IfAbsent)
    }

    /// Stage a JSON write under an arbitrary key. The value is serialized now.
    pub fn put_json<V: Serialize + ?Sized>(
        &mut self,
        key: impl Into<String>,
        value: &V,
        precondition: Precondition,
    ) -> Result<(), StorageError> {
        let body = serde_json::to_vec_pretty(value)?;
        self.operations.push(Operation::Put {
            key: key.into(),
            body,
            precondition,
        });
        Ok(())
    }

    /// Apply every staged operation in order.
    ///
    /// On the first failure, already-applied operations are compensated in
    /// reverse order and the original error is returned.
    pub async fn commit(self) -> Result<CommitReceipt, StorageError> {
        let UnitOfWork { store, operations } = self;
        let total = operations.len();

        let mut receipt = CommitReceipt::default();
        let mut applied: Vec<Applied> = Vec::with_capacity(total);

        for operation in operations {
            let key = operation.key().to_string();
            let prior = match store.get(&key).await {
                Ok(object) => Some(object),
                Err(StorageError::NotFound { .. }) => None,
                Err(e) => {
                    rollback(store.as_ref(), applied).await;
                    return Err(e);
                }
            };

            let result = match operation {
                Operation::Put {
                    key,
                    body,
                    precondition,
                } => store
                    .put(&key, body, Some(JSON_CONTENT_TYPE), precondition)
                    .await
                    .map(|etag| {
                        receipt.etags.insert(key, etag);
                    }),
                Operation::Delete { key, precondition } => store.delete(&key, precondition).await,
            };

            match result {
                Ok(()) => applied.push(Applied { key, prior }),
                Err(e) => {
                    debug!(key = %key, error = %e, "unit of work step failed, rolling back");
                    rollback(store.as_ref(), applied).await;
                    return Err(e);
                }
            }
        }

        debug!(operations = total, "unit of work committed");
        Ok(receipt)
    }
}

async fn rollback(store: &dyn DocumentStore, applied: Vec<Applied>) {
    for Applied { key, prior } in applied.into_iter().rev() {
        let result = match prior {
            Some(object) => store
                .put(&key, object.body, Some(JSON_CONTENT_TYPE), Precondition::None)
                .await
                .map(|_| ()),
            None => store.delete(&key, Precondition::None).await,
        };
        if let Err(e) = result {
            warn!(key = %key, error = %e, "failed to compensate write during rollback");
        }
    }
}
