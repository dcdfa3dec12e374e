use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use almoner_core::keys;
use almoner_core::models::Document;

use crate::error::StorageError;
use crate::json;
use crate::store::{DocumentStore, Precondition};

/// A document together with the ETag it was read at.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Versioned<T> {
    #[serde(flatten)]
    pub value: T,
    #[serde(skip)]
    pub etag: String,
}

impl<T> Versioned<T> {
    pub fn into_inner(self) -> T {
        self.value
    }
}

/// Typed access to one document collection.
pub struct Repository<T> {
    store: Arc<dyn DocumentStore>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _marker: PhantomData,
        }
    }
}

impl<T: Document> Repository<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub async fn get(&self, id: Uuid) -> Result<Versioned<T>, StorageError> {
        let (value, etag) = json::load_json(self.store.as_ref(), &T::key_for(id)).await?;
        Ok(Versioned { value, etag })
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<Versioned<T>>, StorageError> {
        let found = json::find_json(self.store.as_ref(), &T::key_for(id)).await?;
        Ok(found.map(|(value, etag)| Versioned { value, etag }))
    }

    /// Every document in the collection, in key order.
    ///
    /// Documents deleted between listing and loading are skipped.
    pub async fn list(&self) -> Result<Vec<Versioned<T>>, StorageError> {
        let keys = self.store.list(T::COLLECTION).await?;

        let mut docs = Vec::with_capacity(keys.len());
        for key in keys
            .iter()
            .filter(|key| keys::document_id(T::COLLECTION, key).is_some())
        {
            match json::load_json(self.store.as_ref(), key).await {
                Ok((value, etag)) => docs.push(Versioned { value, etag }),
                Err(StorageError::NotFound { .. }) => {
                    tracing::debug!(key = %key, "document vanished during listing");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(docs)
    }

    /// Store a new document. Fails with `PreconditionFailed` if the id is taken.
    pub async fn insert(&self, doc: &T) -> Result<String, StorageError> {
        json::save_json(self.store.as_ref(), &doc.key(), doc, Precondition::IfAbsent).await
    }

    /// Overwrite a document read at `etag`.
    pub async fn replace(&self, doc: &T, etag: &str) -> Result<String, StorageError> {
        json::save_json(
            self.store.as_ref(),
            &doc.key(),
            doc,
            Precondition::IfMatch(etag.to_string()),
        )
        .await
    }

    pub async fn delete(&self, id: Uuid, etag: Option<&str>) -> Result<(), StorageError> {
        let precondition = match etag {
            Some(etag) => Precondition::IfMatch(etag.to_string()),
            None => Precondition::None,
        };
        self.store.delete(&T::key_for(id), precondition).await
    }
}
