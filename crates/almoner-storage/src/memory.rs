use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StorageError;
use crate::store::{DocumentStore, Precondition, StoredObject};

/// In-process [`DocumentStore`] with the same precondition semantics as S3.
///
/// Used by tests and by `ALMONER_STORE=memory` for local runs. ETags are
/// drawn from a store-wide counter, so every write yields a fresh one.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    objects: BTreeMap<String, StoredObject>,
    version: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub async fn len(&self) -> usize {
        self.inner.read().await.objects.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn check(
    key: &str,
    current: Option<&StoredObject>,
    precondition: &Precondition,
) -> Result<(), StorageError> {
    let ok = match (precondition, current) {
        (Precondition::None, _) => true,
        (Precondition::IfAbsent, existing) => existing.is_none(),
        (Precondition::IfMatch(etag), Some(existing)) => existing.etag == *etag,
        (Precondition::IfMatch(_), None) => false,
    };
    if ok {
        Ok(())
    } else {
        Err(StorageError::PreconditionFailed {
            key: key.to_string(),
        })
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<StoredObject, StorageError> {
        self.inner
            .read()
            .await
            .objects
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                key: key.to_string(),
            })
    }

    async fn put(
        &self,
        key: &str,
        body: Vec<u8>,
        _content_type: Option<&str>,
        precondition: Precondition,
    ) -> Result<String, StorageError> {
        let mut inner = self.inner.write().await;
        check(key, inner.objects.get(key), &precondition)?;

        inner.version += 1;
        let etag = format!("\"{:016x}\"", inner.version);
        inner.objects.insert(
            key.to_string(),
            StoredObject {
                body,
                etag: etag.clone(),
            },
        );
        Ok(etag)
    }

    async fn delete(&self, key: &str, precondition: Precondition) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        check(key, inner.objects.get(key), &precondition)?;
        inner.objects.remove(key);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let inner = self.inner.read().await;
        Ok(inner
            .objects
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect())
    }
}
