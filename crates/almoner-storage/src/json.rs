use serde::{Serialize, de::DeserializeOwned};

use almoner_core::keys::JSON_CONTENT_TYPE;

use crate::error::StorageError;
use crate::store::{DocumentStore, Precondition};

/// Load a JSON document. Returns the deserialized value and its ETag.
pub async fn load_json<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    key: &str,
) -> Result<(T, String), StorageError> {
    let object = store.get(key).await?;
    let value: T = serde_json::from_slice(&object.body)?;
    Ok((value, object.etag))
}

/// Like [`load_json`] but maps a missing document to `None`.
pub async fn find_json<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    key: &str,
) -> Result<Option<(T, String)>, StorageError> {
    match load_json(store, key).await {
        Ok(found) => Ok(Some(found)),
        Err(StorageError::NotFound { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Save a JSON document under a precondition. Returns the new ETag.
pub async fn save_json<T: Serialize + ?Sized>(
    store: &dyn DocumentStore,
    key: &str,
    value: &T,
    precondition: Precondition,
) -> Result<String, StorageError> {
    let body = serde_json::to_vec_pretty(value)?;
    store
        .put(key, body, Some(JSON_CONTENT_TYPE), precondition)
        .await
}
