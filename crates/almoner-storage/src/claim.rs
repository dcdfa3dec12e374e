use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StorageError;
use crate::json;
use crate::store::DocumentStore;

/// Marks a unique value as taken.
///
/// A claim is written with `IfAbsent` in the same unit of work as the record
/// that owns it, so of two concurrent writers only one can take the value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub owner: Uuid,
}

/// Owner of the claim stored at `key`.
pub async fn owner(store: &dyn DocumentStore, key: &str) -> Result<Option<Uuid>, StorageError> {
    let found = json::find_json::<Claim>(store, key).await?;
    Ok(found.map(|(claim, _)| claim.owner))
}
