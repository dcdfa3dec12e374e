use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::keys;

pub mod activity;
pub mod assignment;
pub mod department;
pub mod documents;
pub mod legal;
pub mod medical;
pub mod patient;
pub mod pension;
pub mod user;

/// A record persisted as one JSON object under a collection prefix.
pub trait Document: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Key prefix shared by every document of this type, e.g. `patients/`.
    const COLLECTION: &'static str;

    fn id(&self) -> Uuid;

    fn key_for(id: Uuid) -> String {
        keys::document(Self::COLLECTION, id)
    }

    fn key(&self) -> String {
        Self::key_for(self.id())
    }
}
