use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::Document;
use crate::keys;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Department {
    pub id: Uuid,
    /// Short unique code, e.g. `CARD-2`.
    pub code: String,
    pub name: String,
    pub active: bool,
    pub created_at: jiff::Timestamp,
    pub updated_at: jiff::Timestamp,
}

impl Document for Department {
    const COLLECTION: &'static str = keys::DEPARTMENTS;

    fn id(&self) -> Uuid {
        self.id
    }
}
