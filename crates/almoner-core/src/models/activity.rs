use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// One entry in the audit trail of user activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ActivityRecord {
    pub id: Uuid,
    pub occurred_at: jiff::Timestamp,
    pub actor: Actor,
    pub action: ActivityAction,
    pub resource_type: ResourceType,
    pub resource_id: Option<Uuid>,
    pub summary: String,
    pub details: Option<serde_json::Value>,
}

/// Who performed an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Actor {
    pub id: Uuid,
    pub name: String,
}

impl Actor {
    /// Actor for work done by the system itself (bootstrap, maintenance).
    pub fn system() -> Self {
        Self {
            id: Uuid::nil(),
            name: "system".to_string(),
        }
    }

    pub fn is_system(&self) -> bool {
        self.id.is_nil()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ActivityAction {
    Create,
    Update,
    View,
    Archive,
    Restore,
    Delete,
    Export,
    Assign,
    StatusChange,
    RoleChange,
    Activate,
    Deactivate,
}

impl ActivityAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityAction::Create => "create",
            ActivityAction::Update => "update",
            ActivityAction::View => "view",
            ActivityAction::Archive => "archive",
            ActivityAction::Restore => "restore",
            ActivityAction::Delete => "delete",
            ActivityAction::Export => "export",
            ActivityAction::Assign => "assign",
            ActivityAction::StatusChange => "status_change",
            ActivityAction::RoleChange => "role_change",
            ActivityAction::Activate => "activate",
            ActivityAction::Deactivate => "deactivate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ResourceType {
    Patient,
    Assignment,
    Department,
    User,
    SearchIndex,
}

impl ResourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Patient => "patient",
            ResourceType::Assignment => "assignment",
            ResourceType::Department => "department",
            ResourceType::User => "user",
            ResourceType::SearchIndex => "search_index",
        }
    }
}
