use tracing::info;
use uuid::Uuid;

use almoner_core::models::activity::{ActivityAction, ActivityRecord, Actor, ResourceType};

/// A structured audit event describing one user action.
///
/// Events are emitted via `tracing` so they reach the log pipeline, and
/// persisted through [`crate::trail::AuditTrail`] so they can be queried.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub action: ActivityAction,
    pub resource_type: ResourceType,
    pub resource_id: Option<Uuid>,
    pub actor: Actor,
    pub summary: String,
    pub details: Option<serde_json::Value>,
}

impl AuditEvent {
    pub fn new(action: ActivityAction, resource_type: ResourceType, actor: &Actor) -> Self {
        Self {
            action,
            resource_type,
            resource_id: None,
            actor: actor.clone(),
            summary: String::new(),
            details: None,
        }
    }

    pub fn resource(mut self, id: Uuid) -> Self {
        self.resource_id = Some(id);
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn into_record(self, occurred_at: jiff::Timestamp) -> ActivityRecord {
        ActivityRecord {
            id: Uuid::new_v4(),
            occurred_at,
            actor: self.actor,
            action: self.action,
            resource_type: self.resource_type,
            resource_id: self.resource_id,
            summary: self.summary,
            details: self.details,
        }
    }
}

/// Emit a persisted activity record via tracing.
pub fn emit(record: &ActivityRecord) {
    let resource_id = record
        .resource_id
        .map(|id| id.to_string())
        .unwrap_or_default();
    info!(
        audit.id = %record.id,
        audit.action = record.action.as_str(),
        audit.resource_type = record.resource_type.as_str(),
        audit.resource_id = %resource_id,
        audit.actor_id = %record.actor.id,
        audit.actor = %record.actor.name,
        "{}",
        record.summary
    );
}
