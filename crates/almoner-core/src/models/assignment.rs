use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::Document;
use crate::keys;

/// A task handed to the social department by a clinical department.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Assignment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub requested_by_department: Uuid,
    pub kind: AssignmentKind,
    pub description: String,
    pub assignee_id: Option<Uuid>,
    pub status: AssignmentStatus,
    pub due_on: Option<jiff::civil::Date>,
    #[serde(default)]
    pub notes: Vec<AssignmentNote>,
    pub created_by: Uuid,
    pub created_at: jiff::Timestamp,
    pub updated_at: jiff::Timestamp,
    pub closed_at: Option<jiff::Timestamp>,
}

impl Document for Assignment {
    const COLLECTION: &'static str = keys::ASSIGNMENTS;

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Assignment {
    pub fn is_overdue(&self, today: jiff::civil::Date) -> bool {
        !self.status.is_closed() && self.due_on.is_some_and(|due| due < today)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum AssignmentKind {
    DocumentRestoration,
    PensionApplication,
    DisabilityReview,
    GuardianshipPetition,
    Placement,
    Benefits,
    Other,
}

impl AssignmentKind {
    pub fn label(self) -> &'static str {
        match self {
            AssignmentKind::DocumentRestoration => "document restoration",
            AssignmentKind::PensionApplication => "pension application",
            AssignmentKind::DisabilityReview => "disability review",
            AssignmentKind::GuardianshipPetition => "guardianship petition",
            AssignmentKind::Placement => "care placement",
            AssignmentKind::Benefits => "benefits",
            AssignmentKind::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum AssignmentStatus {
    Open,
    InProgress,
    Completed,
    Cancelled,
}

impl AssignmentStatus {
    pub fn is_closed(self) -> bool {
        matches!(self, AssignmentStatus::Completed | AssignmentStatus::Cancelled)
    }

    pub fn can_transition_to(self, next: AssignmentStatus) -> bool {
        use AssignmentStatus::*;
        matches!(
            (self, next),
            (Open, InProgress)
                | (Open, Cancelled)
                | (InProgress, Open)
                | (InProgress, Completed)
                | (InProgress, Cancelled)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AssignmentStatus::Open => "open",
            AssignmentStatus::InProgress => "in_progress",
            AssignmentStatus::Completed => "completed",
            AssignmentStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AssignmentNote {
    pub author_id: Uuid,
    pub author_name: String,
    pub body: String,
    pub created_at: jiff::Timestamp,
}
