use std::cmp::Ordering;

use jiff::Timestamp;
use jiff::civil::Date;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use almoner_audit::events::AuditEvent;
use almoner_core::models::activity::{ActivityAction, Actor, ResourceType};
use almoner_core::models::assignment::{
    Assignment, AssignmentKind, AssignmentNote, AssignmentStatus,
};
use almoner_core::models::department::Department;
use almoner_core::models::patient::Patient;
use almoner_core::models::user::{Permission, UserAccount};
use almoner_core::validation::validate_all;
use almoner_storage::repository::{Repository, Versioned};

use crate::departments::require_active;
use crate::error::CaseError;
use crate::{CaseStore, commit, today, versioned};

#[derive(Debug, Clone, Deserialize)]
pub struct NewAssignment {
    pub patient_id: Uuid,
    pub requested_by_department: Uuid,
    pub kind: AssignmentKind,
    pub description: String,
    #[serde(default)]
    pub due_on: Option<Date>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssignmentFilter {
    pub patient_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub status: Option<AssignmentStatus>,
    /// Only assignments overdue on this day.
    pub overdue_as_of: Option<Date>,
}

impl AssignmentFilter {
    fn matches(&self, a: &Assignment) -> bool {
        self.patient_id.is_none_or(|id| a.patient_id == id)
            && self.assignee_id.is_none_or(|id| a.assignee_id == Some(id))
            && self
                .department_id
                .is_none_or(|id| a.requested_by_department == id)
            && self.status.is_none_or(|s| a.status == s)
            && self.overdue_as_of.is_none_or(|day| a.is_overdue(day))
    }
}

/// Due date first (undated last), then creation time.
fn by_due_date(a: &Assignment, b: &Assignment) -> Ordering {
    match (a.due_on, b.due_on) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.created_at.cmp(&b.created_at))
}

/// Work requested from the social department by clinical departments.
#[derive(Clone)]
pub struct AssignmentService {
    cases: CaseStore,
    assignments: Repository<Assignment>,
    patients: Repository<Patient>,
    departments: Repository<Department>,
    users: Repository<UserAccount>,
}

impl AssignmentService {
    pub fn new(cases: CaseStore) -> Self {
        let store = cases.store().clone();
        Self {
            assignments: Repository::new(store.clone()),
            patients: Repository::new(store.clone()),
            departments: Repository::new(store.clone()),
            users: Repository::new(store),
            cases,
        }
    }

    pub async fn create(
        &self,
        actor: &Actor,
        new: NewAssignment,
    ) -> Result<Versioned<Assignment>, CaseError> {
        let patient = self
            .patients
            .find(new.patient_id)
            .await?
            .ok_or_else(|| CaseError::invalid("patient_id", "unknown patient"))?
            .into_inner();
        if patient.archived {
            return Err(CaseError::InvalidState(
                "cannot open an assignment for an archived patient".to_string(),
            ));
        }
        let department = require_active(
            &self.departments,
            "requested_by_department",
            new.requested_by_department,
        )
        .await?;

        let now = Timestamp::now();
        let assignment = Assignment {
            id: Uuid::new_v4(),
            patient_id: patient.id,
            requested_by_department: department.id,
            kind: new.kind,
            description: new.description.trim().to_string(),
            assignee_id: None,
            status: AssignmentStatus::Open,
            due_on: new.due_on,
            notes: Vec::new(),
            created_by: actor.id,
            created_at: now,
            updated_at: now,
            closed_at: None,
        };
        validate_all(&assignment, today())?;

        let event = AuditEvent::new(ActivityAction::Create, ResourceType::Assignment, actor)
            .resource(assignment.id)
            .summary(format!(
                "{} requested {} for {}",
                department.code,
                assignment.kind.label(),
                patient.name.full()
            ))
            .with_details(json!({ "patient_id": patient.id }));

        let mut uow = self.cases.unit();
        uow.insert(&assignment)?;
        let record = self.cases.trail().stage(&mut uow, event)?;
        let receipt = commit(uow, &[record]).await?;

        info!(assignment_id = %assignment.id, patient_id = %patient.id, "assignment created");
        Ok(versioned(&receipt, assignment))
    }

    pub async fn get(&self, id: Uuid) -> Result<Versioned<Assignment>, CaseError> {
        self.assignments.find(id).await?.ok_or(CaseError::NotFound {
            kind: "assignment",
            id,
        })
    }

    pub async fn list(
        &self,
        filter: &AssignmentFilter,
    ) -> Result<Vec<Versioned<Assignment>>, CaseError> {
        let mut assignments: Vec<_> = self
            .assignments
            .list()
            .await?
            .into_iter()
            .filter(|a| filter.matches(&a.value))
            .collect();
        assignments.sort_by(|a, b| by_due_date(&a.value, &b.value));
        Ok(assignments)
    }

    /// Set or clear the assignee. Picking someone up starts the work;
    /// clearing the assignee hands in-progress work back to the queue.
    pub async fn assign(
        &self,
        actor: &Actor,
        id: Uuid,
        etag: &str,
        assignee: Option<Uuid>,
    ) -> Result<Versioned<Assignment>, CaseError> {
        let mut assignment = self.open_for_changes(id).await?;

        let summary = match assignee {
            Some(user_id) => {
                let user = self
                    .users
                    .find(user_id)
                    .await?
                    .ok_or_else(|| CaseError::invalid("assignee_id", "unknown user"))?
                    .into_inner();
                if !user.can(Permission::WorkAssignments) {
                    return Err(CaseError::invalid(
                        "assignee_id",
                        format!("{} cannot work assignments", user.username),
                    ));
                }
                if assignment.status == AssignmentStatus::Open {
                    assignment.status = AssignmentStatus::InProgress;
                }
                format!("assigned to {}", user.display_name)
            }
            None => {
                if assignment.status == AssignmentStatus::InProgress {
                    assignment.status = AssignmentStatus::Open;
                }
                "unassigned".to_string()
            }
        };
        let previous = std::mem::replace(&mut assignment.assignee_id, assignee);

        let event = AuditEvent::new(ActivityAction::Assign, ResourceType::Assignment, actor)
            .resource(id)
            .summary(summary)
            .with_details(json!({
                "from": previous,
                "to": assignee,
                "status": assignment.status.as_str(),
            }));
        self.save(assignment, etag, event).await
    }

    pub async fn transition(
        &self,
        actor: &Actor,
        id: Uuid,
        etag: &str,
        next: AssignmentStatus,
    ) -> Result<Versioned<Assignment>, CaseError> {
        let mut assignment = self.get(id).await?.into_inner();
        let from = assignment.status;
        if !from.can_transition_to(next) {
            return Err(CaseError::InvalidState(format!(
                "cannot move assignment from {from} to {next}"
            )));
        }
        if next == AssignmentStatus::Completed && assignment.assignee_id.is_none() {
            return Err(CaseError::InvalidState(
                "an assignment needs an assignee to be completed".to_string(),
            ));
        }

        assignment.status = next;
        if next.is_closed() {
            assignment.closed_at = Some(Timestamp::now());
        }

        let event = AuditEvent::new(ActivityAction::StatusChange, ResourceType::Assignment, actor)
            .resource(id)
            .summary(format!("assignment {from} -> {next}"))
            .with_details(json!({ "from": from, "to": next }));
        self.save(assignment, etag, event).await
    }

    pub async fn add_note(
        &self,
        actor: &Actor,
        id: Uuid,
        etag: &str,
        body: &str,
    ) -> Result<Versioned<Assignment>, CaseError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(CaseError::invalid("body", "note is empty"));
        }
        let mut assignment = self.open_for_changes(id).await?;
        assignment.notes.push(AssignmentNote {
            author_id: actor.id,
            author_name: actor.name.clone(),
            body: body.to_string(),
            created_at: Timestamp::now(),
        });

        let event = AuditEvent::new(ActivityAction::Update, ResourceType::Assignment, actor)
            .resource(id)
            .summary("added a note");
        self.save(assignment, etag, event).await
    }

    async fn open_for_changes(&self, id: Uuid) -> Result<Assignment, CaseError> {
        let assignment = self.get(id).await?.into_inner();
        if assignment.status.is_closed() {
            return Err(CaseError::InvalidState(format!(
                "assignment is {}",
                assignment.status
            )));
        }
        Ok(assignment)
    }

    async fn save(
        &self,
        mut assignment: Assignment,
        etag: &str,
        event: AuditEvent,
    ) -> Result<Versioned<Assignment>, CaseError> {
        assignment.updated_at = Timestamp::now();

        let mut uow = self.cases.unit();
        uow.replace(&assignment, etag)?;
        let record = self.cases.trail().stage(&mut uow, event)?;
        let receipt = commit(uow, &[record]).await?;
        Ok(versioned(&receipt, assignment))
    }
}
