use jiff::Timestamp;
use tracing::info;
use uuid::Uuid;

use almoner_audit::events::{self, AuditEvent};
use almoner_core::keys;
use almoner_core::models::activity::{ActivityAction, Actor, ResourceType};
use almoner_core::models::department::Department;
use almoner_core::validation::validate_all;
use almoner_storage::claim;
use almoner_storage::error::StorageError;
use almoner_storage::repository::{Repository, Versioned};

use crate::error::CaseError;
use crate::{CaseStore, commit, today, versioned};

/// Hospital departments that request social work.
#[derive(Clone)]
pub struct DepartmentService {
    cases: CaseStore,
    departments: Repository<Department>,
}

impl DepartmentService {
    pub fn new(cases: CaseStore) -> Self {
        let departments = Repository::new(cases.store().clone());
        Self { cases, departments }
    }

    /// Codes are stored upper-cased and must be unique.
    pub async fn create(
        &self,
        actor: &Actor,
        code: &str,
        name: &str,
    ) -> Result<Versioned<Department>, CaseError> {
        let now = Timestamp::now();
        let department = Department {
            id: Uuid::new_v4(),
            code: code.trim().to_uppercase(),
            name: name.trim().to_string(),
            active: true,
            created_at: now,
            updated_at: now,
        };
        validate_all(&department, today())?;

        let claim_key = keys::department_code_claim(&department.code);
        if claim::owner(self.cases.store().as_ref(), &claim_key)
            .await?
            .is_some()
        {
            return Err(code_taken(&department.code));
        }

        let event = AuditEvent::new(ActivityAction::Create, ResourceType::Department, actor)
            .resource(department.id)
            .summary(format!("created department {}", department.code));

        let mut uow = self.cases.unit();
        uow.insert(&department)?;
        uow.claim(claim_key.clone(), department.id)?;
        let record = self.cases.trail().stage(&mut uow, event)?;
        let receipt = uow.commit().await.map_err(|e| match e {
            StorageError::PreconditionFailed { key } if key == claim_key => {
                code_taken(&department.code)
            }
            other => other.into(),
        })?;
        events::emit(&record);

        info!(department_id = %department.id, code = %department.code, "department created");
        Ok(versioned(&receipt, department))
    }

    pub async fn get(&self, id: Uuid) -> Result<Versioned<Department>, CaseError> {
        self.departments
            .find(id)
            .await?
            .ok_or(CaseError::NotFound {
                kind: "department",
                id,
            })
    }

    /// Departments sorted by name.
    pub async fn list(&self, include_inactive: bool) -> Result<Vec<Versioned<Department>>, CaseError> {
        let mut departments: Vec<_> = self
            .departments
            .list()
            .await?
            .into_iter()
            .filter(|d| include_inactive || d.value.active)
            .collect();
        departments.sort_by_key(|d| d.value.name.to_lowercase());
        Ok(departments)
    }

    pub async fn rename(
        &self,
        actor: &Actor,
        id: Uuid,
        etag: &str,
        name: &str,
    ) -> Result<Versioned<Department>, CaseError> {
        let mut department = self.get(id).await?.into_inner();
        let previous = std::mem::replace(&mut department.name, name.trim().to_string());
        validate_all(&department, today())?;

        let event = AuditEvent::new(ActivityAction::Update, ResourceType::Department, actor)
            .resource(id)
            .summary(format!("renamed department {}", department.code))
            .with_details(serde_json::json!({ "from": previous, "to": department.name }));
        self.save(department, etag, event).await
    }

    pub async fn deactivate(
        &self,
        actor: &Actor,
        id: Uuid,
        etag: &str,
    ) -> Result<Versioned<Department>, CaseError> {
        self.set_active(actor, id, etag, false).await
    }

    pub async fn activate(
        &self,
        actor: &Actor,
        id: Uuid,
        etag: &str,
    ) -> Result<Versioned<Department>, CaseError> {
        self.set_active(actor, id, etag, true).await
    }

    async fn set_active(
        &self,
        actor: &Actor,
        id: Uuid,
        etag: &str,
        active: bool,
    ) -> Result<Versioned<Department>, CaseError> {
        let mut department = self.get(id).await?.into_inner();
        department.active = active;

        let (action, verb) = if active {
            (ActivityAction::Activate, "activated")
        } else {
            (ActivityAction::Deactivate, "deactivated")
        };
        let event = AuditEvent::new(action, ResourceType::Department, actor)
            .resource(id)
            .summary(format!("{verb} department {}", department.code));
        self.save(department, etag, event).await
    }

    async fn save(
        &self,
        mut department: Department,
        etag: &str,
        event: AuditEvent,
    ) -> Result<Versioned<Department>, CaseError> {
        department.updated_at = Timestamp::now();

        let mut uow = self.cases.unit();
        uow.replace(&department, etag)?;
        let record = self.cases.trail().stage(&mut uow, event)?;
        let receipt = commit(uow, &[record]).await?;
        Ok(versioned(&receipt, department))
    }
}

fn code_taken(code: &str) -> CaseError {
    CaseError::Conflict(format!("department code {code} is already in use"))
}

/// Look up a department that new work may be filed against.
pub(crate) async fn require_active(
    departments: &Repository<Department>,
    field: &str,
    id: Uuid,
) -> Result<Department, CaseError> {
    match departments.find(id).await? {
        Some(found) if found.value.active => Ok(found.into_inner()),
        Some(found) => Err(CaseError::invalid(
            field,
            format!("department {} is inactive", found.value.code),
        )),
        None => Err(CaseError::invalid(field, "unknown department")),
    }
}
