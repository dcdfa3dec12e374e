use jiff::Timestamp;
use jiff::civil::Date;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use almoner_audit::events::AuditEvent;
use almoner_core::models::activity::{ActivityAction, Actor, ResourceType};
use almoner_core::models::assignment::Assignment;
use almoner_core::models::department::Department;
use almoner_core::models::documents::{DocumentKind, IdentityDocuments};
use almoner_core::models::legal::LegalStatus;
use almoner_core::models::medical::{Disability, MedicalRecord};
use almoner_core::models::patient::{Address, Contact, Patient, PatientStatus, PersonName, Sex};
use almoner_core::models::pension::Pension;
use almoner_core::validation::validate_all;
use almoner_storage::repository::{Repository, Versioned};

use crate::departments::require_active;
use crate::error::CaseError;
use crate::{CaseStore, commit, today, versioned};

#[derive(Debug, Clone, Deserialize)]
pub struct NewPatient {
    pub name: PersonName,
    pub date_of_birth: Date,
    pub sex: Sex,
    pub department_id: Uuid,
    #[serde(default)]
    pub ward: Option<String>,
    #[serde(default)]
    pub registered_address: Option<Address>,
    pub admitted_on: Date,
    #[serde(default)]
    pub documents: IdentityDocuments,
    #[serde(default)]
    pub medical: Option<MedicalRecord>,
    #[serde(default)]
    pub legal: LegalStatus,
    #[serde(default)]
    pub pension: Option<Pension>,
    #[serde(default)]
    pub disability: Option<Disability>,
    #[serde(default)]
    pub relatives: Vec<Contact>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// The editable part of a patient record. Status and discharge are changed
/// through their own operations.
#[derive(Debug, Clone, Deserialize)]
pub struct PatientUpdate {
    pub name: PersonName,
    pub date_of_birth: Date,
    pub sex: Sex,
    #[serde(default)]
    pub department_id: Option<Uuid>,
    #[serde(default)]
    pub ward: Option<String>,
    #[serde(default)]
    pub registered_address: Option<Address>,
    pub admitted_on: Date,
    #[serde(default)]
    pub documents: IdentityDocuments,
    #[serde(default)]
    pub medical: Option<MedicalRecord>,
    #[serde(default)]
    pub legal: LegalStatus,
    #[serde(default)]
    pub pension: Option<Pension>,
    #[serde(default)]
    pub disability: Option<Disability>,
    #[serde(default)]
    pub relatives: Vec<Contact>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientFilter {
    pub department_id: Option<Uuid>,
    pub status: Option<PatientStatus>,
    #[serde(default)]
    pub include_archived: bool,
    /// Case-insensitive substring of the full name.
    pub name: Option<String>,
}

impl PatientFilter {
    fn matches(&self, patient: &Patient) -> bool {
        if patient.archived && !self.include_archived {
            return false;
        }
        if self
            .department_id
            .is_some_and(|id| patient.department_id != Some(id))
        {
            return false;
        }
        if self.status.is_some_and(|s| patient.status != s) {
            return false;
        }
        match self.name.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => patient
                .name
                .full()
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            _ => true,
        }
    }
}

#[derive(Clone)]
pub struct PatientService {
    cases: CaseStore,
    patients: Repository<Patient>,
    assignments: Repository<Assignment>,
    departments: Repository<Department>,
}

impl PatientService {
    pub fn new(cases: CaseStore) -> Self {
        let store = cases.store().clone();
        Self {
            patients: Repository::new(store.clone()),
            assignments: Repository::new(store.clone()),
            departments: Repository::new(store),
            cases,
        }
    }

    pub async fn register(
        &self,
        actor: &Actor,
        new: NewPatient,
    ) -> Result<Versioned<Patient>, CaseError> {
        let now = Timestamp::now();
        let patient = Patient {
            id: Uuid::new_v4(),
            name: new.name,
            date_of_birth: new.date_of_birth,
            sex: new.sex,
            department_id: Some(new.department_id),
            ward: new.ward,
            registered_address: new.registered_address,
            admitted_on: new.admitted_on,
            discharged_on: None,
            status: PatientStatus::Inpatient,
            documents: new.documents,
            medical: new.medical,
            legal: new.legal,
            pension: new.pension,
            disability: new.disability,
            relatives: new.relatives,
            notes: new.notes,
            archived: false,
            created_by: actor.id,
            created_at: now,
            updated_at: now,
        };
        validate_all(&patient, today())?;
        require_active(&self.departments, "department_id", new.department_id).await?;

        let event = AuditEvent::new(ActivityAction::Create, ResourceType::Patient, actor)
            .resource(patient.id)
            .summary(format!("registered patient {}", patient.name.full()));

        let mut uow = self.cases.unit();
        uow.insert(&patient)?;
        let record = self.cases.trail().stage(&mut uow, event)?;
        let receipt = commit(uow, &[record]).await?;

        info!(patient_id = %patient.id, "patient registered");
        Ok(versioned(&receipt, patient))
    }

    pub async fn get(&self, id: Uuid) -> Result<Versioned<Patient>, CaseError> {
        self.patients
            .find(id)
            .await?
            .ok_or(CaseError::NotFound { kind: "patient", id })
    }

    /// Matching patients sorted by last, first and middle name.
    pub async fn list(&self, filter: &PatientFilter) -> Result<Vec<Versioned<Patient>>, CaseError> {
        let mut patients: Vec<_> = self
            .patients
            .list()
            .await?
            .into_iter()
            .filter(|p| filter.matches(&p.value))
            .collect();
        patients.sort_by_key(|p| p.value.name.sort_key());
        Ok(patients)
    }

    /// Every patient record, archived ones included.
    pub async fn all(&self) -> Result<Vec<Patient>, CaseError> {
        Ok(self
            .patients
            .list()
            .await?
            .into_iter()
            .map(Versioned::into_inner)
            .collect())
    }

    pub async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        etag: &str,
        update: PatientUpdate,
    ) -> Result<Versioned<Patient>, CaseError> {
        let mut patient = self.get(id).await?.into_inner();
        if patient.archived {
            return Err(CaseError::InvalidState(
                "archived patients cannot be edited".to_string(),
            ));
        }

        let moved_to = update
            .department_id
            .filter(|dep| patient.department_id != Some(*dep));

        patient.name = update.name;
        patient.date_of_birth = update.date_of_birth;
        patient.sex = update.sex;
        patient.department_id = update.department_id;
        patient.ward = update.ward;
        patient.registered_address = update.registered_address;
        patient.admitted_on = update.admitted_on;
        patient.documents = update.documents;
        patient.medical = update.medical;
        patient.legal = update.legal;
        patient.pension = update.pension;
        patient.disability = update.disability;
        patient.relatives = update.relatives;
        patient.notes = update.notes;
        validate_all(&patient, today())?;
        if let Some(department) = moved_to {
            require_active(&self.departments, "department_id", department).await?;
        }

        let event = AuditEvent::new(ActivityAction::Update, ResourceType::Patient, actor)
            .resource(id)
            .summary(format!("updated patient {}", patient.name.full()));
        self.save(patient, etag, event).await
    }

    pub async fn discharge(
        &self,
        actor: &Actor,
        id: Uuid,
        etag: &str,
        on: Date,
    ) -> Result<Versioned<Patient>, CaseError> {
        let mut patient = self.editable(id).await?;
        if patient.status != PatientStatus::Inpatient {
            return Err(CaseError::InvalidState(format!(
                "only inpatients can be discharged, patient is {}",
                patient.status.as_str()
            )));
        }
        if on < patient.admitted_on {
            return Err(CaseError::invalid(
                "discharged_on",
                "discharge is before admission",
            ));
        }
        patient.status = PatientStatus::Discharged;
        patient.discharged_on = Some(on);
        validate_all(&patient, today())?;

        let event = AuditEvent::new(ActivityAction::StatusChange, ResourceType::Patient, actor)
            .resource(id)
            .summary(format!("discharged patient {}", patient.name.full()))
            .with_details(json!({ "to": "discharged", "on": on }));
        self.save(patient, etag, event).await
    }

    /// Mark the patient deceased. The date of death closes the stay, so it
    /// is kept as the discharge date.
    pub async fn record_death(
        &self,
        actor: &Actor,
        id: Uuid,
        etag: &str,
        on: Date,
    ) -> Result<Versioned<Patient>, CaseError> {
        let mut patient = self.editable(id).await?;
        if patient.status == PatientStatus::Deceased {
            return Err(CaseError::InvalidState(
                "death is already recorded".to_string(),
            ));
        }
        if on < patient.admitted_on {
            return Err(CaseError::invalid(
                "discharged_on",
                "date of death is before admission",
            ));
        }
        if on > today() {
            return Err(CaseError::invalid(
                "discharged_on",
                "date of death is in the future",
            ));
        }
        let from = patient.status;
        patient.status = PatientStatus::Deceased;
        patient.discharged_on = Some(on);
        validate_all(&patient, today())?;

        let event = AuditEvent::new(ActivityAction::StatusChange, ResourceType::Patient, actor)
            .resource(id)
            .summary(format!("recorded death of {}", patient.name.full()))
            .with_details(json!({ "from": from.as_str(), "to": "deceased", "on": on }));
        self.save(patient, etag, event).await
    }

    pub async fn archive(
        &self,
        actor: &Actor,
        id: Uuid,
        etag: &str,
    ) -> Result<Versioned<Patient>, CaseError> {
        let mut patient = self.get(id).await?.into_inner();
        if patient.archived {
            return Err(CaseError::InvalidState("patient is already archived".to_string()));
        }
        let open = self
            .assignments_of(id)
            .await?
            .iter()
            .filter(|a| !a.status.is_closed())
            .count();
        if open > 0 {
            return Err(CaseError::InvalidState(format!(
                "patient has {open} open assignment(s)"
            )));
        }
        patient.archived = true;

        let event = AuditEvent::new(ActivityAction::Archive, ResourceType::Patient, actor)
            .resource(id)
            .summary(format!("archived patient {}", patient.name.full()));
        self.save(patient, etag, event).await
    }

    pub async fn restore(
        &self,
        actor: &Actor,
        id: Uuid,
        etag: &str,
    ) -> Result<Versioned<Patient>, CaseError> {
        let mut patient = self.get(id).await?.into_inner();
        if !patient.archived {
            return Err(CaseError::InvalidState("patient is not archived".to_string()));
        }
        patient.archived = false;

        let event = AuditEvent::new(ActivityAction::Restore, ResourceType::Patient, actor)
            .resource(id)
            .summary(format!("restored patient {}", patient.name.full()));
        self.save(patient, etag, event).await
    }

    /// Remove an archived patient together with all of their assignments.
    /// Returns the ids of the removed assignments.
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<Vec<Uuid>, CaseError> {
        let current = self.get(id).await?;
        if !current.value.archived {
            return Err(CaseError::InvalidState(
                "only archived patients can be deleted".to_string(),
            ));
        }

        let assignments = self
            .assignments
            .list()
            .await?
            .into_iter()
            .filter(|a| a.value.patient_id == id)
            .collect::<Vec<_>>();

        let mut uow = self.cases.unit();
        for assignment in &assignments {
            uow.delete::<Assignment>(assignment.value.id, Some(assignment.etag.clone()));
        }
        uow.delete::<Patient>(id, Some(current.etag.clone()));

        let removed: Vec<Uuid> = assignments.iter().map(|a| a.value.id).collect();
        let event = AuditEvent::new(ActivityAction::Delete, ResourceType::Patient, actor)
            .resource(id)
            .summary(format!("deleted patient {}", current.value.name.full()))
            .with_details(json!({ "assignments": removed }));
        let record = self.cases.trail().stage(&mut uow, event)?;
        commit(uow, &[record]).await?;

        info!(patient_id = %id, assignments = removed.len(), "patient deleted");
        Ok(removed)
    }

    /// Required documents not on file, plus any explicitly reported missing.
    pub async fn missing_documents(&self, id: Uuid) -> Result<Vec<DocumentKind>, CaseError> {
        Ok(self.get(id).await?.value.documents.outstanding())
    }

    pub async fn assignments_of(&self, id: Uuid) -> Result<Vec<Assignment>, CaseError> {
        Ok(self
            .assignments
            .list()
            .await?
            .into_iter()
            .map(Versioned::into_inner)
            .filter(|a| a.patient_id == id)
            .collect())
    }

    async fn editable(&self, id: Uuid) -> Result<Patient, CaseError> {
        let patient = self.get(id).await?.into_inner();
        if patient.archived {
            return Err(CaseError::InvalidState(
                "archived patients cannot be edited".to_string(),
            ));
        }
        Ok(patient)
    }

    async fn save(
        &self,
        mut patient: Patient,
        etag: &str,
        event: AuditEvent,
    ) -> Result<Versioned<Patient>, CaseError> {
        patient.updated_at = Timestamp::now();

        let mut uow = self.cases.unit();
        uow.replace(&patient, etag)?;
        let record = self.cases.trail().stage(&mut uow, event)?;
        let receipt = commit(uow, &[record]).await?;
        Ok(versioned(&receipt, patient))
    }
}
