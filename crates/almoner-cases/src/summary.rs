use std::collections::HashMap;

use jiff::civil::Date;
use serde::Serialize;
use uuid::Uuid;

use almoner_core::models::assignment::{Assignment, AssignmentStatus};
use almoner_core::models::department::Department;
use almoner_core::models::patient::{Patient, PatientStatus};
use almoner_storage::repository::{Repository, Versioned};

use crate::CaseStore;
use crate::error::CaseError;

/// Headline numbers for the social department's caseload.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CaseloadSummary {
    pub as_of: Option<Date>,
    pub inpatients: usize,
    pub discharged: usize,
    pub missing_documents: usize,
    pub incapacitated: usize,
    pub open_assignments: usize,
    pub in_progress_assignments: usize,
    pub overdue_assignments: usize,
    pub open_by_department: Vec<DepartmentLoad>,
}

/// Unfinished assignments requested by one department.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentLoad {
    pub department_id: Uuid,
    pub code: String,
    pub name: String,
    pub open: usize,
}

#[derive(Clone)]
pub struct SummaryService {
    patients: Repository<Patient>,
    assignments: Repository<Assignment>,
    departments: Repository<Department>,
}

impl SummaryService {
    pub fn new(cases: CaseStore) -> Self {
        let store = cases.store().clone();
        Self {
            patients: Repository::new(store.clone()),
            assignments: Repository::new(store.clone()),
            departments: Repository::new(store),
        }
    }

    pub async fn summarize(&self, today: Date) -> Result<CaseloadSummary, CaseError> {
        let patients: Vec<Patient> = self
            .patients
            .list()
            .await?
            .into_iter()
            .map(Versioned::into_inner)
            .filter(|p| !p.archived)
            .collect();
        let assignments: Vec<Assignment> = self
            .assignments
            .list()
            .await?
            .into_iter()
            .map(Versioned::into_inner)
            .collect();

        let mut summary = CaseloadSummary {
            as_of: Some(today),
            ..Default::default()
        };

        for patient in &patients {
            match patient.status {
                PatientStatus::Inpatient => summary.inpatients += 1,
                PatientStatus::Discharged => summary.discharged += 1,
                PatientStatus::Deceased => {}
            }
            if !patient.documents.outstanding().is_empty() {
                summary.missing_documents += 1;
            }
            if patient.legal.capacity.is_restricted() {
                summary.incapacitated += 1;
            }
        }

        let mut per_department: HashMap<Uuid, usize> = HashMap::new();
        for assignment in &assignments {
            match assignment.status {
                AssignmentStatus::Open => summary.open_assignments += 1,
                AssignmentStatus::InProgress => summary.in_progress_assignments += 1,
                AssignmentStatus::Completed | AssignmentStatus::Cancelled => continue,
            }
            if assignment.is_overdue(today) {
                summary.overdue_assignments += 1;
            }
            *per_department
                .entry(assignment.requested_by_department)
                .or_default() += 1;
        }

        let departments: HashMap<Uuid, Department> = self
            .departments
            .list()
            .await?
            .into_iter()
            .map(|d| (d.value.id, d.into_inner()))
            .collect();

        let mut loads: Vec<DepartmentLoad> = per_department
            .into_iter()
            .map(|(id, open)| {
                let (code, name) = departments
                    .get(&id)
                    .map(|d| (d.code.clone(), d.name.clone()))
                    .unwrap_or_else(|| (String::new(), "unknown department".to_string()));
                DepartmentLoad {
                    department_id: id,
                    code,
                    name,
                    open,
                }
            })
            .collect();
        loads.sort_by(|a, b| b.open.cmp(&a.open).then_with(|| a.code.cmp(&b.code)));
        summary.open_by_department = loads;

        Ok(summary)
    }
}
