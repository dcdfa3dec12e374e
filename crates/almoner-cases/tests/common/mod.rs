#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use jiff::civil::date;
use uuid::Uuid;

use almoner_cases::CaseStore;
use almoner_cases::assignments::{AssignmentService, NewAssignment};
use almoner_cases::departments::DepartmentService;
use almoner_cases::patients::{NewPatient, PatientService};
use almoner_core::models::activity::Actor;
use almoner_core::models::assignment::{Assignment, AssignmentKind};
use almoner_core::models::department::Department;
use almoner_core::models::documents::IdentityDocuments;
use almoner_core::models::legal::LegalStatus;
use almoner_core::models::patient::{Patient, PersonName, Sex};
use almoner_core::models::user::{Role, UserAccount};
use almoner_storage::error::StorageError;
use almoner_storage::memory::MemoryStore;
use almoner_storage::repository::{Repository, Versioned};
use almoner_storage::store::{DocumentStore, Precondition, StoredObject};

/// Yields before every call so that concurrently awaited operations
/// interleave their reads and writes.
#[derive(Default)]
pub struct InterleavingStore(pub MemoryStore);

#[async_trait]
impl DocumentStore for InterleavingStore {
    async fn get(&self, key: &str) -> Result<StoredObject, StorageError> {
        tokio::task::yield_now().await;
        self.0.get(key).await
    }

    async fn put(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
        precondition: Precondition,
    ) -> Result<String, StorageError> {
        tokio::task::yield_now().await;
        self.0.put(key, body, content_type, precondition).await
    }

    async fn delete(&self, key: &str, precondition: Precondition) -> Result<(), StorageError> {
        tokio::task::yield_now().await;
        self.0.delete(key, precondition).await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        tokio::task::yield_now().await;
        self.0.list(prefix).await
    }
}

pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub cases: CaseStore,
    pub patients: PatientService,
    pub assignments: AssignmentService,
    pub departments: DepartmentService,
    pub actor: Actor,
}

impl Fixture {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let cases = CaseStore::new(store.clone());
        Self {
            patients: PatientService::new(cases.clone()),
            assignments: AssignmentService::new(cases.clone()),
            departments: DepartmentService::new(cases.clone()),
            cases,
            store,
            actor: Actor {
                id: Uuid::new_v4(),
                name: "Social Worker".to_string(),
            },
        }
    }

    pub async fn department(&self, code: &str) -> Versioned<Department> {
        self.departments
            .create(&self.actor, code, &format!("{code} ward"))
            .await
            .unwrap()
    }

    pub async fn patient(&self, last: &str, department: Uuid) -> Versioned<Patient> {
        self.patients
            .register(&self.actor, new_patient(last, department))
            .await
            .unwrap()
    }

    pub async fn assignment(&self, patient: Uuid, department: Uuid) -> Versioned<Assignment> {
        self.assignments
            .create(
                &self.actor,
                NewAssignment {
                    patient_id: patient,
                    requested_by_department: department,
                    kind: AssignmentKind::DocumentRestoration,
                    description: "restore passport".to_string(),
                    due_on: None,
                },
            )
            .await
            .unwrap()
    }

    /// Store a user account directly, bypassing the directory.
    pub async fn user(&self, username: &str, roles: Vec<Role>, active: bool) -> UserAccount {
        let now = jiff::Timestamp::now();
        let user = UserAccount {
            id: Uuid::new_v4(),
            subject: format!("idp|{username}"),
            username: username.to_string(),
            display_name: username.to_string(),
            email: None,
            department_id: None,
            roles,
            active,
            created_at: now,
            updated_at: now,
        };
        Repository::<UserAccount>::new(self.store.clone())
            .insert(&user)
            .await
            .unwrap();
        user
    }
}

pub fn new_patient(last: &str, department: Uuid) -> NewPatient {
    NewPatient {
        name: PersonName {
            last: last.to_string(),
            first: "Anna".to_string(),
            middle: None,
        },
        date_of_birth: date(1948, 5, 17),
        sex: Sex::Female,
        department_id: department,
        ward: Some("12".to_string()),
        registered_address: None,
        admitted_on: date(2024, 1, 10),
        documents: IdentityDocuments::default(),
        medical: None,
        legal: LegalStatus::default(),
        pension: None,
        disability: None,
        relatives: Vec::new(),
        notes: None,
    }
}
