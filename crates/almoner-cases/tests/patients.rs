mod common;

use jiff::civil::date;

use almoner_audit::trail::ActivityFilter;
use almoner_cases::error::CaseError;
use almoner_cases::patients::{PatientFilter, PatientUpdate};
use almoner_core::models::activity::{ActivityAction, ResourceType};
use almoner_core::models::assignment::{Assignment, AssignmentStatus};
use almoner_core::models::documents::DocumentKind;
use almoner_core::models::patient::{Patient, PatientStatus};
use almoner_storage::repository::Repository;

use common::{Fixture, new_patient};

fn update_from(patient: &Patient) -> PatientUpdate {
    PatientUpdate {
        name: patient.name.clone(),
        date_of_birth: patient.date_of_birth,
        sex: patient.sex,
        department_id: patient.department_id,
        ward: patient.ward.clone(),
        registered_address: patient.registered_address.clone(),
        admitted_on: patient.admitted_on,
        documents: patient.documents.clone(),
        medical: patient.medical.clone(),
        legal: patient.legal.clone(),
        pension: patient.pension.clone(),
        disability: patient.disability.clone(),
        relatives: patient.relatives.clone(),
        notes: patient.notes.clone(),
    }
}

#[tokio::test]
async fn register_creates_an_inpatient_and_audits_it() {
    let fx = Fixture::new();
    let dep = fx.department("CARD").await;

    let patient = fx.patient("Orlova", dep.value.id).await;
    assert_eq!(patient.value.status, PatientStatus::Inpatient);
    assert!(!patient.value.archived);
    assert_eq!(patient.value.created_by, fx.actor.id);

    let page = fx
        .cases
        .trail()
        .query(&ActivityFilter {
            resource_type: Some(ResourceType::Patient),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.records[0].resource_id, Some(patient.value.id));
}

#[tokio::test]
async fn register_requires_an_active_department() {
    let fx = Fixture::new();
    let dep = fx.department("SURG").await;
    fx.departments
        .deactivate(&fx.actor, dep.value.id, &dep.etag)
        .await
        .unwrap();

    let result = fx
        .patients
        .register(&fx.actor, new_patient("Orlova", dep.value.id))
        .await;
    assert!(matches!(result, Err(CaseError::Validation(_))));

    let unknown = fx
        .patients
        .register(&fx.actor, new_patient("Orlova", uuid::Uuid::new_v4()))
        .await;
    assert!(matches!(unknown, Err(CaseError::Validation(_))));
}

#[tokio::test]
async fn invalid_patient_is_not_stored() {
    let fx = Fixture::new();
    let dep = fx.department("CARD").await;
    let mut new = new_patient("", dep.value.id);
    new.admitted_on = date(1940, 1, 1);

    let result = fx.patients.register(&fx.actor, new).await;
    match result {
        Err(CaseError::Validation(errors)) => {
            let fields: Vec<&str> = errors.0.iter().map(|e| e.field.as_str()).collect();
            assert_eq!(fields, vec!["name.last", "admitted_on"]);
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(fx.patients.all().await.unwrap().is_empty());
}

#[tokio::test]
async fn list_filters_and_sorts_by_name() {
    let fx = Fixture::new();
    let card = fx.department("CARD").await;
    let neuro = fx.department("NEURO").await;

    fx.patient("Zaitseva", card.value.id).await;
    fx.patient("abramova", card.value.id).await;
    let smirnova = fx.patient("Smirnova", neuro.value.id).await;
    fx.patients
        .discharge(&fx.actor, smirnova.value.id, &smirnova.etag, date(2024, 2, 1))
        .await
        .unwrap();

    let names = |list: Vec<almoner_storage::repository::Versioned<Patient>>| {
        list.into_iter()
            .map(|p| p.value.name.last)
            .collect::<Vec<_>>()
    };

    let all = fx.patients.list(&PatientFilter::default()).await.unwrap();
    assert_eq!(names(all), vec!["abramova", "Smirnova", "Zaitseva"]);

    let in_card = fx
        .patients
        .list(&PatientFilter {
            department_id: Some(card.value.id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(names(in_card), vec!["abramova", "Zaitseva"]);

    let discharged = fx
        .patients
        .list(&PatientFilter {
            status: Some(PatientStatus::Discharged),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(names(discharged), vec!["Smirnova"]);

    let by_name = fx
        .patients
        .list(&PatientFilter {
            name: Some("ZAIT".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(names(by_name), vec!["Zaitseva"]);
}

#[tokio::test]
async fn update_uses_optimistic_locking() {
    let fx = Fixture::new();
    let dep = fx.department("CARD").await;
    let patient = fx.patient("Orlova", dep.value.id).await;

    let mut update = update_from(&patient.value);
    update.notes = Some("prefers to be called by first name".to_string());
    let updated = fx
        .patients
        .update(&fx.actor, patient.value.id, &patient.etag, update.clone())
        .await
        .unwrap();
    assert_eq!(updated.value.notes, update.notes);

    let stale = fx
        .patients
        .update(&fx.actor, patient.value.id, &patient.etag, update)
        .await;
    assert!(matches!(stale, Err(CaseError::Conflict(_))));
}

#[tokio::test]
async fn discharge_rules() {
    let fx = Fixture::new();
    let dep = fx.department("CARD").await;
    let patient = fx.patient("Orlova", dep.value.id).await;

    let early = fx
        .patients
        .discharge(&fx.actor, patient.value.id, &patient.etag, date(2023, 12, 31))
        .await;
    assert!(matches!(early, Err(CaseError::Validation(_))));

    let discharged = fx
        .patients
        .discharge(&fx.actor, patient.value.id, &patient.etag, date(2024, 1, 20))
        .await
        .unwrap();
    assert_eq!(discharged.value.status, PatientStatus::Discharged);
    assert_eq!(discharged.value.discharged_on, Some(date(2024, 1, 20)));

    let again = fx
        .patients
        .discharge(&fx.actor, patient.value.id, &discharged.etag, date(2024, 1, 21))
        .await;
    assert!(matches!(again, Err(CaseError::InvalidState(_))));
}

#[tokio::test]
async fn record_death_closes_the_stay() {
    let fx = Fixture::new();
    let dep = fx.department("CARD").await;
    let patient = fx.patient("Orlova", dep.value.id).await;

    let deceased = fx
        .patients
        .record_death(&fx.actor, patient.value.id, &patient.etag, date(2024, 3, 2))
        .await
        .unwrap();
    assert_eq!(deceased.value.status, PatientStatus::Deceased);
    assert_eq!(deceased.value.discharged_on, Some(date(2024, 3, 2)));

    let twice = fx
        .patients
        .record_death(&fx.actor, patient.value.id, &deceased.etag, date(2024, 3, 2))
        .await;
    assert!(matches!(twice, Err(CaseError::InvalidState(_))));
}

#[tokio::test]
async fn archive_waits_for_open_assignments() {
    let fx = Fixture::new();
    let dep = fx.department("CARD").await;
    let patient = fx.patient("Orlova", dep.value.id).await;
    let assignment = fx.assignment(patient.value.id, dep.value.id).await;

    let refused = fx
        .patients
        .archive(&fx.actor, patient.value.id, &patient.etag)
        .await;
    assert!(matches!(refused, Err(CaseError::InvalidState(_))));

    fx.assignments
        .transition(
            &fx.actor,
            assignment.value.id,
            &assignment.etag,
            AssignmentStatus::Cancelled,
        )
        .await
        .unwrap();

    let archived = fx
        .patients
        .archive(&fx.actor, patient.value.id, &patient.etag)
        .await
        .unwrap();
    assert!(archived.value.archived);

    let edit = fx
        .patients
        .update(
            &fx.actor,
            patient.value.id,
            &archived.etag,
            update_from(&archived.value),
        )
        .await;
    assert!(matches!(edit, Err(CaseError::InvalidState(_))));

    let hidden = fx.patients.list(&PatientFilter::default()).await.unwrap();
    assert!(hidden.is_empty());

    let restored = fx
        .patients
        .restore(&fx.actor, patient.value.id, &archived.etag)
        .await
        .unwrap();
    assert!(!restored.value.archived);
}

#[tokio::test]
async fn delete_removes_patient_and_assignments_together() {
    let fx = Fixture::new();
    let dep = fx.department("CARD").await;
    let patient = fx.patient("Orlova", dep.value.id).await;
    let other = fx.patient("Petrova", dep.value.id).await;

    let first = fx.assignment(patient.value.id, dep.value.id).await;
    fx.assignments
        .transition(&fx.actor, first.value.id, &first.etag, AssignmentStatus::Cancelled)
        .await
        .unwrap();
    fx.assignment(other.value.id, dep.value.id).await;

    let not_archived = fx.patients.delete(&fx.actor, patient.value.id).await;
    assert!(matches!(not_archived, Err(CaseError::InvalidState(_))));

    fx.patients
        .archive(&fx.actor, patient.value.id, &patient.etag)
        .await
        .unwrap();
    let removed = fx.patients.delete(&fx.actor, patient.value.id).await.unwrap();
    assert_eq!(removed, vec![first.value.id]);

    assert!(matches!(
        fx.patients.get(patient.value.id).await,
        Err(CaseError::NotFound { .. })
    ));
    let remaining = Repository::<Assignment>::new(fx.store.clone())
        .list()
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].value.patient_id, other.value.id);

    let deletions = fx
        .cases
        .trail()
        .query(&ActivityFilter {
            action: Some(ActivityAction::Delete),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(deletions.total, 1);
}

#[tokio::test]
async fn missing_documents_lists_lost_and_absent_kinds() {
    let fx = Fixture::new();
    let dep = fx.department("CARD").await;
    let mut new = new_patient("Orlova", dep.value.id);
    new.documents.pension_insurance_number = Some("112-233-445 95".to_string());
    new.documents.missing = vec![DocumentKind::BirthCertificate];
    let patient = fx.patients.register(&fx.actor, new).await.unwrap();

    let missing = fx
        .patients
        .missing_documents(patient.value.id)
        .await
        .unwrap();
    assert_eq!(
        missing,
        vec![
            DocumentKind::BirthCertificate,
            DocumentKind::Passport,
            DocumentKind::InsurancePolicy,
        ]
    );
}
