mod common;

use std::sync::Arc;

use jiff::civil::date;

use almoner_cases::CaseStore;
use almoner_cases::departments::DepartmentService;
use almoner_cases::error::CaseError;
use almoner_cases::summary::SummaryService;
use almoner_core::models::documents::{InsurancePolicy, Passport};
use almoner_core::models::legal::{CourtDecision, LegalCapacity};
use almoner_core::models::user::Role;

use common::{Fixture, InterleavingStore, new_patient};

#[tokio::test]
async fn department_codes_are_unique_and_normalized() {
    let fx = Fixture::new();
    let created = fx
        .departments
        .create(&fx.actor, " card-2 ", "Cardiology II")
        .await
        .unwrap();
    assert_eq!(created.value.code, "CARD-2");

    let clash = fx.departments.create(&fx.actor, "Card-2", "Other").await;
    assert!(matches!(clash, Err(CaseError::Conflict(_))));

    let bad = fx.departments.create(&fx.actor, "card 2", "Spaced").await;
    assert!(matches!(bad, Err(CaseError::Validation(_))));
}

#[tokio::test]
async fn concurrent_creates_cannot_share_a_code() {
    let store = Arc::new(InterleavingStore::default());
    let departments = DepartmentService::new(CaseStore::new(store));
    let actor = almoner_core::models::activity::Actor::system();

    let (a, b) = tokio::join!(
        departments.create(&actor, "ther", "Therapy"),
        departments.create(&actor, "THER", "Therapy II"),
    );
    match (&a, &b) {
        (Ok(_), Err(CaseError::Conflict(_))) | (Err(CaseError::Conflict(_)), Ok(_)) => {}
        other => panic!("expected exactly one department, got {other:?}"),
    }
    assert_eq!(departments.list(true).await.unwrap().len(), 1);
}

#[tokio::test]
async fn rename_and_deactivate() {
    let fx = Fixture::new();
    let dep = fx.department("NEURO").await;
    fx.department("CARD").await;

    let renamed = fx
        .departments
        .rename(&fx.actor, dep.value.id, &dep.etag, "Neurology")
        .await
        .unwrap();
    assert_eq!(renamed.value.name, "Neurology");

    fx.departments
        .deactivate(&fx.actor, dep.value.id, &renamed.etag)
        .await
        .unwrap();
    let active = fx.departments.list(false).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].value.code, "CARD");
    assert_eq!(fx.departments.list(true).await.unwrap().len(), 2);

    let stale = fx
        .departments
        .activate(&fx.actor, dep.value.id, &renamed.etag)
        .await;
    assert!(matches!(stale, Err(CaseError::Conflict(_))));
}

#[tokio::test]
async fn summary_counts_the_caseload() {
    let fx = Fixture::new();
    let card = fx.department("CARD").await;
    let neuro = fx.department("NEURO").await;
    let summaries = SummaryService::new(fx.cases.clone());

    // Restricted capacity, no documents on file.
    let mut incapable = new_patient("Orlova", card.value.id);
    incapable.legal.capacity = LegalCapacity::Incapable {
        decision: CourtDecision {
            court: "District court".to_string(),
            case_number: "2-118/2023".to_string(),
            decided_on: date(2023, 6, 1),
        },
        guardian: None,
    };
    let orlova = fx.patients.register(&fx.actor, incapable).await.unwrap();

    // Every required document on file.
    let mut complete = new_patient("Petrova", neuro.value.id);
    complete.documents.passport = Some(Passport {
        series: Some("4510".to_string()),
        number: "123456".to_string(),
        issued_by: "UFMS".to_string(),
        issued_on: date(2010, 3, 3),
    });
    complete.documents.insurance_policy = Some(InsurancePolicy {
        number: "7700000000000000".to_string(),
        insurer: "City MHI Fund".to_string(),
        valid_until: None,
    });
    complete.documents.pension_insurance_number = Some("112-233-445 95".to_string());
    let petrova = fx.patients.register(&fx.actor, complete).await.unwrap();
    fx.patients
        .discharge(&fx.actor, petrova.value.id, &petrova.etag, date(2024, 2, 1))
        .await
        .unwrap();

    let first = fx.assignment(orlova.value.id, card.value.id).await;
    fx.assignment(orlova.value.id, card.value.id).await;
    fx.assignment(orlova.value.id, neuro.value.id).await;
    let worker = fx.user("worker", vec![Role::SocialWorker], true).await;
    fx.assignments
        .assign(&fx.actor, first.value.id, &first.etag, Some(worker.id))
        .await
        .unwrap();

    let summary = summaries.summarize(date(2024, 6, 1)).await.unwrap();
    assert_eq!(summary.inpatients, 1);
    assert_eq!(summary.discharged, 1);
    assert_eq!(summary.missing_documents, 1);
    assert_eq!(summary.incapacitated, 1);
    assert_eq!(summary.open_assignments, 2);
    assert_eq!(summary.in_progress_assignments, 1);
    assert_eq!(summary.overdue_assignments, 0);

    assert_eq!(summary.open_by_department.len(), 2);
    assert_eq!(summary.open_by_department[0].code, "CARD");
    assert_eq!(summary.open_by_department[0].open, 2);
    assert_eq!(summary.open_by_department[1].open, 1);
}
