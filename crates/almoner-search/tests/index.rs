use std::sync::Arc;

use jiff::civil::date;
use uuid::Uuid;

use almoner_core::keys;
use almoner_core::models::documents::{IdentityDocuments, Passport};
use almoner_core::models::legal::LegalStatus;
use almoner_core::models::patient::{Patient, PatientStatus, PersonName, Sex};
use almoner_search::error::SearchError;
use almoner_search::flush::flush;
use almoner_search::index::{INDEX_SUBDIR, PatientIndex};
use almoner_storage::memory::MemoryStore;
use almoner_storage::store::DocumentStore;

fn patient(last: &str, first: &str, department: Uuid) -> Patient {
    let now = jiff::Timestamp::now();
    Patient {
        id: Uuid::new_v4(),
        name: PersonName {
            last: last.to_string(),
            first: first.to_string(),
            middle: None,
        },
        date_of_birth: date(1950, 2, 3),
        sex: Sex::Female,
        department_id: Some(department),
        ward: None,
        registered_address: None,
        admitted_on: date(2024, 1, 1),
        discharged_on: None,
        status: PatientStatus::Inpatient,
        documents: IdentityDocuments::default(),
        medical: None,
        legal: LegalStatus::default(),
        pension: None,
        disability: None,
        relatives: Vec::new(),
        notes: None,
        archived: false,
        created_by: Uuid::nil(),
        created_at: now,
        updated_at: now,
    }
}

#[test]
fn search_matches_names_and_document_numbers() {
    let department = Uuid::new_v4();
    let mut index = PatientIndex::create_empty(None).unwrap();

    let mut orlova = patient("Orlova", "Anna", department);
    orlova.documents.passport = Some(Passport {
        series: Some("4510".to_string()),
        number: "778899".to_string(),
        issued_by: "UFMS".to_string(),
        issued_on: date(2005, 6, 1),
    });
    let petrov = patient("Petrov", "Ivan", department);

    index.upsert_patient(&orlova).unwrap();
    index.upsert_patient(&petrov).unwrap();
    index.commit().unwrap();
    assert_eq!(index.num_docs(), 2);

    let by_name = index.search("orlova", 10, false).unwrap();
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].id, orlova.id);
    assert_eq!(by_name[0].full_name, "Orlova Anna");
    assert_eq!(by_name[0].department_id, Some(department));
    assert_eq!(by_name[0].date_of_birth, Some(date(1950, 2, 3)));

    let by_passport = index.search("778899", 10, false).unwrap();
    assert_eq!(by_passport.len(), 1);
    assert_eq!(by_passport[0].id, orlova.id);

    assert!(index.search("   ", 10, false).unwrap().is_empty());
}

#[test]
fn upsert_replaces_and_archived_patients_are_hidden() {
    let department = Uuid::new_v4();
    let mut index = PatientIndex::create_empty(None).unwrap();

    let mut orlova = patient("Orlova", "Anna", department);
    index.upsert_patient(&orlova).unwrap();
    index.commit().unwrap();

    orlova.archived = true;
    index.upsert_patient(&orlova).unwrap();
    index.commit().unwrap();
    assert_eq!(index.num_docs(), 1);

    assert!(index.search("orlova", 10, false).unwrap().is_empty());
    let with_archived = index.search("orlova", 10, true).unwrap();
    assert_eq!(with_archived.len(), 1);
    assert!(with_archived[0].archived);

    index.remove_patient(orlova.id).unwrap();
    index.commit().unwrap();
    assert_eq!(index.num_docs(), 0);
}

#[test]
fn rebuild_and_department_lookup() {
    let cardiology = Uuid::new_v4();
    let neurology = Uuid::new_v4();
    let mut index = PatientIndex::create_empty(None).unwrap();
    index
        .upsert_patient(&patient("Stale", "Entry", cardiology))
        .unwrap();
    index.commit().unwrap();

    let patients = vec![
        patient("Orlova", "Anna", cardiology),
        patient("Petrov", "Ivan", cardiology),
        patient("Sidorov", "Oleg", neurology),
    ];
    assert_eq!(index.rebuild(&patients).unwrap(), 3);

    let in_cardiology = index.find_by_department(cardiology, 50).unwrap();
    assert_eq!(in_cardiology.len(), 2);
    assert!(index.search("stale", 10, true).unwrap().is_empty());
}

#[test]
fn malformed_query_is_reported() {
    let index = PatientIndex::create_empty(None).unwrap();
    let err = index.search("full_name:(", 10, false).unwrap_err();
    assert!(matches!(err, SearchError::QueryParse(_)));
}

#[tokio::test]
async fn flush_and_load_round_trip_with_etag_locking() {
    let store = Arc::new(MemoryStore::new());
    let department = Uuid::new_v4();

    let missing = PatientIndex::load(store.as_ref(), None).await;
    assert!(matches!(missing, Err(SearchError::IndexNotFound)));

    let mut index = PatientIndex::load_or_create(store.as_ref(), None)
        .await
        .unwrap();
    assert_eq!(index.etag(), None);
    let orlova = patient("Orlova", "Anna", department);
    index.upsert_patient(&orlova).unwrap();
    index.commit().unwrap();

    let etag = flush(store.as_ref(), &mut index).await.unwrap();
    assert_eq!(index.etag(), Some(etag.as_str()));
    assert!(store.get(keys::PATIENT_INDEX).await.is_ok());

    let workdir = tempfile::tempdir().unwrap();
    let mut loaded = PatientIndex::load(store.as_ref(), Some(workdir.path()))
        .await
        .unwrap();
    assert_eq!(loaded.etag(), Some(etag.as_str()));
    assert_eq!(loaded.search("orlova", 10, false).unwrap()[0].id, orlova.id);

    // The first copy flushes again and moves the ETag on; the second is now stale.
    flush(store.as_ref(), &mut index).await.unwrap();
    let stale = flush(store.as_ref(), &mut loaded).await;
    assert!(matches!(stale, Err(SearchError::ETagMismatch)));
}

#[tokio::test]
async fn a_second_fresh_index_cannot_overwrite_a_persisted_one() {
    let store = Arc::new(MemoryStore::new());
    let mut first = PatientIndex::create_empty(None).unwrap();
    flush(store.as_ref(), &mut first).await.unwrap();

    let mut second = PatientIndex::create_empty(None).unwrap();
    let result = flush(store.as_ref(), &mut second).await;
    assert!(matches!(result, Err(SearchError::ETagMismatch)));
}

#[test]
fn an_older_version_does_not_replace_a_newer_entry() {
    let department = Uuid::new_v4();
    let mut index = PatientIndex::create_empty(None).unwrap();

    let mut newer = patient("Orlova", "Anna", department);
    newer.updated_at = jiff::Timestamp::from_second(1_700_000_100).unwrap();
    let mut older = newer.clone();
    older.name.last = "Orlova-Smirnova".to_string();
    older.updated_at = jiff::Timestamp::from_second(1_700_000_000).unwrap();

    assert!(index.upsert_if_newer(&newer).unwrap());
    index.commit().unwrap();
    assert_eq!(
        index.indexed_updated_at(newer.id).unwrap(),
        Some(newer.updated_at.as_millisecond())
    );

    assert!(!index.upsert_if_newer(&older).unwrap());
    index.commit().unwrap();
    let hits = index.search("orlova", 10, false).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].full_name, "Orlova Anna");

    assert_eq!(index.indexed_updated_at(Uuid::new_v4()).unwrap(), None);
}

#[test]
fn index_dir_keeps_unrelated_files() {
    let root = tempfile::tempdir().unwrap();
    let notes = root.path().join("operator-notes.txt");
    std::fs::write(&notes, "do not delete").unwrap();

    let index = PatientIndex::create_empty(Some(root.path())).unwrap();
    assert_eq!(index.dir(), root.path().join(INDEX_SUBDIR));
    drop(index);

    // A second start-up clears only the index subdirectory.
    let index = PatientIndex::create_empty(Some(root.path())).unwrap();
    assert_eq!(index.num_docs(), 0);
    assert_eq!(std::fs::read_to_string(&notes).unwrap(), "do not delete");
}
