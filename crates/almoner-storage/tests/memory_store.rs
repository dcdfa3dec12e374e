use almoner_storage::error::StorageError;
use almoner_storage::memory::MemoryStore;
use almoner_storage::store::{DocumentStore, Precondition};

#[tokio::test]
async fn get_missing_is_not_found() {
    let store = MemoryStore::new();
    let err = store.get("patients/nope.json").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn if_absent_refuses_to_overwrite() {
    let store = MemoryStore::new();
    store
        .put("a.json", b"1".to_vec(), None, Precondition::IfAbsent)
        .await
        .unwrap();

    let err = store
        .put("a.json", b"2".to_vec(), None, Precondition::IfAbsent)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::PreconditionFailed { ref key } if key == "a.json"));
    assert_eq!(store.get("a.json").await.unwrap().body, b"1");
}

#[tokio::test]
async fn if_match_requires_current_etag() {
    let store = MemoryStore::new();
    let first = store
        .put("a.json", b"1".to_vec(), None, Precondition::None)
        .await
        .unwrap();
    let second = store
        .put("a.json", b"2".to_vec(), None, Precondition::IfMatch(first.clone()))
        .await
        .unwrap();
    assert_ne!(first, second);

    let stale = store
        .put("a.json", b"3".to_vec(), None, Precondition::IfMatch(first))
        .await
        .unwrap_err();
    assert!(stale.is_precondition_failed());

    let object = store.get("a.json").await.unwrap();
    assert_eq!(object.body, b"2");
    assert_eq!(object.etag, second);
}

#[tokio::test]
async fn conditional_delete() {
    let store = MemoryStore::new();
    let etag = store
        .put("a.json", b"1".to_vec(), None, Precondition::None)
        .await
        .unwrap();

    let err = store
        .delete("a.json", Precondition::IfMatch("\"stale\"".to_string()))
        .await
        .unwrap_err();
    assert!(err.is_precondition_failed());

    store
        .delete("a.json", Precondition::IfMatch(etag.clone()))
        .await
        .unwrap();
    assert!(store.is_empty().await);

    // Unconditional delete of a missing key is a no-op, a conditional one is not.
    store.delete("a.json", Precondition::None).await.unwrap();
    assert!(
        store
            .delete("a.json", Precondition::IfMatch(etag))
            .await
            .unwrap_err()
            .is_precondition_failed()
    );
}

#[tokio::test]
async fn list_is_prefix_scoped_and_ordered() {
    let store = MemoryStore::new();
    for key in ["users/b.json", "patients/2.json", "patients/1.json", "patientsx/3.json"] {
        store
            .put(key, Vec::new(), None, Precondition::None)
            .await
            .unwrap();
    }

    assert_eq!(
        store.list("patients/").await.unwrap(),
        vec!["patients/1.json", "patients/2.json"]
    );

    assert_eq!(store.delete_prefix("patients/").await.unwrap(), 2);
    assert_eq!(store.len().await, 2);
}
