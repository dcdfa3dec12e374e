use std::sync::Arc;

use jiff::Timestamp;
use jiff::civil::date;
use uuid::Uuid;

use almoner_audit::events::AuditEvent;
use almoner_audit::trail::{ActivityFilter, AuditTrail, MAX_PAGE_SIZE};
use almoner_core::keys;
use almoner_core::models::activity::{ActivityAction, Actor, ResourceType};
use almoner_storage::json;
use almoner_storage::memory::MemoryStore;
use almoner_storage::store::{DocumentStore, Precondition};
use almoner_storage::unit_of_work::UnitOfWork;

fn actor(name: &str) -> Actor {
    Actor {
        id: Uuid::new_v4(),
        name: name.to_string(),
    }
}

async fn seed(
    store: &dyn DocumentStore,
    at: &str,
    action: ActivityAction,
    resource_type: ResourceType,
    who: &Actor,
) -> Uuid {
    let occurred_at: Timestamp = at.parse().unwrap();
    let record = AuditEvent::new(action, resource_type, who)
        .summary(format!("{} at {at}", action.as_str()))
        .into_record(occurred_at);
    let day = occurred_at.to_zoned(jiff::tz::TimeZone::UTC).date();
    json::save_json(
        store,
        &keys::activity(day, record.id),
        &record,
        Precondition::IfAbsent,
    )
    .await
    .unwrap();
    record.id
}

#[tokio::test]
async fn record_persists_under_the_day_partition() {
    let store = Arc::new(MemoryStore::new());
    let trail = AuditTrail::new(store.clone());
    let who = actor("ivanova");
    let patient = Uuid::new_v4();

    let record = trail
        .record(
            AuditEvent::new(ActivityAction::View, ResourceType::Patient, &who)
                .resource(patient)
                .summary("viewed patient"),
        )
        .await
        .unwrap();

    let keys = store.list(keys::ACTIVITY).await.unwrap();
    assert_eq!(keys.len(), 1);
    assert!(keys[0].ends_with(&format!("{}.json", record.id)));
    let day = keys::activity_day(&keys[0]).unwrap();
    assert_eq!(day, record.occurred_at.to_zoned(jiff::tz::TimeZone::UTC).date());

    let page = trail.query(&ActivityFilter::default()).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.records[0].resource_id, Some(patient));
    assert_eq!(page.records[0].actor, who);
}

#[tokio::test]
async fn staged_event_only_lands_with_its_unit_of_work() {
    let store = Arc::new(MemoryStore::new());
    let trail = AuditTrail::new(store.clone());
    let who = actor("petrov");

    let mut uow = UnitOfWork::new(store.clone());
    trail
        .stage(
            &mut uow,
            AuditEvent::new(ActivityAction::Create, ResourceType::Department, &who),
        )
        .unwrap();
    assert!(store.is_empty().await);

    uow.commit().await.unwrap();
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn query_filters_by_day_range_newest_first() {
    let store = Arc::new(MemoryStore::new());
    let trail = AuditTrail::new(store.clone());
    let who = actor("sidorova");

    seed(store.as_ref(), "2024-03-08T23:59:00Z", ActivityAction::Create, ResourceType::Patient, &who).await;
    let first = seed(store.as_ref(), "2024-03-09T08:00:00Z", ActivityAction::Update, ResourceType::Patient, &who).await;
    let second = seed(store.as_ref(), "2024-03-10T12:30:00Z", ActivityAction::View, ResourceType::Patient, &who).await;
    seed(store.as_ref(), "2024-03-11T00:00:01Z", ActivityAction::Delete, ResourceType::Patient, &who).await;

    let page = trail
        .query(&ActivityFilter {
            from: Some(date(2024, 3, 9)),
            to: Some(date(2024, 3, 10)),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(page.total, 2);
    let ids: Vec<Uuid> = page.records.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![second, first]);
}

#[tokio::test]
async fn query_filters_by_actor_resource_and_action() {
    let store = Arc::new(MemoryStore::new());
    let trail = AuditTrail::new(store.clone());
    let alice = actor("alice");
    let bob = actor("bob");

    seed(store.as_ref(), "2024-05-01T10:00:00Z", ActivityAction::Create, ResourceType::Patient, &alice).await;
    seed(store.as_ref(), "2024-05-01T11:00:00Z", ActivityAction::Create, ResourceType::Assignment, &alice).await;
    seed(store.as_ref(), "2024-05-02T09:00:00Z", ActivityAction::Update, ResourceType::Patient, &bob).await;

    let by_actor = trail
        .query(&ActivityFilter {
            actor_id: Some(alice.id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_actor.total, 2);

    let by_type = trail
        .query(&ActivityFilter {
            resource_type: Some(ResourceType::Patient),
            action: Some(ActivityAction::Create),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_type.total, 1);
    assert_eq!(by_type.records[0].actor, alice);
}

#[tokio::test]
async fn query_pages_and_clamps_the_limit() {
    let store = Arc::new(MemoryStore::new());
    let trail = AuditTrail::new(store.clone());
    let who = actor("pager");

    for hour in 0..5 {
        seed(
            store.as_ref(),
            &format!("2024-06-01T0{hour}:00:00Z"),
            ActivityAction::View,
            ResourceType::Patient,
            &who,
        )
        .await;
    }

    let page = trail
        .query(&ActivityFilter {
            offset: Some(1),
            limit: Some(2),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 5);
    assert_eq!(page.records.len(), 2);
    assert_eq!(page.records[0].summary, "view at 2024-06-01T03:00:00Z");

    let clamped = trail
        .query(&ActivityFilter {
            limit: Some(10_000),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(clamped.limit, MAX_PAGE_SIZE);
}

#[tokio::test]
async fn inverted_range_is_rejected() {
    let trail = AuditTrail::new(Arc::new(MemoryStore::new()));
    let result = trail
        .query(&ActivityFilter {
            from: Some(date(2024, 3, 10)),
            to: Some(date(2024, 3, 9)),
            ..Default::default()
        })
        .await;
    assert!(result.is_err());
}
