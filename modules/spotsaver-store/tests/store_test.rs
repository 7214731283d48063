use std::collections::HashSet;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use spotsaver_common::{Coordinates, DraftError, InsertFailurePolicy, SortKey, Spot, SpotDraft, SpotId, Tags};
use spotsaver_store::testing::MemoryRepository;
use spotsaver_store::{
    NotificationKind, PersistedSpot, SpotEntry, SpotQuery, SpotRepository, SpotStore,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn spot(name: &str, location: &str, tags: &[&str], minute: u32) -> Spot {
    Spot {
        id: SpotId::from("seed"),
        name: name.to_string(),
        location: location.to_string(),
        coordinates: Coordinates::new(40.0, -73.0),
        tags: tags.iter().collect::<Tags>(),
        notes: None,
        visited_at: None,
        rating: None,
        created_at: Utc.with_ymd_and_hms(2024, 3, 1, 8, minute, 0).unwrap(),
    }
}

fn draft(name: &str, location: &str) -> SpotDraft {
    SpotDraft::builder().name(name).location(location).build()
}

fn store_with(repo: &Arc<MemoryRepository>, policy: InsertFailurePolicy) -> SpotStore {
    let repository: Arc<dyn SpotRepository> = repo.clone();
    SpotStore::new(repository, policy)
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[tokio::test]
async fn load_marks_rows_confirmed() {
    let repo = Arc::new(MemoryRepository::with_spots(vec![
        spot("Cafe Lumen", "5th Ave", &["coffee"], 1),
        spot("Park Bench", "Oak St", &["outdoor"], 2),
    ]));
    let mut store = store_with(&repo, InsertFailurePolicy::Keep);

    assert_eq!(store.load().await, 2);
    assert!(store.entries().iter().all(SpotEntry::is_confirmed));
    assert_eq!(store.entries()[0].remote_id(), Some(1));
    assert_eq!(store.entries()[0].id().as_str(), "1");
    assert!(store.notifications().is_empty());
}

#[tokio::test]
async fn load_failure_leaves_store_empty_and_usable() {
    let repo = Arc::new(MemoryRepository::with_spots(vec![spot("Cafe", "5th", &[], 1)]));
    repo.fail_fetch(true);
    let mut store = store_with(&repo, InsertFailurePolicy::Keep);

    assert_eq!(store.load().await, 0);
    assert!(store.is_empty());

    let notice = store.notifications().latest().expect("load failure should be reported");
    assert_eq!(notice.kind, NotificationKind::LoadFailed);
    assert_eq!(notice.title, "Error fetching spots");

    store.add(draft("Park", "Oak St")).unwrap();
    assert_eq!(store.len(), 1);
}

// ---------------------------------------------------------------------------
// Adding
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_name_is_rejected_without_touching_anything() {
    let repo = Arc::new(MemoryRepository::new());
    let mut store = store_with(&repo, InsertFailurePolicy::Keep);

    let result = store.add_and_persist(draft("   ", "Oak St")).await;

    assert_eq!(result.unwrap_err(), DraftError::MissingName);
    assert!(store.is_empty());
    assert_eq!(repo.insert_calls(), 0);
}

#[tokio::test]
async fn add_prepends_a_pending_spot() {
    let repo = Arc::new(MemoryRepository::with_spots(vec![spot("Old", "Here", &[], 1)]));
    let mut store = store_with(&repo, InsertFailurePolicy::Keep);
    store.load().await;

    let pending = store.add(draft("  New Place ", " Elm St ")).unwrap();

    let first = &store.entries()[0];
    assert!(first.is_pending());
    assert_eq!(first.id(), pending.id());
    assert_eq!(first.spot().name, "New Place");
    assert_eq!(first.spot().location, "Elm St");
    assert_eq!(store.len(), 2);
    assert_eq!(repo.insert_calls(), 0);
}

#[tokio::test]
async fn successful_insert_confirms_and_keeps_local_id() {
    let repo = Arc::new(MemoryRepository::new());
    let mut store = store_with(&repo, InsertFailurePolicy::Keep);

    let entry = store
        .add_and_persist(draft("Cafe", "5th Ave"))
        .await
        .unwrap()
        .expect("entry should survive");

    assert!(entry.is_confirmed());
    assert_eq!(entry.remote_id(), Some(1));
    assert_ne!(entry.id().as_str(), "1");
    assert_eq!(repo.row_count(), 1);
    assert!(store.notifications().is_empty());
}

#[tokio::test]
async fn insert_failure_keeps_unsaved_entry_by_default() {
    let repo = Arc::new(MemoryRepository::new());
    repo.fail_insert(true);
    let mut store = store_with(&repo, InsertFailurePolicy::Keep);

    let entry = store
        .add_and_persist(draft("Cafe", "5th Ave"))
        .await
        .unwrap()
        .expect("keep policy retains the entry");

    assert!(matches!(entry, SpotEntry::Unsaved { .. }));
    assert_eq!(store.len(), 1);
    assert_eq!(
        store.notifications().latest().map(|n| n.kind),
        Some(NotificationKind::InsertFailed)
    );
}

#[tokio::test]
async fn insert_failure_rolls_back_when_configured() {
    let repo = Arc::new(MemoryRepository::new());
    repo.fail_insert(true);
    let mut store = store_with(&repo, InsertFailurePolicy::Rollback);

    let entry = store.add_and_persist(draft("Cafe", "5th Ave")).await.unwrap();

    assert!(entry.is_none());
    assert!(store.is_empty());
    assert_eq!(store.notifications().len(), 1);
}

#[tokio::test]
async fn split_insert_shows_pending_until_resolved() {
    let repo = Arc::new(MemoryRepository::new());
    let mut store = store_with(&repo, InsertFailurePolicy::Keep);

    let pending = store.add(draft("Cafe", "5th Ave")).unwrap();
    assert!(store.get(pending.id()).unwrap().is_pending());

    let result = pending.persist(repo.as_ref()).await;
    let id = pending.id().clone();
    store.resolve(pending, result);

    assert!(store.get(&id).unwrap().is_confirmed());
}

#[tokio::test]
async fn confirmed_spot_takes_database_creation_time() {
    let repo = Arc::new(MemoryRepository::new());
    let mut store = store_with(&repo, InsertFailurePolicy::Keep);

    let pending = store.add(draft("Cafe", "5th Ave")).unwrap();
    let stored_at = Utc.with_ymd_and_hms(2024, 7, 4, 12, 30, 0).unwrap();
    let entry = store
        .resolve(
            pending,
            Ok(PersistedSpot {
                remote_id: 42,
                created_at: stored_at,
            }),
        )
        .expect("entry should be confirmed");

    assert_eq!(entry.remote_id(), Some(42));
    assert_eq!(entry.spot().created_at, stored_at);
}

#[tokio::test]
async fn result_for_foreign_spot_is_discarded() {
    let repo = Arc::new(MemoryRepository::new());
    let mut origin = store_with(&repo, InsertFailurePolicy::Keep);
    let mut other = store_with(&repo, InsertFailurePolicy::Keep);

    let pending = origin.add(draft("Cafe", "5th Ave")).unwrap();
    let result = pending.persist(repo.as_ref()).await;

    assert!(other.resolve(pending, result).is_none());
    assert!(other.is_empty());
}

#[tokio::test]
async fn rapid_creation_never_reuses_ids() {
    let repo = Arc::new(MemoryRepository::new());
    let mut store = store_with(&repo, InsertFailurePolicy::Keep);

    for i in 0..200 {
        store.add(draft(&format!("Spot {i}"), "Somewhere")).unwrap();
    }

    let ids: HashSet<_> = store.entries().iter().map(|e| e.id().clone()).collect();
    assert_eq!(ids.len(), 200);
}

#[tokio::test]
async fn dropped_pin_becomes_new_spot() {
    let repo = Arc::new(MemoryRepository::new());
    let mut store = store_with(&repo, InsertFailurePolicy::Keep);

    store.drop_pin(Coordinates::new(12.97159, 77.59456)).unwrap();

    let spot = store.entries()[0].spot();
    assert_eq!(spot.name, "New Spot");
    assert_eq!(spot.location, "Lat: 12.9716, Lng: 77.5946");
    assert_eq!(spot.coordinates, Coordinates::new(12.97159, 77.59456));
}

// ---------------------------------------------------------------------------
// Derived views
// ---------------------------------------------------------------------------

#[tokio::test]
async fn derived_views_follow_the_collection() {
    let mut visited = spot("Park Bench", "Oak St", &["outdoor", "quiet"], 2);
    visited.visited_at = Some(Utc::now());
    let repo = Arc::new(MemoryRepository::with_spots(vec![
        visited,
        spot("Cafe Lumen", "5th Ave", &["coffee"], 1),
    ]));
    let mut store = store_with(&repo, InsertFailurePolicy::Keep);
    store.load().await;

    assert_eq!(store.available_tags(), ["coffee", "outdoor", "quiet"]);
    assert_eq!(store.stats().total, 2);
    assert_eq!(store.stats().visited, 1);

    let query = SpotQuery::new("cafe", vec![], SortKey::Recent);
    let names: Vec<_> = store.filtered(&query).iter().map(|s| s.name.clone()).collect();
    assert_eq!(names, ["Cafe Lumen"]);

    let mut tagged = draft("Roastery", "Pine St");
    tagged.tags.insert("coffee");
    tagged.tags.insert("beans");
    store.add(tagged).unwrap();
    assert_eq!(store.available_tags(), ["beans", "coffee", "outdoor", "quiet"]);
}
