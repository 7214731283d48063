//! Integration tests for the Postgres repository.
//! Requires a Postgres instance. Set DATABASE_TEST_URL or these tests are skipped.

use spotsaver_common::{Coordinates, SpotDraft, Tags};
use spotsaver_store::{PgSpotRepository, SpotRepository};
use sqlx::PgPool;

async fn test_repository() -> Option<(PgPool, PgSpotRepository)> {
    let url = std::env::var("DATABASE_TEST_URL").ok()?;
    let pool = PgPool::connect(&url).await.ok()?;
    let repo = PgSpotRepository::new(pool.clone());
    repo.migrate().await.ok()?;

    sqlx::query("TRUNCATE spots RESTART IDENTITY")
        .execute(&pool)
        .await
        .ok()?;

    Some((pool, repo))
}

// Single test so the shared table is never truncated underneath a sibling.
#[tokio::test]
async fn insert_and_fetch_round_trip_through_postgres() {
    let Some((pool, repo)) = test_repository().await else {
        return;
    };

    // Rows written by other clients may leave any column null.
    sqlx::query(
        "INSERT INTO spots (name, location, coordinates, tags, rating, created_at) \
         VALUES ('Legacy', NULL, NULL, '\"oops\"'::jsonb, 9, now() - interval '1 day')",
    )
    .execute(&pool)
    .await
    .unwrap();

    let draft = SpotDraft::builder()
        .name("Cafe Lumen")
        .location("5th Ave")
        .coordinates(Coordinates::new(40.7, -73.9))
        .tags(["coffee", "quiet"].into_iter().collect::<Tags>())
        .notes("good espresso")
        .build();
    let persisted = repo.insert(&draft).await.unwrap();
    assert_eq!(persisted.remote_id, 2);

    let rows = repo.fetch_all().await.unwrap();
    assert_eq!(rows.len(), 2);

    let newest = &rows[0];
    assert_eq!(newest.remote_id, 2);
    assert_eq!(newest.spot.id.as_str(), "2");
    assert_eq!(newest.spot.name, "Cafe Lumen");
    assert_eq!(newest.spot.coordinates, Coordinates::new(40.7, -73.9));
    assert_eq!(newest.spot.tags.as_slice(), ["coffee", "quiet"]);
    assert_eq!(newest.spot.notes.as_deref(), Some("good espresso"));
    assert!(newest.spot.visited_at.is_none());
    assert!(newest.spot.rating.is_none());

    let legacy = &rows[1];
    assert_eq!(legacy.spot.name, "Legacy");
    assert_eq!(legacy.spot.location, "");
    assert!(legacy.spot.coordinates.is_sentinel());
    assert!(legacy.spot.tags.is_empty());
    assert!(legacy.spot.rating.is_none());
}
