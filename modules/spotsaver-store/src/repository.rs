//! Postgres persistence for the `spots` table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::warn;

use spotsaver_common::{Coordinates, Rating, Spot, SpotDraft, SpotId, Tags};

use crate::error::Result;

/// What the database hands back for a freshly inserted row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PersistedSpot {
    pub remote_id: i64,
    pub created_at: DateTime<Utc>,
}

/// A loaded row together with its database id.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSpot {
    pub remote_id: i64,
    pub spot: Spot,
}

/// Storage seam for the spot collection. Reads everything, writes one row at a time.
#[async_trait]
pub trait SpotRepository: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<StoredSpot>>;

    /// Insert a new row. Only the creation-form fields are written;
    /// `visited_at` and `rating` stay null.
    async fn insert(&self, draft: &SpotDraft) -> Result<PersistedSpot>;
}

/// A row from the spots table. Every column except `id` is nullable.
#[derive(Debug, Clone, sqlx::FromRow)]
struct SpotRow {
    id: i32,
    name: Option<String>,
    location: Option<String>,
    coordinates: Option<serde_json::Value>,
    tags: Option<serde_json::Value>,
    notes: Option<String>,
    visited_at: Option<DateTime<Utc>>,
    rating: Option<i32>,
    created_at: Option<DateTime<Utc>>,
}

impl SpotRow {
    fn into_stored(self, loaded_at: DateTime<Utc>) -> StoredSpot {
        let coordinates = match self.coordinates {
            Some(value) => serde_json::from_value::<Coordinates>(value).unwrap_or_else(|e| {
                warn!(id = self.id, error = %e, "Unreadable coordinates, using sentinel");
                Coordinates::SENTINEL
            }),
            None => Coordinates::SENTINEL,
        };

        let tags = match self.tags {
            Some(value) => serde_json::from_value::<Tags>(value).unwrap_or_else(|e| {
                warn!(id = self.id, error = %e, "Unreadable tags, treating as empty");
                Tags::new()
            }),
            None => Tags::new(),
        };

        let rating = self
            .rating
            .and_then(|r| Rating::try_from(i64::from(r)).ok());

        let remote_id = i64::from(self.id);
        StoredSpot {
            remote_id,
            spot: Spot {
                id: SpotId::from_remote(remote_id),
                name: self.name.unwrap_or_default(),
                location: self.location.unwrap_or_default(),
                coordinates,
                tags,
                notes: self.notes.filter(|n| !n.is_empty()),
                visited_at: self.visited_at,
                rating,
                created_at: self.created_at.unwrap_or(loaded_at),
            },
        }
    }
}

pub struct PgSpotRepository {
    pool: PgPool,
}

impl PgSpotRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the embedded SQL migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl SpotRepository for PgSpotRepository {
    async fn fetch_all(&self) -> Result<Vec<StoredSpot>> {
        let rows = sqlx::query_as::<_, SpotRow>(
            r#"
            SELECT id, name, location, coordinates, tags, notes,
                   visited_at, rating, created_at
            FROM spots
            ORDER BY created_at DESC NULLS LAST, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let loaded_at = Utc::now();
        Ok(rows.into_iter().map(|r| r.into_stored(loaded_at)).collect())
    }

    async fn insert(&self, draft: &SpotDraft) -> Result<PersistedSpot> {
        let coordinates = serde_json::json!({
            "lat": draft.coordinates.lat,
            "lng": draft.coordinates.lng,
        });
        let tags = serde_json::Value::from(draft.tags.as_slice().to_vec());

        let (id, created_at) = sqlx::query_as::<_, (i32, DateTime<Utc>)>(
            r#"
            INSERT INTO spots (name, location, coordinates, tags, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, created_at
            "#,
        )
        .bind(&draft.name)
        .bind(&draft.location)
        .bind(&coordinates)
        .bind(&tags)
        .bind(&draft.notes)
        .fetch_one(&self.pool)
        .await?;

        Ok(PersistedSpot {
            remote_id: i64::from(id),
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row() -> SpotRow {
        SpotRow {
            id: 7,
            name: Some("Cafe Lumen".into()),
            location: Some("5th Ave".into()),
            coordinates: Some(serde_json::json!({ "lat": 40.7, "lng": -73.9 })),
            tags: Some(serde_json::json!(["coffee", "coffee", "quiet"])),
            notes: Some(String::new()),
            visited_at: None,
            rating: Some(4),
            created_at: Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()),
        }
    }

    #[test]
    fn row_maps_to_spot_with_remote_id() {
        let stored = row().into_stored(Utc::now());
        assert_eq!(stored.remote_id, 7);
        assert_eq!(stored.spot.id.as_str(), "7");
        assert_eq!(stored.spot.coordinates, Coordinates::new(40.7, -73.9));
        assert_eq!(stored.spot.tags.as_slice(), ["coffee", "quiet"]);
        assert_eq!(stored.spot.notes, None);
        assert_eq!(stored.spot.rating.map(|r| r.value()), Some(4));
    }

    #[test]
    fn missing_columns_fall_back() {
        let loaded_at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let stored = SpotRow {
            coordinates: None,
            tags: Some(serde_json::json!({ "not": "an array" })),
            rating: Some(0),
            created_at: None,
            ..row()
        }
        .into_stored(loaded_at);

        assert!(stored.spot.coordinates.is_sentinel());
        assert!(stored.spot.tags.is_empty());
        assert_eq!(stored.spot.rating, None);
        assert_eq!(stored.spot.created_at, loaded_at);
    }
}
