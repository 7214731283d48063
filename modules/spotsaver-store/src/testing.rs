//! In-memory fakes for the repository and geocoder seams.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Notify;

use geocode_client::GeocodeError;
use spotsaver_common::{Coordinates, Spot, SpotDraft, SpotId};

use crate::error::{Result, StoreError};
use crate::geocoder::Geocoder;
use crate::repository::{PersistedSpot, SpotRepository, StoredSpot};

#[derive(Default)]
pub struct MemoryRepository {
    rows: Mutex<Vec<StoredSpot>>,
    next_id: AtomicUsize,
    fail_fetch: AtomicBool,
    fail_insert: AtomicBool,
    inserts: AtomicUsize,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self {
            next_id: AtomicUsize::new(1),
            ..Default::default()
        }
    }

    pub fn with_spots(spots: Vec<Spot>) -> Self {
        let repo = Self::new();
        for spot in spots {
            repo.seed(spot);
        }
        repo
    }

    /// Store a spot as if it had been loaded from the database. The spot's id
    /// is replaced with the assigned row id.
    pub fn seed(&self, mut spot: Spot) -> i64 {
        let remote_id = self.next_id.fetch_add(1, Ordering::SeqCst) as i64;
        spot.id = SpotId::from_remote(remote_id);
        self.rows
            .lock()
            .expect("repository lock poisoned")
            .push(StoredSpot { remote_id, spot });
        remote_id
    }

    pub fn fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    pub fn fail_insert(&self, fail: bool) {
        self.fail_insert.store(fail, Ordering::SeqCst);
    }

    /// Number of insert calls, failed ones included.
    pub fn insert_calls(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().expect("repository lock poisoned").len()
    }
}

#[async_trait]
impl SpotRepository for MemoryRepository {
    async fn fetch_all(&self) -> Result<Vec<StoredSpot>> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".into()));
        }
        Ok(self.rows.lock().expect("repository lock poisoned").clone())
    }

    async fn insert(&self, draft: &SpotDraft) -> Result<PersistedSpot> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("insert rejected".into()));
        }

        let created_at = Utc::now();
        let remote_id = self.next_id.fetch_add(1, Ordering::SeqCst) as i64;
        let spot = Spot::from_draft(SpotId::from_remote(remote_id), draft.clone(), created_at);
        self.rows
            .lock()
            .expect("repository lock poisoned")
            .push(StoredSpot { remote_id, spot });

        Ok(PersistedSpot {
            remote_id,
            created_at,
        })
    }
}

#[derive(Clone)]
pub enum GeocoderBehavior {
    Resolve(Coordinates),
    Reject { status: u16, message: String },
}

pub struct FakeGeocoder {
    behavior: GeocoderBehavior,
    gate: Option<Arc<Notify>>,
    calls: AtomicUsize,
}

impl FakeGeocoder {
    pub fn new(behavior: GeocoderBehavior) -> Self {
        Self {
            behavior,
            gate: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn resolving(lat: f64, lng: f64) -> Self {
        Self::new(GeocoderBehavior::Resolve(Coordinates::new(lat, lng)))
    }

    pub fn rejecting(status: u16, message: &str) -> Self {
        Self::new(GeocoderBehavior::Reject {
            status,
            message: message.to_string(),
        })
    }

    /// Hold every lookup until the gate is notified.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn geocode(&self, _map_url: &str) -> std::result::Result<Coordinates, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match &self.behavior {
            GeocoderBehavior::Resolve(coords) => Ok(*coords),
            GeocoderBehavior::Reject { status, message } => Err(GeocodeError::Api {
                status: *status,
                message: message.clone(),
            }),
        }
    }
}
