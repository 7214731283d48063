//! In-memory spot collection with optimistic inserts.
//!
//! The store is loaded once from the repository and afterwards only grows.
//! New spots are prepended as `Pending` before the database has seen them;
//! the insert result later turns them into `Confirmed`, or into `Unsaved` /
//! nothing depending on the [`InsertFailurePolicy`].

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use spotsaver_common::{Coordinates, DraftError, InsertFailurePolicy, Spot, SpotDraft, SpotId};

use crate::error::Result;
use crate::notifications::{NotificationKind, Notifications};
use crate::pipeline::{self, SpotQuery, SpotStats};
use crate::repository::{PersistedSpot, SpotRepository};

/// A spot together with where it stands relative to the database.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SpotEntry {
    /// Added locally, insert not yet acknowledged.
    Pending {
        #[serde(flatten)]
        spot: Spot,
    },
    /// Backed by a database row.
    Confirmed {
        #[serde(flatten)]
        spot: Spot,
        #[serde(rename = "remoteId")]
        remote_id: i64,
    },
    /// The insert failed and the local copy was kept.
    Unsaved {
        #[serde(flatten)]
        spot: Spot,
        reason: String,
    },
}

impl SpotEntry {
    pub fn spot(&self) -> &Spot {
        match self {
            SpotEntry::Pending { spot }
            | SpotEntry::Confirmed { spot, .. }
            | SpotEntry::Unsaved { spot, .. } => spot,
        }
    }

    pub fn id(&self) -> &SpotId {
        &self.spot().id
    }

    pub fn remote_id(&self) -> Option<i64> {
        match self {
            SpotEntry::Confirmed { remote_id, .. } => Some(*remote_id),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, SpotEntry::Pending { .. })
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, SpotEntry::Confirmed { .. })
    }
}

/// Handle for an optimistic insert whose database write is still outstanding.
#[derive(Debug, Clone)]
pub struct PendingInsert {
    id: SpotId,
    draft: SpotDraft,
}

impl PendingInsert {
    pub fn id(&self) -> &SpotId {
        &self.id
    }

    pub fn draft(&self) -> &SpotDraft {
        &self.draft
    }

    /// Write the draft to the database. Does not touch the store, so callers
    /// sharing the store behind a lock can run this without holding it.
    pub async fn persist(&self, repository: &dyn SpotRepository) -> Result<PersistedSpot> {
        repository.insert(&self.draft).await
    }
}

pub struct SpotStore {
    repository: Arc<dyn SpotRepository>,
    policy: InsertFailurePolicy,
    entries: Vec<SpotEntry>,
    notifications: Notifications,
}

impl SpotStore {
    pub fn new(repository: Arc<dyn SpotRepository>, policy: InsertFailurePolicy) -> Self {
        Self {
            repository,
            policy,
            entries: Vec::new(),
            notifications: Notifications::new(),
        }
    }

    pub fn repository(&self) -> Arc<dyn SpotRepository> {
        self.repository.clone()
    }

    pub fn policy(&self) -> InsertFailurePolicy {
        self.policy
    }

    /// Replace the collection with everything in the database. A failed fetch
    /// leaves the store empty and queues a notification; it is never fatal.
    pub async fn load(&mut self) -> usize {
        match self.repository.fetch_all().await {
            Ok(rows) => {
                self.entries = rows
                    .into_iter()
                    .map(|row| SpotEntry::Confirmed {
                        spot: row.spot,
                        remote_id: row.remote_id,
                    })
                    .collect();
                info!(count = self.entries.len(), "Loaded spots");
                self.entries.len()
            }
            Err(e) => {
                warn!(error = %e, "Failed to load spots, starting empty");
                self.entries.clear();
                self.notifications
                    .push(NotificationKind::LoadFailed, "Error fetching spots", e.to_string());
                0
            }
        }
    }

    /// Validate the draft and prepend it as a pending spot. Invalid drafts
    /// leave the store untouched.
    pub fn add(&mut self, draft: SpotDraft) -> std::result::Result<PendingInsert, DraftError> {
        draft.validate()?;
        let draft = normalize(draft);

        let id = SpotId::local();
        let spot = Spot::from_draft(id.clone(), draft.clone(), Utc::now());
        self.entries.insert(0, SpotEntry::Pending { spot });

        info!(id = %id, name = %draft.name, "Added spot");
        Ok(PendingInsert { id, draft })
    }

    /// Add a placeholder spot for a pin dropped on the map.
    pub fn drop_pin(
        &mut self,
        coordinates: Coordinates,
    ) -> std::result::Result<PendingInsert, DraftError> {
        self.add(SpotDraft::pin(coordinates))
    }

    /// Apply the outcome of a pending insert. A confirmed spot takes the
    /// database's creation time. Returns the entry as it now stands, or
    /// `None` if it was rolled back or no longer exists.
    pub fn resolve(
        &mut self,
        pending: PendingInsert,
        result: Result<PersistedSpot>,
    ) -> Option<&SpotEntry> {
        let Some(pos) = self.position(&pending.id) else {
            debug!(id = %pending.id, "Insert result for unknown spot discarded");
            return None;
        };

        match result {
            Ok(persisted) => {
                let mut spot = self.entries[pos].spot().clone();
                spot.created_at = persisted.created_at;
                info!(id = %pending.id, remote_id = persisted.remote_id, "Spot saved");
                self.entries[pos] = SpotEntry::Confirmed {
                    spot,
                    remote_id: persisted.remote_id,
                };
                Some(&self.entries[pos])
            }
            Err(e) => {
                let reason = e.to_string();
                warn!(id = %pending.id, error = %reason, policy = %self.policy, "Failed to save spot");
                self.notifications.push(
                    NotificationKind::InsertFailed,
                    "Error saving spot",
                    format!("{}: {}", pending.draft.name, reason),
                );

                match self.policy {
                    InsertFailurePolicy::Keep => {
                        let spot = self.entries[pos].spot().clone();
                        self.entries[pos] = SpotEntry::Unsaved { spot, reason };
                        Some(&self.entries[pos])
                    }
                    InsertFailurePolicy::Rollback => {
                        self.entries.remove(pos);
                        None
                    }
                }
            }
        }
    }

    /// `add`, `persist` and `resolve` in one go, for callers that own the store.
    pub async fn add_and_persist(
        &mut self,
        draft: SpotDraft,
    ) -> std::result::Result<Option<SpotEntry>, DraftError> {
        let pending = self.add(draft)?;
        let result = pending.persist(self.repository.as_ref()).await;
        Ok(self.resolve(pending, result).cloned())
    }

    pub fn entries(&self) -> &[SpotEntry] {
        &self.entries
    }

    pub fn spots(&self) -> impl Iterator<Item = &Spot> {
        self.entries.iter().map(SpotEntry::spot)
    }

    pub fn get(&self, id: &SpotId) -> Option<&SpotEntry> {
        self.entries.iter().find(|e| e.id() == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn filtered(&self, query: &SpotQuery) -> Vec<&Spot> {
        pipeline::filter_spots(self.spots(), query)
    }

    pub fn available_tags(&self) -> Vec<String> {
        pipeline::available_tags(self.spots())
    }

    pub fn stats(&self) -> SpotStats {
        pipeline::stats(self.spots())
    }

    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    pub fn notifications_mut(&mut self) -> &mut Notifications {
        &mut self.notifications
    }

    fn position(&self, id: &SpotId) -> Option<usize> {
        self.entries.iter().position(|e| e.id() == id)
    }
}

fn normalize(draft: SpotDraft) -> SpotDraft {
    SpotDraft {
        name: draft.name.trim().to_string(),
        location: draft.location.trim().to_string(),
        notes: draft
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
        ..draft
    }
}
