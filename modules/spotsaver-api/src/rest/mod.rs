pub mod forms;
pub mod notifications;
pub mod spots;

use std::sync::Arc;

use tracing::warn;

use spotsaver_store::{FormError, NotificationKind, PendingInsert, SpotEntry, SpotRepository};

use crate::error::ApiError;
use crate::AppState;

// --- Helpers ---

pub fn spots_to_geojson<'a>(entries: impl IntoIterator<Item = &'a SpotEntry>) -> serde_json::Value {
    let features: Vec<serde_json::Value> = entries
        .into_iter()
        .map(|entry| {
            let spot = entry.spot();
            serde_json::json!({
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    "coordinates": [spot.coordinates.lng, spot.coordinates.lat]
                },
                "properties": {
                    "id": spot.id,
                    "name": spot.name,
                    "location": spot.location,
                    "tags": spot.tags,
                    "visited": spot.is_visited(),
                    "rating": spot.rating,
                    "pending": entry.is_pending(),
                }
            })
        })
        .collect();

    serde_json::json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

/// Write an optimistic insert to the database and fold the result back into
/// the store. The store lock is only held while resolving.
pub(crate) async fn save_pending(
    state: &AppState,
    pending: PendingInsert,
    repository: Arc<dyn SpotRepository>,
) -> Result<SpotEntry, ApiError> {
    let result = pending.persist(repository.as_ref()).await;

    let mut store = state.store.write().await;
    store.resolve(pending, result).cloned().ok_or(ApiError::SaveFailed)
}

/// Surface a failed lookup as a notification; other form errors are only
/// reported in the response.
pub(crate) async fn report_form_error(state: &AppState, err: &FormError) {
    if let FormError::Geocode(e) = err {
        warn!(error = %e, "Geocoding failed, spot not saved");
        state.store.write().await.notifications_mut().push(
            NotificationKind::GeocodeFailed,
            "Error fetching coordinates",
            e.message(),
        );
    }
}
