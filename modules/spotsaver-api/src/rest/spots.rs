use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use tracing::info;

use spotsaver_common::{Coordinates, SortKey, Spot, SpotId};
use spotsaver_store::{FormFields, SpotForm, SpotQuery};

use crate::error::ApiError;
use crate::rest::{report_form_error, save_pending, spots_to_geojson};
use crate::AppState;

// --- Query structs ---

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    q: Option<String>,
    /// Comma-separated tag names.
    tags: Option<String>,
    sort: Option<String>,
}

impl From<ListQuery> for SpotQuery {
    fn from(params: ListQuery) -> Self {
        let tags = params
            .tags
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        let sort = params.sort.as_deref().map(SortKey::parse).unwrap_or_default();

        SpotQuery::new(params.q.unwrap_or_default(), tags, sort)
    }
}

// --- Handlers ---

pub async fn api_spots(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListQuery>,
) -> impl IntoResponse {
    let query = SpotQuery::from(params);
    let store = state.store.read().await;
    let spots: Vec<Spot> = store.filtered(&query).into_iter().cloned().collect();

    Json(serde_json::json!({
        "spots": spots,
        "total": store.len(),
        "hasActiveFilters": query.has_active_filters(),
    }))
}

/// One-shot create: runs the creation form to completion in a single request.
pub async fn api_create_spot(
    State(state): State<Arc<AppState>>,
    Json(fields): Json<FormFields>,
) -> Result<impl IntoResponse, ApiError> {
    let mut form = SpotForm::new();
    form.update(fields)?;

    let draft = match form.submit(state.geocoder.as_ref()).await {
        Ok(draft) => draft,
        Err(e) => {
            report_form_error(&state, &e).await;
            return Err(e.into());
        }
    };

    let (pending, repository) = {
        let mut store = state.store.write().await;
        (store.add(draft)?, store.repository())
    };
    let entry = save_pending(&state, pending, repository).await?;

    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn api_drop_pin(
    State(state): State<Arc<AppState>>,
    Json(coordinates): Json<Coordinates>,
) -> Result<impl IntoResponse, ApiError> {
    if !coordinates.is_valid() {
        return Err(ApiError::InvalidCoordinates);
    }

    let (pending, repository) = {
        let mut store = state.store.write().await;
        (store.drop_pin(coordinates)?, store.repository())
    };
    info!(lat = coordinates.lat, lng = coordinates.lng, "Pin dropped");
    let entry = save_pending(&state, pending, repository).await?;

    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn api_spot_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let store = state.store.read().await;
    let entry = store.get(&SpotId::from(id)).ok_or(ApiError::SpotNotFound)?;
    Ok(Json(entry.clone()))
}

pub async fn api_update_spot(Path(_id): Path<String>) -> ApiError {
    ApiError::NotImplemented
}

pub async fn api_map(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let store = state.store.read().await;
    Json(spots_to_geojson(store.entries()))
}

pub async fn api_tags(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.store.read().await.available_tags())
}

pub async fn api_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.store.read().await.stats())
}
