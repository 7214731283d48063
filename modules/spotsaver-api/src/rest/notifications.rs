use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;

use crate::error::ApiError;
use crate::AppState;

pub async fn api_notifications(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.store.read().await.notifications().list())
}

pub async fn api_dismiss_notification(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.store.write().await.notifications_mut().dismiss(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotificationNotFound)
    }
}
