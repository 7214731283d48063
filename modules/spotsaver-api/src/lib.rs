pub mod error;
pub mod registry;
pub mod rest;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue},
    routing::{delete, get, post, put},
    Router,
};
use tokio::sync::{Mutex, RwLock};
use tower_http::set_header::SetResponseHeaderLayer;

use spotsaver_store::{Geocoder, SpotStore};

pub use error::ApiError;
pub use registry::{FormRegistry, MAX_OPEN_FORMS};

pub struct AppState {
    pub store: RwLock<SpotStore>,
    pub geocoder: Arc<dyn Geocoder>,
    pub forms: Mutex<FormRegistry>,
}

impl AppState {
    pub fn new(store: SpotStore, geocoder: Arc<dyn Geocoder>) -> Self {
        Self {
            store: RwLock::new(store),
            geocoder,
            forms: Mutex::new(FormRegistry::new()),
        }
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/", get(|| async { "ok" }))
        // Spots
        .route("/api/spots", get(rest::spots::api_spots).post(rest::spots::api_create_spot))
        .route("/api/spots/pin", post(rest::spots::api_drop_pin))
        .route(
            "/api/spots/{id}",
            get(rest::spots::api_spot_detail).put(rest::spots::api_update_spot),
        )
        .route("/api/map", get(rest::spots::api_map))
        .route("/api/tags", get(rest::spots::api_tags))
        .route("/api/stats", get(rest::spots::api_stats))
        // Creation forms
        .route("/api/forms", post(rest::forms::api_open_form))
        .route(
            "/api/forms/{id}",
            put(rest::forms::api_update_form).delete(rest::forms::api_cancel_form),
        )
        .route("/api/forms/{id}/submit", post(rest::forms::api_submit_form))
        // Notifications
        .route("/api/notifications", get(rest::notifications::api_notifications))
        .route(
            "/api/notifications/{id}",
            delete(rest::notifications::api_dismiss_notification),
        )
        .with_state(state)
        // CORS
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        // Logging layer: method + path only
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}
