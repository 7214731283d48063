use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;

use spotsaver_common::DraftError;
use spotsaver_store::FormError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Draft(#[from] DraftError),

    #[error(transparent)]
    Form(#[from] FormError),

    #[error("Spot not found")]
    SpotNotFound,

    #[error("Form not found")]
    FormNotFound,

    #[error("Notification not found")]
    NotificationNotFound,

    #[error("Error saving spot")]
    SaveFailed,

    #[error("Coordinates out of range")]
    InvalidCoordinates,

    #[error("Editing is coming soon")]
    NotImplemented,

    #[error("Internal error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Draft(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Form(FormError::MissingName | FormError::MissingLocation) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::Form(FormError::Geocode(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Form(FormError::Cancelled) => StatusCode::GONE,
            ApiError::Form(FormError::NotEditing(_)) => StatusCode::CONFLICT,
            ApiError::SpotNotFound | ApiError::FormNotFound | ApiError::NotificationNotFound => {
                StatusCode::NOT_FOUND
            }
            ApiError::SaveFailed => StatusCode::BAD_GATEWAY,
            ApiError::InvalidCoordinates => StatusCode::BAD_REQUEST,
            ApiError::NotImplemented => StatusCode::NOT_IMPLEMENTED,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(serde_json::json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geocode_client::GeocodeError;
    use spotsaver_store::FormState;

    #[test]
    fn form_errors_map_to_distinct_statuses() {
        let geocode = ApiError::from(FormError::Geocode(GeocodeError::Api {
            status: 400,
            message: "Invalid Google Maps URL".into(),
        }));
        assert_eq!(geocode.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(geocode.to_string(), "Invalid Google Maps URL");

        assert_eq!(
            ApiError::from(FormError::MissingName).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::from(FormError::NotEditing(FormState::Submitted)).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(ApiError::from(FormError::Cancelled).status(), StatusCode::GONE);
    }

    #[test]
    fn draft_errors_are_unprocessable() {
        let err = ApiError::from(DraftError::MissingLocation);
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
