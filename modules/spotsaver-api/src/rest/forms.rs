//! Creation forms kept open across requests.
//!
//! The registry lock is released while the map link is geocoded, so a cancel
//! can land mid-lookup. The submission's cancellation token then wins and the
//! late result is dropped. The lookup and save run in their own task, so a
//! client that disconnects mid-submit still leaves the form either submitted
//! or back in `Editing`.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use spotsaver_common::Coordinates;
use spotsaver_store::{FormError, FormFields, FormState, SpotEntry, SpotForm, Submission};

use crate::error::ApiError;
use crate::rest::{report_form_error, save_pending};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct OpenFormRequest {
    /// Position clicked on the map before opening the form.
    #[serde(default)]
    coordinates: Option<Coordinates>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormView {
    pub id: Uuid,
    pub state: FormState,
    pub fields: FormFields,
}

impl FormView {
    fn new(id: Uuid, form: &SpotForm) -> Self {
        Self {
            id,
            state: form.state(),
            fields: form.fields().clone(),
        }
    }
}

pub async fn api_open_form(
    State(state): State<Arc<AppState>>,
    Json(body): Json<OpenFormRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let form = match body.coordinates {
        Some(coordinates) if !coordinates.is_valid() => return Err(ApiError::InvalidCoordinates),
        Some(coordinates) => SpotForm::at(coordinates),
        None => SpotForm::new(),
    };

    let id = Uuid::new_v4();
    let view = FormView::new(id, &form);
    state.forms.lock().await.insert(id, form);
    debug!(form = %id, "Opened spot form");

    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn api_update_form(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(fields): Json<FormFields>,
) -> Result<impl IntoResponse, ApiError> {
    let mut forms = state.forms.lock().await;
    let form = forms.get_mut(&id).ok_or(ApiError::FormNotFound)?;
    form.update(fields)?;
    Ok(Json(FormView::new(id, form)))
}

pub async fn api_submit_form(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let submission = {
        let mut forms = state.forms.lock().await;
        let form = forms.get_mut(&id).ok_or(ApiError::FormNotFound)?;
        form.begin_submit()?
    };

    let entry = tokio::spawn(complete_submission(state.clone(), id, submission))
        .await
        .map_err(|e| {
            warn!(form = %id, error = %e, "Form submission task failed");
            ApiError::Internal
        })??;

    Ok((StatusCode::CREATED, Json(entry)))
}

/// Geocode, finish the form and save the resulting spot.
async fn complete_submission(
    state: Arc<AppState>,
    id: Uuid,
    submission: Submission,
) -> Result<SpotEntry, ApiError> {
    let outcome = submission.geocode(state.geocoder.as_ref()).await;

    let finished = {
        let mut forms = state.forms.lock().await;
        let Some(form) = forms.get_mut(&id) else {
            // Cancelled or evicted while the lookup was running.
            return Err(FormError::Cancelled.into());
        };
        let finished = form.finish(outcome);
        if finished.is_ok() {
            forms.remove(&id);
        }
        finished
    };

    let draft = match finished {
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
    info!(form = %id, spot = %pending.id(), "Form submitted");
    save_pending(&state, pending, repository).await
}

pub async fn api_cancel_form(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut form = state
        .forms
        .lock()
        .await
        .remove(&id)
        .ok_or(ApiError::FormNotFound)?;
    form.cancel();
    debug!(form = %id, "Cancelled spot form");

    Ok(StatusCode::NO_CONTENT)
}
