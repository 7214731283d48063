//! The "add spot" form.
//!
//! ```text
//! Editing ──submit──▶ Validating ──ok──▶ Submitted
//!    ▲                   │
//!    └──invalid/geocode──┘
//! any ──cancel──▶ Closed
//! ```
//!
//! A failed submit keeps every entered value. Only a successful submit or a
//! cancel clears the fields.

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use geocode_client::GeocodeError;
use spotsaver_common::{Coordinates, DraftError, SpotDraft, Tags};

use crate::geocoder::Geocoder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormState {
    Editing,
    Validating,
    Submitted,
    Closed,
}

impl std::fmt::Display for FormState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormState::Editing => write!(f, "editing"),
            FormState::Validating => write!(f, "validating"),
            FormState::Submitted => write!(f, "submitted"),
            FormState::Closed => write!(f, "closed"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error("Spot name is required")]
    MissingName,

    #[error("Spot location is required")]
    MissingLocation,

    #[error("{}", .0.message())]
    Geocode(#[from] GeocodeError),

    #[error("Form was cancelled")]
    Cancelled,

    #[error("Form is {0}, not editable")]
    NotEditing(FormState),
}

impl From<DraftError> for FormError {
    fn from(err: DraftError) -> Self {
        match err {
            DraftError::MissingName => FormError::MissingName,
            DraftError::MissingLocation => FormError::MissingLocation,
        }
    }
}

/// Everything the user can type into the form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormFields {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub location: String,
    /// Pasted map link; when present its geocoded position wins.
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub tags: Tags,
    /// Position picked on the map before the form was opened.
    #[serde(default)]
    pub initial_coordinates: Option<Coordinates>,
}

/// Work that has to happen outside the form before it can finish submitting.
#[derive(Debug, Clone)]
pub struct Submission {
    url: Option<String>,
    token: CancellationToken,
}

impl Submission {
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Geocode the pasted link, if any. Resolves to `Cancelled` as soon as the
    /// owning form is cancelled, dropping the in-flight lookup.
    pub async fn geocode(&self, geocoder: &dyn Geocoder) -> Result<Option<Coordinates>, FormError> {
        let Some(url) = self.url.as_deref() else {
            return Ok(None);
        };

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(FormError::Cancelled),
            result = geocoder.geocode(url) => result.map(Some).map_err(FormError::from),
        }
    }
}

#[derive(Debug)]
pub struct SpotForm {
    fields: FormFields,
    state: FormState,
    token: CancellationToken,
}

impl Default for SpotForm {
    fn default() -> Self {
        Self::new()
    }
}

impl SpotForm {
    pub fn new() -> Self {
        Self {
            fields: FormFields::default(),
            state: FormState::Editing,
            token: CancellationToken::new(),
        }
    }

    /// Open the form pre-filled with a position picked on the map.
    pub fn at(coordinates: Coordinates) -> Self {
        let mut form = Self::new();
        form.fields.initial_coordinates = Some(coordinates);
        form
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn fields(&self) -> &FormFields {
        &self.fields
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    // --- editing ---

    fn editable(&mut self) -> Result<&mut FormFields, FormError> {
        match self.state {
            FormState::Editing => Ok(&mut self.fields),
            FormState::Closed => Err(FormError::Cancelled),
            other => Err(FormError::NotEditing(other)),
        }
    }

    /// Replace all fields at once.
    pub fn update(&mut self, fields: FormFields) -> Result<(), FormError> {
        *self.editable()? = fields;
        Ok(())
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), FormError> {
        self.editable()?.name = name.into();
        Ok(())
    }

    pub fn set_location(&mut self, location: impl Into<String>) -> Result<(), FormError> {
        self.editable()?.location = location.into();
        Ok(())
    }

    pub fn set_url(&mut self, url: impl Into<String>) -> Result<(), FormError> {
        self.editable()?.url = url.into();
        Ok(())
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) -> Result<(), FormError> {
        self.editable()?.notes = notes.into();
        Ok(())
    }

    pub fn set_initial_coordinates(&mut self, coordinates: Coordinates) -> Result<(), FormError> {
        self.editable()?.initial_coordinates = Some(coordinates);
        Ok(())
    }

    /// Returns `false` for blank or duplicate tags.
    pub fn add_tag(&mut self, tag: &str) -> Result<bool, FormError> {
        Ok(self.editable()?.tags.insert(tag))
    }

    pub fn remove_tag(&mut self, tag: &str) -> Result<bool, FormError> {
        Ok(self.editable()?.tags.remove(tag))
    }

    // --- submitting ---

    /// Validate and move to `Validating`. Missing name or location sends the
    /// form back to `Editing` with its values intact.
    pub fn begin_submit(&mut self) -> Result<Submission, FormError> {
        self.editable()?;

        if self.fields.name.trim().is_empty() {
            return Err(FormError::MissingName);
        }
        if self.fields.location.trim().is_empty() {
            return Err(FormError::MissingLocation);
        }

        self.state = FormState::Validating;
        let url = Some(self.fields.url.trim().to_string()).filter(|u| !u.is_empty());
        Ok(Submission {
            url,
            token: self.token.clone(),
        })
    }

    /// Apply the geocoding outcome. On success the form yields its draft,
    /// clears itself and becomes `Submitted`; on failure it returns to `Editing`.
    pub fn finish(
        &mut self,
        outcome: Result<Option<Coordinates>, FormError>,
    ) -> Result<SpotDraft, FormError> {
        if self.token.is_cancelled() || self.state == FormState::Closed {
            debug!("Discarding submit result for cancelled form");
            return Err(FormError::Cancelled);
        }
        if self.state != FormState::Validating {
            return Err(FormError::NotEditing(self.state));
        }

        let geocoded = match outcome {
            Ok(geocoded) => geocoded,
            Err(e) => {
                self.state = FormState::Editing;
                return Err(e);
            }
        };

        let fields = std::mem::take(&mut self.fields);
        let coordinates = geocoded
            .or(fields.initial_coordinates)
            .unwrap_or(Coordinates::SENTINEL);
        let notes = fields.notes.trim().to_string();

        let draft = SpotDraft {
            name: fields.name.trim().to_string(),
            location: fields.location.trim().to_string(),
            coordinates,
            tags: fields.tags,
            notes: Some(notes).filter(|n| !n.is_empty()),
        };

        self.state = FormState::Submitted;
        info!(name = %draft.name, geocoded = geocoded.is_some(), "Spot form submitted");
        Ok(draft)
    }

    /// Validate, geocode and finish, for callers that own the form outright.
    pub async fn submit(&mut self, geocoder: &dyn Geocoder) -> Result<SpotDraft, FormError> {
        let submission = self.begin_submit()?;
        let outcome = submission.geocode(geocoder).await;
        self.finish(outcome)
    }

    /// Close the form from any state, discarding input and any pending lookup.
    pub fn cancel(&mut self) {
        self.token.cancel();
        self.fields = FormFields::default();
        self.state = FormState::Closed;
    }
}
