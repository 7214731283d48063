use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;
use uuid::Uuid;

use crate::error::{DraftError, SpotSaverError};

// --- Geo Types ---

/// A latitude/longitude pair. `{0, 0}` doubles as the "unknown" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub const SENTINEL: Coordinates = Coordinates { lat: 0.0, lng: 0.0 };

    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_sentinel(&self) -> bool {
        *self == Self::SENTINEL
    }

    /// True when both components are finite and inside WGS84 bounds.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Display label used for spots dropped straight from the map.
    pub fn label(&self) -> String {
        format!("Lat: {:.4}, Lng: {:.4}", self.lat, self.lng)
    }
}

// --- Identity ---

/// Opaque spot identifier. Database rows use the decimal serial id, spots
/// created in this process use a random UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpotId(String);

impl SpotId {
    pub fn local() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_remote(id: i64) -> Self {
        Self(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SpotId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SpotId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for SpotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// --- Tags ---

/// Insertion-ordered set of tags. Values are trimmed; blanks and duplicates
/// are dropped on the way in.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Tags(Vec<String>);

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the tag was blank or already present.
    pub fn insert(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.contains(tag) {
            return false;
        }
        self.0.push(tag.to_string());
        true
    }

    pub fn remove(&mut self, tag: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|t| t != tag);
        self.0.len() != before
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl<S: AsRef<str>> FromIterator<S> for Tags {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut tags = Tags::new();
        for tag in iter {
            tags.insert(tag.as_ref());
        }
        tags
    }
}

impl From<Vec<String>> for Tags {
    fn from(value: Vec<String>) -> Self {
        value.into_iter().collect()
    }
}

impl From<Tags> for Vec<String> {
    fn from(value: Tags) -> Self {
        value.0
    }
}

impl<'a> IntoIterator for &'a Tags {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// --- Rating ---

/// Rating on a 1–5 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Rating {
    type Error = SpotSaverError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            Ok(Rating(value as u8))
        } else {
            Err(SpotSaverError::InvalidRating(value))
        }
    }
}

impl From<Rating> for u8 {
    fn from(value: Rating) -> Self {
        value.0
    }
}

// --- Spot ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spot {
    pub id: SpotId,
    pub name: String,
    pub location: String,
    pub coordinates: Coordinates,
    pub tags: Tags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visited_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
    pub created_at: DateTime<Utc>,
}

impl Spot {
    /// Materialize a draft into a spot. Visit metadata starts out empty.
    pub fn from_draft(id: SpotId, draft: SpotDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name,
            location: draft.location,
            coordinates: draft.coordinates,
            tags: draft.tags,
            notes: draft.notes,
            visited_at: None,
            rating: None,
            created_at,
        }
    }

    pub fn is_visited(&self) -> bool {
        self.visited_at.is_some()
    }

    pub fn notes_or_empty(&self) -> &str {
        self.notes.as_deref().unwrap_or("")
    }
}

/// The user-supplied part of a spot, before it has an id or timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder)]
pub struct SpotDraft {
    #[builder(setter(into))]
    pub name: String,
    #[builder(setter(into))]
    pub location: String,
    #[builder(default)]
    #[serde(default)]
    pub coordinates: Coordinates,
    #[builder(default)]
    #[serde(default)]
    pub tags: Tags,
    #[builder(default, setter(strip_option, into))]
    #[serde(default)]
    pub notes: Option<String>,
}

impl SpotDraft {
    /// Name and location must be non-blank.
    pub fn validate(&self) -> Result<(), DraftError> {
        if self.name.trim().is_empty() {
            return Err(DraftError::MissingName);
        }
        if self.location.trim().is_empty() {
            return Err(DraftError::MissingLocation);
        }
        Ok(())
    }

    /// Draft for a pin dropped on the map with no further details.
    pub fn pin(coordinates: Coordinates) -> Self {
        Self {
            name: "New Spot".to_string(),
            location: coordinates.label(),
            coordinates,
            tags: Tags::new(),
            notes: None,
        }
    }
}

// --- Sorting ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Recent,
    Name,
    Location,
    Rating,
}

impl SortKey {
    /// Unrecognized keys fall back to `Recent`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "name" => SortKey::Name,
            "location" => SortKey::Location,
            "rating" => SortKey::Rating,
            _ => SortKey::Recent,
        }
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortKey::Recent => write!(f, "recent"),
            SortKey::Name => write!(f, "name"),
            SortKey::Location => write!(f, "location"),
            SortKey::Rating => write!(f, "rating"),
        }
    }
}
