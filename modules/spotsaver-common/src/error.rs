use thiserror::Error;

/// Why a draft cannot be saved.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    #[error("Spot name is required")]
    MissingName,

    #[error("Spot location is required")]
    MissingLocation,
}

#[derive(Error, Debug)]
pub enum SpotSaverError {
    #[error("Rating must be between 1 and 5, got {0}")]
    InvalidRating(i64),

    #[error("Configuration error: {0}")]
    Config(String),
}
