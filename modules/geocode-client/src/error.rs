use thiserror::Error;

pub type Result<T> = std::result::Result<T, GeocodeError>;

/// Message used when the service gives no reason of its own.
pub const GENERIC_FAILURE: &str = "Failed to fetch coordinates";

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("{0}")]
    Malformed(String),
}

impl GeocodeError {
    /// The message to show the user.
    pub fn message(&self) -> &str {
        match self {
            GeocodeError::Network(message) => message,
            GeocodeError::Api { message, .. } => message,
            GeocodeError::Malformed(message) => message,
        }
    }
}

impl From<reqwest::Error> for GeocodeError {
    fn from(err: reqwest::Error) -> Self {
        GeocodeError::Network(err.to_string())
    }
}
