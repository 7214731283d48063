pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, InsertFailurePolicy};
pub use error::{DraftError, SpotSaverError};
pub use types::*;
