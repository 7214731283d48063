pub mod error;
pub mod form;
pub mod geocoder;
pub mod notifications;
pub mod pipeline;
pub mod repository;
pub mod store;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use error::{Result, StoreError};
pub use form::{FormError, FormFields, FormState, SpotForm, Submission};
pub use geocoder::Geocoder;
pub use notifications::{Notification, NotificationKind, Notifications};
pub use pipeline::{available_tags, filter_spots, SpotQuery, SpotStats};
pub use repository::{PersistedSpot, PgSpotRepository, SpotRepository, StoredSpot};
pub use store::{PendingInsert, SpotEntry, SpotStore};
