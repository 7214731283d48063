use async_trait::async_trait;
use geocode_client::{GeocodeClient, GeocodeError};

use spotsaver_common::Coordinates;

/// Resolves a pasted map link into coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, map_url: &str) -> Result<Coordinates, GeocodeError>;
}

#[async_trait]
impl Geocoder for GeocodeClient {
    async fn geocode(&self, map_url: &str) -> Result<Coordinates, GeocodeError> {
        let coords = self.lookup(map_url).await?;
        Ok(Coordinates::new(coords.lat, coords.lng))
    }
}
