pub mod error;

pub use error::{GeocodeError, Result, GENERIC_FAILURE};

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// Body returned by `/get-lat-lng`: either `coordinates` or `error`.
#[derive(Debug, Deserialize)]
struct LookupResponse {
    coordinates: Option<LatLng>,
    error: Option<String>,
}

pub struct GeocodeClient {
    client: reqwest::Client,
    base_url: String,
}

impl GeocodeClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Resolve a pasted map link (e.g. a Google Maps URL) into coordinates.
    pub async fn lookup(&self, map_url: &str) -> Result<LatLng> {
        let endpoint = format!("{}/get-lat-lng", self.base_url);

        let resp = self
            .client
            .get(&endpoint)
            .query(&[("url", map_url)])
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        let parsed = serde_json::from_str::<LookupResponse>(&body);

        if !status.is_success() {
            let message = parsed
                .ok()
                .and_then(|r| r.error)
                .unwrap_or_else(|| GENERIC_FAILURE.to_string());
            tracing::warn!(status = status.as_u16(), %message, "Geocode lookup rejected");
            return Err(GeocodeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed = parsed.map_err(|e| {
            tracing::warn!(error = %e, "Geocode response was not valid JSON");
            GeocodeError::Malformed(GENERIC_FAILURE.to_string())
        })?;

        let coords = match parsed.coordinates {
            Some(coords) => coords,
            None => {
                return Err(GeocodeError::Malformed(
                    parsed.error.unwrap_or_else(|| GENERIC_FAILURE.to_string()),
                ))
            }
        };

        if !in_range(&coords) {
            return Err(GeocodeError::Malformed(format!(
                "Coordinates out of range: {}, {}",
                coords.lat, coords.lng
            )));
        }

        tracing::debug!(lat = coords.lat, lng = coords.lng, "Geocoded map link");
        Ok(coords)
    }
}

fn in_range(c: &LatLng) -> bool {
    c.lat.is_finite()
        && c.lng.is_finite()
        && (-90.0..=90.0).contains(&c.lat)
        && (-180.0..=180.0).contains(&c.lng)
}
