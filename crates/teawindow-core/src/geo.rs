//! Observer location lookup.
//!
//! The ephemeris only needs rough coordinates; an IP-based lookup is good
//! to a city, which is plenty for sunrise/sunset. Lookup failures are
//! expected (offline, blocked, slow) and every failure mode collapses to
//! the same caller-visible outcome: no coordinates, fixed sun times.

use std::time::Duration;

use serde::Deserialize;

use crate::ephemeris::{self, Coordinates, SunTimes};
use crate::error::GeoError;
use crate::storage::Settings;

/// Default lookup endpoint. Returns `{"lat": .., "lon": ..}` among other
/// fields.
const DEFAULT_ENDPOINT: &str = "http://ip-api.com/json";
/// How long a lookup may take before it counts as absent.
const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Source of observer coordinates. Implementations may block up to their
/// own timeout; callers treat every error identically.
pub trait LocationProvider {
    fn locate(&self) -> Result<Coordinates, GeoError>;
}

#[derive(Deserialize)]
struct IpApiBody {
    lat: Option<f64>,
    lon: Option<f64>,
}

/// Coordinates from an IP geolocation endpoint, fetched over HTTP with a
/// hard timeout.
pub struct IpLocationProvider {
    endpoint: String,
    timeout_ms: u64,
}

impl IpLocationProvider {
    pub fn new() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Point the provider at a different endpoint (tests use a local
    /// mock server).
    pub fn with_endpoint(endpoint: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout_ms,
        }
    }

    async fn fetch(&self) -> Result<Coordinates, GeoError> {
        let body: IpApiBody = reqwest::Client::new()
            .get(&self.endpoint)
            .send()
            .await?
            .json()
            .await
            .map_err(|e| GeoError::Malformed(e.to_string()))?;
        match (body.lat, body.lon) {
            (Some(latitude), Some(longitude)) => Ok(Coordinates {
                latitude,
                longitude,
            }),
            _ => Err(GeoError::Malformed(
                "response missing lat/lon fields".into(),
            )),
        }
    }
}

impl Default for IpLocationProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationProvider for IpLocationProvider {
    fn locate(&self) -> Result<Coordinates, GeoError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| GeoError::Http(e.to_string()))?;
        runtime.block_on(async {
            tokio::time::timeout(Duration::from_millis(self.timeout_ms), self.fetch())
                .await
                .map_err(|_| GeoError::Timeout {
                    timeout_ms: self.timeout_ms,
                })?
        })
    }
}

/// Sun times for `date` honoring the settings: explicit coordinates win,
/// then the provider, then the fixed schedule. A `None` provider behaves
/// like a denied lookup.
pub fn resolve_sun_times(
    date: chrono::NaiveDate,
    settings: &Settings,
    provider: Option<&dyn LocationProvider>,
) -> SunTimes {
    if !settings.use_real_sun_times {
        return ephemeris::fixed(date);
    }
    let coords = match (settings.latitude, settings.longitude) {
        (Some(latitude), Some(longitude)) => Some(Coordinates {
            latitude,
            longitude,
        }),
        _ => provider.and_then(|p| p.locate().ok()),
    };
    ephemeris::compute_local(date, coords)
}
