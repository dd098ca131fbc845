//! Single-shot device location and the "my location" resolution flow.
//!
//! Position comes from an IP geolocation service over plain HTTP, the
//! headless stand-in for a browser's geolocation facility. One acquisition
//! per call; no tracking.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::provider::WeatherClient;
use crate::types::{Coordinate, CurrentLocation, LocationError, WeatherError};

const LOCATE_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct IpLocator {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct LocateResponse {
    status: String,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
    #[serde(default)]
    message: Option<String>,
}

impl IpLocator {
    pub fn new(base_url: &str) -> Result<Self, LocationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(LOCATE_TIMEOUT_SECS))
            .build()
            .map_err(|e| LocationError::Other(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Acquire the device's current coordinate, once.
    pub async fn current_position(&self) -> Result<Coordinate, LocationError> {
        let url = format!("{}/json", self.base_url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                LocationError::Timeout
            } else {
                LocationError::Other(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(LocationError::ServiceUnavailable);
        }

        let body: LocateResponse = response
            .json()
            .await
            .map_err(|e| LocationError::Other(e.to_string()))?;

        if body.status != "success" {
            tracing::debug!(
                "Location service refused the request: {}",
                body.message.as_deref().unwrap_or("no reason given")
            );
            return Err(LocationError::ServiceUnavailable);
        }

        match (body.lat, body.lon) {
            (Some(lat), Some(lon)) => Ok(Coordinate { lat, lon }),
            _ => Err(LocationError::ServiceUnavailable),
        }
    }
}

/// Resolve the "my location" card: acquire a coordinate, then fetch one
/// current-conditions reading for it.
///
/// Position failures arrive as [`WeatherError::Location`]; a failure is
/// terminal for the session and must not block the saved-city list.
pub async fn resolve_current_location(
    locator: &IpLocator,
    client: &WeatherClient,
) -> Result<CurrentLocation, WeatherError> {
    let coord = locator.current_position().await?;
    let snapshot = client.conditions_at(coord).await?;

    tracing::info!(lat = coord.lat, lon = coord.lon, city = %snapshot.name, "Resolved current location");
    Ok(CurrentLocation(snapshot))
}
