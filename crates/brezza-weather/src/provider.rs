//! OpenWeatherMap-compatible API client.

use reqwest::Client;
use std::time::Duration;
use tracing::instrument;

use crate::types::*;

const API_BASE: &str = "https://api.openweathermap.org/data/2.5";
const GEO_BASE: &str = "https://api.openweathermap.org/geo/1.0";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// How many geocoding candidates a search asks for.
pub const GEOCODE_LIMIT: u8 = 5;

#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Client,
    api_key: String,
    api_url: String,
    geo_url: String,
    language: String,
}

impl WeatherClient {
    /// Create a client against the public provider endpoints.
    pub fn new(api_key: &str, language: &str) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            api_url: API_BASE.to_string(),
            geo_url: GEO_BASE.to_string(),
            language: language.to_string(),
        })
    }

    /// Override the provider endpoints (configuration, tests).
    pub fn with_base_urls(mut self, api_url: &str, geo_url: &str) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self.geo_url = geo_url.trim_end_matches('/').to_string();
        self
    }

    /// Geocode a free-text query to up to `limit` place candidates.
    #[instrument(skip(self), level = "info")]
    pub async fn geocode(&self, query: &str, limit: u8) -> Result<Vec<PlaceCandidate>, WeatherError> {
        let url = format!(
            "{}/direct?q={}&limit={}&appid={}",
            self.geo_url,
            urlencoding::encode(query),
            limit,
            self.api_key,
        );

        let response = self.client.get(&url).send().await?;
        self.handle_response(response).await
    }

    /// Current conditions at a coordinate.
    #[instrument(skip(self), level = "info")]
    pub async fn conditions_at(&self, coord: Coordinate) -> Result<CitySnapshot, WeatherError> {
        let url = format!(
            "{}/weather?lat={}&lon={}&units=metric&lang={}&appid={}",
            self.api_url, coord.lat, coord.lon, self.language, self.api_key,
        );

        let response = self.client.get(&url).send().await?;
        let report: ConditionsReport = self.handle_response(response).await?;
        Ok(CitySnapshot::from_report(report))
    }

    /// Current conditions for a known city id (the detail view's re-fetch
    /// path when no snapshot was handed over).
    #[instrument(skip(self), level = "info")]
    pub async fn conditions_by_id(&self, id: i64) -> Result<CitySnapshot, WeatherError> {
        let url = format!(
            "{}/weather?id={}&units=metric&lang={}&appid={}",
            self.api_url, id, self.language, self.api_key,
        );

        let response = self.client.get(&url).send().await?;
        let report: ConditionsReport = self.handle_response(response).await?;
        Ok(CitySnapshot::from_report(report))
    }

    /// Multi-day forecast at a coordinate, 3-hour granularity.
    #[instrument(skip(self), level = "info")]
    pub async fn forecast_at(&self, coord: Coordinate) -> Result<ForecastReport, WeatherError> {
        let url = format!(
            "{}/forecast?lat={}&lon={}&units=metric&lang={}&appid={}",
            self.api_url, coord.lat, coord.lon, self.language, self.api_key,
        );

        let response = self.client.get(&url).send().await?;
        self.handle_response(response).await
    }

    /// Helper to handle API responses and errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, WeatherError> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| WeatherError::Parse(format!("JSON parse error: {}", e)))
        } else if status.as_u16() == 401 {
            Err(WeatherError::InvalidApiKey)
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(WeatherError::Api {
                status: status.as_u16(),
                message: text,
            })
        }
    }
}
