//! The headless application session.
//!
//! Holds everything a front end would render: the saved-city list, the
//! ephemeral "my location" card, the live suggestion list, and the error
//! banner. Provider and location failures are caught here and turned into
//! banner messages; storage write failures propagate to the caller.

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use brezza_store::{CityCollection, ConsentGate, LocationConsent, StorageBackend, StoreError};
use brezza_weather::{
    forecast, location, search, CityDetail, CitySnapshot, CurrentLocation, IpLocator,
    LocationError, PlaceCandidate, WeatherClient, WeatherError,
};

const SEARCH_FAILED: &str = "Search is unavailable right now. Please try again later.";
const CITY_FETCH_FAILED: &str = "Unable to fetch weather for this city.";
const LOCATION_WEATHER_FAILED: &str = "Unable to fetch weather for your position.";

pub struct App<S: StorageBackend> {
    client: WeatherClient,
    locator: Option<IpLocator>,
    collection: CityCollection<S>,
    consent: ConsentGate<S>,
    current_location: Option<CurrentLocation>,
    suggestions: Vec<PlaceCandidate>,
    query: String,
    error: Option<String>,
}

impl<S: StorageBackend + Clone> App<S> {
    /// Wire a session over the given client, optional locator, and storage
    /// backend. The saved-city list hydrates here.
    pub fn new(client: WeatherClient, locator: Option<IpLocator>, store: S) -> Self {
        Self {
            client,
            locator,
            collection: CityCollection::hydrate(store.clone()),
            consent: ConsentGate::new(store),
            current_location: None,
            suggestions: Vec::new(),
            query: String::new(),
            error: None,
        }
    }

    /// Consent-gated startup: a stored accept resolves the location card
    /// exactly once for this session; anything else resolves nothing.
    pub async fn start(&mut self) {
        if self.consent.load() == LocationConsent::Accepted {
            self.locate().await;
        }
    }

    /// Whether the consent prompt should be shown.
    pub fn needs_consent_prompt(&self) -> bool {
        self.consent.load() == LocationConsent::Undecided
    }

    /// Record the user's decision; accepting resolves the location card
    /// immediately.
    ///
    /// # Errors
    ///
    /// Propagates a failed decision write.
    pub async fn decide_consent(&mut self, accepted: bool) -> Result<(), StoreError> {
        let decision = self.consent.record(accepted)?;
        if decision == LocationConsent::Accepted && self.current_location.is_none() {
            self.locate().await;
        }
        Ok(())
    }

    async fn locate(&mut self) {
        let Some(locator) = &self.locator else {
            self.error = Some(LocationError::Unsupported.user_message().to_string());
            return;
        };

        match location::resolve_current_location(locator, &self.client).await {
            Ok(current) => self.current_location = Some(current),
            Err(WeatherError::Location(e)) => {
                tracing::warn!("Location resolution failed: {}", e);
                self.error = Some(e.user_message().to_string());
            }
            Err(e) => {
                tracing::warn!("Weather lookup for current location failed: {}", e);
                self.error = Some(LOCATION_WEATHER_FAILED.to_string());
            }
        }
    }

    /// Handle a search-box edit. Short input clears the suggestions without
    /// a provider call; a provider failure sets the banner and leaves the
    /// suggestion list empty.
    pub async fn search_input(&mut self, input: &str) {
        self.query = input.to_string();
        self.error = None;

        match search::search(&self.client, input).await {
            Ok(candidates) => self.suggestions = candidates,
            Err(e) => {
                tracing::warn!("Search failed: {}", e);
                self.suggestions.clear();
                self.error = Some(SEARCH_FAILED.to_string());
            }
        }
    }

    /// Save the chosen candidate. The query and suggestion list are cleared
    /// only on success; a provider failure sets the banner and keeps them.
    ///
    /// # Errors
    ///
    /// Propagates a failed storage write.
    pub async fn select(&mut self, candidate: &PlaceCandidate) -> Result<(), StoreError> {
        match search::select_candidate(&self.client, candidate).await {
            Ok(snapshot) => {
                self.collection.add(snapshot)?;
                self.query.clear();
                self.suggestions.clear();
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to fetch weather for selected city: {}", e);
                self.error = Some(CITY_FETCH_FAILED.to_string());
                Ok(())
            }
        }
    }

    /// Remove a saved city. Only saved cities are removable; the location
    /// card is not part of the collection.
    ///
    /// # Errors
    ///
    /// Propagates a failed storage write.
    pub fn remove_city(&mut self, id: i64) -> Result<(), StoreError> {
        self.collection.remove(id)?;
        Ok(())
    }

    /// Detail-view data for a city: the saved snapshot when present (the
    /// navigation handed it over), a fresh lookup by id otherwise. The
    /// token cancels the fetches when the view is torn down.
    ///
    /// # Errors
    ///
    /// Returns the provider error; the caller renders it inline.
    pub async fn open_city(
        &self,
        id: i64,
        cancel: &CancellationToken,
    ) -> Result<CityDetail, WeatherError> {
        let snapshot = match self.collection.get(id) {
            Some(saved) => saved.clone(),
            None => self.client.conditions_by_id(id).await?,
        };

        forecast::detail(&self.client, snapshot, Utc::now().date_naive(), cancel).await
    }

    pub fn cities(&self) -> &[CitySnapshot] {
        self.collection.cities()
    }

    pub fn current_location(&self) -> Option<&CurrentLocation> {
        self.current_location.as_ref()
    }

    pub fn suggestions(&self) -> &[PlaceCandidate] {
        &self.suggestions
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The banner is dismissed by navigating, not by the failing action.
    pub fn clear_error(&mut self) {
        self.error = None;
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use brezza_store::MemoryStore;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> WeatherClient {
        WeatherClient::new("test_key", "en")
            .unwrap()
            .with_base_urls(&server.uri(), &server.uri())
    }

    fn test_locator(server: &MockServer) -> IpLocator {
        IpLocator::new(&server.uri()).unwrap()
    }

    fn weather_body(id: i64, name: &str, temp: f64) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "name": name,
            "coord": {"lat": 41.89, "lon": 12.48},
            "weather": [{"icon": "01d", "description": "clear sky"}],
            "main": {"temp": temp, "temp_min": temp - 2.0, "temp_max": temp + 2.0, "humidity": 50, "pressure": 1013},
            "wind": {"speed": 2.0},
            "sys": {"country": "IT"},
            "dt": 1735722000
        })
    }

    fn candidate(name: &str) -> PlaceCandidate {
        PlaceCandidate {
            name: name.to_string(),
            lat: 41.89,
            lon: 12.48,
            country: Some("IT".to_string()),
            state: None,
        }
    }

    #[tokio::test]
    async fn test_geocode_failure_sets_banner_and_empties_suggestions() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/direct"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let mut app = App::new(test_client(&mock_server), None, MemoryStore::new());
        app.search_input("Rom").await;

        assert!(app.suggestions().is_empty());
        assert_eq!(app.error(), Some(SEARCH_FAILED));
    }

    #[tokio::test]
    async fn test_short_input_clears_suggestions_without_calls() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/direct"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"name": "Rome", "lat": 41.89, "lon": 12.48, "country": "IT"}
            ])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut app = App::new(test_client(&mock_server), None, MemoryStore::new());

        app.search_input("Rom").await;
        assert_eq!(app.suggestions().len(), 1);

        app.search_input("Ro").await;
        assert!(app.suggestions().is_empty());
        assert!(app.error().is_none());
    }

    #[tokio::test]
    async fn test_select_saves_city_and_clears_search() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/direct"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"name": "Rome", "lat": 41.89, "lon": 12.48, "country": "IT"}
            ])))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(weather_body(100, "Rome", 21.0)))
            .mount(&mock_server)
            .await;

        let store = MemoryStore::new();
        let mut app = App::new(test_client(&mock_server), None, store);

        app.search_input("Rome").await;
        app.select(&candidate("Rome")).await.unwrap();

        assert_eq!(app.cities().len(), 1);
        assert_eq!(app.cities()[0].name, "Rome");
        assert!(app.query().is_empty());
        assert!(app.suggestions().is_empty());
    }

    #[tokio::test]
    async fn test_select_failure_keeps_query_and_sets_banner() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/direct"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"name": "Rome", "lat": 41.89, "lon": 12.48, "country": "IT"}
            ])))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let mut app = App::new(test_client(&mock_server), None, MemoryStore::new());

        app.search_input("Rome").await;
        app.select(&candidate("Rome")).await.unwrap();

        assert!(app.cities().is_empty());
        assert_eq!(app.query(), "Rome");
        assert_eq!(app.error(), Some(CITY_FETCH_FAILED));
    }

    #[tokio::test]
    async fn test_declined_consent_never_resolves_across_restarts() {
        let mock_server = MockServer::start().await;
        let store = MemoryStore::new();

        {
            let mut app = App::new(
                test_client(&mock_server),
                Some(test_locator(&mock_server)),
                store.clone(),
            );
            app.decide_consent(false).await.unwrap();
        }

        for _ in 0..3 {
            let mut app = App::new(
                test_client(&mock_server),
                Some(test_locator(&mock_server)),
                store.clone(),
            );
            app.start().await;
            assert!(app.current_location().is_none());
            assert!(app.error().is_none());
        }

        assert!(mock_server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_accepted_consent_resolves_once_per_start() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "success", "lat": 45.46, "lon": 9.19
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("lat", "45.46"))
            .respond_with(ResponseTemplate::new(200).set_body_json(weather_body(200, "Milan", 12.0)))
            .expect(1)
            .mount(&mock_server)
            .await;

        let store = MemoryStore::new();
        ConsentGate::new(store.clone()).record(true).unwrap();

        let mut app = App::new(
            test_client(&mock_server),
            Some(test_locator(&mock_server)),
            store,
        );
        app.start().await;

        let current = app.current_location().unwrap();
        assert_eq!(current.0.name, "Milan");
        // The location card never lands in the saved list.
        assert!(app.cities().is_empty());
    }

    #[tokio::test]
    async fn test_accepting_consent_resolves_immediately() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "success", "lat": 45.46, "lon": 9.19
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(weather_body(200, "Milan", 12.0)))
            .mount(&mock_server)
            .await;

        let mut app = App::new(
            test_client(&mock_server),
            Some(test_locator(&mock_server)),
            MemoryStore::new(),
        );

        assert!(app.needs_consent_prompt());
        app.decide_consent(true).await.unwrap();

        assert!(!app.needs_consent_prompt());
        assert!(app.current_location().is_some());
    }

    #[tokio::test]
    async fn test_missing_locator_reports_unsupported() {
        let mock_server = MockServer::start().await;

        let store = MemoryStore::new();
        ConsentGate::new(store.clone()).record(true).unwrap();

        let mut app = App::new(test_client(&mock_server), None, store);
        app.start().await;

        assert!(app.current_location().is_none());
        assert_eq!(app.error(), Some(LocationError::Unsupported.user_message()));
    }

    #[tokio::test]
    async fn test_location_failure_does_not_block_saved_list() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/json"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(weather_body(100, "Rome", 21.0)))
            .mount(&mock_server)
            .await;

        let store = MemoryStore::new();
        ConsentGate::new(store.clone()).record(true).unwrap();

        let mut app = App::new(
            test_client(&mock_server),
            Some(test_locator(&mock_server)),
            store,
        );
        app.start().await;

        assert!(app.current_location().is_none());
        assert!(app.error().is_some());

        // The list still works after the location failure.
        app.select(&candidate("Rome")).await.unwrap();
        assert_eq!(app.cities().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_city() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(weather_body(100, "Rome", 21.0)))
            .mount(&mock_server)
            .await;

        let mut app = App::new(test_client(&mock_server), None, MemoryStore::new());
        app.select(&candidate("Rome")).await.unwrap();
        assert_eq!(app.cities().len(), 1);

        app.remove_city(100).unwrap();
        assert!(app.cities().is_empty());

        // Removing an id that is not saved is a quiet no-op.
        app.remove_city(100).unwrap();
    }

    #[tokio::test]
    async fn test_file_backed_state_survives_restart() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(weather_body(100, "Rome", 21.0)))
            .mount(&mock_server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let store = brezza_store::FileStore::new(dir.path());

        {
            let mut app = App::new(test_client(&mock_server), None, store.clone());
            app.select(&candidate("Rome")).await.unwrap();
            app.decide_consent(false).await.unwrap();
        }

        // A fresh session over the same directory sees the saved state.
        let mut app = App::new(test_client(&mock_server), None, store);
        app.start().await;

        assert_eq!(app.cities().len(), 1);
        assert_eq!(app.cities()[0].name, "Rome");
        assert!(!app.needs_consent_prompt());
        assert!(app.current_location().is_none());
    }

    #[tokio::test]
    async fn test_open_city_prefers_saved_snapshot() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(weather_body(100, "Rome", 21.0)))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "list": [{
                    "dt": 1735722000,
                    "dt_txt": "2025-01-01 09:00:00",
                    "main": {"temp": 10.0},
                    "weather": [{"icon": "03d", "description": "scattered clouds"}]
                }]
            })))
            .mount(&mock_server)
            .await;

        let mut app = App::new(test_client(&mock_server), None, MemoryStore::new());
        app.select(&candidate("Rome")).await.unwrap();

        let cancel = CancellationToken::new();
        let detail = app.open_city(100, &cancel).await.unwrap();

        assert_eq!(detail.snapshot.name, "Rome");
        assert!(!detail.hourly.is_empty());
    }
}
