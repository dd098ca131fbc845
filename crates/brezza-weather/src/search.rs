//! City search and candidate selection.

use crate::provider::{WeatherClient, GEOCODE_LIMIT};
use crate::types::{CitySnapshot, PlaceCandidate, WeatherError};

/// Queries shorter than this never reach the provider.
pub const MIN_QUERY_CHARS: usize = 3;

/// Geocode a free-text query into place candidates.
///
/// Short queries return an empty list without any HTTP call, keeping
/// per-keystroke searches from spamming the provider.
pub async fn search(
    client: &WeatherClient,
    query: &str,
) -> Result<Vec<PlaceCandidate>, WeatherError> {
    if query.chars().count() < MIN_QUERY_CHARS {
        return Ok(Vec::new());
    }

    client.geocode(query, GEOCODE_LIMIT).await
}

/// Fetch the full snapshot for a chosen candidate.
///
/// The candidate's administrative area rides along on the snapshot; the
/// conditions payload does not carry it.
pub async fn select_candidate(
    client: &WeatherClient,
    candidate: &PlaceCandidate,
) -> Result<CitySnapshot, WeatherError> {
    let mut snapshot = client.conditions_at(candidate.coordinate()).await?;
    snapshot.state = candidate.state.clone();
    Ok(snapshot)
}
