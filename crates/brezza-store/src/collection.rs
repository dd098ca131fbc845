//! The saved-city collection: ordered, deduplicated, write-through.

use brezza_weather::CitySnapshot;

use crate::backend::{StorageBackend, StoreError};

/// Storage key for the serialized city list.
pub const CITIES_KEY: &str = "cities";

/// Ordered set of saved city snapshots, keyed by provider city id,
/// synchronized with a [`StorageBackend`] on every mutation.
pub struct CityCollection<S: StorageBackend> {
    store: S,
    cities: Vec<CitySnapshot>,
}

impl<S: StorageBackend> CityCollection<S> {
    /// Load the saved list from the backend.
    ///
    /// Missing, unreadable, or unparsable state all hydrate to an empty
    /// collection; corrupt data is logged and discarded, never surfaced.
    pub fn hydrate(store: S) -> Self {
        let cities = match store.get(CITIES_KEY) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(cities) => cities,
                Err(e) => {
                    tracing::warn!("Discarding unparsable saved-city state: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read saved-city state: {}", e);
                Vec::new()
            }
        };

        Self { store, cities }
    }

    /// The saved cities, in insertion order.
    pub fn cities(&self) -> &[CitySnapshot] {
        &self.cities
    }

    pub fn contains(&self, id: i64) -> bool {
        self.cities.iter().any(|c| c.id == id)
    }

    pub fn get(&self, id: i64) -> Option<&CitySnapshot> {
        self.cities.iter().find(|c| c.id == id)
    }

    /// Append a snapshot and persist the whole list.
    ///
    /// Adding an id that is already saved keeps the existing entry and
    /// performs no write (first-write-wins).
    ///
    /// # Errors
    ///
    /// Propagates a failed backend write; the in-memory list is already
    /// updated when that happens.
    pub fn add(&mut self, snapshot: CitySnapshot) -> Result<&[CitySnapshot], StoreError> {
        if self.contains(snapshot.id) {
            tracing::debug!(id = snapshot.id, "City already saved, keeping existing entry");
            return Ok(&self.cities);
        }

        tracing::info!(id = snapshot.id, city = %snapshot.name, "Saving city");
        self.cities.push(snapshot);
        self.flush()?;
        Ok(&self.cities)
    }

    /// Remove the entry with the given id, if present, and persist.
    ///
    /// An absent id is a no-op, not an error; the (unchanged) list is
    /// still flushed.
    ///
    /// # Errors
    ///
    /// Propagates a failed backend write.
    pub fn remove(&mut self, id: i64) -> Result<&[CitySnapshot], StoreError> {
        self.cities.retain(|c| c.id != id);
        self.flush()?;
        Ok(&self.cities)
    }

    fn flush(&self) -> Result<(), StoreError> {
        let raw = serde_json::to_string(&self.cities)?;
        self.store.set(CITIES_KEY, &raw)
    }
}
