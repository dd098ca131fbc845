//! The one-time location-consent gate.

use crate::backend::{StorageBackend, StoreError};

/// Storage key for the persisted consent decision.
pub const CONSENT_KEY: &str = "location_decision";

/// The user's standing decision on automatic location use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationConsent {
    Undecided,
    Accepted,
    Declined,
}

impl LocationConsent {
    pub fn is_decided(&self) -> bool {
        !matches!(self, Self::Undecided)
    }
}

/// Persists the accept/decline decision and makes it terminal: once a
/// decision is stored it is never re-prompted or overwritten.
pub struct ConsentGate<S: StorageBackend> {
    store: S,
}

impl<S: StorageBackend> ConsentGate<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The stored decision.
    ///
    /// Absent (or unreadable) state is `Undecided`. Any stored value other
    /// than the accepted marker counts as `Declined`: an unrecognized value
    /// must neither re-prompt nor trigger resolution.
    pub fn load(&self) -> LocationConsent {
        match self.store.get(CONSENT_KEY) {
            Ok(None) => LocationConsent::Undecided,
            Ok(Some(value)) if value == "accepted" => LocationConsent::Accepted,
            Ok(Some(_)) => LocationConsent::Declined,
            Err(e) => {
                tracing::warn!("Failed to read consent decision: {}", e);
                LocationConsent::Undecided
            }
        }
    }

    /// Persist a decision.
    ///
    /// A no-op returning the stored decision when one already exists.
    ///
    /// # Errors
    ///
    /// Propagates a failed backend write.
    pub fn record(&self, accepted: bool) -> Result<LocationConsent, StoreError> {
        let current = self.load();
        if current.is_decided() {
            tracing::debug!("Consent already decided, keeping {:?}", current);
            return Ok(current);
        }

        let (decision, marker) = if accepted {
            (LocationConsent::Accepted, "accepted")
        } else {
            (LocationConsent::Declined, "declined")
        };

        self.store.set(CONSENT_KEY, marker)?;
        tracing::info!("Recorded location consent: {:?}", decision);
        Ok(decision)
    }
}
