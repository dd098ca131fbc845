//! Durable city-list state for Brezza
//!
//! A small key-value contract ([`StorageBackend`]) with file-backed and
//! in-memory implementations, the write-through saved-city collection, and
//! the one-time location-consent gate.

pub mod backend;
pub mod collection;
pub mod consent;

pub use backend::{FileStore, MemoryStore, StorageBackend, StoreError};
pub use collection::CityCollection;
pub use consent::{ConsentGate, LocationConsent};
