//! Weather lookups for Brezza
//!
//! Provides geocoded city search, current conditions and forecast data via
//! an OpenWeatherMap-compatible API, plus single-shot device location.

pub mod forecast;
pub mod location;
pub mod provider;
pub mod search;
pub mod types;

pub use location::{resolve_current_location, IpLocator};
pub use provider::WeatherClient;
pub use types::*;
