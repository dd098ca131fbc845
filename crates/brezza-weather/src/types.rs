use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Geographic coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

/// Current conditions for one place, metric units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    /// Relative humidity, percent
    pub humidity: u8,
    /// Pressure, hPa
    pub pressure: u32,
    /// Wind speed, m/s
    pub wind_speed: f64,
    /// Provider icon code (e.g. "04d")
    pub icon: String,
    pub description: String,
}

/// Point-in-time weather reading for one city.
///
/// `id` is the provider-assigned city identifier and the key saved cities
/// are deduplicated on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitySnapshot {
    pub id: i64,
    pub name: String,
    pub country: Option<String>,
    /// Administrative area, carried over from the geocoding candidate;
    /// the conditions payload does not include it.
    pub state: Option<String>,
    pub coord: Coordinate,
    pub current: CurrentConditions,
    pub observed_at: DateTime<Utc>,
}

impl CitySnapshot {
    /// Build a snapshot from a raw conditions payload, stamped now.
    pub fn from_report(report: ConditionsReport) -> Self {
        let condition = report.weather.into_iter().next().unwrap_or_default();
        Self {
            id: report.id,
            name: report.name,
            country: report.sys.country,
            state: None,
            coord: report.coord,
            current: CurrentConditions {
                temperature: report.main.temp,
                temp_min: report.main.temp_min,
                temp_max: report.main.temp_max,
                humidity: report.main.humidity,
                pressure: report.main.pressure,
                wind_speed: report.wind.speed,
                icon: condition.icon,
                description: condition.description,
            },
            observed_at: Utc::now(),
        }
    }
}

/// The ephemeral "my location" reading.
///
/// Never persisted and never deduplicated against the saved list; it only
/// lives for the session that resolved it.
#[derive(Debug, Clone)]
pub struct CurrentLocation(pub CitySnapshot);

/// Geocoding result for a free-text city query.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlaceCandidate {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub country: Option<String>,
    pub state: Option<String>,
}

impl PlaceCandidate {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate {
            lat: self.lat,
            lon: self.lon,
        }
    }

    /// Display label, e.g. "Rome, IT".
    pub fn label(&self) -> String {
        match &self.country {
            Some(country) => format!("{}, {}", self.name, country),
            None => self.name.clone(),
        }
    }
}

/// One slot of the hourly outlook strip.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlySlot {
    pub at: DateTime<Utc>,
    pub temperature: f64,
    pub icon: String,
    pub description: String,
}

/// One sample of the same-day temperature series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempPoint {
    pub at: DateTime<Utc>,
    pub temperature: f64,
}

/// Advice bucket derived from the day's average temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayAdvice {
    Beach,
    Springlike,
    StayIn,
}

impl DayAdvice {
    /// Bucket an average temperature: 25 and up is beach weather, 15 to 25
    /// is springlike, anything below calls for staying in.
    pub fn from_average(average: f64) -> Self {
        if average >= 25.0 {
            Self::Beach
        } else if average >= 15.0 {
            Self::Springlike
        } else {
            Self::StayIn
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Beach => {
                "Beach weather! Pack sunscreen and plenty of water, and keep hydrated."
            }
            Self::Springlike => {
                "Perfect springlike temperatures - ideal for a walk in the park or a picnic."
            }
            Self::StayIn => {
                "Better to stay in: the right weather for a hot chocolate under a blanket."
            }
        }
    }
}

/// Same-day temperature series plus derived advice.
///
/// `advice` is absent when no forecast slot falls on the requested day.
#[derive(Debug, Clone)]
pub struct TodayOutlook {
    pub points: Vec<TempPoint>,
    pub average: Option<f64>,
    pub advice: Option<DayAdvice>,
}

/// Assembled detail-view data for one city.
#[derive(Debug, Clone)]
pub struct CityDetail {
    pub snapshot: CitySnapshot,
    pub hourly: Vec<HourlySlot>,
    pub today: TodayOutlook,
}

// API Response Types

/// Raw current-conditions payload.
#[derive(Debug, Deserialize)]
pub struct ConditionsReport {
    pub id: i64,
    pub name: String,
    pub coord: Coordinate,
    #[serde(default)]
    pub weather: Vec<ConditionEntry>,
    pub main: MainReadings,
    pub wind: WindReadings,
    #[serde(default)]
    pub sys: SysInfo,
    /// Provider observation time, unix seconds
    pub dt: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConditionEntry {
    pub icon: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct MainReadings {
    pub temp: f64,
    #[serde(default)]
    pub temp_min: f64,
    #[serde(default)]
    pub temp_max: f64,
    #[serde(default)]
    pub humidity: u8,
    #[serde(default)]
    pub pressure: u32,
}

#[derive(Debug, Default, Deserialize)]
pub struct WindReadings {
    #[serde(default)]
    pub speed: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct SysInfo {
    pub country: Option<String>,
}

/// Raw forecast payload, 3-hourly slots.
#[derive(Debug, Deserialize)]
pub struct ForecastReport {
    pub list: Vec<ForecastSlot>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastSlot {
    /// Slot time, unix seconds
    pub dt: i64,
    /// Slot time as "YYYY-MM-DD HH:MM:SS", UTC
    pub dt_txt: String,
    pub main: MainReadings,
    #[serde(default)]
    pub weather: Vec<ConditionEntry>,
}

impl ForecastSlot {
    /// The slot's calendar date, parsed from `dt_txt`. `None` when the
    /// provider sends a malformed timestamp.
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDateTime::parse_from_str(&self.dt_txt, "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(|dt| dt.date())
    }

    pub fn at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.dt, 0).unwrap_or_default()
    }
}

/// Location acquisition errors
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Location facility not available")]
    Unsupported,
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable")]
    ServiceUnavailable,
    #[error("Location request timed out")]
    Timeout,
    #[error("Location error: {0}")]
    Other(String),
}

impl LocationError {
    /// User-facing message, distinct per variant.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Unsupported => "Geolocation is not supported on this device.",
            Self::PermissionDenied => "Location permission was denied.",
            Self::ServiceUnavailable => "Unable to determine your position.",
            Self::Timeout => "The location request timed out.",
            Self::Other(_) => "Unable to determine your position right now.",
        }
    }
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Provider error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Invalid API key")]
    InvalidApiKey,
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Location error: {0}")]
    Location(#[from] LocationError),
    #[error("Request cancelled")]
    Cancelled,
}

impl WeatherError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Network(_) => "Network error. Check your connection.",
            Self::Api { status, .. } if *status >= 500 => {
                "The weather service is having trouble. Please try again later."
            }
            Self::Api { .. } => "The weather service rejected the request.",
            Self::InvalidApiKey => "Weather API key is invalid. Check your settings.",
            Self::Parse(_) => "Received an unexpected response from the weather service.",
            Self::Location(e) => e.user_message(),
            Self::Cancelled => "The request was cancelled.",
        }
    }
}
