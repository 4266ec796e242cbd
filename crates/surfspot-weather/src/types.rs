use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::wave::WaveEstimator;

/// Opaque spot identifier as issued by the spots backend.
///
/// Backends may send string or integer ids; both are kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SpotId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSpotId {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

impl<'de> Deserialize<'de> for SpotId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawSpotId::deserialize(deserializer)? {
            RawSpotId::Text(id) => Self(id),
            RawSpotId::Signed(id) => Self(id.to_string()),
            RawSpotId::Unsigned(id) => Self(id.to_string()),
        })
    }
}

impl SpotId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SpotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SpotId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SpotId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A user-defined point of interest on the map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spot {
    #[serde(rename = "_id", alias = "id")]
    pub id: SpotId,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl Spot {
    pub fn new(id: impl Into<SpotId>, name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            lat,
            lon,
        }
    }

    pub fn position(&self) -> (f64, f64) {
        (self.lat, self.lon)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    /// Meters per second
    pub speed: f64,
    /// Meteorological direction, 0-360
    pub deg: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gust: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainReadings {
    /// Kelvin
    pub temp: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feels_like: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Current weather payload as returned by `GET /weather`.
///
/// Fields the map doesn't read are kept verbatim in `extra` so the
/// enriched record still carries the whole response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub wind: Wind,
    pub main: MainReadings,
    pub weather: Vec<Condition>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl WeatherObservation {
    pub fn wind_speed(&self) -> f64 {
        self.wind.speed
    }

    pub fn wind_direction_deg(&self) -> f64 {
        self.wind.deg
    }

    pub fn temperature_kelvin(&self) -> f64 {
        self.main.temp
    }

    pub fn condition_description(&self) -> Option<&str> {
        self.weather.first().map(|c| c.description.as_str())
    }
}

/// Observation plus the derived wave height
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedWeather {
    #[serde(flatten)]
    pub observation: WeatherObservation,
    #[serde(rename = "waveHeight")]
    pub wave_height_m: f64,
    pub fetched_at: DateTime<Utc>,
}

impl EnrichedWeather {
    pub fn new(observation: WeatherObservation, estimator: WaveEstimator) -> Self {
        let wave_height_m = estimator.estimate(observation.wind_speed());
        Self {
            observation,
            wave_height_m,
            fetched_at: Utc::now(),
        }
    }
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Weather API returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Enrichment pipeline errors. Logged, never surfaced to the view.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Fetch failed for spot {spot_id}: {cause}")]
    FetchFailed {
        spot_id: SpotId,
        #[source]
        cause: WeatherError,
    },
}

/// Errors loading the spot list
#[derive(Debug, thiserror::Error)]
pub enum SpotSourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid spot data: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Spots API returned {status}: {message}")]
    Api { status: u16, message: String },
}
