//! View model for the map: base map settings and one marker per spot.
//!
//! The rendering widget consumes these descriptors; nothing flows back.

use std::fmt;

use serde::Serialize;

use crate::state::WeatherBySpot;
use crate::types::{EnrichedWeather, Spot, SpotId};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapSettings {
    /// `(lat, lon)`
    pub center: (f64, f64),
    pub zoom: u8,
    /// Template with `{s}`, `{z}`, `{x}`, `{y}` placeholders
    pub tile_url: String,
    pub attribution: String,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            center: (32.0853, 34.7818),
            zoom: 8,
            tile_url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            attribution: "© OpenStreetMap contributors".to_string(),
        }
    }
}

impl MapSettings {
    /// Concrete URL of one tile
    pub fn tile_url_for(&self, subdomain: char, z: u8, x: u32, y: u32) -> String {
        self.tile_url
            .replace("{s}", subdomain.encode_utf8(&mut [0; 4]))
            .replace("{z}", &z.to_string())
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub spot_id: SpotId,
    /// `(lat, lon)`
    pub position: (f64, f64),
    pub popup: Popup,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Popup {
    /// No weather yet (in flight, not started, or failed)
    Loading { name: String },
    Ready(PopupDetails),
}

impl Popup {
    pub fn is_loading(&self) -> bool {
        matches!(self, Popup::Loading { .. })
    }

    pub fn name(&self) -> &str {
        match self {
            Popup::Loading { name } => name,
            Popup::Ready(details) => &details.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopupDetails {
    pub name: String,
    pub temperature_c: i64,
    pub condition: String,
    pub wind_speed: f64,
    pub wind_direction_deg: f64,
    pub wave_height_m: f64,
}

impl PopupDetails {
    pub fn from_weather(name: &str, weather: &EnrichedWeather) -> Self {
        let obs = &weather.observation;
        Self {
            name: name.to_string(),
            temperature_c: kelvin_to_celsius(obs.temperature_kelvin()),
            condition: obs.condition_description().unwrap_or("unknown").to_string(),
            wind_speed: obs.wind_speed(),
            wind_direction_deg: obs.wind_direction_deg(),
            wave_height_m: weather.wave_height_m,
        }
    }

    /// Rotation for the wind arrow, as a CSS transform
    pub fn arrow_transform(&self) -> String {
        format!("rotate({}deg)", self.wind_direction_deg)
    }
}

/// Kelvin to whole degrees Celsius, halves rounded toward positive infinity.
pub fn kelvin_to_celsius(kelvin: f64) -> i64 {
    (kelvin - 273.15 + 0.5).floor() as i64
}

/// One marker per spot, in list order.
pub fn build_markers(spots: &[Spot], weather: &WeatherBySpot) -> Vec<Marker> {
    spots
        .iter()
        .map(|spot| {
            let popup = match weather.get(&spot.id) {
                Some(w) => Popup::Ready(PopupDetails::from_weather(&spot.name, &w)),
                None => Popup::Loading {
                    name: spot.name.clone(),
                },
            };
            Marker {
                spot_id: spot.id.clone(),
                position: spot.position(),
                popup,
            }
        })
        .collect()
}

impl fmt::Display for Popup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Popup::Loading { name } => {
                writeln!(f, "{name}")?;
                write!(f, "Loading...")
            }
            Popup::Ready(d) => {
                writeln!(f, "{}", d.name)?;
                writeln!(f, "Temperature: {}°C", d.temperature_c)?;
                writeln!(f, "Condition: {}", d.condition)?;
                writeln!(f, "Wind Speed: {} m/s", d.wind_speed)?;
                writeln!(f, "Wind Direction: {}°", d.wind_direction_deg)?;
                write!(f, "Wave Height: {:.2} m", d.wave_height_m)
            }
        }
    }
}
