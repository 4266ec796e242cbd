//! Weather enrichment for surf spots
//!
//! Fetches current conditions per spot from an OpenWeather-compatible API,
//! estimates wave height from wind speed, and exposes the results to the map
//! view through an explicitly owned result map.

pub mod pipeline;
pub mod provider;
pub mod spots;
pub mod state;
pub mod types;
pub mod view;
pub mod wave;

pub use pipeline::{EnrichmentPipeline, TriggerSummary};
pub use provider::WeatherProvider;
pub use spots::{load_spots_file, SpotClient, SpotSource};
pub use state::WeatherBySpot;
pub use types::*;
pub use view::{build_markers, kelvin_to_celsius, MapSettings, Marker, Popup, PopupDetails};
pub use wave::{wave_height, WaveEstimator, DEFAULT_FETCH_LENGTH_M, SMB_COEFFICIENT};
