//! OpenWeather "current weather" client.

use crate::types::{WeatherError, WeatherObservation};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

pub const DEFAULT_API_URL: &str = "https://api.openweathermap.org/data/2.5";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Clone)]
pub struct WeatherProvider {
    client: Arc<Client>,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for WeatherProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherProvider")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl WeatherProvider {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, WeatherError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Provider against the public OpenWeather endpoint
    pub fn openweather(api_key: &str) -> Result<Self, WeatherError> {
        Self::new(
            DEFAULT_API_URL,
            api_key,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch current conditions at the given coordinates.
    ///
    /// Non-2xx responses and payloads without wind, temperature or a
    /// condition entry are errors.
    #[instrument(skip(self), level = "debug")]
    pub async fn fetch_current(&self, lat: f64, lon: f64) -> Result<WeatherObservation, WeatherError> {
        let url = format!("{}/weather", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("appid", self.api_key.clone()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(WeatherError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let observation: WeatherObservation =
            serde_json::from_str(&body).map_err(|e| WeatherError::Parse(e.to_string()))?;

        if observation.weather.is_empty() {
            return Err(WeatherError::Parse(
                "response has no weather condition".to_string(),
            ));
        }

        tracing::debug!(
            wind_speed = observation.wind_speed(),
            temp_k = observation.temperature_kelvin(),
            "Weather fetched"
        );
        Ok(observation)
    }
}

/// OpenWeather errors look like `{"cod": 401, "message": "..."}`
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.chars().take(200).collect())
}
