//! Wave height estimate from wind speed.
//!
//! Uses the simplified Sverdrup-Munk-Bretschneider growth curve
//! `H = 0.21 * U^2 / F^(1/3)` with `U` in m/s and `F` in meters. The classical
//! curve is calibrated in other units, so the result is an index that tracks
//! wind strength rather than a physically normalized height.

/// Empirical SMB coefficient
pub const SMB_COEFFICIENT: f64 = 0.21;

/// Assumed 50 km of open water upwind of every spot
pub const DEFAULT_FETCH_LENGTH_M: f64 = 50_000.0;

/// Estimated wave height in meters for `wind_speed` (m/s) over `fetch_length`.
///
/// `fetch_length` must be finite and positive; zero yields `NaN` for calm
/// wind. [`WaveEstimator`] enforces this.
pub fn wave_height(wind_speed: f64, fetch_length: f64) -> f64 {
    SMB_COEFFICIENT * (wind_speed * wind_speed) / fetch_length.cbrt()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveEstimator {
    fetch_length_m: f64,
}

impl WaveEstimator {
    /// `None` unless `fetch_length_m` is a finite, positive distance.
    pub fn new(fetch_length_m: f64) -> Option<Self> {
        (fetch_length_m.is_finite() && fetch_length_m > 0.0).then_some(Self { fetch_length_m })
    }

    pub fn fetch_length_m(&self) -> f64 {
        self.fetch_length_m
    }

    pub fn estimate(&self, wind_speed: f64) -> f64 {
        wave_height(wind_speed, self.fetch_length_m)
    }
}

impl Default for WaveEstimator {
    fn default() -> Self {
        Self {
            fetch_length_m: DEFAULT_FETCH_LENGTH_M,
        }
    }
}
