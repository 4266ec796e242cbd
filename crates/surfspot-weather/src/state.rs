//! Per-view weather results keyed by spot id.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::watch;

use crate::types::{EnrichedWeather, SpotId};

/// Enriched weather for the spots of one map view.
///
/// Cloning shares the same map. Entries are only ever inserted or
/// overwritten; an absent entry means the spot is still loading.
#[derive(Debug, Clone)]
pub struct WeatherBySpot {
    inner: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    entries: RwLock<HashMap<SpotId, EnrichedWeather>>,
    revision: watch::Sender<u64>,
}

impl WeatherBySpot {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(Shared {
                entries: RwLock::new(HashMap::new()),
                revision,
            }),
        }
    }

    /// Insert or overwrite one spot's entry, leaving all others untouched.
    pub fn merge(&self, spot_id: SpotId, weather: EnrichedWeather) {
        self.inner.entries.write().insert(spot_id, weather);
        self.inner.revision.send_modify(|r| *r += 1);
    }

    pub fn get(&self, spot_id: &SpotId) -> Option<EnrichedWeather> {
        self.inner.entries.read().get(spot_id).cloned()
    }

    pub fn contains(&self, spot_id: &SpotId) -> bool {
        self.inner.entries.read().contains_key(spot_id)
    }

    pub fn len(&self) -> usize {
        self.inner.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.read().is_empty()
    }

    pub fn snapshot(&self) -> HashMap<SpotId, EnrichedWeather> {
        self.inner.entries.read().clone()
    }

    /// Number of merges so far
    pub fn revision(&self) -> u64 {
        *self.inner.revision.borrow()
    }

    /// Receiver that changes whenever an entry is merged
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }
}

impl Default for WeatherBySpot {
    fn default() -> Self {
        Self::new()
    }
}
