//! Weather enrichment pipeline.
//!
//! One fetch task per spot id. A trigger with a new spot list:
//! - cancels tasks whose spot left the list,
//! - cancels and replaces tasks whose spot moved,
//! - leaves still-running tasks for unchanged spots alone,
//! - starts a fresh fetch for every other spot.
//!
//! Results land in the [`WeatherBySpot`] the pipeline was built with. A
//! completion is merged only if its task is still the current one for that
//! spot, so a superseded response can never overwrite a newer one.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::Instrument;

use crate::provider::WeatherProvider;
use crate::state::WeatherBySpot;
use crate::types::{EnrichedWeather, PipelineError, Spot, SpotId};
use crate::wave::WaveEstimator;

/// What a single trigger did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TriggerSummary {
    /// Fetches started
    pub issued: usize,
    /// Spots whose previous fetch was still running and was kept
    pub deduplicated: usize,
    /// Running fetches replaced because the spot's coordinates changed
    pub superseded: usize,
    /// Running fetches dropped because the spot left the list
    pub cancelled: usize,
}

struct FetchTask {
    lat: f64,
    lon: f64,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl FetchTask {
    fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    fn same_position(&self, spot: &Spot) -> bool {
        self.lat == spot.lat && self.lon == spot.lon
    }
}

/// Owned per map view; dropping it cancels every outstanding fetch.
pub struct EnrichmentPipeline {
    provider: Arc<WeatherProvider>,
    estimator: WaveEstimator,
    state: WeatherBySpot,
    tasks: HashMap<SpotId, FetchTask>,
    /// Generation of the task allowed to publish for each spot
    current: Arc<Mutex<HashMap<SpotId, u64>>>,
    next_generation: u64,
    tracker: TaskTracker,
    shutdown: CancellationToken,
}

impl std::fmt::Debug for EnrichmentPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnrichmentPipeline")
            .field("provider", &self.provider)
            .field("estimator", &self.estimator)
            .field("tasks", &self.tasks.len())
            .field("shut_down", &self.shutdown.is_cancelled())
            .finish()
    }
}

impl EnrichmentPipeline {
    pub fn new(
        provider: Arc<WeatherProvider>,
        state: WeatherBySpot,
        estimator: WaveEstimator,
    ) -> Self {
        Self {
            provider,
            estimator,
            state,
            tasks: HashMap::new(),
            current: Arc::new(Mutex::new(HashMap::new())),
            next_generation: 0,
            tracker: TaskTracker::new(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn state(&self) -> &WeatherBySpot {
        &self.state
    }

    /// Fetches that have not completed yet
    pub fn in_flight(&self) -> usize {
        self.tasks.values().filter(|t| t.is_running()).count()
    }

    /// Enrich every spot in `spots`.
    ///
    /// Must be called from within a Tokio runtime. Fetches run in the
    /// background; use [`settle`](Self::settle) to wait for them.
    pub fn enrich_all(&mut self, spots: &[Spot]) -> TriggerSummary {
        let mut summary = TriggerSummary::default();

        if self.shutdown.is_cancelled() {
            tracing::warn!("Enrichment triggered after shutdown; ignoring");
            return summary;
        }

        let wanted: HashSet<&SpotId> = spots.iter().map(|s| &s.id).collect();

        {
            let mut current = self.current.lock();
            self.tasks.retain(|id, task| {
                if wanted.contains(id) {
                    return true;
                }
                if task.is_running() {
                    summary.cancelled += 1;
                }
                task.token.cancel();
                current.remove(id);
                false
            });
        }

        let mut seen = HashSet::new();
        for spot in spots {
            if !seen.insert(&spot.id) {
                tracing::debug!(spot_id = %spot.id, "Duplicate spot in list; skipping");
                continue;
            }

            if let Some(task) = self.tasks.get(&spot.id) {
                if task.is_running() {
                    if task.same_position(spot) {
                        summary.deduplicated += 1;
                        continue;
                    }
                    task.token.cancel();
                    summary.superseded += 1;
                }
            }

            self.spawn_fetch(spot);
            summary.issued += 1;
        }

        tracing::info!(
            spots = spots.len(),
            issued = summary.issued,
            deduplicated = summary.deduplicated,
            superseded = summary.superseded,
            cancelled = summary.cancelled,
            "Weather enrichment triggered"
        );
        summary
    }

    fn spawn_fetch(&mut self, spot: &Spot) {
        self.next_generation += 1;
        let generation = self.next_generation;
        self.current.lock().insert(spot.id.clone(), generation);

        let token = self.shutdown.child_token();
        let job = FetchJob {
            spot_id: spot.id.clone(),
            lat: spot.lat,
            lon: spot.lon,
            generation,
            token: token.clone(),
            provider: self.provider.clone(),
            estimator: self.estimator,
            state: self.state.clone(),
            current: self.current.clone(),
        };

        let span = tracing::debug_span!("fetch", spot_id = %spot.id, generation);
        let handle = self.tracker.spawn(job.run().instrument(span));

        self.tasks.insert(
            spot.id.clone(),
            FetchTask {
                lat: spot.lat,
                lon: spot.lon,
                token,
                handle,
            },
        );
    }

    /// Wait until every fetch started so far has finished or been cancelled.
    pub async fn settle(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Enrich the current list, then again after every change, until the
    /// source closes or the pipeline is shut down.
    pub async fn follow(&mut self, mut spots: watch::Receiver<Arc<[Spot]>>) {
        let initial = spots.borrow_and_update().clone();
        self.enrich_all(&initial);

        let shutdown = self.shutdown.clone();
        loop {
            let changed = tokio::select! {
                biased;
                _ = shutdown.cancelled() => false,
                res = spots.changed() => res.is_ok(),
            };
            if !changed {
                tracing::debug!("Spot source closed or pipeline shut down");
                break;
            }

            let list = spots.borrow_and_update().clone();
            self.enrich_all(&list);
        }
    }

    /// Cancel every outstanding fetch. Further triggers are ignored.
    pub fn shutdown(&mut self) {
        self.shutdown.cancel();
        self.tasks.clear();
        self.current.lock().clear();
        tracing::info!("Enrichment pipeline shut down");
    }
}

impl Drop for EnrichmentPipeline {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

struct FetchJob {
    spot_id: SpotId,
    lat: f64,
    lon: f64,
    generation: u64,
    token: CancellationToken,
    provider: Arc<WeatherProvider>,
    estimator: WaveEstimator,
    state: WeatherBySpot,
    current: Arc<Mutex<HashMap<SpotId, u64>>>,
}

impl FetchJob {
    async fn run(self) {
        let result = tokio::select! {
            biased;
            _ = self.token.cancelled() => {
                tracing::debug!("Fetch cancelled");
                return;
            }
            res = self.provider.fetch_current(self.lat, self.lon) => res,
        };

        match result {
            Ok(observation) => {
                let enriched = EnrichedWeather::new(observation, self.estimator);
                let current = self.current.lock();
                if current.get(&self.spot_id) != Some(&self.generation) {
                    tracing::debug!("Discarding superseded result");
                    return;
                }
                tracing::debug!(wave_height_m = enriched.wave_height_m, "Weather ready");
                self.state.merge(self.spot_id, enriched);
            }
            Err(cause) => {
                let err = PipelineError::FetchFailed {
                    spot_id: self.spot_id,
                    cause,
                };
                tracing::warn!("{}", err);
            }
        }
    }
}
