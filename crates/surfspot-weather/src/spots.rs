//! Spot list: the reactive source the map and pipeline read from, plus
//! loaders for a JSON file or the spots backend.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::watch;
use tracing::instrument;

use crate::types::{Spot, SpotSourceError};

/// Shared, observable spot list.
///
/// Every `replace` publishes a new list; subscribers see it as a change even
/// when the contents are equal. The channel closes once the last clone is
/// dropped.
#[derive(Debug, Clone)]
pub struct SpotSource {
    tx: Arc<watch::Sender<Arc<[Spot]>>>,
}

impl SpotSource {
    pub fn new(spots: Vec<Spot>) -> Self {
        let (tx, _) = watch::channel(Arc::from(spots));
        Self { tx: Arc::new(tx) }
    }

    pub fn replace(&self, spots: Vec<Spot>) {
        tracing::debug!("Spot list replaced ({} spots)", spots.len());
        self.tx.send_replace(Arc::from(spots));
    }

    pub fn current(&self) -> Arc<[Spot]> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<[Spot]>> {
        self.tx.subscribe()
    }
}

impl Default for SpotSource {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// Backends answer with either a bare array or `{ "spots": [...] }`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SpotsPayload {
    List(Vec<Spot>),
    Wrapped { spots: Vec<Spot> },
}

impl SpotsPayload {
    fn into_spots(self) -> Vec<Spot> {
        match self {
            SpotsPayload::List(spots) | SpotsPayload::Wrapped { spots } => spots,
        }
    }
}

pub fn parse_spots(json: &str) -> Result<Vec<Spot>, SpotSourceError> {
    let payload: SpotsPayload = serde_json::from_str(json)?;
    Ok(payload.into_spots())
}

/// Read spots from a JSON file
pub fn load_spots_file(path: &Path) -> Result<Vec<Spot>, SpotSourceError> {
    let contents = std::fs::read_to_string(path)?;
    let spots = parse_spots(&contents)?;
    tracing::info!("Loaded {} spots from {}", spots.len(), path.display());
    Ok(spots)
}

/// Read-only client for the spots REST backend
#[derive(Debug, Clone)]
pub struct SpotClient {
    client: reqwest::Client,
    base_url: String,
}

impl SpotClient {
    pub fn new(base_url: &str) -> Result<Self, SpotSourceError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// `GET {base_url}/spots`
    #[instrument(skip(self), level = "info")]
    pub async fn list_spots(&self) -> Result<Vec<Spot>, SpotSourceError> {
        let url = format!("{}/spots", self.base_url);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(SpotSourceError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let spots = parse_spots(&body)?;
        tracing::info!("Fetched {} spots", spots.len());
        Ok(spots)
    }
}
