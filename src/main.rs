use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use surfspot_core::{AppError, Config, ConfigError, NetworkError, ReqwestErrorExt};
use surfspot_weather::{
    build_markers, load_spots_file, EnrichmentPipeline, MapSettings, Spot, SpotClient,
    SpotSource, SpotSourceError, WaveEstimator, WeatherBySpot, WeatherProvider,
};

/// Show current weather and estimated wave height for every surf spot
#[derive(Debug, Parser)]
#[command(name = "surfspot", version)]
struct Args {
    /// Config file (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON file of spots; overrides the configured source
    #[arg(long)]
    spots_file: Option<PathBuf>,

    /// Spots backend base URL; overrides the configured source
    #[arg(long, conflicts_with = "spots_file")]
    spots_url: Option<String>,

    /// How long to wait for weather before printing
    #[arg(long, default_value_t = 30)]
    wait_secs: u64,

    /// Print markers as JSON instead of popup text
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    surfspot_core::init()?;
    let args = Args::parse();

    let (config, _) = Config::load_validated(args.config.as_deref())
        .map_err(|e| report("Failed to load config", AppError::from_anyhow(e)))?;

    let spots = load_spots(&args, &config)
        .await
        .map_err(|e| report("Failed to load spots", e))?;

    let provider = WeatherProvider::new(
        &config.weather.api_url,
        &config.weather.resolved_api_key().unwrap_or_default(),
        Duration::from_secs(config.weather.request_timeout_secs),
    )?;
    let estimator = WaveEstimator::new(config.weather.fetch_length_m)
        .context("weather.fetch_length_m must be a positive number of meters")?;

    let source = SpotSource::new(spots);
    let state = WeatherBySpot::new();
    let mut pipeline = EnrichmentPipeline::new(Arc::new(provider), state.clone(), estimator);

    pipeline.enrich_all(&source.current());
    if tokio::time::timeout(Duration::from_secs(args.wait_secs), pipeline.settle())
        .await
        .is_err()
    {
        tracing::warn!(
            "Gave up waiting after {}s; {} fetches still running",
            args.wait_secs,
            pipeline.in_flight()
        );
    }

    let map = MapSettings {
        center: (config.map.center_lat, config.map.center_lon),
        zoom: config.map.zoom,
        tile_url: config.map.tile_url.clone(),
        attribution: config.map.attribution.clone(),
    };
    let markers = build_markers(&source.current(), &state);

    if args.json {
        let out = serde_json::json!({ "map": map, "markers": markers });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!(
            "Map centered at {:.4}, {:.4} (zoom {}) - {}",
            map.center.0, map.center.1, map.zoom, map.attribution
        );
        for marker in &markers {
            println!(
                "\n[{:.4}, {:.4}]\n{}",
                marker.position.0, marker.position.1, marker.popup
            );
        }
    }

    pipeline.shutdown();
    Ok(())
}

/// Log the detail, print the hint, hand the error back to `main`.
fn report(context: &str, err: AppError) -> anyhow::Error {
    tracing::error!("{}: {}", context, err);
    eprintln!("{}", err.user_message());
    err.into()
}

async fn load_spots(args: &Args, config: &Config) -> Result<Vec<Spot>, AppError> {
    if let Some(file) = &args.spots_file {
        return read_spots_file(file);
    }
    if let Some(url) = &args.spots_url {
        return fetch_spots(url).await;
    }
    if let Some(url) = &config.spots.api_url {
        return fetch_spots(url).await;
    }
    if let Some(file) = &config.spots.file {
        return read_spots_file(file);
    }
    tracing::warn!("No spot source configured");
    Ok(Vec::new())
}

fn read_spots_file(path: &Path) -> Result<Vec<Spot>, AppError> {
    load_spots_file(path).map_err(|e| match e {
        SpotSourceError::Io(e) => AppError::Io(e),
        SpotSourceError::Parse(e) => {
            AppError::Config(ConfigError::Invalid(format!("{}: {}", path.display(), e)))
        }
        other => backend_error(other),
    })
}

async fn fetch_spots(url: &str) -> Result<Vec<Spot>, AppError> {
    let client = SpotClient::new(url).map_err(backend_error)?;
    client.list_spots().await.map_err(backend_error)
}

fn backend_error(err: SpotSourceError) -> AppError {
    match err {
        SpotSourceError::Io(e) => AppError::Io(e),
        SpotSourceError::Network(e) => AppError::Network(e.into_network_error()),
        SpotSourceError::Api { status, message } => {
            AppError::Network(NetworkError::ServerError { status, message })
        }
        SpotSourceError::Parse(e) => AppError::Network(NetworkError::InvalidResponse(e.to_string())),
    }
}
