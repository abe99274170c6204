//! geolens-ar - headless driver for the photo pipeline
//!
//! Stands in for the AR framework: publishes a location estimate for a fixed
//! coordinate at a steady interval, runs the real Flickr search and image
//! downloads, and logs every annotation placed into an in-memory scene.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use geolens_ar::{AnnotationLayer, PipelineHandle, PipelineParts};
use geolens_common::config::{write_toml_config, TomlConfig};
use geolens_common::events::EventBus;
use geolens_common::{GeoLocation, ScenePosition};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for geolens-ar
#[derive(Parser, Debug)]
#[command(name = "geolens-ar")]
#[command(about = "Anchor nearby geotagged Flickr photos around a coordinate")]
#[command(version)]
struct Args {
    /// Latitude of the simulated device
    #[arg(long, allow_negative_numbers = true)]
    lat: f64,

    /// Longitude of the simulated device
    #[arg(long, allow_negative_numbers = true)]
    lon: f64,

    /// Configuration file (TOML)
    #[arg(short, long, env = "GEOLENS_CONFIG")]
    config: Option<PathBuf>,

    /// Milliseconds between simulated location estimates
    #[arg(long, default_value = "1000")]
    interval_ms: u64,

    /// Stop after this many seconds (runs until Ctrl+C if omitted)
    #[arg(long)]
    duration_secs: Option<u64>,

    /// Write the effective configuration to this path and exit
    #[arg(long)]
    write_config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = TomlConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Some(path) = args.write_config {
        write_toml_config(&config, &path).context("Failed to write configuration")?;
        info!("Configuration written to {}", path.display());
        return Ok(());
    }

    let location =
        GeoLocation::try_new(args.lat, args.lon).context("Invalid device coordinates")?;

    info!("Starting geolens-ar");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!(lat = location.latitude, lon = location.longitude, "Simulated device location");

    let event_bus = EventBus::new(256);
    let parts = PipelineParts::from_config(&config, AnnotationLayer::new())
        .context("Failed to build pipeline")?;
    let pipeline = PipelineHandle::spawn(event_bus, parts);

    let mut ticker = tokio::time::interval(Duration::from_millis(args.interval_ms.max(1)));
    let deadline = async {
        match args.duration_secs {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);
    let ctrl_c = signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                pipeline.location_estimate_updated(ScenePosition::default(), location);
            }
            _ = &mut deadline => {
                info!("Run duration elapsed");
                break;
            }
            result = &mut ctrl_c => {
                result.context("Failed to listen for Ctrl+C")?;
                info!("Received Ctrl+C");
                break;
            }
        }
    }

    let scene = pipeline
        .shutdown()
        .await
        .context("Pipeline task failed")?;

    info!(annotations = scene.nodes().len(), "Shutdown complete");
    for node in scene.nodes() {
        info!(
            photo_id = %node.photo_id(),
            lat = node.location().latitude,
            lon = node.location().longitude,
            "Annotation"
        );
    }

    Ok(())
}
