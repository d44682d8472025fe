//! CLI entry point for the MBTA tracker.
//!
//! Resolves the configured stations once, then polls live predictions and
//! prints one board per station every interval.

use anyhow::Result;
use clap::{Parser, Subcommand};
use mbta_tracker::aggregator::{Aggregator, BoardSettings};
use mbta_tracker::config::Config;
use mbta_tracker::directions::DirectionResolver;
use mbta_tracker::fetch::auth::ApiKey;
use mbta_tracker::fetch::{BasicClient, HttpClient, Transport};
use mbta_tracker::output::{emit, render_resolved};
use mbta_tracker::poller::{Tracker, resolve_directions, until_interrupted};
use mbta_tracker::stations::{ResolvedStation, StationResolver};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "mbta_tracker")]
#[command(about = "Live MBTA arrival predictions for a few stations", long_about = None)]
struct Cli {
    /// JSON config file; the built-in station set is used when omitted
    #[arg(short, long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Override the API base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve stations, then poll and print predictions (default)
    Watch {
        /// Print a single tick and exit
        #[arg(long, default_value_t = false)]
        once: bool,

        /// Seconds between polls, overriding the config
        #[arg(short, long)]
        interval: Option<u64>,
    },
    /// Resolve configured stations and direction codes, print them and exit
    Resolve,
    /// Show the inbound/outbound direction codes of routes
    Directions {
        #[arg(value_name = "ROUTE", required = true)]
        routes: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/mbta_tracker.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("mbta_tracker.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    config.validate()?;

    let transport = build_transport(&config)?;
    let directions = DirectionResolver::new(transport.clone());

    match cli.command.unwrap_or(Commands::Watch {
        once: false,
        interval: None,
    }) {
        Commands::Watch { once, interval } => {
            let startup = resolve_stations(&config, &transport, &directions);
            let Some(stations) = until_interrupted(startup, tokio::signal::ctrl_c()).await else {
                return Ok(());
            };
            let stations = stations?;

            let settings = BoardSettings::from_config(&config);
            let aggregator = Arc::new(Aggregator::new(transport, settings));
            let tracker = Tracker::new(stations, aggregator, config.station_timeout());

            let interval = interval
                .map(Duration::from_secs)
                .unwrap_or_else(|| config.poll_interval())
                .max(Duration::from_secs(1));
            tracker
                .run(&mut std::io::stdout(), interval, config.tz()?, once)
                .await?;
            info!("Stopped");
        }
        Commands::Resolve => {
            let startup = resolve_stations(&config, &transport, &directions);
            if let Some(resolved) = until_interrupted(startup, tokio::signal::ctrl_c()).await {
                resolved?;
            }
        }
        Commands::Directions { routes } => {
            let mut stdout = std::io::stdout();
            for route in &routes {
                let map = directions.resolve(route).await;
                emit(
                    &mut stdout,
                    &format!("{route}: outbound={} inbound={}\n", map.outbound, map.inbound),
                )?;
            }
        }
    }

    Ok(())
}

/// Builds the shared transport, attaching `MBTA_API_KEY` when set.
fn build_transport(config: &Config) -> Result<Arc<Transport>> {
    let basic = BasicClient::new(config.http_timeout())?;

    let client: Arc<dyn HttpClient> = match std::env::var("MBTA_API_KEY") {
        Ok(key) if !key.trim().is_empty() => {
            info!("Using MBTA API key");
            Arc::new(ApiKey::mbta(basic, key.trim())?)
        }
        _ => {
            warn!("MBTA_API_KEY not set, requests use the anonymous rate limit");
            Arc::new(basic)
        }
    };

    info!(base_url = %config.base_url, timeout_secs = config.http_timeout_secs, "Transport ready");
    Ok(Arc::new(Transport::new(client, config.base_url.clone())))
}

/// Resolves stations and direction codes and prints the startup summary.
///
/// Fails when no configured station resolves at all.
#[tracing::instrument(skip_all)]
async fn resolve_stations(
    config: &Config,
    transport: &Arc<Transport>,
    directions: &DirectionResolver,
) -> Result<Vec<ResolvedStation>> {
    let stations = StationResolver::new(transport.clone())
        .resolve_all(&config.stations)
        .await
        .inspect_err(|e| error!(error = %e, "Fatal"))?;

    let direction_maps = resolve_directions(directions, &config.stations).await;

    emit(
        &mut std::io::stdout(),
        &render_resolved(&stations, &direction_maps),
    )?;
    Ok(stations)
}
