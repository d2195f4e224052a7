//! CLI entry point for the zonewatch tool.
//!
//! Provides subcommands for rating individual readings, listing monitored
//! zones, sampling every zone into per-zone history CSVs, and summarizing
//! that history into an index JSON.

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;
use tracing::Instrument;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use zonewatch::{
    config::EngineConfig,
    engine::aggregate::aggregate_reading,
    fetch::{BasicClient, fetch_bytes},
    output::{BundleRow, append_record, print_json, print_pretty, write_json},
    parser::parse_reading,
    providers::{ReadingProvider, RestStore, StaticCatalog, StoreConfig},
    summary::build_index,
};

#[derive(Parser)]
#[command(name = "zonewatch")]
#[command(about = "Derived environmental metrics for monitored city zones", long_about = None)]
struct Cli {
    /// Engine config JSON file; built-in defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rate a single zone reading from a file or URL
    Rate {
        /// Path to file or URL to fetch
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// CSV file to append the result row to
        #[arg(short, long, default_value = "data.csv")]
        output: String,
    },
    /// List monitored zones from the configured provider
    ListZones {
        /// Read from a local JSON catalog file instead of the hosted store
        #[arg(long)]
        catalog: Option<String>,

        /// Use the built-in demo catalog
        #[arg(long, default_value_t = false)]
        builtin: bool,
    },
    /// Sample every zone, appending one history row per zone per round
    Sample {
        /// Directory to save CSV files (one subdirectory per zone)
        #[arg(short, long, default_value = "zones")]
        output_dir: String,

        /// Maximum number of concurrent zone fetches
        #[arg(short, long, default_value_t = 5)]
        concurrency: usize,

        /// Sample rate: query each zone every X seconds
        #[arg(short = 'r', long, default_value_t = 60)]
        sample_rate: u64,

        /// Number of samples to collect (0 = infinite)
        #[arg(short = 'n', long, default_value_t = 1)]
        num_samples: usize,

        /// Read from a local JSON catalog file instead of the hosted store
        #[arg(long)]
        catalog: Option<String>,

        /// Use the built-in demo catalog
        #[arg(long, default_value_t = false)]
        builtin: bool,
    },
    /// Summarize per-zone history CSVs into an index JSON
    Summarize {
        /// Directory containing per-zone history
        #[arg(short, long, default_value = "zones")]
        data_dir: String,

        /// Path of the index JSON to write
        #[arg(short, long, default_value = "zones.json")]
        output: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/zonewatch.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("zonewatch.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let engine_config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::Rate { source, output } => {
            let bytes = fetcher(&source).await?;
            let reading = parse_reading(&bytes)?;
            let bundle = aggregate_reading(&reading, &engine_config)?;

            print_pretty(&bundle);
            print_json(&bundle)?;
            append_record(&output, &BundleRow::from_bundle(&bundle))?;
        }
        Commands::ListZones { catalog, builtin } => {
            let provider = provider_from(catalog, builtin)?;

            let zones = provider.list_zones().await?;
            info!(total = zones.len(), "Zone list fetched");

            for zone in &zones {
                info!(zone_id = zone.id, zone_name = %zone.name, "Zone");
            }

            let readings = provider.latest_readings().await?;
            info!(
                total = zones.len(),
                with_reading = readings.len(),
                "Zone list summary"
            );
        }
        Commands::Sample {
            output_dir,
            concurrency,
            sample_rate,
            num_samples,
            catalog,
            builtin,
        } => {
            let provider = provider_from(catalog, builtin)?;
            sample_zones(
                &engine_config,
                provider,
                &output_dir,
                concurrency,
                sample_rate,
                num_samples,
            )
            .await?;
        }
        Commands::Summarize { data_dir, output } => {
            let index = build_index(&data_dir, &engine_config)?;
            write_json(&output, &index)?;
            info!(zones = index.zones.len(), output = %output, "Summary written");
        }
    }

    Ok(())
}

/// Picks the reading provider: an explicit catalog file, the built-in demo
/// catalog, or the hosted row store configured via the environment.
fn provider_from(catalog: Option<String>, builtin: bool) -> Result<Arc<dyn ReadingProvider>> {
    if let Some(path) = catalog {
        info!(path = %path, "Using catalog file provider");
        return Ok(Arc::new(StaticCatalog::from_file(&path)?));
    }
    if builtin {
        info!("Using built-in demo catalog");
        return Ok(Arc::new(StaticCatalog::seeded()));
    }
    let store_config = StoreConfig::from_env()?;
    info!(
        base_url = %store_config.base_url,
        table = %store_config.readings_table,
        "Using hosted row store"
    );
    Ok(Arc::new(RestStore::new(store_config)?))
}

/// Loads reading data from a local file path or fetches it over HTTP.
#[tracing::instrument(fields(source = %url))]
async fn fetcher(url: &String) -> Result<Vec<u8>> {
    let bytes = if url.starts_with("http") {
        let client = BasicClient::new();
        fetch_bytes(&client, &url).await?
    } else {
        std::fs::read(url)?
    };
    Ok(bytes)
}

/// Samples all zones concurrently, collecting rounds at a configurable
/// interval and appending one history row per zone per round.
#[tracing::instrument(
    skip(engine_config, provider),
    fields(output_dir, concurrency, sample_rate, num_samples)
)]
async fn sample_zones(
    engine_config: &EngineConfig,
    provider: Arc<dyn ReadingProvider>,
    output_dir: &str,
    concurrency: usize,
    sample_rate: u64,
    num_samples: usize,
) -> Result<()> {
    info!("Fetching zone list");
    let zones = provider.list_zones().await?;

    info!(zone_count = zones.len(), "Zones ready for sampling");

    if num_samples == 0 {
        info!(sample_rate, "Sampling infinitely. Press Ctrl+C to stop.");
    } else {
        info!(num_samples, sample_rate, "Starting sample collection");
    }

    // Create output directory if it doesn't exist
    std::fs::create_dir_all(output_dir)?;

    let semaphore = Arc::new(tokio::sync::Semaphore::new(concurrency));

    let mut sample_count = 0;

    loop {
        // Check if we've reached the sample limit (0 = infinite)
        if num_samples > 0 && sample_count >= num_samples {
            break;
        }

        sample_count += 1;

        info!(
            sample = sample_count,
            total = if num_samples == 0 {
                None
            } else {
                Some(num_samples)
            },
            "Starting sample round"
        );

        let mut tasks = vec![];

        for zone in &zones {
            let sem = semaphore.clone();
            let provider = provider.clone();
            let engine_config = engine_config.clone();
            let output_dir = output_dir.to_string();
            let zone = zone.clone();

            let zone_span = tracing::info_span!(
                "process_zone",
                zone_id = zone.id,
                zone_name = %zone.name,
            );

            let task = tokio::spawn(
                async move {
                    let _permit = sem.acquire().await.unwrap();

                    // Create zone directory with date-based CSV files
                    let now = Utc::now();
                    let date = now.format("%Y-%m-%d").to_string();
                    let zone_dir = format!("{}/zone={}", output_dir, zone.name);

                    // Create directory structure if it doesn't exist
                    if let Err(e) = std::fs::create_dir_all(&zone_dir) {
                        error!(dir = %zone_dir, error = %e, "Failed to create zone directory");
                        return;
                    }

                    let output_file = format!("{}/date={}.csv", zone_dir, date);

                    let fetch_start = std::time::Instant::now();
                    match provider.reading_for(&zone.name).await {
                        Ok(Some(reading)) => {
                            let elapsed = fetch_start.elapsed();
                            if elapsed.as_secs() > 15 {
                                warn!(elapsed_secs = elapsed.as_secs(), "Zone fetch was slow");
                            }
                            debug!(
                                vehicle_count = reading.vehicle_count,
                                "Reading received, aggregating"
                            );
                            match aggregate_reading(&reading, &engine_config) {
                                Ok(bundle) => {
                                    let row = BundleRow::from_bundle(&bundle);
                                    if let Err(e) = append_record(&output_file, &row) {
                                        error!(error = %e, "Failed to write row for zone");
                                    } else {
                                        info!(
                                            score = bundle.composite.score,
                                            band = %bundle.composite.band,
                                            "Zone processed successfully"
                                        );
                                    }
                                }
                                Err(e) => {
                                    error!(error = %e, "Zone aggregation failed");
                                    let error_row = BundleRow::from_error(
                                        &zone.name,
                                        "aggregate_error",
                                        &e.to_string(),
                                    );
                                    let _ = append_record(&output_file, &error_row);
                                }
                            }
                        }
                        Ok(None) => {
                            warn!("Zone has no current reading");
                            let error_row = BundleRow::from_error(
                                &zone.name,
                                "no_reading",
                                "store returned no rows",
                            );
                            let _ = append_record(&output_file, &error_row);
                        }
                        Err(e) => {
                            error!(error = %e, "Zone fetch failed");
                            let error_row =
                                BundleRow::from_error(&zone.name, "fetch_error", &e.to_string());
                            let _ = append_record(&output_file, &error_row);
                        }
                    }
                }
                .instrument(zone_span),
            );

            tasks.push(task);
        }

        // Wait for all tasks to complete
        for task in tasks {
            let _ = task.await;
        }

        // If not the last sample, wait before next iteration
        if num_samples == 0 || sample_count < num_samples {
            info!(sample_rate, "Waiting before next sample");
            tokio::time::sleep(tokio::time::Duration::from_secs(sample_rate)).await;
        }
    }

    info!(output_dir, "Finished sampling all zones");
    Ok(())
}
