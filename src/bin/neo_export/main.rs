//! NEO export orchestrator - runs the load, link, select and write pipeline

use anyhow::{Context, Result};
use neo_catalog::ingestion::{link, write, NeoDatabase, OutputFormat, WriteStats};
use neo_catalog::load_database;
use std::env;
use std::path::PathBuf;
use tracing::{error, info, warn};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("Starting NEO export pipeline");

    // Load configuration from .env and environment
    dotenvy::dotenv().ok();
    let config = Config::from_env(env::args().nth(1))?;
    info!("Configuration loaded: {:?}", config);

    match run(&config) {
        Ok(stats) => {
            info!("✓ Export completed: {}", stats);
            Ok(())
        }
        Err(e) => {
            error!("✗ Export failed: {:#}", e);
            Err(e)
        }
    }
}

fn run(config: &Config) -> Result<WriteStats> {
    info!("Step 1/3: Loading and linking data...");
    let db: NeoDatabase = load_database(&config.neo_csv_path, &config.cad_json_path)
        .with_context(|| {
            format!(
                "Failed to load {:?} and {:?}",
                config.neo_csv_path, config.cad_json_path
            )
        })?;
    info!(
        "✓ Loaded {} NEOs and {} close approaches",
        db.neos().len(),
        db.approaches().len()
    );

    info!("Step 2/3: Selecting close approaches...");
    if config.limit_records > 0 {
        warn!("Limiting output to first {} close approaches", config.limit_records);
    }
    let results = link::limit(db.query(|_, _| true), config.limit_records);

    info!("Step 3/3: Writing {} output...", config.format);
    let stats = write::write_results(&db, results, &config.output_path, config.format)
        .with_context(|| format!("Failed to write {:?}", config.output_path))?;

    Ok(stats)
}

/// Configuration loaded from environment variables
#[derive(Debug, Clone)]
struct Config {
    neo_csv_path: PathBuf,
    cad_json_path: PathBuf,
    output_path: PathBuf,
    format: OutputFormat,
    limit_records: usize, // 0 = no limit
}

impl Config {
    /// `output_arg` (first CLI argument) takes precedence over `OUTPUT_PATH`
    fn from_env(output_arg: Option<String>) -> Result<Self> {
        let output_path: PathBuf = match output_arg {
            Some(arg) => arg.into(),
            None => env::var("OUTPUT_PATH")
                .context("Pass an output path or set OUTPUT_PATH")?
                .into(),
        };

        let format = OutputFormat::from_path(&output_path).with_context(|| {
            format!(
                "Unsupported output extension for {:?} (expected .csv or .json)",
                output_path
            )
        })?;

        Ok(Config {
            neo_csv_path: env::var("NEO_CSV_PATH")
                .unwrap_or_else(|_| "data/neos.csv".to_string())
                .into(),

            cad_json_path: env::var("CAD_JSON_PATH")
                .unwrap_or_else(|_| "data/cad.json".to_string())
                .into(),

            output_path,
            format,

            limit_records: env::var("LIMIT_RECORDS")
                .unwrap_or_else(|_| "0".to_string())
                .parse()
                .context("LIMIT_RECORDS must be a non-negative integer")?,
        })
    }
}
