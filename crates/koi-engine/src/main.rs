//! Headless engine for the Koi pond simulation.
//!
//! Loads configuration, builds a pond, and runs the frame loop for a fixed
//! number of frames at a fixed frame rate, without a window. The run
//! totals are printed to stdout as JSON.
//!
//! # Startup Sequence
//!
//! 1. Load configuration (first argument, then `KOI_CONFIG`, then
//!    `koi-config.yaml`)
//! 2. Initialize structured logging (tracing)
//! 3. Build the pond, atlas, spawner and clock; seed the population
//! 4. Run the frame loop
//! 5. Free every fish and report the result

mod error;
mod progress;

use std::path::PathBuf;

use koi_pond::{KoiConfig, LoggingConfig, Simulation};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::progress::ProgressCallback;

/// Config file read when neither an argument nor `KOI_CONFIG` names one.
const DEFAULT_CONFIG_PATH: &str = "koi-config.yaml";

/// Application entry point for the Koi engine.
///
/// # Errors
///
/// Returns an error if any initialization step or the simulation itself fails.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let (config, source) = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config.logging)?;
    info!("koi-engine starting");
    info!(
        source = %source,
        seed = config.simulation.seed,
        ticks_per_second = config.simulation.ticks_per_second,
        frame_rate = config.simulation.frame_rate,
        frames = config.simulation.frames,
        "Configuration loaded"
    );

    // 3. Build the simulation.
    let mut simulation = Simulation::from_config(&config).map_err(EngineError::from)?;

    // 4. Run the frame loop.
    let frame_seconds = config.simulation.frame_seconds();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let report_every = config.simulation.frame_rate.round() as u64;
    let mut callback = ProgressCallback::new(report_every);
    let result = koi_pond::run_simulation(
        &mut simulation,
        config.simulation.frames,
        frame_seconds,
        &mut callback,
    )
    .map_err(EngineError::from)?;

    // 5. Tear down and report.
    simulation.teardown();
    let summary = serde_json::to_string_pretty(&result).map_err(EngineError::from)?;
    println!("{summary}");

    info!(
        total_ticks = result.total_ticks,
        final_population = result.final_population,
        "koi-engine shutdown complete"
    );
    Ok(())
}

/// Resolve and load the configuration file.
///
/// A missing file falls back to the built-in defaults.
fn load_config() -> Result<(KoiConfig, String), EngineError> {
    let explicit = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("KOI_CONFIG").map(PathBuf::from));
    let path = explicit
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    if path.exists() {
        let config = KoiConfig::from_file(&path)?;
        config.validate()?;
        Ok((config, path.display().to_string()))
    } else {
        if explicit.is_some() {
            eprintln!("config file {} not found, using defaults", path.display());
        }
        Ok((KoiConfig::default(), String::from("defaults")))
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
fn init_logging(logging: &LoggingConfig) -> Result<(), EngineError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&logging.level).map_err(|e| EngineError::Logging {
            message: format!("invalid log level {:?}: {e}", logging.level),
        })?,
    };

    let installed = if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
    };
    installed.map_err(|e| EngineError::Logging {
        message: e.to_string(),
    })
}
