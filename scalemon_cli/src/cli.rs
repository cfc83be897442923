//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

/// Config path tried when `--config` is not given; defaults apply if it is absent.
pub const DEFAULT_CONFIG: &str = "etc/scalemon.toml";

#[derive(Parser, Debug)]
#[command(
    name = "scalemon",
    version,
    about = "Weight-scale telemetry monitor and calibration fitter"
)]
pub struct Cli {
    /// Path to config TOML (typed); falls back to etc/scalemon.toml, then built-in defaults
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print results and errors as JSON lines; logs go to stderr as JSON too
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); RUST_LOG takes precedence
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fit scale/offset from (raw, actual) calibration points
    Fit {
        /// Calibration points CSV with headers raw,actual (overrides calibration.points)
        #[arg(long, value_name = "FILE")]
        points: Option<PathBuf>,
        /// Leave points with this actual value out of the regression
        #[arg(long, value_name = "VALUE", allow_negative_numbers = true)]
        zero_weight: Option<f64>,
        /// Drop the point at this 0-based row index before fitting (repeatable)
        #[arg(long = "exclude", value_name = "INDEX")]
        exclude: Vec<usize>,
        /// Also print per-point residuals against the fit
        #[arg(long, action = ArgAction::SetTrue)]
        residuals: bool,
    },
    /// Poll the device and report live values and the rolling mean
    Monitor {
        /// Stop after this many readings
        #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
        samples: u64,
        /// Replay recorded status payloads (JSON lines) instead of the simulator
        #[arg(long, value_name = "FILE")]
        replay: Option<PathBuf>,
        /// Override polling.interval_ms
        #[arg(long, value_name = "MS")]
        interval_ms: Option<u64>,
        /// Override simulator.load
        #[arg(long, value_name = "WEIGHT", allow_negative_numbers = true)]
        load: Option<f64>,
    },
    /// Validate the config and take one reading from the simulator
    SelfCheck,
}
