#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and calibration point loading for scalemon.
//!
//! - `Config` and its sections are deserialized from TOML and validated.
//! - The calibration CSV loader enforces headers and rejects non-finite
//!   values; fitting itself lives in `scalemon_core`.
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

/// Calibration CSV schema.
///
/// Expected headers:
/// raw,actual
///
/// Example:
/// raw,actual
/// 8400,0.0
/// 50400,100.0
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct CalibrationRow {
    pub raw: f64,
    pub actual: f64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Polling {
    /// Interval between status polls (ms)
    pub interval_ms: u64,
    /// Per-fetch timeout handed to the telemetry source (ms)
    pub timeout_ms: u64,
}

impl Default for Polling {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            timeout_ms: 500,
        }
    }
}

/// Chart history retention. Exactly one of the two limits may be set;
/// when neither is, the last `DEFAULT_HISTORY_SAMPLES` samples are kept.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct History {
    pub max_samples: Option<usize>,
    pub max_age_ms: Option<u64>,
}

pub const DEFAULT_HISTORY_SAMPLES: usize = 20;

/// Resolved history retention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryLimit {
    Samples(usize),
    AgeMs(u64),
}

impl History {
    pub fn limit(&self) -> HistoryLimit {
        match (self.max_samples, self.max_age_ms) {
            (None, Some(ms)) => HistoryLimit::AgeMs(ms),
            (Some(n), _) => HistoryLimit::Samples(n),
            (None, None) => HistoryLimit::Samples(DEFAULT_HISTORY_SAMPLES),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChannelName {
    Raw,
    #[default]
    Weight,
    Battery,
    Vdd33,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Average {
    /// Rolling mean window (ms)
    pub window_ms: u64,
    /// Telemetry field the rolling mean is computed over
    pub channel: ChannelName,
}

impl Default for Average {
    fn default() -> Self {
        Self {
            window_ms: 10_000,
            channel: ChannelName::Weight,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct CalibrationCfg {
    /// `actual` value treated as the no-load point and left out of the fit
    pub zero_weight: Option<f64>,
    /// Default calibration points CSV, used when the CLI gets none
    pub points: Option<String>,
}

/// Parameters of the built-in simulated device.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Simulator {
    /// Counts per unit of weight
    pub scale: f64,
    /// Raw reading at zero load
    pub offset: f64,
    /// Load on the platform, in weight units
    pub load: f64,
    /// Peak amplitude of the triangular ripple added to the load
    pub ripple: f64,
    /// Battery voltage at start
    pub battery_v: f64,
    /// Reported `rom_phy_get_vdd33`
    pub vdd33: f64,
    /// Fail every n-th fetch with a timeout (0 = never)
    pub timeout_every: u64,
}

impl Default for Simulator {
    fn default() -> Self {
        Self {
            scale: 420.0,
            offset: 8400.0,
            load: 0.0,
            ripple: 0.0,
            battery_v: 4.1,
            vdd33: 3300.0,
            timeout_every: 0,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub polling: Polling,
    pub history: History,
    pub average: Average,
    pub calibration: CalibrationCfg,
    pub simulator: Simulator,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read calibration rows from any CSV reader. `label` names the input in errors.
pub fn read_calibration_csv<R: Read>(reader: R, label: &str) -> eyre::Result<Vec<CalibrationRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {label}: {e}"))?
        .clone();
    let expected = ["raw", "actual"];
    let actual: Vec<String> = headers.iter().map(ToString::to_string).collect();
    if actual != expected {
        eyre::bail!(
            "calibration CSV must have headers 'raw,actual', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<CalibrationRow>().enumerate() {
        // +2: one for the header line, one for 1-based numbering
        let line = idx + 2;
        let row = rec.map_err(|e| eyre::eyre!("invalid CSV row {line}: {e}"))?;
        if !row.raw.is_finite() || !row.actual.is_finite() {
            eyre::bail!("invalid CSV row {line}: values must be finite numbers");
        }
        rows.push(row);
    }
    Ok(rows)
}

pub fn load_calibration_csv(path: &Path) -> eyre::Result<Vec<CalibrationRow>> {
    let file = std::fs::File::open(path)
        .map_err(|e| eyre::eyre!("open calibration CSV {}: {e}", path.display()))?;
    read_calibration_csv(file, &path.display().to_string())
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Polling
        if self.polling.interval_ms == 0 {
            eyre::bail!("polling.interval_ms must be >= 1");
        }
        if self.polling.timeout_ms == 0 {
            eyre::bail!("polling.timeout_ms must be >= 1");
        }
        if self.polling.interval_ms > 24 * 60 * 60 * 1000 {
            eyre::bail!("polling.interval_ms is unreasonably large (>24h)");
        }

        // History
        if self.history.max_samples.is_some() && self.history.max_age_ms.is_some() {
            eyre::bail!("history: set either max_samples or max_age_ms, not both");
        }
        if self.history.max_samples == Some(0) {
            eyre::bail!("history.max_samples must be >= 1");
        }
        if self.history.max_age_ms == Some(0) {
            eyre::bail!("history.max_age_ms must be >= 1");
        }

        // Average
        if self.average.window_ms == 0 {
            eyre::bail!("average.window_ms must be >= 1");
        }

        // Calibration
        if let Some(z) = self.calibration.zero_weight
            && !z.is_finite()
        {
            eyre::bail!("calibration.zero_weight must be a finite number");
        }

        // Simulator
        let sim = &self.simulator;
        if !sim.scale.is_finite() || sim.scale == 0.0 {
            eyre::bail!("simulator.scale must be finite and non-zero");
        }
        for (name, v) in [
            ("simulator.offset", sim.offset),
            ("simulator.load", sim.load),
            ("simulator.battery_v", sim.battery_v),
            ("simulator.vdd33", sim.vdd33),
        ] {
            if !v.is_finite() {
                eyre::bail!("{name} must be a finite number");
            }
        }
        if !sim.ripple.is_finite() || sim.ripple < 0.0 {
            eyre::bail!("simulator.ripple must be >= 0");
        }

        // Logging
        if let Some(r) = self.logging.rotation.as_deref()
            && !matches!(r, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got {r:?}");
        }

        Ok(())
    }
}
