//! Test and helper telemetry sources for scalemon_core.

use scalemon_traits::{Telemetry, TelemetrySource};
use std::collections::VecDeque;
use std::time::Duration;

/// A source that always fails; useful for exercising error paths.
pub struct FailingSource;

impl TelemetrySource for FailingSource {
    fn fetch(
        &mut self,
        _timeout: Duration,
    ) -> Result<Telemetry, Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("failing source")))
    }
}

/// Plays back a fixed list of readings, optionally taking `latency` per fetch.
/// Once the script runs out, the last reading repeats.
pub struct ScriptedSource {
    frames: VecDeque<Telemetry>,
    last: Telemetry,
    latency: Duration,
}

impl ScriptedSource {
    pub fn new(frames: impl IntoIterator<Item = Telemetry>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            last: Telemetry::default(),
            latency: Duration::ZERO,
        }
    }

    /// Readings with only `raw_value` set.
    pub fn raw(values: impl IntoIterator<Item = f64>) -> Self {
        Self::new(values.into_iter().map(Telemetry::from_raw))
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

impl TelemetrySource for ScriptedSource {
    fn fetch(
        &mut self,
        _timeout: Duration,
    ) -> Result<Telemetry, Box<dyn std::error::Error + Send + Sync>> {
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }
        if let Some(t) = self.frames.pop_front() {
            self.last = t;
        }
        Ok(self.last)
    }
}
