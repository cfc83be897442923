pub mod error;
pub mod status;

pub use error::DeviceError;
pub use status::{StatusPayload, parse_status};

use scalemon_traits::{Telemetry, TelemetrySource};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Duration;

/// Ripple period of the simulated load, in fetches.
const RIPPLE_PERIOD: u64 = 8;
/// Battery drop per fetch (V) and the floor it settles at.
const BATTERY_DRAIN_V: f64 = 0.0001;
const BATTERY_FLOOR_V: f64 = 3.0;

/// Simulated scale device.
///
/// Raw counts follow the device model `raw = load * scale + offset`, with a
/// triangular ripple of `ripple` weight units on top of the load.
#[derive(Debug, Clone)]
pub struct SimulatedDevice {
    scale: f64,
    offset: f64,
    load: f64,
    ripple: f64,
    battery_v: f64,
    vdd33: f64,
    timeout_every: Option<u64>,
    fetches: u64,
}

impl Default for SimulatedDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedDevice {
    pub fn new() -> Self {
        Self {
            scale: 420.0,
            offset: 8400.0,
            load: 0.0,
            ripple: 0.0,
            battery_v: 4.1,
            vdd33: 3300.0,
            timeout_every: None,
            fetches: 0,
        }
    }

    pub fn with_calibration(mut self, scale: f64, offset: f64) -> Self {
        self.scale = scale;
        self.offset = offset;
        self
    }

    pub fn with_load(mut self, load: f64) -> Self {
        self.load = load;
        self
    }

    pub fn with_ripple(mut self, ripple: f64) -> Self {
        self.ripple = ripple.abs();
        self
    }

    pub fn with_battery(mut self, battery_v: f64) -> Self {
        self.battery_v = battery_v;
        self
    }

    pub fn with_vdd33(mut self, vdd33: f64) -> Self {
        self.vdd33 = vdd33;
        self
    }

    /// Fail every `n`-th fetch with `DeviceError::Timeout` (`0` disables).
    pub fn with_timeout_every(mut self, n: u64) -> Self {
        self.timeout_every = (n > 0).then_some(n);
        self
    }

    pub fn set_load(&mut self, load: f64) {
        self.load = load;
    }

    /// Triangle wave in [-1, 1].
    fn ripple_phase(&self) -> f64 {
        let p = self.fetches % RIPPLE_PERIOD;
        let half = RIPPLE_PERIOD / 2;
        let up = if p <= half { p } else { RIPPLE_PERIOD - p };
        (up as f64 / half as f64) * 2.0 - 1.0
    }

    fn read(&mut self) -> Result<Telemetry, DeviceError> {
        self.fetches = self.fetches.saturating_add(1);
        if let Some(n) = self.timeout_every
            && self.fetches % n == 0
        {
            tracing::debug!(fetch = self.fetches, "simulated device timeout");
            return Err(DeviceError::Timeout);
        }
        let load = self.load + self.ripple * self.ripple_phase();
        let raw = (load * self.scale + self.offset).round();
        let weight = (raw - self.offset) / self.scale;
        let battery =
            (self.battery_v - BATTERY_DRAIN_V * self.fetches as f64).max(BATTERY_FLOOR_V);
        tracing::trace!(raw, weight, "simulated status");
        Ok(Telemetry {
            raw_value: raw,
            weight: Some(weight),
            battery: Some(battery),
            vdd33: Some(self.vdd33),
            current_scale: Some(self.scale),
            current_offset: Some(self.offset),
        })
    }
}

impl TelemetrySource for SimulatedDevice {
    fn fetch(
        &mut self,
        _timeout: Duration,
    ) -> Result<Telemetry, Box<dyn std::error::Error + Send + Sync>> {
        self.read().map_err(Into::into)
    }
}

/// Replays recorded status payloads, one JSON object per line.
///
/// Blank lines are skipped; end of input is `DeviceError::Exhausted`.
pub struct ReplaySource<R = BufReader<File>> {
    reader: R,
    line_no: usize,
    buf: Vec<u8>,
}

impl ReplaySource {
    pub fn open(path: &Path) -> Result<Self, DeviceError> {
        let file = File::open(path)?;
        tracing::debug!(path = %path.display(), "replaying status payloads");
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: BufRead> ReplaySource<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            buf: Vec::new(),
        }
    }

    pub fn next_frame(&mut self) -> Result<Telemetry, DeviceError> {
        loop {
            self.buf.clear();
            if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
                return Err(DeviceError::Exhausted);
            }
            // Counted before decoding so a bad line still advances the numbering
            self.line_no += 1;
            let line_no = self.line_no;
            let line = std::str::from_utf8(&self.buf)
                .map_err(|e| DeviceError::Parse(format!("line {line_no}: invalid UTF-8: {e}")))?
                .trim();
            if line.is_empty() {
                continue;
            }
            return parse_status(line).map_err(|e| match e {
                DeviceError::Parse(msg) => DeviceError::Parse(format!("line {line_no}: {msg}")),
                other => other,
            });
        }
    }
}

impl<R: BufRead> TelemetrySource for ReplaySource<R> {
    fn fetch(
        &mut self,
        _timeout: Duration,
    ) -> Result<Telemetry, Box<dyn std::error::Error + Send + Sync>> {
        self.next_frame().map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_device_follows_its_calibration() {
        let mut dev = SimulatedDevice::new()
            .with_calibration(420.0, 8400.0)
            .with_load(100.0);
        let t = dev.read().unwrap();
        assert_eq!(t.raw_value, 50_400.0);
        assert_eq!(t.weight, Some(100.0));
        assert_eq!(t.current_scale, Some(420.0));
    }

    #[test]
    fn ripple_stays_within_amplitude() {
        let mut dev = SimulatedDevice::new()
            .with_calibration(1.0, 0.0)
            .with_load(10.0)
            .with_ripple(0.5);
        for _ in 0..32 {
            let t = dev.read().unwrap();
            assert!((t.raw_value - 10.0).abs() <= 1.0, "raw {}", t.raw_value);
        }
    }

    #[test]
    fn battery_drains_to_floor() {
        let mut dev = SimulatedDevice::new().with_battery(3.0001);
        let first = dev.read().unwrap().battery.unwrap();
        let second = dev.read().unwrap().battery.unwrap();
        assert!(first >= second);
        assert_eq!(second, BATTERY_FLOOR_V);
    }

    #[test]
    fn scheduled_timeouts() {
        let mut dev = SimulatedDevice::new().with_timeout_every(3);
        assert!(dev.read().is_ok());
        assert!(dev.read().is_ok());
        assert!(matches!(dev.read(), Err(DeviceError::Timeout)));
        assert!(dev.read().is_ok());
    }
}
