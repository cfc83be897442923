//! Live telemetry bookkeeping for one device.
//!
//! Each reported channel gets its own chart history; one configured channel
//! also feeds a time-windowed buffer for the rolling mean.

use crate::buffer::{EvictionPolicy, SampleBuffer};
use crate::calibration::CalibrationModel;
use crate::config::MonitorCfg;
use crate::error::{CoreError, Result};
use crate::stats::{RollingStatistics, WindowSummary};
use scalemon_traits::Telemetry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Raw,
    Weight,
    Battery,
    Vdd33,
}

impl Channel {
    pub const ALL: [Self; 4] = [Self::Raw, Self::Weight, Self::Battery, Self::Vdd33];

    pub fn of(self, t: &Telemetry) -> Option<f64> {
        match self {
            Self::Raw => Some(t.raw_value),
            Self::Weight => t.weight,
            Self::Battery => t.battery,
            Self::Vdd33 => t.vdd33,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Weight => "weight",
            Self::Battery => "battery",
            Self::Vdd33 => "vdd33",
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Raw => 0,
            Self::Weight => 1,
            Self::Battery => 2,
            Self::Vdd33 => 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryMonitor {
    cfg: MonitorCfg,
    history: [SampleBuffer; 4],
    average: SampleBuffer,
    latest: Option<(u64, Telemetry)>,
}

impl Default for TelemetryMonitor {
    fn default() -> Self {
        Self::new(MonitorCfg::default())
    }
}

impl TelemetryMonitor {
    pub fn new(cfg: MonitorCfg) -> Self {
        Self {
            cfg,
            history: std::array::from_fn(|_| SampleBuffer::new(cfg.history)),
            average: SampleBuffer::new(EvictionPolicy::MaxAge {
                window_ms: cfg.average_window_ms,
            }),
            latest: None,
        }
    }

    pub fn cfg(&self) -> &MonitorCfg {
        &self.cfg
    }

    /// Record one reading taken at `time_ms`.
    ///
    /// Validation happens before any buffer is touched, so a rejected frame
    /// leaves the monitor exactly as it was.
    pub fn ingest(&mut self, time_ms: u64, telemetry: &Telemetry) -> Result<()> {
        if let Some((last_ms, _)) = self.latest
            && time_ms < last_ms
        {
            return Err(CoreError::OrderViolation {
                newest_ms: last_ms,
                got_ms: time_ms,
            });
        }
        for ch in Channel::ALL {
            if let Some(v) = ch.of(telemetry)
                && !v.is_finite()
            {
                return Err(CoreError::InvalidInput(format!(
                    "{} must be finite, got {v}",
                    ch.name()
                )));
            }
        }

        for ch in Channel::ALL {
            if let Some(v) = ch.of(telemetry) {
                self.history[ch.index()].insert(time_ms, v)?;
            }
        }
        if let Some(v) = self.cfg.average_channel.of(telemetry) {
            self.average.insert(time_ms, v)?;
        }
        self.latest = Some((time_ms, *telemetry));
        Ok(())
    }

    pub fn history(&self, channel: Channel) -> &SampleBuffer {
        &self.history[channel.index()]
    }

    /// Samples currently inside the rolling-mean window.
    pub fn window(&self) -> &SampleBuffer {
        &self.average
    }

    pub fn rolling_mean(&self) -> Result<f64> {
        RollingStatistics::mean(&self.average)
    }

    pub fn summary(&self) -> Result<WindowSummary> {
        RollingStatistics::summary(&self.average)
    }

    pub fn latest(&self) -> Option<&Telemetry> {
        self.latest.as_ref().map(|(_, t)| t)
    }

    pub fn latest_time_ms(&self) -> Option<u64> {
        self.latest.map(|(ms, _)| ms)
    }

    /// Calibration the device reported in its latest reading, if complete and usable.
    pub fn device_calibration(&self) -> Option<CalibrationModel> {
        let t = self.latest()?;
        CalibrationModel::new(t.current_scale?, t.current_offset?).ok()
    }

    pub fn clear(&mut self) {
        for h in &mut self.history {
            h.clear();
        }
        self.average.clear();
        self.latest = None;
    }
}
