//! `From` implementations bridging `scalemon_config` types to `scalemon_core` types.

use crate::buffer::EvictionPolicy;
use crate::calibration::{CalibrationFitter, CalibrationPoint};
use crate::config::{MonitorCfg, PollerCfg};
use crate::error::Result;
use crate::monitor::Channel;
use std::time::Duration;

// ── EvictionPolicy ───────────────────────────────────────────────────────────

impl From<&scalemon_config::History> for EvictionPolicy {
    fn from(h: &scalemon_config::History) -> Self {
        match h.limit() {
            scalemon_config::HistoryLimit::Samples(capacity) => Self::MaxCount { capacity },
            scalemon_config::HistoryLimit::AgeMs(window_ms) => Self::MaxAge { window_ms },
        }
    }
}

// ── Channel ──────────────────────────────────────────────────────────────────

impl From<scalemon_config::ChannelName> for Channel {
    fn from(c: scalemon_config::ChannelName) -> Self {
        match c {
            scalemon_config::ChannelName::Raw => Self::Raw,
            scalemon_config::ChannelName::Weight => Self::Weight,
            scalemon_config::ChannelName::Battery => Self::Battery,
            scalemon_config::ChannelName::Vdd33 => Self::Vdd33,
        }
    }
}

// ── MonitorCfg / PollerCfg ───────────────────────────────────────────────────

impl From<&scalemon_config::Config> for MonitorCfg {
    fn from(c: &scalemon_config::Config) -> Self {
        Self {
            history: (&c.history).into(),
            average_window_ms: c.average.window_ms,
            average_channel: c.average.channel.into(),
        }
    }
}

impl From<&scalemon_config::Polling> for PollerCfg {
    fn from(p: &scalemon_config::Polling) -> Self {
        Self {
            interval: Duration::from_millis(p.interval_ms),
            timeout: Duration::from_millis(p.timeout_ms),
        }
    }
}

// ── Calibration points ───────────────────────────────────────────────────────

impl From<&scalemon_config::CalibrationRow> for CalibrationPoint {
    fn from(r: &scalemon_config::CalibrationRow) -> Self {
        Self {
            raw: r.raw,
            actual: r.actual,
        }
    }
}

impl CalibrationFitter {
    /// Build a fitter from CSV rows, preserving file order.
    pub fn from_rows(
        rows: &[scalemon_config::CalibrationRow],
        zero_weight: Option<f64>,
    ) -> Result<Self> {
        let mut fitter = Self::new();
        fitter.set_zero_weight(zero_weight)?;
        for row in rows {
            fitter.add_point(row.raw, row.actual)?;
        }
        Ok(fitter)
    }
}

impl TryFrom<&[scalemon_config::CalibrationRow]> for CalibrationFitter {
    type Error = crate::error::CoreError;
    fn try_from(rows: &[scalemon_config::CalibrationRow]) -> Result<Self> {
        Self::from_rows(rows, None)
    }
}
