//! Runtime configuration types for the monitor and poller.
//!
//! These are separate from the TOML-deserialized config in `scalemon_config`;
//! see `conversions` for the mapping.

use crate::buffer::EvictionPolicy;
use crate::monitor::Channel;
use std::time::Duration;

/// Shape of a `TelemetryMonitor`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitorCfg {
    /// Retention for the per-channel chart history.
    pub history: EvictionPolicy,
    /// Trailing window the rolling mean is computed over.
    pub average_window_ms: u64,
    pub average_channel: Channel,
}

impl Default for MonitorCfg {
    fn default() -> Self {
        Self {
            history: EvictionPolicy::MaxCount { capacity: 20 },
            average_window_ms: 10_000,
            average_channel: Channel::Weight,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerCfg {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollerCfg {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1000),
            timeout: Duration::from_millis(500),
        }
    }
}
