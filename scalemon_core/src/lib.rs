#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Telemetry and calibration core for a remote weight scale (device-agnostic).
//!
//! All device interaction goes through `scalemon_traits::TelemetrySource`;
//! nothing here performs I/O except the `poller` threads.
//!
//! ## Architecture
//!
//! - **Buffers**: time-ordered samples with age- or count-based eviction (`buffer`)
//! - **Statistics**: rolling mean and window summary over a buffer (`stats`)
//! - **Calibration**: point list, zero-weight filtering, least-squares fit
//!   inverted to the device's `actual = (raw - offset) / scale` (`calibration`)
//! - **Monitor**: per-channel histories plus one averaged channel (`monitor`)
//! - **Polling**: single-slot, overlap-dropping background poller (`poller`)
//!
//! The numeric types are synchronous, single-owner and never log; errors are
//! returned as `CoreError` for the caller to present.

pub mod buffer;
pub mod calibration;
pub mod config;
pub mod conversions;
pub mod error;
pub mod mocks;
pub mod monitor;
pub mod poller;
pub mod source_error;
pub mod stats;
pub mod util;

pub use buffer::{EvictionPolicy, Sample, SampleBuffer};
pub use calibration::{CalibrationFitter, CalibrationModel, CalibrationPoint, FitResult};
pub use config::{MonitorCfg, PollerCfg};
pub use error::{CoreError, Result};
pub use monitor::{Channel, TelemetryMonitor};
pub use poller::{OverlapGuard, PolledFrame, Poller};
pub use stats::{RollingStatistics, WindowSummary};
