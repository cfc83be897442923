//! Seams shared across the scalemon workspace.
//!
//! - `TelemetrySource`: anything that can produce one device status reading.
//! - `Telemetry`: the reading itself, as plain data.
//! - `Clock`: monotonic time used to stamp samples.
pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

/// One status reading from the scale device.
///
/// Only `raw_value` is guaranteed; firmware builds differ in which of the
/// other fields they report.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Telemetry {
    /// Unscaled load-cell reading (ADC counts).
    pub raw_value: f64,
    /// Weight as computed by the device with its current calibration.
    pub weight: Option<f64>,
    /// Battery voltage.
    pub battery: Option<f64>,
    /// PHY supply diagnostic (`rom_phy_get_vdd33`).
    pub vdd33: Option<f64>,
    /// Calibration the device is currently using.
    pub current_scale: Option<f64>,
    pub current_offset: Option<f64>,
}

impl Telemetry {
    pub fn from_raw(raw_value: f64) -> Self {
        Self {
            raw_value,
            ..Self::default()
        }
    }
}

pub trait TelemetrySource {
    fn fetch(
        &mut self,
        timeout: std::time::Duration,
    ) -> Result<Telemetry, Box<dyn std::error::Error + Send + Sync>>;
}

impl<T: TelemetrySource + ?Sized> TelemetrySource for Box<T> {
    fn fetch(
        &mut self,
        timeout: std::time::Duration,
    ) -> Result<Telemetry, Box<dyn std::error::Error + Send + Sync>> {
        (**self).fetch(timeout)
    }
}
