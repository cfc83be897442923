//! Maps `Box<dyn Error>` from the `TelemetrySource` seam to typed `CoreError`.
//!
//! Sources return `Box<dyn Error + Send + Sync>` so any transport can plug in;
//! this module converts those to our typed error enum, with an optional
//! feature-gated path for `scalemon_device::DeviceError` downcasting.

use crate::error::CoreError;

/// Map a source error to a typed `CoreError`.
///
/// Attempts to downcast known device error types first, then falls back
/// to string-based heuristics.
pub fn map_source_error(e: &(dyn std::error::Error + 'static)) -> CoreError {
    #[cfg(feature = "device-errors")]
    {
        if let Some(dev) = e.downcast_ref::<scalemon_device::DeviceError>() {
            return match dev {
                scalemon_device::DeviceError::Exhausted => CoreError::SourceExhausted,
                scalemon_device::DeviceError::Timeout => CoreError::Timeout,
                other => CoreError::Source(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        CoreError::Timeout
    } else {
        CoreError::Source(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_text_maps_to_timeout() {
        let e = std::io::Error::other("read Timeout after 500ms");
        assert_eq!(map_source_error(&e), CoreError::Timeout);
    }

    #[test]
    fn other_text_is_preserved() {
        let e = std::io::Error::other("connection refused");
        assert_eq!(
            map_source_error(&e),
            CoreError::Source("connection refused".into())
        );
    }

    #[cfg(feature = "device-errors")]
    #[test]
    fn device_errors_downcast_precisely() {
        let e = scalemon_device::DeviceError::Exhausted;
        assert_eq!(map_source_error(&e), CoreError::SourceExhausted);
        let e = scalemon_device::DeviceError::Timeout;
        assert_eq!(map_source_error(&e), CoreError::Timeout);
    }
}
