use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("index {index} out of range for {len} calibration points")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("no samples in window")]
    EmptyWindow,
    #[error("insufficient data: {usable} usable calibration points, need at least 2")]
    InsufficientData { usable: usize },
    #[error("degenerate fit: {0}")]
    DegenerateFit(&'static str),
    #[error("sample at {got_ms} ms is older than newest sample at {newest_ms} ms")]
    OrderViolation { newest_ms: u64, got_ms: u64 },
    #[error("timeout waiting for telemetry")]
    Timeout,
    #[error("telemetry source exhausted")]
    SourceExhausted,
    #[error("telemetry source error: {0}")]
    Source(String),
}

impl CoreError {
    /// True for the "not enough information to fit" family.
    pub fn is_fit_failure(&self) -> bool {
        matches!(self, Self::InsufficientData { .. } | Self::DegenerateFit(_))
    }
}

pub type Result<T, E = CoreError> = std::result::Result<T, E>;
