use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("status payload: {0}")]
    Parse(String),
    #[error("device timeout")]
    Timeout,
    #[error("telemetry source exhausted")]
    Exhausted,
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DeviceError>;
