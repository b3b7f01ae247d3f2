use mf_device::DeviceError;
use mf_telemetry::TelemetryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("fleet configuration error: {0}")]
    Config(String),

    #[error("device error: {0}")]
    Device(#[from] DeviceError),

    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),

    #[error("could not start worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

pub type SimResult<T> = Result<T, SimError>;
