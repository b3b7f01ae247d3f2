//! Error types for mf-telemetry.

use thiserror::Error;

/// Errors that can occur while publishing telemetry or reading history.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("unexpected JSON from telemetry service: {0}")]
    Json(#[from] serde_json::Error),

    #[error("polyline encoding failed: {0}")]
    Encode(String),

    #[error("trip history needs a channel id and read API key")]
    MissingReadAccess,
}

/// Alias for `Result<T, TelemetryError>`.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
