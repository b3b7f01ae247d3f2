//! Core error type.
//!
//! Sub-crates define their own error enums and wrap `CoreError` where a core
//! operation can fail.

use thiserror::Error;

/// Errors produced by `mf-core`.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown time zone {name:?}: {reason}")]
    UnknownTimezone { name: String, reason: String },
}

/// Shorthand result type for `mf-core`.
pub type CoreResult<T> = Result<T, CoreError>;
