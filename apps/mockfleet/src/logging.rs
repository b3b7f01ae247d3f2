//! stdout logging via `tracing-subscriber`.

use std::io;

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

use crate::cli::LogFormat;

/// Install the global subscriber.  `filter` accepts a plain level or full
/// `EnvFilter` directives.
pub fn init(format: LogFormat, filter: &str) -> Result<()> {
    let filter = EnvFilter::try_new(filter).map_err(|e| anyhow!("bad log filter {filter:?}: {e}"))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stdout)
        .with_thread_names(true);

    match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().with_current_span(true).try_init(),
    }
    .map_err(|e| anyhow!(e))
}
