//! `mf-sim` — running devices.
//!
//! # Per-device loop
//!
//! ```text
//! sleep(start_delay)
//! loop:
//!   ① hour    — local hour of day from the shared Clock
//!   ② tick    — Device::tick(hour): temperature, motion, battery
//!   ③ record  — TelemetryRecord::from_reading (polyline-encodes the path)
//!   ④ publish — TelemetrySink::publish; accepted / rejected / failed is
//!               logged and counted, never retried
//!   ⑤ sleep(interval)
//! ```
//!
//! [`run_single`] drives one worker on the calling thread and stops at the
//! first error.  A [`Fleet`] gives every worker its own named thread with a
//! staggered start; [`Fleet::join`] collects a [`FleetReport`] in which a
//! failed or panicked worker is just one entry.
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use mf_sim::{FleetBuilder, FleetConfig};
//!
//! let fleet = FleetBuilder::new(FleetConfig::default(), sink, clock, trips)
//!     .spawn_street(network)?;
//! let report = fleet.join();
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod fleet;
pub mod worker;

#[cfg(test)]
mod tests;

pub use builder::FleetBuilder;
pub use config::{FleetConfig, WorkerConfig};
pub use error::{SimError, SimResult};
pub use fleet::{Fleet, FleetReport};
pub use worker::{run_single, DeviceWorker, WorkerSummary};
