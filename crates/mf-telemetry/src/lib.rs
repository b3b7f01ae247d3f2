//! `mf-telemetry` — turning device readings into published telemetry.
//!
//! Two backends implement [`TelemetrySink`] and [`TripHistory`]:
//!
//! | Backend            | Target                                        |
//! |--------------------|-----------------------------------------------|
//! | [`ThingSpeakClient`] | ThingSpeak channel API over HTTPS (blocking) |
//! | [`CsvSink`] / [`CsvHistory`] | a local CSV file, for offline runs   |
//!
//! # Usage
//!
//! ```rust,ignore
//! use mf_telemetry::{TelemetryRecord, TelemetrySink, ThingSpeakClient, ThingSpeakConfig};
//!
//! let client = ThingSpeakClient::new(ThingSpeakConfig::new(write_key))?;
//! let record = TelemetryRecord::from_reading(&reading, true)?;
//! match client.publish(&record)? {
//!     Delivery::Accepted { entry_id } => { /* ... */ }
//!     Delivery::Rejected => { /* rate limited */ }
//! }
//! ```

pub mod csv;
pub mod error;
pub mod polyline;
pub mod record;
pub mod sink;
pub mod thingspeak;


pub use crate::csv::{CsvHistory, CsvSink};
pub use error::{TelemetryError, TelemetryResult};
pub use polyline::{decode_trajectory, encode_trajectory};
pub use record::TelemetryRecord;
pub use sink::{Delivery, TelemetrySink, TripHistory};
pub use thingspeak::{interpret_update_body, max_trip_id, ThingSpeakClient, ThingSpeakConfig};
