//! CSV backend for offline runs.
//!
//! Each published record becomes one row.  Opening an existing file appends
//! to it without repeating the header, and the same file can be read back
//! as a [`TripHistory`] so trip ids keep increasing across runs.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use csv::{Writer, WriterBuilder};
use parking_lot::Mutex;

use mf_core::TripId;

use crate::sink::{parse_trip_id, Delivery, TelemetrySink, TripHistory};
use crate::{TelemetryRecord, TelemetryResult};

pub const HEADER: [&str; 11] = [
    "created_at",
    "entry_id",
    "device",
    "trip",
    "temperature_c",
    "battery_pct",
    "latitude",
    "longitude",
    "speed_mps",
    "trajectory",
    "tick",
];

const TRIP_COLUMN: usize = 3;

struct CsvState {
    writer:  Writer<File>,
    entries: u64,
}

/// Appends records to a CSV file.  Writes are serialised by a mutex and
/// flushed per row so a killed process loses at most the row in flight.
pub struct CsvSink {
    path:  PathBuf,
    state: Mutex<CsvState>,
}

impl CsvSink {
    /// Open `path` for appending, writing the header if the file is new or
    /// empty.
    pub fn open(path: &Path) -> TelemetryResult<Self> {
        let entries = count_rows(path)?;
        let is_new = std::fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        if is_new {
            writer.write_record(HEADER)?;
            writer.flush()?;
        }

        Ok(Self { path: path.to_owned(), state: Mutex::new(CsvState { writer, entries }) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TelemetrySink for CsvSink {
    fn publish(&self, record: &TelemetryRecord) -> TelemetryResult<Delivery> {
        let (device, trip) = if record.include_ids {
            (record.device.to_string(), record.trip.to_string())
        } else {
            (String::new(), String::new())
        };

        let mut state = self.state.lock();
        let entry_id = state.entries + 1;
        state.writer.write_record([
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            entry_id.to_string(),
            device,
            trip,
            record.temperature_c.to_string(),
            record.battery_pct.to_string(),
            record.latitude.to_string(),
            record.longitude.to_string(),
            record.speed_mps.to_string(),
            record.trajectory.clone(),
            record.tick.0.to_string(),
        ])?;
        state.writer.flush()?;
        state.entries = entry_id;

        Ok(Delivery::Accepted { entry_id: Some(entry_id) })
    }
}

/// Reads trip ids back from a file written by [`CsvSink`].
pub struct CsvHistory {
    path: PathBuf,
}

impl CsvHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TripHistory for CsvHistory {
    /// A missing file is an empty history.
    fn latest_trip_id(&self) -> TelemetryResult<TripId> {
        if !self.path.exists() {
            return Ok(TripId::NONE);
        }
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(&self.path)?;
        let mut latest = TripId::NONE;
        for row in reader.records() {
            let row = row?;
            if let Some(trip) = row.get(TRIP_COLUMN).and_then(parse_trip_id) {
                latest = latest.max(trip);
            }
        }
        Ok(latest)
    }
}

fn count_rows(path: &Path) -> TelemetryResult<u64> {
    if !path.exists() {
        return Ok(0);
    }
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let mut n = 0;
    for row in reader.records() {
        row?;
        n += 1;
    }
    Ok(n)
}
