//! Publisher and history traits implemented by the ThingSpeak and CSV
//! backends.

use mf_core::TripId;

use crate::{TelemetryRecord, TelemetryResult};

/// Outcome of a write the service answered.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Delivery {
    /// Stored.  `entry_id` is the service's id for the entry, when it
    /// reports one.
    Accepted { entry_id: Option<u64> },
    /// The service answered but refused the entry (e.g. rate limited).
    Rejected,
}

/// Where records go.  Shared by every worker thread.
///
/// A publish is attempted once; callers log failures and move on.
pub trait TelemetrySink: Send + Sync {
    fn publish(&self, record: &TelemetryRecord) -> TelemetryResult<Delivery>;
}

/// Read access to previously published trip ids.
pub trait TripHistory {
    /// Highest trip id found, `TripId::NONE` for an empty history.
    fn latest_trip_id(&self) -> TelemetryResult<TripId>;
}

/// Parse a non-empty, all-ASCII-digit value; anything else is ignored.
pub(crate) fn parse_trip_id(raw: &str) -> Option<TripId> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok().map(TripId)
}
