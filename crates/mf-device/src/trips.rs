//! Process-wide trip-id counter.

use std::sync::atomic::{AtomicU64, Ordering};

use mf_core::TripId;

/// Issues strictly increasing [`TripId`]s to every device in the process.
///
/// Seeded from the highest id already published so ids stay unique across
/// restarts.  Shared as `Arc<TripCounter>`; issuance is a single atomic
/// increment.
#[derive(Debug, Default)]
pub struct TripCounter {
    last: AtomicU64,
}

impl TripCounter {
    /// A counter whose next issued id is `last_used + 1`.
    pub fn seeded(last_used: TripId) -> Self {
        Self { last: AtomicU64::new(last_used.0) }
    }

    /// Issue the next id.
    #[inline]
    pub fn issue(&self) -> TripId {
        TripId(self.last.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Most recently issued id (or the seed if none was issued yet).
    pub fn last_issued(&self) -> TripId {
        TripId(self.last.load(Ordering::Relaxed))
    }
}
