//! Tick counter and wall-clock sources.
//!
//! Devices advance in fixed-length ticks; the only thing a tick needs from
//! the wall clock is the local hour of day, which drives the temperature
//! curve.  [`Clock`] abstracts that so tests can pin the hour.

use std::fmt;

use chrono::{Timelike, Utc};
use chrono_tz::Tz;

use crate::{CoreError, CoreResult};

// ── Tick ─────────────────────────────────────────────────────────────────────

/// Per-device tick counter (number of completed simulation steps).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// The tick after `self`.
    #[inline]
    pub fn next(self) -> Tick {
        Tick(self.0 + 1)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── Clock ─────────────────────────────────────────────────────────────────────

/// Source of the local time of day.
pub trait Clock: Send + Sync {
    /// Fractional local hour in `[0, 24)`, e.g. `14.5` for 14:30.
    fn hour_of_day(&self) -> f64;
}

/// Hour plus minutes as a fraction of an hour.  Seconds are ignored.
#[inline]
pub fn fractional_hour<T: Timelike>(t: &T) -> f64 {
    f64::from(t.hour()) + f64::from(t.minute()) / 60.0
}

/// Reads the system clock and converts it to an IANA time zone.
#[derive(Clone, Debug)]
pub struct ZonedClock {
    tz: Tz,
}

impl ZonedClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Parse an IANA zone name such as `"America/Santiago"`.
    pub fn from_name(name: &str) -> CoreResult<Self> {
        let tz: Tz = name.parse().map_err(|e| CoreError::UnknownTimezone {
            name: name.to_owned(),
            reason: format!("{e}"),
        })?;
        Ok(Self::new(tz))
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }
}

impl Clock for ZonedClock {
    fn hour_of_day(&self) -> f64 {
        fractional_hour(&Utc::now().with_timezone(&self.tz))
    }
}

/// A clock stuck at one hour of day.
#[derive(Copy, Clone, Debug)]
pub struct FixedClock(pub f64);

impl Clock for FixedClock {
    fn hour_of_day(&self) -> f64 {
        self.0
    }
}
