//! Worker and fleet run settings.

use std::time::Duration;

use mf_device::DeviceParams;

/// How one worker paces and bounds its loop.
#[derive(Clone, Debug, PartialEq)]
pub struct WorkerConfig {
    /// Simulated time per tick; also the sleep between ticks when
    /// `realtime` is set.
    pub interval:    Duration,
    /// Wait before the first tick.
    pub start_delay: Duration,
    /// Stop after this many ticks.  `None` runs until the process exits.
    pub max_ticks:   Option<u64>,
    /// Publish device and trip ids (fleet payload).
    pub include_ids: bool,
    /// Sleep for real between ticks.  Tests turn this off.
    pub realtime:    bool,
}

impl WorkerConfig {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            start_delay: Duration::ZERO,
            max_ticks:   None,
            include_ids: false,
            realtime:    true,
        }
    }
}

/// Settings shared by every device in a fleet.
#[derive(Clone, Debug)]
pub struct FleetConfig {
    pub devices:   u32,
    pub interval:  Duration,
    /// Delay between consecutive device starts.  Defaults to half the
    /// interval.
    pub stagger:   Option<Duration>,
    pub max_ticks: Option<u64>,
    /// Global RNG seed; each device mixes in its own id.
    pub seed:      u64,
    pub params:    DeviceParams,
    pub realtime:  bool,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            devices:   2,
            interval:  Duration::from_secs(60),
            stagger:   None,
            max_ticks: None,
            seed:      0,
            params:    DeviceParams::default(),
            realtime:  true,
        }
    }
}

impl FleetConfig {
    pub fn stagger(&self) -> Duration {
        self.stagger.unwrap_or(self.interval / 2)
    }

    /// Worker settings for the device at zero-based `index`.
    pub fn worker_config(&self, index: u32) -> WorkerConfig {
        WorkerConfig {
            interval:    self.interval,
            start_delay: self.stagger() * index,
            max_ticks:   self.max_ticks,
            include_ids: true,
            realtime:    self.realtime,
        }
    }
}
