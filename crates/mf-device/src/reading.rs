use mf_core::{DeviceId, GeoPoint, Tick, TripId};

use crate::battery::BatteryMode;

/// One tick's worth of simulated sensor output.
#[derive(Clone, Debug, PartialEq)]
pub struct DeviceReading {
    pub device:        DeviceId,
    pub tick:          Tick,
    /// °C, two decimals.
    pub temperature_c: f64,
    /// Percent, one decimal.
    pub battery_pct:   f64,
    pub battery_mode:  BatteryMode,
    /// Six decimals.
    pub position:      GeoPoint,
    /// m/s, two decimals.
    pub speed_mps:     f64,
    pub trajectory:    Vec<GeoPoint>,
    pub trip:          TripId,
}
