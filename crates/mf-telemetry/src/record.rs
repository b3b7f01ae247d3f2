//! The flat payload published once per device per tick.

use mf_core::{DeviceId, Tick, TripId};
use mf_device::DeviceReading;

use crate::polyline::encode_trajectory;
use crate::TelemetryResult;

/// One telemetry entry.
///
/// Field mapping on the wire:
///
/// | Field    | Value                          |
/// |----------|--------------------------------|
/// | `field1` | temperature, °C                |
/// | `field2` | battery, %                     |
/// | `field3` | latitude                       |
/// | `field4` | longitude                      |
/// | `field5` | speed, m/s                     |
/// | `field6` | encoded trajectory             |
/// | `field7` | device id (fleet only)         |
/// | `field8` | trip id (fleet only)           |
#[derive(Clone, Debug, PartialEq)]
pub struct TelemetryRecord {
    pub device:        DeviceId,
    pub tick:          Tick,
    pub trip:          TripId,
    pub temperature_c: f64,
    pub battery_pct:   f64,
    pub latitude:      f64,
    pub longitude:     f64,
    pub speed_mps:     f64,
    pub trajectory:    String,
    /// Publish `field7`/`field8`.
    pub include_ids:   bool,
}

impl TelemetryRecord {
    pub fn from_reading(reading: &DeviceReading, include_ids: bool) -> TelemetryResult<Self> {
        Ok(Self {
            device:        reading.device,
            tick:          reading.tick,
            trip:          reading.trip,
            temperature_c: reading.temperature_c,
            battery_pct:   reading.battery_pct,
            latitude:      reading.position.lat,
            longitude:     reading.position.lon,
            speed_mps:     reading.speed_mps,
            trajectory:    encode_trajectory(&reading.trajectory)?,
            include_ids,
        })
    }

    /// `(name, value)` pairs in wire order.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("field1", self.temperature_c.to_string()),
            ("field2", self.battery_pct.to_string()),
            ("field3", self.latitude.to_string()),
            ("field4", self.longitude.to_string()),
            ("field5", self.speed_mps.to_string()),
            ("field6", self.trajectory.clone()),
        ];
        if self.include_ids {
            fields.push(("field7", self.device.to_string()));
            fields.push(("field8", self.trip.to_string()));
        }
        fields
    }
}
