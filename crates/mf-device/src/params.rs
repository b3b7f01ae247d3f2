//! Tunable device parameters.
//!
//! Every field has a default, so a JSON override only needs the keys it
//! changes:
//!
//! ```
//! use mf_device::DeviceParams;
//!
//! let p: DeviceParams =
//!     serde_json::from_str(r#"{ "max_speed_kmh": 40.0, "battery": { "charge_rate": 5.0 } }"#).unwrap();
//! assert_eq!(p.max_speed_kmh, 40.0);
//! assert_eq!(p.battery.charge_rate, 5.0);
//! assert_eq!(p.battery.low_threshold, 10.0);
//! ```

use serde::{Deserialize, Serialize};

use mf_core::{kmh_to_mps, GeoPoint};

use crate::{DeviceError, DeviceResult};

/// Everything that shapes one device's simulated readings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceParams {
    /// Upper bound on reported speed.  Fleet default 25 km/h.
    pub max_speed_kmh: f64,
    pub battery: BatteryParams,
    pub temperature: TemperatureParams,
    pub wander: WanderParams,
}

impl Default for DeviceParams {
    fn default() -> Self {
        Self {
            max_speed_kmh: 25.0,
            battery:       BatteryParams::default(),
            temperature:   TemperatureParams::default(),
            wander:        WanderParams::default(),
        }
    }
}

impl DeviceParams {
    /// Defaults for the single-device publisher (faster vehicle).
    pub fn single() -> Self {
        Self { max_speed_kmh: 50.0, ..Self::default() }
    }

    #[inline]
    pub fn max_speed_mps(&self) -> f64 {
        kmh_to_mps(self.max_speed_kmh)
    }

    /// Reject values the models cannot sample from.
    pub fn validate(&self) -> DeviceResult<()> {
        let invalid = |msg: String| Err(DeviceError::InvalidParams(msg));

        if !(self.max_speed_kmh.is_finite() && self.max_speed_kmh > 0.0) {
            return invalid(format!("max_speed_kmh must be positive, got {}", self.max_speed_kmh));
        }

        let b = &self.battery;
        if !(0.0..=100.0).contains(&b.initial) || !(0.0..=100.0).contains(&b.low_threshold) {
            return invalid("battery levels must lie in [0, 100]".into());
        }
        if b.charge_rate <= 0.0 {
            return invalid(format!("battery.charge_rate must be positive, got {}", b.charge_rate));
        }
        if b.weibull_scale <= 0.0 || b.weibull_shape <= 0.0 {
            return invalid("battery Weibull scale and shape must be positive".into());
        }
        if b.speed_discharge < 0.0 {
            return invalid("battery.speed_discharge must not be negative".into());
        }

        let t = &self.temperature;
        if t.min_c > t.max_c {
            return invalid(format!("temperature.min_c {} exceeds max_c {}", t.min_c, t.max_c));
        }
        if !(t.noise_sigma.is_finite() && t.noise_sigma >= 0.0) {
            return invalid("temperature.noise_sigma must be finite and non-negative".into());
        }

        let w = &self.wander;
        for (name, p) in [
            ("decide_prob", w.decide_prob),
            ("stop_prob", w.stop_prob),
            ("go_prob", w.go_prob),
            ("min_speed_fraction", w.min_speed_fraction),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return invalid(format!("wander.{name} must lie in [0, 1], got {p}"));
            }
        }
        if w.min_heading_ticks == 0 || w.min_heading_ticks > w.max_heading_ticks {
            return invalid("wander heading tick bounds must satisfy 0 < min <= max".into());
        }
        Ok(())
    }
}

// ── Battery ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatteryParams {
    /// Starting level, also the full-charge ceiling.
    pub initial: f64,
    /// At or below this level the device starts charging.
    pub low_threshold: f64,
    /// Percentage points gained per tick while charging.
    pub charge_rate: f64,
    pub weibull_scale: f64,
    pub weibull_shape: f64,
    /// Extra drain per tick at maximum speed, scaled linearly with speed.
    pub speed_discharge: f64,
}

impl Default for BatteryParams {
    fn default() -> Self {
        Self {
            initial:         100.0,
            low_threshold:   10.0,
            charge_rate:     2.5,
            weibull_scale:   0.25,
            weibull_shape:   1.6,
            speed_discharge: 0.5,
        }
    }
}

// ── Temperature ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemperatureParams {
    pub min_c: f64,
    pub max_c: f64,
    /// Local hour (fractional) of the daily maximum.
    pub peak_hour: f64,
    pub noise_sigma: f64,
}

impl Default for TemperatureParams {
    fn default() -> Self {
        Self { min_c: 12.0, max_c: 26.0, peak_hour: 14.0, noise_sigma: 1.0 }
    }
}

// ── Wanderer ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WanderParams {
    /// Where a free-roaming device starts.
    pub start: GeoPoint,
    /// Per-tick chance of reconsidering moving vs. stopped.
    pub decide_prob: f64,
    /// Chance a moving device stops when it reconsiders.
    pub stop_prob: f64,
    /// Chance a stopped device starts moving when it reconsiders.
    pub go_prob: f64,
    pub min_heading_ticks: u32,
    pub max_heading_ticks: u32,
    /// Lower bound of the moving speed as a fraction of the maximum.
    pub min_speed_fraction: f64,
}

impl Default for WanderParams {
    fn default() -> Self {
        Self {
            start:              GeoPoint::new(-33.43704205868932, -70.63473385143928),
            decide_prob:        0.1,
            stop_prob:          0.3,
            go_prob:            0.7,
            min_heading_ticks:  10,
            max_heading_ticks:  40,
            min_speed_fraction: 0.2,
        }
    }
}
