//! Two-state battery: Weibull-distributed drain while discharging, linear
//! charge while charging.

use std::fmt;

use rand_distr::Weibull;

use mf_core::{round_dp, DeviceRng};

use crate::params::BatteryParams;
use crate::{DeviceError, DeviceResult};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BatteryMode {
    Charging,
    Discharging,
}

impl fmt::Display for BatteryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BatteryMode::Charging => "charging",
            BatteryMode::Discharging => "discharging",
        })
    }
}

/// Battery level (percent) and the mode it is currently in.
///
/// Invariant: `level` stays in `[0, full]` and is kept at one decimal.
#[derive(Clone, Debug)]
pub struct Battery {
    level:           f64,
    mode:            BatteryMode,
    full:            f64,
    low_threshold:   f64,
    charge_rate:     f64,
    speed_discharge: f64,
    wear:            Weibull<f64>,
}

impl Battery {
    /// A full, discharging battery.
    pub fn new(params: &BatteryParams) -> DeviceResult<Self> {
        Self::with_state(params, params.initial, BatteryMode::Discharging)
    }

    /// A battery at an arbitrary level and mode.
    pub fn with_state(params: &BatteryParams, level: f64, mode: BatteryMode) -> DeviceResult<Self> {
        // rand_distr's Weibull takes (scale, shape).
        let wear = Weibull::new(params.weibull_scale, params.weibull_shape)
            .map_err(|e| DeviceError::InvalidParams(format!("battery Weibull: {e}")))?;
        Ok(Self {
            level: level.clamp(0.0, params.initial),
            mode,
            full: params.initial,
            low_threshold: params.low_threshold,
            charge_rate: params.charge_rate,
            speed_discharge: params.speed_discharge,
            wear,
        })
    }

    #[inline]
    pub fn level(&self) -> f64 {
        self.level
    }

    #[inline]
    pub fn mode(&self) -> BatteryMode {
        self.mode
    }

    /// Advance one tick and return the new level.
    ///
    /// `speed_mps / max_speed_mps` scales the extra drain; a zero maximum
    /// means no speed-dependent drain.
    pub fn step(&mut self, speed_mps: f64, max_speed_mps: f64, rng: &mut DeviceRng) -> f64 {
        match self.mode {
            BatteryMode::Charging => {
                self.level += self.charge_rate;
                if self.level >= self.full {
                    self.level = self.full;
                    self.mode = BatteryMode::Discharging;
                }
            }
            BatteryMode::Discharging => {
                let speed_factor = if max_speed_mps > 0.0 { speed_mps / max_speed_mps } else { 0.0 };
                let drain = rng.sample(&self.wear) + speed_factor * self.speed_discharge;
                self.level -= drain;
                if self.level <= self.low_threshold {
                    self.level = self.level.max(0.0);
                    self.mode = BatteryMode::Charging;
                }
            }
        }
        self.level = round_dp(self.level.clamp(0.0, self.full), 1);
        self.level
    }
}
