//! Per-device state machine tying the motion, battery, and temperature
//! models together.

use tracing::{debug_span, info};

use mf_core::{round_dp, DeviceId, DeviceRng, GeoPoint, Tick};

use crate::battery::{Battery, BatteryMode};
use crate::motion::MotionModel;
use crate::params::DeviceParams;
use crate::reading::DeviceReading;
use crate::temperature::TemperatureModel;
use crate::DeviceResult;

/// A simulated device.  Owned by exactly one worker thread.
pub struct Device<M: MotionModel> {
    id:            DeviceId,
    rng:           DeviceRng,
    motion:        M,
    battery:       Battery,
    temperature:   TemperatureModel,
    max_speed_mps: f64,
    tick_secs:     f64,
    tick:          Tick,
}

impl<M: MotionModel> Device<M> {
    pub fn new(
        id: DeviceId,
        params: &DeviceParams,
        motion: M,
        rng: DeviceRng,
        tick_secs: f64,
    ) -> DeviceResult<Self> {
        params.validate()?;
        Ok(Self {
            id,
            rng,
            motion,
            battery: Battery::new(&params.battery)?,
            temperature: TemperatureModel::new(&params.temperature)?,
            max_speed_mps: params.max_speed_mps(),
            tick_secs,
            tick: Tick::ZERO,
        })
    }

    #[inline]
    pub fn id(&self) -> DeviceId {
        self.id
    }

    /// Number of completed ticks.
    #[inline]
    pub fn ticks(&self) -> Tick {
        self.tick
    }

    pub fn position(&self) -> GeoPoint {
        self.motion.position()
    }

    pub fn battery(&self) -> &Battery {
        &self.battery
    }

    pub fn motion(&self) -> &M {
        &self.motion
    }

    /// Advance one tick at local time `hour` and return the reading.
    ///
    /// Order: temperature, motion, then battery (drain depends on this
    /// tick's speed).
    pub fn tick(&mut self, hour: f64) -> DeviceResult<DeviceReading> {
        let span = debug_span!("tick", device = %self.id, tick = %self.tick);
        let _guard = span.enter();

        let temperature_c = self.temperature.sample(hour, &mut self.rng);
        let motion = self.motion.advance(&mut self.rng, self.tick_secs)?;

        let mode_before = self.battery.mode();
        let battery_pct = self.battery.step(motion.speed_mps, self.max_speed_mps, &mut self.rng);
        match (mode_before, self.battery.mode()) {
            (BatteryMode::Discharging, BatteryMode::Charging) => {
                info!(device = %self.id, level = battery_pct, "battery low, charging");
            }
            (BatteryMode::Charging, BatteryMode::Discharging) => {
                info!(device = %self.id, level = battery_pct, "battery full, discharging");
            }
            _ => {}
        }

        let reading = DeviceReading {
            device: self.id,
            tick: self.tick,
            temperature_c,
            battery_pct,
            battery_mode: self.battery.mode(),
            position: motion.position,
            speed_mps: round_dp(motion.speed_mps, 2),
            trajectory: motion.trajectory,
            trip: motion.trip,
        };
        self.tick = self.tick.next();
        Ok(reading)
    }
}
