//! `mf-device` — one simulated GPS/IoT device.
//!
//! # Crate layout
//!
//! | Module             | Contents                                                  |
//! |--------------------|-----------------------------------------------------------|
//! | [`params`]         | `DeviceParams` and per-model parameter blocks (serde)     |
//! | [`temperature`]    | `TemperatureModel`: cosine day curve + Gaussian noise     |
//! | [`battery`]        | `Battery`, `BatteryMode`: Weibull drain / linear charge   |
//! | [`motion`]         | `MotionModel` trait, `MotionSample`, `advance_along`      |
//! | [`route_follower`] | `RouteFollower<R>`: shortest paths on a street network    |
//! | [`wander`]         | `Wanderer`: cardinal random walk without a network        |
//! | [`trips`]          | `TripCounter`: process-wide atomic trip ids               |
//! | [`device`]         | `Device<M>`: per-tick state machine                       |
//! | [`reading`]        | `DeviceReading`: what one tick produced                   |
//! | [`error`]          | `DeviceError`, `DeviceResult<T>`                          |
//!
//! # Tick model
//!
//! A device is advanced by its worker once per tick.  Each tick samples the
//! temperature for the current local hour, moves the device by
//! `speed · tick_secs` metres along its route (planning a new one first when
//! the old one is used up), then drains or charges the battery.  All
//! randomness comes from the device's own `DeviceRng`, so a fixed seed
//! reproduces a device's readings exactly.

pub mod battery;
pub mod device;
pub mod error;
pub mod motion;
pub mod params;
pub mod reading;
pub mod route_follower;
pub mod temperature;
pub mod trips;
pub mod wander;

#[cfg(test)]
mod tests;

pub use battery::{Battery, BatteryMode};
pub use device::Device;
pub use error::{DeviceError, DeviceResult};
pub use motion::{advance_along, MotionModel, MotionSample, RouteCursor};
pub use params::{BatteryParams, DeviceParams, TemperatureParams, WanderParams};
pub use reading::DeviceReading;
pub use route_follower::RouteFollower;
pub use temperature::TemperatureModel;
pub use trips::TripCounter;
pub use wander::{Heading, Wanderer};
