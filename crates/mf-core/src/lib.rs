//! `mf-core` — foundational types for the `mock_fleet` device simulator.
//!
//! This crate is a dependency of every other `mf-*` crate.  It has no `mf-*`
//! dependencies and few external ones (`rand`, `thiserror`, `chrono`,
//! `chrono-tz`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `DeviceId`, `NodeId`, `EdgeId`, `TripId`              |
//! | [`geo`]         | `GeoPoint`, `PlanarPoint`, haversine distance         |
//! | [`projection`]  | `UtmProjection` (WGS-84 ⇄ planar metres)              |
//! | [`time`]        | `Tick`, `Clock`, `ZonedClock`, `FixedClock`           |
//! | [`rng`]         | `DeviceRng` (per-device, deterministic)               |
//! | [`units`]       | speed conversion and decimal rounding                 |
//! | [`error`]       | `CoreError`, `CoreResult`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to the plain data types.    |

pub mod error;
pub mod geo;
pub mod ids;
pub mod projection;
pub mod rng;
pub mod time;
pub mod units;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use geo::{GeoPoint, PlanarPoint};
pub use ids::{DeviceId, EdgeId, NodeId, TripId};
pub use projection::UtmProjection;
pub use rng::DeviceRng;
pub use time::{Clock, FixedClock, Tick, ZonedClock};
pub use units::{kmh_to_mps, round_dp};
