//! `mf-spatial` — projected road network, spatial indexing, and routing.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                    |
//! |-------------|-------------------------------------------------------------|
//! | [`network`] | `RoadNetwork` (CSR + edge shapes + R-tree), builder         |
//! | [`router`]  | `Router` trait, `Route`, `DijkstraRouter` (by length)       |
//! | [`osm`]     | `load_from_pbf` (feature = `"osm"` only)                   |
//! | [`error`]   | `SpatialError`, `SpatialResult<T>`                         |
//!
//! Node and edge geometry is stored twice: geographic for reporting and
//! projected (UTM metres) for distance math.  The projection is fixed when
//! the network is built and shared by everything that walks it.
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `osm`   | Enables OSM PBF loading via the `osmpbf` crate.             |
//! | `serde` | Derives `Serialize`/`Deserialize` on the `mf-core` types.    |

pub mod error;
pub mod network;
pub mod router;

#[cfg(feature = "osm")]
pub mod osm;


pub use error::{SpatialError, SpatialResult};
pub use network::{RoadNetwork, RoadNetworkBuilder};
pub use router::{DijkstraRouter, Route, Router};
