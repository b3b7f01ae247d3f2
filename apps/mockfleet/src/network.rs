//! Street network acquisition: an OSM extract, or a built-in grid.

use std::path::Path;

use anyhow::Result;

use mf_core::{GeoPoint, NodeId};
use mf_spatial::{RoadNetwork, RoadNetworkBuilder};

/// North-west corner of the built-in grid, near Plaza Italia.
const ORIGIN: GeoPoint = GeoPoint { lat: -33.43300, lon: -70.64000 };
const ROWS: usize = 8;
const COLS: usize = 10;
/// ~110 m north-south, ~120 m east-west at this latitude.
const BLOCK_LAT: f64 = 0.00099;
const BLOCK_LON: f64 = 0.00129;

pub fn load(osm: Option<&Path>) -> Result<RoadNetwork> {
    match osm {
        Some(path) => load_osm(path),
        None => Ok(santiago_grid()),
    }
}

#[cfg(feature = "osm")]
fn load_osm(path: &Path) -> Result<RoadNetwork> {
    use anyhow::Context;
    mf_spatial::osm::load_from_pbf(path).with_context(|| format!("loading {}", path.display()))
}

#[cfg(not(feature = "osm"))]
fn load_osm(path: &Path) -> Result<RoadNetwork> {
    anyhow::bail!(
        "cannot read {}: mockfleet was built without the `osm` feature",
        path.display()
    )
}

/// A synthetic downtown: two-way avenues running north-south, one-way
/// streets running east-west in alternating directions, and a curved
/// diagonal avenue across the grid.
pub fn santiago_grid() -> RoadNetwork {
    let mut b = RoadNetworkBuilder::with_capacity(ROWS * COLS, ROWS * COLS * 4);

    let mut ids: Vec<NodeId> = Vec::with_capacity(ROWS * COLS);
    for row in 0..ROWS {
        for col in 0..COLS {
            ids.push(b.add_node(GeoPoint::new(
                ORIGIN.lat - row as f64 * BLOCK_LAT,
                ORIGIN.lon + col as f64 * BLOCK_LON,
            )));
        }
    }
    let at = |row: usize, col: usize| ids[row * COLS + col];

    for row in 0..ROWS {
        for col in 0..COLS {
            if row + 1 < ROWS {
                b.add_road(at(row, col), at(row + 1, col));
            }
            if col + 1 < COLS {
                if row % 2 == 0 {
                    b.add_directed_edge(at(row, col), at(row, col + 1));
                } else {
                    b.add_directed_edge(at(row, col + 1), at(row, col));
                }
            }
        }
    }

    // Diagonal avenue, bowed slightly north between intersections.
    let steps = (ROWS - 1).min(COLS - 1);
    for i in 0..steps {
        let from = at(i, i);
        let to = at(i + 1, i + 1);
        let (a, c) = (b.node_pos(from), b.node_pos(to));
        let bend = GeoPoint::new((a.lat + c.lat) / 2.0 + BLOCK_LAT * 0.15, (a.lon + c.lon) / 2.0);
        b.add_road_via(from, to, vec![bend]);
    }

    b.build()
}
