//! OSM PBF loader — enabled with the `osm` Cargo feature.
//!
//! # Usage
//!
//! ```ignore
//! use std::path::Path;
//! use mf_spatial::osm::load_from_pbf;
//!
//! let network = load_from_pbf(Path::new("santiago.osm.pbf"))?;
//! ```
//!
//! # What is loaded
//!
//! Only car-drivable `highway=*` ways are included (see [`is_drivable`]).
//! Ways are simplified: a graph node is created only where a way ends or
//! where two ways share an OSM node.  Everything in between becomes edge
//! shape, so curved streets keep their geometry without inflating the graph.
//!
//! `oneway=yes|1|true` adds the forward direction only, `oneway=-1` the
//! reverse only.  Motorways are implicitly one-way.

use std::collections::HashMap;
use std::path::Path;

use osmpbf::{Element, ElementReader};

use mf_core::{GeoPoint, NodeId};

use crate::network::{RoadNetwork, RoadNetworkBuilder};
use crate::{SpatialError, SpatialResult};

// ── Public entry point ────────────────────────────────────────────────────────

/// Load a road network from an OSM PBF file.
///
/// # Errors
///
/// Returns [`SpatialError::Osm`] on parse errors,
/// [`SpatialError::Io`] on file errors.
pub fn load_from_pbf(path: &Path) -> SpatialResult<RoadNetwork> {
    // ── Phase 1: collect all OSM nodes + road ways in one sequential pass ──
    if !path.exists() {
        return Err(SpatialError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )));
    }
    let reader = ElementReader::from_path(path).map_err(|e| SpatialError::Osm(e.to_string()))?;

    let mut all_nodes: HashMap<i64, GeoPoint> = HashMap::new();
    let mut road_ways: Vec<OsmWay> = Vec::new();

    reader
        .for_each(|elem| match elem {
            Element::Node(n) => {
                all_nodes.insert(n.id(), GeoPoint::new(n.lat(), n.lon()));
            }
            Element::DenseNode(n) => {
                all_nodes.insert(n.id(), GeoPoint::new(n.lat(), n.lon()));
            }
            Element::Way(w) => {
                // Collect tags eagerly so &str lifetimes don't escape the closure.
                let tags: Vec<(&str, &str)> = w.tags().collect();
                let highway = tags.iter().find(|(k, _)| *k == "highway").map(|(_, v)| *v);

                if let Some(highway) = highway.filter(|h| is_drivable(h)) {
                    let direction = direction(highway, &tags);
                    let refs: Vec<i64> = w.refs().collect();
                    if refs.len() >= 2 {
                        road_ways.push(OsmWay { refs, direction });
                    }
                }
            }
            _ => {}
        })
        .map_err(|e| SpatialError::Osm(e.to_string()))?;

    Ok(build_network(&all_nodes, &road_ways))
}

// ── Internal types ────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Direction {
    Both,
    Forward,
    Backward,
}

struct OsmWay {
    refs:      Vec<i64>,
    direction: Direction,
}

// ── Simplification ────────────────────────────────────────────────────────────

fn build_network(all_nodes: &HashMap<i64, GeoPoint>, ways: &[OsmWay]) -> RoadNetwork {
    // Reference count per OSM node; endpoints count double so they always
    // survive as graph nodes.
    let mut refcount: HashMap<i64, u32> = HashMap::new();
    for way in ways {
        for &r in &way.refs {
            *refcount.entry(r).or_default() += 1;
        }
        for end in [way.refs[0], way.refs[way.refs.len() - 1]] {
            *refcount.entry(end).or_default() += 1;
        }
    }

    let mut builder = RoadNetworkBuilder::with_capacity(refcount.len() / 4, ways.len() * 4);
    let mut osm_to_mf: HashMap<i64, NodeId> = HashMap::new();

    for way in ways {
        // Drop refs whose coordinates are missing from the extract.
        let refs: Vec<(i64, GeoPoint)> = way
            .refs
            .iter()
            .filter_map(|r| all_nodes.get(r).map(|&p| (*r, p)))
            .collect();
        if refs.len() < 2 {
            continue;
        }

        let last = refs.len() - 1;
        let mut seg_start: Option<NodeId> = None;
        let mut shape: Vec<GeoPoint> = Vec::new();

        for (i, &(osm_id, pos)) in refs.iter().enumerate() {
            let is_graph_node =
                i == 0 || i == last || refcount.get(&osm_id).copied().unwrap_or(0) >= 2;
            if !is_graph_node {
                shape.push(pos);
                continue;
            }

            let node = *osm_to_mf.entry(osm_id).or_insert_with(|| builder.add_node(pos));
            if let Some(from) = seg_start {
                let seg = std::mem::take(&mut shape);
                if from != node {
                    add_segment(&mut builder, from, node, seg, way.direction);
                }
            }
            seg_start = Some(node);
        }
    }

    builder.build()
}

fn add_segment(
    builder: &mut RoadNetworkBuilder,
    from: NodeId,
    to: NodeId,
    shape: Vec<GeoPoint>,
    direction: Direction,
) {
    match direction {
        Direction::Both => builder.add_road_via(from, to, shape),
        Direction::Forward => builder.add_directed_edge_via(from, to, shape),
        Direction::Backward => {
            let reversed = shape.into_iter().rev().collect();
            builder.add_directed_edge_via(to, from, reversed);
        }
    }
}

// ── Tag helpers ───────────────────────────────────────────────────────────────

/// `true` if a `highway` value carries car traffic.
fn is_drivable(highway: &str) -> bool {
    !matches!(
        highway,
        "footway" | "path" | "cycleway" | "pedestrian" | "steps" | "track" | "bridleway"
            | "corridor" | "proposed" | "construction" | "platform" | "elevator"
    )
}

/// Travel direction for car traffic.
///
/// Motorways and motorway links are implicitly one-way in OSM convention.
fn direction(highway: &str, tags: &[(&str, &str)]) -> Direction {
    let oneway = tags.iter().find(|(k, _)| *k == "oneway").map(|(_, v)| *v);
    match oneway {
        Some("yes" | "1" | "true") => Direction::Forward,
        Some("-1" | "reverse") => Direction::Backward,
        Some("no" | "false" | "0") => Direction::Both,
        _ if matches!(highway, "motorway" | "motorway_link") => Direction::Forward,
        _ => Direction::Both,
    }
}
