//! Routing trait and default Dijkstra implementation.
//!
//! # Pluggability
//!
//! Motion models call routing via the [`Router`] trait, so a different
//! search (A*, contraction hierarchies) can be swapped in without touching
//! the device state machine.  The default [`DijkstraRouter`] minimises total
//! edge length.
//!
//! # Cost units
//!
//! Costs are accumulated as integer **millimetres** (u64) so heap ordering is
//! total and ties break deterministically on `NodeId`.  `Route::length_m`
//! is the exact `f64` sum of the chosen edges.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use mf_core::{EdgeId, NodeId, PlanarPoint};

use crate::network::RoadNetwork;
use crate::{SpatialError, SpatialResult};

// ── Route ─────────────────────────────────────────────────────────────────────

/// The result of a routing query: the origin node and the ordered edges to
/// traverse.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Node the route starts at.
    pub origin: NodeId,
    /// Edges to traverse in order, from source to destination.
    pub edges: Vec<EdgeId>,
    /// Total length in metres.
    pub length_m: f64,
}

impl Route {
    /// `true` if the source and destination are the same node.
    pub fn is_trivial(&self) -> bool {
        self.edges.is_empty()
    }

    /// Final node of the route.
    pub fn destination(&self, network: &RoadNetwork) -> NodeId {
        self.edges
            .last()
            .map(|e| network.edge_to[e.index()])
            .unwrap_or(self.origin)
    }

    /// Flatten the route into the planar point sequence a vehicle drives
    /// along: the origin node, then for every edge its shape points followed
    /// by its target node.  Consecutive duplicates are dropped so every
    /// segment has non-zero length.
    pub fn points(&self, network: &RoadNetwork) -> Vec<PlanarPoint> {
        let mut pts = Vec::with_capacity(self.edges.len() + 1);
        pts.push(network.node_xy(self.origin));
        for &edge in &self.edges {
            let shape = network.edge_shape(edge);
            let to = network.node_xy(network.edge_to[edge.index()]);
            for &p in shape.iter().chain(std::iter::once(&to)) {
                if pts.last() != Some(&p) {
                    pts.push(p);
                }
            }
        }
        pts
    }
}

// ── Router trait ──────────────────────────────────────────────────────────────

/// Pluggable routing engine.
///
/// Implementations must be `Send + Sync` because every device worker thread
/// holds one.
pub trait Router: Send + Sync {
    /// Compute a route from `from` to `to`.
    ///
    /// `from == to` is an empty route, not an error.  Returns
    /// [`SpatialError::NoRoute`] if `to` is unreachable and
    /// [`SpatialError::NodeNotFound`] for ids outside the network.
    fn route(&self, network: &RoadNetwork, from: NodeId, to: NodeId) -> SpatialResult<Route>;
}

// ── DijkstraRouter ────────────────────────────────────────────────────────────

/// Standard Dijkstra's algorithm over the CSR road graph, weighted by edge
/// length.
#[derive(Copy, Clone, Debug, Default)]
pub struct DijkstraRouter;

impl Router for DijkstraRouter {
    fn route(&self, network: &RoadNetwork, from: NodeId, to: NodeId) -> SpatialResult<Route> {
        for node in [from, to] {
            if !network.contains(node) {
                return Err(SpatialError::NodeNotFound(node));
            }
        }
        dijkstra(network, from, to)
    }
}

// ── Dijkstra internals ────────────────────────────────────────────────────────

#[inline]
fn edge_cost_mm(network: &RoadNetwork, edge: EdgeId) -> u64 {
    (network.edge_length_m[edge.index()] * 1_000.0).round() as u64
}

fn dijkstra(network: &RoadNetwork, from: NodeId, to: NodeId) -> SpatialResult<Route> {
    if from == to {
        return Ok(Route { origin: from, edges: vec![], length_m: 0.0 });
    }

    let n = network.node_count();
    // dist[v] = best known cost (mm) to reach v.
    let mut dist      = vec![u64::MAX; n];
    // prev_edge[v] = EdgeId that reached v; EdgeId::INVALID for unreached nodes.
    let mut prev_edge = vec![EdgeId::INVALID; n];

    dist[from.index()] = 0;

    // Min-heap: (cost, node). Reverse makes BinaryHeap (max) behave as min-heap.
    // Secondary key NodeId ensures deterministic tie-breaking.
    let mut heap: BinaryHeap<Reverse<(u64, NodeId)>> = BinaryHeap::new();
    heap.push(Reverse((0, from)));

    while let Some(Reverse((cost, node))) = heap.pop() {
        if node == to {
            return Ok(reconstruct(network, &prev_edge, from, to));
        }

        // Skip stale heap entries.
        if cost > dist[node.index()] {
            continue;
        }

        for edge in network.out_edges(node) {
            let neighbor = network.edge_to[edge.index()];
            let new_cost = cost.saturating_add(edge_cost_mm(network, edge));

            if new_cost < dist[neighbor.index()] {
                dist[neighbor.index()] = new_cost;
                prev_edge[neighbor.index()] = edge;
                heap.push(Reverse((new_cost, neighbor)));
            }
        }
    }

    Err(SpatialError::NoRoute { from, to })
}

fn reconstruct(network: &RoadNetwork, prev_edge: &[EdgeId], from: NodeId, to: NodeId) -> Route {
    let mut edges = Vec::new();
    let mut cur = to;
    while cur != from {
        let e = prev_edge[cur.index()];
        if e == EdgeId::INVALID {
            break;
        }
        edges.push(e);
        cur = network.edge_from[e.index()];
    }
    edges.reverse();
    let length_m = edges.iter().map(|e| network.edge_length_m[e.index()]).sum();
    Route { origin: from, edges, length_m }
}
