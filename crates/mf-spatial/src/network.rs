//! Road network representation and builder.
//!
//! # Data layout
//!
//! The graph uses **Compressed Sparse Row (CSR)** format for outgoing edges.
//! Given a `NodeId n`, its outgoing edges occupy the slice:
//!
//! ```text
//! edge_from[ node_out_start[n] .. node_out_start[n+1] ]
//! ```
//!
//! Edge geometry uses the same trick: the interior shape points of edge `e`
//! (the bends between its two end nodes, already projected) are
//!
//! ```text
//! shape_xy[ edge_shape_start[e] .. edge_shape_start[e+1] ]
//! ```
//!
//! Edge lengths are the planar length of `node → shape… → node`, so the
//! router and the motion model agree on distance.
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) over projected node positions maps a geographic
//! point to the nearest `NodeId`.  Route followers use it to park a new
//! device on the intersection nearest the middle of the network.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use mf_core::geo::path_length_m;
use mf_core::{EdgeId, GeoPoint, NodeId, PlanarPoint, UtmProjection};

// ── R-tree node entry ─────────────────────────────────────────────────────────

/// Entry stored in the R-tree spatial index: a projected `[x, y]` point with
/// the associated `NodeId`.
#[derive(Clone)]
struct NodeEntry {
    point: [f64; 2],
    id: NodeId,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

// ── RoadNetwork ───────────────────────────────────────────────────────────────

/// Directed road graph in CSR format with projected geometry and a spatial
/// index for node snapping.
///
/// Built once at startup and then shared read-only between device workers
/// (`Arc<RoadNetwork>`); nothing mutates it after [`RoadNetworkBuilder::build`].
pub struct RoadNetwork {
    // ── Node data ─────────────────────────────────────────────────────────
    /// Geographic position of each node.  Indexed by `NodeId`.
    pub node_geo: Vec<GeoPoint>,

    /// Projected position of each node.  Indexed by `NodeId`.
    pub node_xy: Vec<PlanarPoint>,

    // ── CSR edge adjacency ────────────────────────────────────────────────
    /// CSR row pointer.  Length = `node_count + 1`.
    pub node_out_start: Vec<u32>,

    // ── Edge data (indexed by EdgeId = position in sorted order) ──────────
    /// Source node of each edge.
    pub edge_from: Vec<NodeId>,

    /// Destination node of each edge.
    pub edge_to: Vec<NodeId>,

    /// Planar length of each edge in metres.  Dijkstra edge cost.
    pub edge_length_m: Vec<f64>,

    /// CSR pointer into `shape_xy`.  Length = `edge_count + 1`.
    pub edge_shape_start: Vec<u32>,

    /// Interior shape points of all edges, concatenated in `EdgeId` order.
    pub shape_xy: Vec<PlanarPoint>,

    // ── Projection & spatial index ────────────────────────────────────────
    projection: UtmProjection,
    spatial_idx: RTree<NodeEntry>,
}

impl RoadNetwork {
    /// Construct an empty network with no nodes or edges.
    pub fn empty() -> Self {
        RoadNetworkBuilder::new().build()
    }

    // ── Graph dimensions ──────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.node_geo.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_geo.is_empty()
    }

    /// `true` if `node` is a valid index into this network.
    #[inline]
    pub fn contains(&self, node: NodeId) -> bool {
        node.index() < self.node_count()
    }

    // ── Geometry ──────────────────────────────────────────────────────────

    /// The projection all planar coordinates in this network use.
    #[inline]
    pub fn projection(&self) -> UtmProjection {
        self.projection
    }

    #[inline]
    pub fn node_xy(&self, node: NodeId) -> PlanarPoint {
        self.node_xy[node.index()]
    }

    #[inline]
    pub fn node_geo(&self, node: NodeId) -> GeoPoint {
        self.node_geo[node.index()]
    }

    /// Interior shape points of `edge`, from its source towards its target.
    /// Empty for straight edges.
    #[inline]
    pub fn edge_shape(&self, edge: EdgeId) -> &[PlanarPoint] {
        let start = self.edge_shape_start[edge.index()] as usize;
        let end   = self.edge_shape_start[edge.index() + 1] as usize;
        &self.shape_xy[start..end]
    }

    /// Mean geographic position of all nodes, `None` for an empty network.
    pub fn center(&self) -> Option<GeoPoint> {
        geo_centroid(&self.node_geo)
    }

    // ── Graph traversal ───────────────────────────────────────────────────

    /// Iterator over the `EdgeId`s of all outgoing edges from `node`.
    #[inline]
    pub fn out_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        (start..end).map(|i| EdgeId(i as u32))
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// Return the `NodeId` of the nearest road node to `pos`.
    ///
    /// Returns `None` only if the network has no nodes.
    pub fn snap_to_node(&self, pos: GeoPoint) -> Option<NodeId> {
        let xy = self.projection.project(pos);
        self.spatial_idx
            .nearest_neighbor(&[xy.x, xy.y])
            .map(|e| e.id)
    }

    /// The node closest to the network's mean position; where devices
    /// wait before their first route.
    pub fn central_node(&self) -> Option<NodeId> {
        self.center().and_then(|c| self.snap_to_node(c))
    }
}

fn geo_centroid(points: &[GeoPoint]) -> Option<GeoPoint> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (lat, lon) = points
        .iter()
        .fold((0.0, 0.0), |(lat, lon), p| (lat + p.lat, lon + p.lon));
    Some(GeoPoint::new(lat / n, lon / n))
}

// ── RoadNetworkBuilder ────────────────────────────────────────────────────────

/// Construct a [`RoadNetwork`] incrementally, then call [`build`](Self::build).
///
/// Nodes and edges are given in geographic coordinates.  `build()` picks the
/// UTM zone of the node centroid (unless one was set with
/// [`with_projection`](Self::with_projection)), projects everything, derives
/// edge lengths, sorts edges by source node, and bulk-loads the R-tree.
///
/// # Example
///
/// ```
/// use mf_core::GeoPoint;
/// use mf_spatial::RoadNetworkBuilder;
///
/// let mut b = RoadNetworkBuilder::new();
/// let a = b.add_node(GeoPoint::new(-33.44, -70.65));
/// let c = b.add_node(GeoPoint::new(-33.45, -70.65));
/// b.add_road(a, c);
/// let net = b.build();
/// assert_eq!(net.node_count(), 2);
/// assert_eq!(net.edge_count(), 2); // bidirectional
/// ```
pub struct RoadNetworkBuilder {
    nodes:      Vec<GeoPoint>,
    raw_edges:  Vec<RawEdge>,
    projection: Option<UtmProjection>,
}

struct RawEdge {
    from:  NodeId,
    to:    NodeId,
    shape: Vec<GeoPoint>,
}

impl RoadNetworkBuilder {
    pub fn new() -> Self {
        Self { nodes: Vec::new(), raw_edges: Vec::new(), projection: None }
    }

    /// Pre-allocate for the expected number of nodes and edges to reduce
    /// reallocations when bulk-loading from OSM.
    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            nodes:      Vec::with_capacity(nodes),
            raw_edges:  Vec::with_capacity(edges),
            projection: None,
        }
    }

    /// Use `projection` instead of the centroid's UTM zone.
    pub fn with_projection(mut self, projection: UtmProjection) -> Self {
        self.projection = Some(projection);
        self
    }

    /// Add a road node and return its `NodeId` (sequential from 0).
    pub fn add_node(&mut self, pos: GeoPoint) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(pos);
        id
    }

    /// Add a straight **directed** edge from `from` to `to`.
    pub fn add_directed_edge(&mut self, from: NodeId, to: NodeId) {
        self.add_directed_edge_via(from, to, Vec::new());
    }

    /// Add a **directed** edge that bends through `shape` (interior points,
    /// ordered from `from` towards `to`).
    pub fn add_directed_edge_via(&mut self, from: NodeId, to: NodeId, shape: Vec<GeoPoint>) {
        self.raw_edges.push(RawEdge { from, to, shape });
    }

    /// Convenience: a straight road in **both directions**.
    pub fn add_road(&mut self, a: NodeId, b: NodeId) {
        self.add_road_via(a, b, Vec::new());
    }

    /// A two-way road bending through `shape` (ordered from `a` to `b`).
    pub fn add_road_via(&mut self, a: NodeId, b: NodeId, shape: Vec<GeoPoint>) {
        let reversed: Vec<GeoPoint> = shape.iter().rev().copied().collect();
        self.add_directed_edge_via(a, b, shape);
        self.add_directed_edge_via(b, a, reversed);
    }

    /// Look up the position of a node added earlier.
    pub fn node_pos(&self, id: NodeId) -> GeoPoint {
        self.nodes[id.index()]
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn edge_count(&self) -> usize { self.raw_edges.len() }

    /// Consume the builder and produce a [`RoadNetwork`].
    ///
    /// Time complexity: O(E log E) for edge sort + O(N log N) for R-tree bulk
    /// load, where N = nodes, E = edges.
    pub fn build(self) -> RoadNetwork {
        let node_count = self.nodes.len();
        let edge_count = self.raw_edges.len();

        let projection = self.projection.unwrap_or_else(|| {
            UtmProjection::for_point(geo_centroid(&self.nodes).unwrap_or_default())
        });
        let node_xy: Vec<PlanarPoint> =
            self.nodes.iter().map(|&p| projection.project(p)).collect();

        // Stable sort keeps parallel edges in insertion order.
        let mut raw = self.raw_edges;
        raw.sort_by_key(|e| e.from.0);

        let mut edge_from        = Vec::with_capacity(edge_count);
        let mut edge_to          = Vec::with_capacity(edge_count);
        let mut edge_length_m    = Vec::with_capacity(edge_count);
        let mut edge_shape_start = Vec::with_capacity(edge_count + 1);
        let mut shape_xy         = Vec::new();
        let mut polyline         = Vec::new();

        for e in &raw {
            edge_shape_start.push(shape_xy.len() as u32);

            polyline.clear();
            polyline.push(node_xy[e.from.index()]);
            for &p in &e.shape {
                let xy = projection.project(p);
                shape_xy.push(xy);
                polyline.push(xy);
            }
            polyline.push(node_xy[e.to.index()]);

            edge_from.push(e.from);
            edge_to.push(e.to);
            edge_length_m.push(path_length_m(&polyline));
        }
        edge_shape_start.push(shape_xy.len() as u32);

        // Build CSR row pointer (node_out_start).
        let mut node_out_start = vec![0u32; node_count + 1];
        for e in &raw {
            node_out_start[e.from.index() + 1] += 1;
        }
        for i in 1..=node_count {
            node_out_start[i] += node_out_start[i - 1];
        }
        debug_assert_eq!(node_out_start[node_count] as usize, edge_count);

        // Bulk-load R-tree for O(N log N) construction (faster than N inserts).
        let entries: Vec<NodeEntry> = node_xy
            .iter()
            .enumerate()
            .map(|(i, p)| NodeEntry { point: [p.x, p.y], id: NodeId(i as u32) })
            .collect();
        let spatial_idx = RTree::bulk_load(entries);

        RoadNetwork {
            node_geo: self.nodes,
            node_xy,
            node_out_start,
            edge_from,
            edge_to,
            edge_length_m,
            edge_shape_start,
            shape_xy,
            projection,
            spatial_idx,
        }
    }
}

impl Default for RoadNetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}
