//! Street-network motion: drive shortest paths between random nodes.

use std::sync::Arc;

use tracing::{info, warn};

use mf_core::{DeviceRng, GeoPoint, NodeId, PlanarPoint, TripId};
use mf_spatial::{DijkstraRouter, RoadNetwork, Router, SpatialError};

use crate::motion::{advance_along, MotionModel, MotionSample, RouteCursor};
use crate::trips::TripCounter;
use crate::{DeviceError, DeviceResult};

/// Follows a flattened shortest-path route, planning a new one whenever the
/// current route is exhausted.
///
/// Speed each tick is uniform in `[0.5 · max, max]`.
pub struct RouteFollower<R: Router = DijkstraRouter> {
    network:       Arc<RoadNetwork>,
    router:        R,
    trips:         Arc<TripCounter>,
    max_speed_mps: f64,
    route:         Vec<PlanarPoint>,
    cursor:        RouteCursor,
    position:      GeoPoint,
    trip:          TripId,
}

impl<R: Router> RouteFollower<R> {
    /// A follower with no route yet, parked on the node nearest the network
    /// centre.
    ///
    /// # Errors
    ///
    /// [`DeviceError::NetworkTooSmall`] if the network has fewer than two
    /// nodes, since origin and destination must differ.
    pub fn new(
        network: Arc<RoadNetwork>,
        router: R,
        trips: Arc<TripCounter>,
        max_speed_mps: f64,
    ) -> DeviceResult<Self> {
        let nodes = network.node_count();
        if nodes < 2 {
            return Err(DeviceError::NetworkTooSmall { nodes });
        }
        let position = network
            .central_node()
            .map(|n| network.node_geo(n))
            .unwrap_or_default()
            .rounded(6);
        Ok(Self {
            network,
            router,
            trips,
            max_speed_mps,
            route: Vec::new(),
            cursor: RouteCursor::default(),
            position,
            trip: TripId::NONE,
        })
    }

    /// Replace the current route with `points` under a freshly issued trip.
    pub fn start_route(&mut self, points: Vec<PlanarPoint>) {
        self.trip = self.trips.issue();
        self.cursor = RouteCursor::default();
        if let Some(&first) = points.first() {
            self.position = self.network.projection().unproject(first).rounded(6);
        }
        self.route = points;
    }

    pub fn route(&self) -> &[PlanarPoint] {
        &self.route
    }

    pub fn cursor(&self) -> RouteCursor {
        self.cursor
    }

    pub fn trip(&self) -> TripId {
        self.trip
    }

    /// `true` before the first route and after reaching a route's end.
    pub fn is_exhausted(&self) -> bool {
        self.cursor.is_at_end(&self.route)
    }

    /// Pick two distinct random nodes and route between them.
    ///
    /// Returns `Ok(false)` when no path exists; the caller retries next tick.
    fn plan_route(&mut self, rng: &mut DeviceRng) -> DeviceResult<bool> {
        let n = self.network.node_count() as u32;
        let origin = NodeId(rng.gen_range(0..n));
        let mut destination = NodeId(rng.gen_range(0..n));
        while destination == origin {
            destination = NodeId(rng.gen_range(0..n));
        }

        match self.router.route(&self.network, origin, destination) {
            Ok(route) => {
                let points = route.points(&self.network);
                self.start_route(points);
                info!(
                    trip = %self.trip,
                    from = %origin,
                    to = %destination,
                    length_m = route.length_m,
                    start = %self.position,
                    "route generated"
                );
                Ok(true)
            }
            Err(SpatialError::NoRoute { from, to }) => {
                warn!(%from, %to, "no route between sampled nodes, retrying next tick");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl<R: Router> MotionModel for RouteFollower<R> {
    fn advance(&mut self, rng: &mut DeviceRng, tick_secs: f64) -> DeviceResult<MotionSample> {
        if self.is_exhausted() && !self.plan_route(rng)? {
            return Ok(MotionSample {
                position:   self.position,
                speed_mps:  0.0,
                trajectory: Vec::new(),
                trip:       self.trip,
            });
        }

        let speed_mps = rng.gen_range(0.5 * self.max_speed_mps..=self.max_speed_mps);
        let (cursor, walked) = advance_along(&self.route, self.cursor, speed_mps * tick_secs);
        self.cursor = cursor;

        if self.is_exhausted() {
            info!(trip = %self.trip, "trip completed");
        }

        let projection = self.network.projection();
        let trajectory: Vec<GeoPoint> =
            walked.iter().map(|&p| projection.unproject(p).rounded(6)).collect();
        if let Some(&last) = trajectory.last() {
            self.position = last;
        }

        Ok(MotionSample { position: self.position, speed_mps, trajectory, trip: self.trip })
    }

    fn position(&self) -> GeoPoint {
        self.position
    }
}
