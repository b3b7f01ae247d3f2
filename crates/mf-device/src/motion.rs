//! Motion model trait and the route-walking primitive shared by followers.

use mf_core::{DeviceRng, GeoPoint, PlanarPoint, TripId};

use crate::DeviceResult;

/// What a motion model produced for one tick.
#[derive(Clone, Debug, PartialEq)]
pub struct MotionSample {
    /// Position at the end of the tick.
    pub position: GeoPoint,
    /// Speed used for this tick, m/s.
    pub speed_mps: f64,
    /// Points passed through during the tick, starting where the tick began.
    /// Empty when no route was available.
    pub trajectory: Vec<GeoPoint>,
    pub trip: TripId,
}

/// Moves one device forward by one tick.
pub trait MotionModel: Send {
    fn advance(&mut self, rng: &mut DeviceRng, tick_secs: f64) -> DeviceResult<MotionSample>;

    /// Current position without advancing.
    fn position(&self) -> GeoPoint;
}

impl MotionModel for Box<dyn MotionModel> {
    fn advance(&mut self, rng: &mut DeviceRng, tick_secs: f64) -> DeviceResult<MotionSample> {
        (**self).advance(rng, tick_secs)
    }

    fn position(&self) -> GeoPoint {
        (**self).position()
    }
}

// ── Route walking ─────────────────────────────────────────────────────────────

/// Position along a flattened route: the index of the last route point
/// passed and the distance already covered on the segment after it.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct RouteCursor {
    pub index:    usize,
    pub offset_m: f64,
}

impl RouteCursor {
    /// Planar point the cursor sits on.  `route` must be non-empty.
    pub fn point(&self, route: &[PlanarPoint]) -> PlanarPoint {
        let p1 = route[self.index];
        match route.get(self.index + 1) {
            Some(&p2) if self.offset_m > 0.0 => {
                let seg = p1.distance_to(p2);
                if seg > 0.0 { p1.lerp(p2, (self.offset_m / seg).min(1.0)) } else { p1 }
            }
            _ => p1,
        }
    }

    /// `true` once the cursor sits on the last point (or the route is empty).
    #[inline]
    pub fn is_at_end(&self, route: &[PlanarPoint]) -> bool {
        self.index + 1 >= route.len()
    }
}

/// Walk `distance_m` along `route` from `cursor`.
///
/// Returns the new cursor and the walked sub-path: the starting point, every
/// route point passed, and the interpolated stop point if the walk ends
/// mid-segment.  The cursor never moves backwards and never passes the last
/// point.  An empty route yields an empty path.
pub fn advance_along(
    route: &[PlanarPoint],
    cursor: RouteCursor,
    distance_m: f64,
) -> (RouteCursor, Vec<PlanarPoint>) {
    if route.is_empty() {
        return (cursor, Vec::new());
    }

    let mut cur = cursor;
    let mut remaining = distance_m.max(0.0);
    let mut walked = vec![cur.point(route)];

    while remaining > 0.0 && !cur.is_at_end(route) {
        let p1 = route[cur.index];
        let p2 = route[cur.index + 1];
        let left = p1.distance_to(p2) - cur.offset_m;

        if remaining >= left {
            remaining -= left.max(0.0);
            cur = RouteCursor { index: cur.index + 1, offset_m: 0.0 };
            walked.push(p2);
        } else {
            cur.offset_m += remaining;
            remaining = 0.0;
            walked.push(cur.point(route));
        }
    }

    (cur, walked)
}
