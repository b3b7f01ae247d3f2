//! Free-roaming motion without a street network.
//!
//! The device alternates between stopped and moving, travels along one of
//! the four cardinal headings, and turns 90° after a random number of ticks.

use mf_core::{DeviceRng, GeoPoint, TripId};

use crate::motion::{MotionModel, MotionSample};
use crate::params::WanderParams;
use crate::DeviceResult;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Heading {
    North,
    East,
    South,
    West,
}

impl Heading {
    const ALL: [Heading; 4] = [Heading::North, Heading::East, Heading::South, Heading::West];

    fn random(rng: &mut DeviceRng) -> Heading {
        Self::ALL[rng.gen_range(0..4)]
    }

    pub fn opposite(self) -> Heading {
        match self {
            Heading::North => Heading::South,
            Heading::East => Heading::West,
            Heading::South => Heading::North,
            Heading::West => Heading::East,
        }
    }

    /// A heading that is neither `self` nor its opposite.
    pub(crate) fn turn(self, rng: &mut DeviceRng) -> Heading {
        let (a, b) = match self {
            Heading::North | Heading::South => (Heading::East, Heading::West),
            Heading::East | Heading::West => (Heading::North, Heading::South),
        };
        if rng.gen_bool(0.5) { a } else { b }
    }
}

/// Random-walk motion model.  Starts stopped at `params.start`.
pub struct Wanderer {
    params:        WanderParams,
    max_speed_mps: f64,
    position:      GeoPoint,
    moving:        bool,
    heading:       Heading,
    ticks_on_heading: u32,
    turn_after:    u32,
}

impl Wanderer {
    pub fn new(params: WanderParams, max_speed_mps: f64, rng: &mut DeviceRng) -> Self {
        let turn_after = rng.gen_range(params.min_heading_ticks..=params.max_heading_ticks);
        Self {
            position: params.start,
            params,
            max_speed_mps,
            moving: false,
            heading: Heading::random(rng),
            ticks_on_heading: 0,
            turn_after,
        }
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    pub fn heading(&self) -> Heading {
        self.heading
    }

    fn reset_heading_timer(&mut self, rng: &mut DeviceRng) {
        self.ticks_on_heading = 0;
        self.turn_after =
            rng.gen_range(self.params.min_heading_ticks..=self.params.max_heading_ticks);
    }

    /// Offset `from` by `distance_m` along `heading` on a spherical Earth.
    fn displace(from: GeoPoint, heading: Heading, distance_m: f64) -> GeoPoint {
        let dlat = (distance_m / EARTH_RADIUS_M).to_degrees();
        let cos_lat = from.lat.to_radians().cos();
        let dlon = if cos_lat.abs() > 1e-12 {
            (distance_m / (EARTH_RADIUS_M * cos_lat)).to_degrees()
        } else {
            0.0
        };
        let moved = match heading {
            Heading::North => GeoPoint::new(from.lat + dlat, from.lon),
            Heading::East => GeoPoint::new(from.lat, from.lon + dlon),
            Heading::South => GeoPoint::new(from.lat - dlat, from.lon),
            Heading::West => GeoPoint::new(from.lat, from.lon - dlon),
        };
        moved.clamped()
    }
}

impl MotionModel for Wanderer {
    fn advance(&mut self, rng: &mut DeviceRng, tick_secs: f64) -> DeviceResult<MotionSample> {
        if rng.gen_bool(self.params.decide_prob) {
            if self.moving {
                if rng.gen_bool(self.params.stop_prob) {
                    self.moving = false;
                }
            } else if rng.gen_bool(self.params.go_prob) {
                self.moving = true;
            }
        }

        self.ticks_on_heading += 1;

        if !self.moving {
            // The heading timer keeps running while stopped; any heading is
            // allowed for the next departure.
            if self.ticks_on_heading >= self.turn_after {
                self.heading = Heading::random(rng);
                self.reset_heading_timer(rng);
            }
            let here = self.position.rounded(6);
            return Ok(MotionSample {
                position:   here,
                speed_mps:  0.0,
                trajectory: vec![here],
                trip:       TripId::NONE,
            });
        }

        let low = self.params.min_speed_fraction * self.max_speed_mps;
        let speed_mps = rng.gen_range(low..=self.max_speed_mps);

        if self.ticks_on_heading >= self.turn_after {
            self.heading = self.heading.turn(rng);
            self.reset_heading_timer(rng);
        }

        let previous = self.position;
        self.position = Self::displace(previous, self.heading, speed_mps * tick_secs);

        Ok(MotionSample {
            position:   self.position.rounded(6),
            speed_mps,
            trajectory: vec![previous.rounded(6), self.position.rounded(6)],
            trip:       TripId::NONE,
        })
    }

    fn position(&self) -> GeoPoint {
        self.position.rounded(6)
    }
}
