//! Unit tests for mf-device.

#[cfg(test)]
mod helpers {
    use std::sync::Arc;

    use mf_core::{DeviceId, DeviceRng, GeoPoint};
    use mf_spatial::{RoadNetwork, RoadNetworkBuilder};

    pub fn rng(seed: u64) -> DeviceRng {
        DeviceRng::new(seed, DeviceId(1))
    }

    /// `n × n` two-way street grid with ~100 m blocks around Plaza Italia.
    pub fn grid(n: usize) -> Arc<RoadNetwork> {
        let mut b = RoadNetworkBuilder::new();
        let mut ids = Vec::new();
        for row in 0..n {
            for col in 0..n {
                ids.push(b.add_node(GeoPoint::new(
                    -33.437 - row as f64 * 0.0009,
                    -70.634 + col as f64 * 0.00108,
                )));
            }
        }
        for row in 0..n {
            for col in 0..n {
                let here = ids[row * n + col];
                if col + 1 < n {
                    b.add_road(here, ids[row * n + col + 1]);
                }
                if row + 1 < n {
                    b.add_road(here, ids[(row + 1) * n + col]);
                }
            }
        }
        Arc::new(b.build())
    }

    /// Two nodes, no roads.
    pub fn disconnected() -> Arc<RoadNetwork> {
        let mut b = RoadNetworkBuilder::new();
        b.add_node(GeoPoint::new(-33.44, -70.65));
        b.add_node(GeoPoint::new(-33.45, -70.65));
        Arc::new(b.build())
    }
}

// ── Parameters ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod params {
    use crate::{DeviceError, DeviceParams};

    #[test]
    fn defaults() {
        let p = DeviceParams::default();
        assert_eq!(p.max_speed_kmh, 25.0);
        assert_eq!(p.battery.initial, 100.0);
        assert_eq!(p.battery.low_threshold, 10.0);
        assert_eq!(p.battery.charge_rate, 2.5);
        assert_eq!(p.temperature.peak_hour, 14.0);
        assert_eq!(p.wander.decide_prob, 0.1);
        assert_eq!(DeviceParams::single().max_speed_kmh, 50.0);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn partial_json_override() {
        let p: DeviceParams =
            serde_json::from_str(r#"{ "temperature": { "max_c": 30.0 } }"#).unwrap();
        assert_eq!(p.temperature.max_c, 30.0);
        assert_eq!(p.temperature.min_c, 12.0);
        assert_eq!(p.max_speed_kmh, 25.0);
    }

    #[test]
    fn rejects_unusable_values() {
        let mut p = DeviceParams::default();
        p.max_speed_kmh = 0.0;
        assert!(matches!(p.validate(), Err(DeviceError::InvalidParams(_))));

        let mut p = DeviceParams::default();
        p.temperature.min_c = 30.0;
        assert!(p.validate().is_err());

        let mut p = DeviceParams::default();
        p.wander.min_heading_ticks = 50;
        assert!(p.validate().is_err());
    }
}

// ── Temperature ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod temperature {
    use crate::{TemperatureModel, TemperatureParams};

    fn model() -> TemperatureModel {
        TemperatureModel::new(&TemperatureParams::default()).unwrap()
    }

    #[test]
    fn curve_shape() {
        let m = model();
        assert!((m.expected(14.0) - 26.0).abs() < 1e-9);
        assert!((m.expected(2.0) - 12.0).abs() < 1e-9);
        assert!((m.expected(8.0) - 19.0).abs() < 1e-9);
        assert!((m.expected(20.0) - 19.0).abs() < 1e-9);
    }

    #[test]
    fn mean_converges_to_curve() {
        let m = model();
        let mut rng = super::helpers::rng(7);
        for hour in [14.0, 8.0, 3.5] {
            let n = 20_000;
            let mean = (0..n).map(|_| m.sample(hour, &mut rng)).sum::<f64>() / n as f64;
            assert!(
                (mean - m.expected(hour)).abs() < 0.05,
                "hour {hour}: mean {mean} vs {}",
                m.expected(hour)
            );
        }
    }

    #[test]
    fn samples_have_two_decimals() {
        let m = model();
        let mut rng = super::helpers::rng(3);
        for _ in 0..100 {
            let t = m.sample(11.25, &mut rng);
            assert!(((t * 100.0).round() - t * 100.0).abs() < 1e-6);
        }
    }

    #[test]
    fn zero_noise_is_exact() {
        let params = TemperatureParams { noise_sigma: 0.0, ..TemperatureParams::default() };
        let m = TemperatureModel::new(&params).unwrap();
        let mut rng = super::helpers::rng(1);
        assert_eq!(m.sample(14.0, &mut rng), 26.0);
    }
}

// ── Battery ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod battery {
    use crate::{Battery, BatteryMode, BatteryParams};

    const MAX: f64 = 6.94;

    #[test]
    fn starts_full_and_discharging() {
        let b = Battery::new(&BatteryParams::default()).unwrap();
        assert_eq!(b.level(), 100.0);
        assert_eq!(b.mode(), BatteryMode::Discharging);
    }

    #[test]
    fn level_stays_in_bounds() {
        let mut b = Battery::new(&BatteryParams::default()).unwrap();
        let mut rng = super::helpers::rng(11);
        let mut flips = 0;
        let mut mode = b.mode();
        for _ in 0..20_000 {
            let speed = rng.gen_range(0.0..=MAX);
            let level = b.step(speed, MAX, &mut rng);
            assert!((0.0..=100.0).contains(&level), "level {level}");
            assert!(((level * 10.0).round() - level * 10.0).abs() < 1e-6);
            if b.mode() != mode {
                flips += 1;
                mode = b.mode();
            }
        }
        assert!(flips > 2, "battery should cycle, saw {flips} flips");
    }

    #[test]
    fn charging_flips_at_full() {
        let p = BatteryParams::default();
        let mut b = Battery::with_state(&p, 99.0, BatteryMode::Charging).unwrap();
        let mut rng = super::helpers::rng(1);
        assert_eq!(b.step(0.0, MAX, &mut rng), 100.0);
        assert_eq!(b.mode(), BatteryMode::Discharging);
    }

    #[test]
    fn charging_below_full_keeps_charging() {
        let p = BatteryParams::default();
        let mut b = Battery::with_state(&p, 50.0, BatteryMode::Charging).unwrap();
        let mut rng = super::helpers::rng(1);
        assert_eq!(b.step(MAX, MAX, &mut rng), 52.5);
        assert_eq!(b.mode(), BatteryMode::Charging);
    }

    #[test]
    fn discharging_flips_at_low_threshold() {
        let p = BatteryParams::default();
        // Full-speed drain is at least 0.5 per tick.
        let mut b = Battery::with_state(&p, 10.4, BatteryMode::Discharging).unwrap();
        let mut rng = super::helpers::rng(1);
        let level = b.step(MAX, MAX, &mut rng);
        assert!(level <= 10.0);
        assert_eq!(b.mode(), BatteryMode::Charging);
    }

    #[test]
    fn never_negative() {
        let p = BatteryParams { low_threshold: 0.0, ..BatteryParams::default() };
        let mut b = Battery::with_state(&p, 0.1, BatteryMode::Discharging).unwrap();
        let mut rng = super::helpers::rng(5);
        assert_eq!(b.step(MAX, MAX, &mut rng), 0.0);
        assert_eq!(b.mode(), BatteryMode::Charging);
    }
}

// ── Route walking ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod walk {
    use mf_core::PlanarPoint;
    use mf_core::geo::path_length_m;
    use crate::{advance_along, RouteCursor};

    fn straight(lengths: &[f64]) -> Vec<PlanarPoint> {
        let mut x = 0.0;
        let mut pts = vec![PlanarPoint::new(0.0, 0.0)];
        for l in lengths {
            x += l;
            pts.push(PlanarPoint::new(x, 0.0));
        }
        pts
    }

    #[test]
    fn empty_route_walks_nowhere() {
        let (cur, walked) = advance_along(&[], RouteCursor::default(), 100.0);
        assert_eq!(cur, RouteCursor::default());
        assert!(walked.is_empty());
    }

    #[test]
    fn single_point_route() {
        let route = [PlanarPoint::new(10.0, 20.0)];
        let (cur, walked) = advance_along(&route, RouteCursor::default(), 100.0);
        assert_eq!(walked, vec![route[0]]);
        assert!(cur.is_at_end(&route));
    }

    #[test]
    fn partial_segment_interpolates() {
        let route = straight(&[100.0, 100.0]);
        let (cur, walked) = advance_along(&route, RouteCursor::default(), 150.0);
        assert_eq!(cur.index, 1);
        assert!((cur.offset_m - 50.0).abs() < 1e-9);
        assert_eq!(walked.len(), 3);
        assert!((walked[2].x - 150.0).abs() < 1e-9);
        assert!((path_length_m(&walked) - 150.0).abs() < 1e-9);
    }

    #[test]
    fn stops_at_route_end() {
        let route = straight(&[100.0, 100.0]);
        let (cur, walked) = advance_along(&route, RouteCursor::default(), 1_000.0);
        assert!(cur.is_at_end(&route));
        assert_eq!(walked.last(), route.last());
        assert!(path_length_m(&walked) <= 1_000.0);
    }

    #[test]
    fn progress_on_long_segment_accumulates() {
        let route = straight(&[500.0]);
        let mut cur = RouteCursor::default();
        for step in 1..=4 {
            let (next, walked) = advance_along(&route, cur, 100.0);
            assert_eq!(walked[0], cur.point(&route));
            assert!((walked[1].x - 100.0 * step as f64).abs() < 1e-9);
            cur = next;
        }
        let (cur, _) = advance_along(&route, cur, 100.0);
        assert!(cur.is_at_end(&route));
    }

    #[test]
    fn cursor_is_monotone_and_bounded() {
        let route = straight(&[30.0, 70.0, 5.0, 120.0, 40.0]);
        let mut cur = RouteCursor::default();
        for _ in 0..20 {
            let (next, walked) = advance_along(&route, cur, 37.0);
            assert!(
                next.index > cur.index || (next.index == cur.index && next.offset_m >= cur.offset_m)
            );
            assert!(next.index <= route.len() - 1);
            assert!(path_length_m(&walked) <= 37.0 + 1e-9);
            cur = next;
        }
        assert!(cur.is_at_end(&route));
    }
}

// ── Trip counter ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod trips {
    use std::sync::Arc;
    use std::thread;

    use mf_core::TripId;
    use crate::TripCounter;

    #[test]
    fn seeded_counter_continues() {
        let c = TripCounter::seeded(TripId(41));
        assert_eq!(c.last_issued(), TripId(41));
        assert_eq!(c.issue(), TripId(42));
        assert_eq!(c.issue(), TripId(43));
        assert_eq!(TripCounter::default().issue(), TripId(1));
    }

    #[test]
    fn concurrent_issue_is_unique_and_gapless() {
        let counter = Arc::new(TripCounter::seeded(TripId(100)));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let c = Arc::clone(&counter);
                thread::spawn(move || (0..1_000).map(|_| c.issue().0).collect::<Vec<_>>())
            })
            .collect();

        let mut all: Vec<u64> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        all.sort_unstable();
        let expected: Vec<u64> = (101..=8_100).collect();
        assert_eq!(all, expected);
    }
}

// ── Route follower ────────────────────────────────────────────────────────────

#[cfg(test)]
mod follower {
    use std::sync::Arc;

    use mf_core::{kmh_to_mps, PlanarPoint, TripId};
    use mf_core::geo::path_length_m;
    use mf_spatial::DijkstraRouter;

    use crate::{DeviceError, MotionModel, RouteFollower, TripCounter};

    const TICK: f64 = 30.0;

    fn follower(counter: Arc<TripCounter>) -> RouteFollower {
        RouteFollower::new(super::helpers::grid(5), DijkstraRouter, counter, kmh_to_mps(25.0))
            .unwrap()
    }

    #[test]
    fn too_small_network_is_an_error() {
        let mut b = mf_spatial::RoadNetworkBuilder::new();
        b.add_node(mf_core::GeoPoint::new(-33.44, -70.65));
        let r = RouteFollower::new(
            Arc::new(b.build()),
            DijkstraRouter,
            Arc::new(TripCounter::default()),
            5.0,
        );
        assert!(matches!(r, Err(DeviceError::NetworkTooSmall { nodes: 1 })));
    }

    #[test]
    fn starts_parked_on_central_node() {
        let net = super::helpers::grid(5);
        let f = RouteFollower::new(
            Arc::clone(&net),
            DijkstraRouter,
            Arc::new(TripCounter::default()),
            5.0,
        )
        .unwrap();
        let centre = net.central_node().unwrap();
        assert_eq!(f.position(), net.node_geo(centre).rounded(6));
    }

    #[test]
    fn first_tick_plans_a_route() {
        let counter = Arc::new(TripCounter::default());
        let mut f = follower(Arc::clone(&counter));
        assert!(f.is_exhausted());
        assert_eq!(f.trip(), TripId::NONE);

        let mut rng = super::helpers::rng(2);
        let s = f.advance(&mut rng, TICK).unwrap();
        assert_eq!(s.trip, TripId(1));
        assert_eq!(counter.last_issued(), TripId(1));
        assert!(s.trajectory.len() >= 2);
        assert_eq!(s.position, *s.trajectory.last().unwrap());
        assert!(s.speed_mps >= 0.5 * kmh_to_mps(25.0) && s.speed_mps <= kmh_to_mps(25.0));
    }

    #[test]
    fn per_tick_distance_bounded_and_cursor_monotone() {
        let counter = Arc::new(TripCounter::default());
        let mut f = follower(counter);
        let mut rng = super::helpers::rng(9);
        let mut last_trip = TripId::NONE;
        let mut last_cursor = f.cursor();

        for _ in 0..200 {
            let s = f.advance(&mut rng, TICK).unwrap();
            let proj = super::helpers::grid(5).projection();
            let planar: Vec<PlanarPoint> = s.trajectory.iter().map(|&p| proj.project(p)).collect();
            // Coordinates are rounded to 6 dp (≈ 0.1 m) per point.
            let tolerance = 0.3 * planar.len() as f64;
            assert!(path_length_m(&planar) <= s.speed_mps * TICK + tolerance);

            let cur = f.cursor();
            assert!(cur.index + 1 <= f.route().len());
            if s.trip == last_trip {
                assert!(
                    cur.index > last_cursor.index
                        || (cur.index == last_cursor.index && cur.offset_m >= last_cursor.offset_m)
                );
            } else {
                assert!(s.trip > last_trip);
            }
            last_trip = s.trip;
            last_cursor = cur;
        }
        assert!(last_trip.0 > 1, "several routes should have completed");
    }

    #[test]
    fn no_route_is_not_fatal_and_burns_no_trip() {
        let counter = Arc::new(TripCounter::default());
        let mut f = RouteFollower::new(
            super::helpers::disconnected(),
            DijkstraRouter,
            Arc::clone(&counter),
            5.0,
        )
        .unwrap();
        let mut rng = super::helpers::rng(4);
        let before = f.position();

        for _ in 0..3 {
            let s = f.advance(&mut rng, TICK).unwrap();
            assert_eq!(s.speed_mps, 0.0);
            assert!(s.trajectory.is_empty());
            assert_eq!(s.trip, TripId::NONE);
            assert_eq!(s.position, before);
        }
        assert_eq!(counter.last_issued(), TripId::NONE);
    }

    #[test]
    fn single_point_route_reports_one_point() {
        let counter = Arc::new(TripCounter::default());
        let mut f = follower(counter);
        let net = super::helpers::grid(5);
        let only = net.node_xy(mf_core::NodeId(3));
        f.start_route(vec![only]);
        assert!(f.is_exhausted());
        assert_eq!(f.trip(), TripId(1));
        assert_eq!(f.position(), net.node_geo(mf_core::NodeId(3)).rounded(6));
    }
}

// ── Wanderer ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod wander {
    use mf_core::{kmh_to_mps, TripId};

    use crate::{Heading, MotionModel, WanderParams, Wanderer};

    const TICK: f64 = 30.0;

    #[test]
    fn starts_stopped_at_start() {
        let mut rng = super::helpers::rng(1);
        let params = WanderParams::default();
        let w = Wanderer::new(params.clone(), kmh_to_mps(60.0), &mut rng);
        assert!(!w.is_moving());
        assert_eq!(w.position(), params.start.rounded(6));
    }

    #[test]
    fn moves_within_speed_bound() {
        let mut rng = super::helpers::rng(12);
        let max = kmh_to_mps(60.0);
        let mut w = Wanderer::new(WanderParams::default(), max, &mut rng);
        let mut moved = 0;

        for _ in 0..2_000 {
            let s = w.advance(&mut rng, TICK).unwrap();
            assert_eq!(s.trip, TripId::NONE);
            assert!(s.speed_mps <= max);
            match s.trajectory.as_slice() {
                [here] => {
                    assert_eq!(s.speed_mps, 0.0);
                    assert_eq!(*here, s.position);
                }
                [from, to] => {
                    moved += 1;
                    assert!(s.speed_mps >= 0.2 * max);
                    assert!(from.distance_m(*to) <= s.speed_mps * TICK * 1.01 + 0.5);
                    assert_eq!(*to, s.position);
                }
                other => panic!("unexpected trajectory {other:?}"),
            }
        }
        assert!(moved > 0);
    }

    #[test]
    fn turns_are_perpendicular() {
        let mut rng = super::helpers::rng(5);
        for h in [Heading::North, Heading::East, Heading::South, Heading::West] {
            for _ in 0..50 {
                let t = h.turn(&mut rng);
                assert_ne!(t, h);
                assert_ne!(t, h.opposite());
            }
        }
    }
}

// ── Device ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod device {
    use std::sync::Arc;

    use mf_core::{round_dp, DeviceId, DeviceRng, Tick};
    use mf_spatial::DijkstraRouter;

    use crate::{Device, DeviceParams, RouteFollower, TripCounter};

    fn device(seed: u64) -> Device<RouteFollower> {
        let params = DeviceParams::default();
        let follower = RouteFollower::new(
            super::helpers::grid(4),
            DijkstraRouter,
            Arc::new(TripCounter::default()),
            params.max_speed_mps(),
        )
        .unwrap();
        Device::new(DeviceId(1), &params, follower, DeviceRng::new(seed, DeviceId(1)), 60.0).unwrap()
    }

    #[test]
    fn readings_respect_invariants() {
        let mut d = device(42);
        let max = DeviceParams::default().max_speed_mps();
        for i in 0..300 {
            let r = d.tick(14.0).unwrap();
            assert_eq!(r.tick, Tick(i));
            assert_eq!(r.device, DeviceId(1));
            assert!((0.0..=100.0).contains(&r.battery_pct));
            assert!(r.speed_mps >= 0.0 && r.speed_mps <= round_dp(max, 2));
            assert_eq!(r.speed_mps, round_dp(r.speed_mps, 2));
        }
        assert_eq!(d.ticks(), Tick(300));
    }

    #[test]
    fn same_seed_same_readings() {
        let mut a = device(7);
        let mut b = device(7);
        for _ in 0..20 {
            assert_eq!(a.tick(9.5).unwrap(), b.tick(9.5).unwrap());
        }
    }

    #[test]
    fn invalid_params_rejected() {
        let params = DeviceParams { max_speed_kmh: -1.0, ..DeviceParams::default() };
        let follower = RouteFollower::new(
            super::helpers::grid(3),
            DijkstraRouter,
            Arc::new(TripCounter::default()),
            1.0,
        )
        .unwrap();
        assert!(Device::new(DeviceId(1), &params, follower, DeviceRng::new(0, DeviceId(1)), 60.0).is_err());
    }
}
