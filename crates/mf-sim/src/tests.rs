//! Unit tests for mf-sim.

#[cfg(test)]
mod helpers {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use mf_core::{DeviceRng, GeoPoint};
    use mf_device::{DeviceError, DeviceResult, MotionModel, MotionSample};
    use mf_spatial::{RoadNetwork, RoadNetworkBuilder};
    use mf_telemetry::{
        Delivery, TelemetryError, TelemetryRecord, TelemetryResult, TelemetrySink,
    };

    /// Sink that stores every record and answers with a fixed outcome.
    pub struct RecordingSink {
        pub records: Mutex<Vec<TelemetryRecord>>,
        outcome:     Outcome,
    }

    #[derive(Copy, Clone)]
    pub enum Outcome {
        Accept,
        Reject,
        Fail,
    }

    impl RecordingSink {
        pub fn new(outcome: Outcome) -> Arc<Self> {
            Arc::new(Self { records: Mutex::new(Vec::new()), outcome })
        }

        pub fn len(&self) -> usize {
            self.records.lock().len()
        }
    }

    impl TelemetrySink for RecordingSink {
        fn publish(&self, record: &TelemetryRecord) -> TelemetryResult<Delivery> {
            let mut records = self.records.lock();
            records.push(record.clone());
            match self.outcome {
                Outcome::Accept => Ok(Delivery::Accepted { entry_id: Some(records.len() as u64) }),
                Outcome::Reject => Ok(Delivery::Rejected),
                Outcome::Fail => Err(TelemetryError::Io(std::io::Error::other("link down"))),
            }
        }
    }

    /// Motion model that misbehaves after a number of good ticks.
    pub struct Faulty {
        pub good_ticks: u32,
        pub panic:      bool,
    }

    impl MotionModel for Faulty {
        fn advance(&mut self, _rng: &mut DeviceRng, _tick_secs: f64) -> DeviceResult<MotionSample> {
            if self.good_ticks == 0 {
                if self.panic {
                    panic!("motion model exploded");
                }
                return Err(DeviceError::InvalidParams("broken sensor".into()));
            }
            self.good_ticks -= 1;
            Ok(MotionSample {
                position:   self.position(),
                speed_mps:  0.0,
                trajectory: vec![self.position()],
                trip:       mf_core::TripId::NONE,
            })
        }

        fn position(&self) -> GeoPoint {
            GeoPoint::new(-33.44, -70.65)
        }
    }

    /// Reports a position no polyline can encode.
    pub struct OffMap;

    impl MotionModel for OffMap {
        fn advance(&mut self, _rng: &mut DeviceRng, _tick_secs: f64) -> DeviceResult<MotionSample> {
            Ok(MotionSample {
                position:   self.position(),
                speed_mps:  1.0,
                trajectory: vec![self.position()],
                trip:       mf_core::TripId::NONE,
            })
        }

        fn position(&self) -> GeoPoint {
            GeoPoint::new(123.0, -70.65)
        }
    }

    /// In-memory log sink for a scoped `tracing` subscriber.
    #[derive(Clone, Default)]
    pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl LogBuffer {
        pub fn dispatch(&self) -> tracing::Dispatch {
            let buf = self.clone();
            tracing::Dispatch::new(
                tracing_subscriber::fmt()
                    .with_writer(move || buf.clone())
                    .with_ansi(false)
                    .finish(),
            )
        }

        pub fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    impl std::io::Write for LogBuffer {
        fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// 4 × 4 two-way grid near Plaza Italia.
    pub fn grid() -> Arc<RoadNetwork> {
        let mut b = RoadNetworkBuilder::new();
        let n = 4;
        let ids: Vec<_> = (0..n * n)
            .map(|i| {
                b.add_node(GeoPoint::new(
                    -33.437 - (i / n) as f64 * 0.0009,
                    -70.634 + (i % n) as f64 * 0.00108,
                ))
            })
            .collect();
        for i in 0..n * n {
            if i % n + 1 < n {
                b.add_road(ids[i], ids[i + 1]);
            }
            if i + n < n * n {
                b.add_road(ids[i], ids[i + n]);
            }
        }
        Arc::new(b.build())
    }
}

// ── Config ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod config {
    use std::time::Duration;

    use crate::FleetConfig;

    #[test]
    fn stagger_defaults_to_half_interval() {
        let c = FleetConfig::default();
        assert_eq!(c.devices, 2);
        assert_eq!(c.interval, Duration::from_secs(60));
        assert_eq!(c.stagger(), Duration::from_secs(30));
        assert_eq!(c.worker_config(0).start_delay, Duration::ZERO);
        assert_eq!(c.worker_config(1).start_delay, Duration::from_secs(30));
        assert_eq!(c.worker_config(3).start_delay, Duration::from_secs(90));
        assert!(c.worker_config(1).include_ids);
    }

    #[test]
    fn explicit_stagger() {
        let c = FleetConfig { stagger: Some(Duration::from_secs(5)), ..FleetConfig::default() };
        assert_eq!(c.worker_config(2).start_delay, Duration::from_secs(10));
    }
}

// ── Worker ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod worker {
    use std::sync::Arc;
    use std::time::Duration;

    use mf_core::{DeviceId, DeviceRng, FixedClock, Tick, TripId};
    use mf_device::{Device, DeviceParams, RouteFollower, TripCounter};
    use mf_spatial::DijkstraRouter;

    use super::helpers::{grid, Faulty, OffMap, Outcome, RecordingSink};
    use crate::{run_single, DeviceWorker, SimError, WorkerConfig};

    fn config(max_ticks: u64, include_ids: bool) -> WorkerConfig {
        WorkerConfig {
            max_ticks: Some(max_ticks),
            include_ids,
            realtime: false,
            ..WorkerConfig::new(Duration::from_secs(30))
        }
    }

    fn street_worker(
        sink: Arc<RecordingSink>,
        cfg: WorkerConfig,
    ) -> DeviceWorker<RouteFollower> {
        let params = DeviceParams::single();
        let follower = RouteFollower::new(
            grid(),
            DijkstraRouter,
            Arc::new(TripCounter::seeded(TripId(40))),
            params.max_speed_mps(),
        )
        .unwrap();
        let device =
            Device::new(DeviceId(1), &params, follower, DeviceRng::new(3, DeviceId(1)), 30.0).unwrap();
        DeviceWorker::new(device, sink, Arc::new(FixedClock(14.0)), cfg)
    }

    #[test]
    fn tick_limit_publishes_exactly_that_many() {
        let sink = RecordingSink::new(Outcome::Accept);
        let summary = street_worker(Arc::clone(&sink), config(7, false)).run().unwrap();

        assert_eq!(summary.ticks, 7);
        assert_eq!(summary.accepted, 7);
        assert_eq!(sink.len(), 7);

        let records = sink.records.lock();
        for (i, r) in records.iter().enumerate() {
            assert_eq!(r.tick, Tick(i as u64));
            assert!(!r.include_ids);
            assert!(r.fields().len() == 6);
        }
        // Trip ids continue from the seed.
        assert!(records[0].trip >= TripId(41));
    }

    #[test]
    fn rejected_and_failed_publishes_are_counted_not_fatal() {
        let sink = RecordingSink::new(Outcome::Reject);
        let s = street_worker(Arc::clone(&sink), config(3, true)).run().unwrap();
        assert_eq!((s.accepted, s.rejected, s.failed), (0, 3, 0));

        let sink = RecordingSink::new(Outcome::Fail);
        let s = street_worker(Arc::clone(&sink), config(4, true)).run().unwrap();
        assert_eq!((s.accepted, s.rejected, s.failed), (0, 0, 4));
        assert_eq!(s.ticks, 4);
    }

    #[test]
    fn fleet_payload_carries_ids() {
        let sink = RecordingSink::new(Outcome::Accept);
        street_worker(Arc::clone(&sink), config(2, true)).run().unwrap();
        let records = sink.records.lock();
        let fields = records[0].fields();
        assert_eq!(fields[6], ("field7", "1".to_string()));
        assert_eq!(fields[7].0, "field8");
    }

    #[test]
    fn unencodable_record_is_dropped_not_fatal() {
        let sink = RecordingSink::new(Outcome::Accept);
        let device = Device::new(
            DeviceId(5),
            &DeviceParams::default(),
            OffMap,
            DeviceRng::new(0, DeviceId(5)),
            30.0,
        )
        .unwrap();
        let worker = DeviceWorker::new(
            device,
            Arc::clone(&sink) as Arc<dyn mf_telemetry::TelemetrySink>,
            Arc::new(FixedClock(9.0)),
            config(3, true),
        );
        let s = worker.run().unwrap();
        assert_eq!((s.ticks, s.accepted, s.failed), (3, 0, 3));
        assert_eq!(sink.len(), 0);
    }

    #[test]
    fn run_single_stops_on_device_error() {
        let sink = RecordingSink::new(Outcome::Accept);
        let device = Device::new(
            DeviceId(1),
            &DeviceParams::default(),
            Faulty { good_ticks: 2, panic: false },
            DeviceRng::new(0, DeviceId(1)),
            30.0,
        )
        .unwrap();
        let worker = DeviceWorker::new(
            device,
            Arc::clone(&sink) as Arc<dyn mf_telemetry::TelemetrySink>,
            Arc::new(FixedClock(3.0)),
            config(10, false),
        );
        assert!(matches!(run_single(worker), Err(SimError::Device(_))));
        assert_eq!(sink.len(), 2);
    }
}

// ── Fleet ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod fleet {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use mf_core::{DeviceId, DeviceRng, FixedClock, TripId};
    use mf_device::{Device, DeviceParams, TripCounter};

    use super::helpers::{grid, Faulty, LogBuffer, Outcome, RecordingSink};
    use crate::{DeviceWorker, Fleet, FleetBuilder, FleetConfig, SimError, WorkerConfig};

    fn fleet_config(devices: u32, ticks: u64) -> FleetConfig {
        FleetConfig {
            devices,
            interval: Duration::from_secs(60),
            max_ticks: Some(ticks),
            seed: 99,
            realtime: false,
            ..FleetConfig::default()
        }
    }

    #[test]
    fn street_fleet_runs_every_device() {
        let sink = RecordingSink::new(Outcome::Accept);
        let trips = Arc::new(TripCounter::seeded(TripId(10)));
        let fleet = FleetBuilder::new(
            fleet_config(3, 12),
            Arc::clone(&sink) as _,
            Arc::new(FixedClock(14.0)),
            Arc::clone(&trips),
        )
        .spawn_street(grid())
        .unwrap();
        assert_eq!(fleet.len(), 3);

        let report = fleet.join();
        assert!(report.failed.is_empty());
        assert_eq!(report.completed.len(), 3);
        assert_eq!(report.total_ticks(), 36);
        assert_eq!(sink.len(), 36);

        // Every trip id belongs to exactly one device, and none reuse the seed.
        let mut owner: HashMap<TripId, DeviceId> = HashMap::new();
        for r in sink.records.lock().iter() {
            assert!(r.trip > TripId(10));
            let prev = owner.insert(r.trip, r.device);
            assert!(prev.is_none() || prev == Some(r.device));
        }
        assert!(trips.last_issued() > TripId(10));
    }

    #[test]
    fn wander_fleet() {
        let sink = RecordingSink::new(Outcome::Accept);
        let report = FleetBuilder::new(
            fleet_config(2, 5),
            Arc::clone(&sink) as _,
            Arc::new(FixedClock(14.0)),
            Arc::new(TripCounter::default()),
        )
        .spawn_wander()
        .unwrap()
        .join();
        assert_eq!(report.completed.len(), 2);
        assert_eq!(sink.len(), 10);
    }

    #[test]
    fn zero_devices_is_a_config_error() {
        let builder = FleetBuilder::new(
            fleet_config(0, 1),
            RecordingSink::new(Outcome::Accept) as _,
            Arc::new(FixedClock(14.0)),
            Arc::new(TripCounter::default()),
        );
        assert!(matches!(builder.street_workers(grid()), Err(SimError::Config(_))));
    }

    #[test]
    fn failing_worker_does_not_stop_siblings() {
        let sink = RecordingSink::new(Outcome::Accept);
        let cfg = WorkerConfig {
            max_ticks: Some(20),
            realtime: false,
            ..WorkerConfig::new(Duration::from_secs(60))
        };

        let mut fleet = Fleet::new();
        for (id, faulty) in [
            (1, Faulty { good_ticks: 100, panic: false }),
            (2, Faulty { good_ticks: 3, panic: true }),
            (3, Faulty { good_ticks: 5, panic: false }),
            (4, Faulty { good_ticks: 100, panic: false }),
        ] {
            let device = Device::new(
                DeviceId(id),
                &DeviceParams::default(),
                faulty,
                DeviceRng::new(1, DeviceId(id)),
                60.0,
            )
            .unwrap();
            fleet
                .spawn(DeviceWorker::new(
                    device,
                    Arc::clone(&sink) as _,
                    Arc::new(FixedClock(10.0)),
                    cfg.clone(),
                ))
                .unwrap();
        }

        let report = fleet.join();
        assert_eq!(report.completed.len(), 2);
        assert_eq!(report.failed.len(), 2);
        let failed: Vec<DeviceId> = report.failed.iter().map(|(id, _)| *id).collect();
        assert_eq!(failed, vec![DeviceId(2), DeviceId(3)]);
        assert!(report.failed[0].1.contains("exploded"));
        // 20 + 3 + 5 + 20
        assert_eq!(sink.len(), 48);
    }

    #[test]
    fn failure_is_logged_while_siblings_keep_running() {
        let logs = LogBuffer::default();
        let steady_sink = RecordingSink::new(Outcome::Accept);
        let steady_cfg = WorkerConfig {
            max_ticks: Some(3),
            ..WorkerConfig::new(Duration::from_millis(500))
        };

        let worker = |id: u32, faulty: Faulty, sink: Arc<RecordingSink>, cfg: WorkerConfig| {
            let device = Device::new(
                DeviceId(id),
                &DeviceParams::default(),
                faulty,
                DeviceRng::new(1, DeviceId(id)),
                0.5,
            )
            .unwrap();
            DeviceWorker::new(device, sink as _, Arc::new(FixedClock(10.0)), cfg)
        };

        let mut fleet = Fleet::new();
        tracing::dispatcher::with_default(&logs.dispatch(), || {
            fleet
                .spawn(worker(1, Faulty { good_ticks: 100, panic: false }, Arc::clone(&steady_sink), steady_cfg))
                .unwrap();
            fleet
                .spawn(worker(
                    2,
                    Faulty { good_ticks: 0, panic: false },
                    RecordingSink::new(Outcome::Accept),
                    WorkerConfig::new(Duration::from_secs(60)),
                ))
                .unwrap();
        });

        let deadline = Instant::now() + Duration::from_secs(5);
        while !logs.contents().contains("broken sensor") && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        let early = logs.contents();
        assert!(early.contains("worker stopped with an error"), "{early}");
        assert!(early.contains("broken sensor"), "{early}");
        // Device 1 is still between its ticks.
        assert!(steady_sink.len() < 3);

        let report = fleet.join();
        assert_eq!(report.completed.len(), 1);
        assert_eq!(report.completed[0].ticks, 3);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, DeviceId(2));
    }
}
