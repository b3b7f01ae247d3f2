//! Builds a fleet of identical workers around shared resources.

use std::sync::Arc;

use mf_core::{Clock, DeviceId, DeviceRng};
use mf_device::{Device, MotionModel, RouteFollower, TripCounter, Wanderer};
use mf_spatial::{DijkstraRouter, RoadNetwork, Router};
use mf_telemetry::TelemetrySink;

use crate::config::FleetConfig;
use crate::fleet::Fleet;
use crate::worker::DeviceWorker;
use crate::{SimError, SimResult};

/// Builder for N device workers sharing one sink, clock, and trip counter.
///
/// Device ids run from 1 to `config.devices`.  Device `i` (zero-based)
/// starts after `i · stagger`.
///
/// # Example
///
/// ```rust,ignore
/// let trips = Arc::new(TripCounter::seeded(history.latest_trip_id()?));
/// let fleet = FleetBuilder::new(config, sink, clock, trips)
///     .spawn_street(Arc::new(network))?;
/// let report = fleet.join();
/// ```
pub struct FleetBuilder {
    config: FleetConfig,
    sink:   Arc<dyn TelemetrySink>,
    clock:  Arc<dyn Clock>,
    trips:  Arc<TripCounter>,
}

impl FleetBuilder {
    pub fn new(
        config: FleetConfig,
        sink: Arc<dyn TelemetrySink>,
        clock: Arc<dyn Clock>,
        trips: Arc<TripCounter>,
    ) -> Self {
        Self { config, sink, clock, trips }
    }

    pub fn config(&self) -> &FleetConfig {
        &self.config
    }

    /// Street-following workers using Dijkstra routing.
    pub fn street_workers(
        &self,
        network: Arc<RoadNetwork>,
    ) -> SimResult<Vec<DeviceWorker<RouteFollower>>> {
        self.street_workers_with(network, DijkstraRouter)
    }

    /// Street-following workers with a custom router (cloned per device).
    pub fn street_workers_with<R: Router + Clone>(
        &self,
        network: Arc<RoadNetwork>,
        router: R,
    ) -> SimResult<Vec<DeviceWorker<RouteFollower<R>>>> {
        let max_speed = self.config.params.max_speed_mps();
        self.workers(|_| {
            Ok(RouteFollower::new(
                Arc::clone(&network),
                router.clone(),
                Arc::clone(&self.trips),
                max_speed,
            )?)
        })
    }

    /// Free-roaming workers, all starting at `params.wander.start`.
    pub fn wander_workers(&self) -> SimResult<Vec<DeviceWorker<Wanderer>>> {
        let params = &self.config.params;
        self.workers(|rng| Ok(Wanderer::new(params.wander.clone(), params.max_speed_mps(), rng)))
    }

    pub fn spawn_street(self, network: Arc<RoadNetwork>) -> SimResult<Fleet> {
        let workers = self.street_workers(network)?;
        spawn_all(workers)
    }

    pub fn spawn_wander(self) -> SimResult<Fleet> {
        let workers = self.wander_workers()?;
        spawn_all(workers)
    }

    fn workers<M, F>(&self, mut motion: F) -> SimResult<Vec<DeviceWorker<M>>>
    where
        M: MotionModel,
        F: FnMut(&mut DeviceRng) -> SimResult<M>,
    {
        if self.config.devices == 0 {
            return Err(SimError::Config("a fleet needs at least one device".into()));
        }
        if self.config.interval.is_zero() && self.config.realtime {
            return Err(SimError::Config("tick interval must be positive".into()));
        }

        let tick_secs = self.config.interval.as_secs_f64();
        (0..self.config.devices)
            .map(|index| {
                let id = DeviceId(index + 1);
                let mut rng = DeviceRng::new(self.config.seed, id);
                let model = motion(&mut rng)?;
                let device = Device::new(id, &self.config.params, model, rng, tick_secs)?;
                Ok(DeviceWorker::new(
                    device,
                    Arc::clone(&self.sink),
                    Arc::clone(&self.clock),
                    self.config.worker_config(index),
                ))
            })
            .collect()
    }
}

fn spawn_all<M: MotionModel + 'static>(workers: Vec<DeviceWorker<M>>) -> SimResult<Fleet> {
    let mut fleet = Fleet::new();
    for worker in workers {
        fleet.spawn(worker)?;
    }
    Ok(fleet)
}
