//! One device's publish loop.

use std::sync::Arc;
use std::thread;

use tracing::{error, info, info_span, warn};

use mf_core::{Clock, DeviceId};
use mf_device::{Device, MotionModel};
use mf_telemetry::{Delivery, TelemetryRecord, TelemetrySink};

use crate::config::WorkerConfig;
use crate::SimResult;

/// Publish counters for one worker.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkerSummary {
    pub device:   DeviceId,
    pub ticks:    u64,
    pub accepted: u64,
    pub rejected: u64,
    /// Publishes that failed in transport.
    pub failed:   u64,
}

/// Drives one [`Device`]: sample, publish, sleep, repeat.
pub struct DeviceWorker<M: MotionModel> {
    device:  Device<M>,
    sink:    Arc<dyn TelemetrySink>,
    clock:   Arc<dyn Clock>,
    config:  WorkerConfig,
    summary: WorkerSummary,
}

impl<M: MotionModel> DeviceWorker<M> {
    pub fn new(
        device: Device<M>,
        sink: Arc<dyn TelemetrySink>,
        clock: Arc<dyn Clock>,
        config: WorkerConfig,
    ) -> Self {
        let summary = WorkerSummary { device: device.id(), ..WorkerSummary::default() };
        Self { device, sink, clock, config, summary }
    }

    pub fn id(&self) -> DeviceId {
        self.device.id()
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn summary(&self) -> &WorkerSummary {
        &self.summary
    }

    /// Run a single tick and publish its record.
    ///
    /// Rejected and failed publishes, including records that cannot be
    /// encoded, are logged and counted, not returned: telemetry is
    /// fire-and-forget.  Errors from the device itself are returned.
    pub fn step(&mut self) -> SimResult<()> {
        let hour = self.clock.hour_of_day();
        let reading = self.device.tick(hour)?;
        self.summary.ticks += 1;

        let record = match TelemetryRecord::from_reading(&reading, self.config.include_ids) {
            Ok(record) => record,
            Err(e) => {
                self.summary.failed += 1;
                warn!(
                    device = %reading.device,
                    tick = %reading.tick,
                    error = %e,
                    "could not build record, tick dropped"
                );
                return Ok(());
            }
        };

        match self.sink.publish(&record) {
            Ok(Delivery::Accepted { entry_id }) => {
                self.summary.accepted += 1;
                info!(
                    device = %record.device,
                    trip = %record.trip,
                    tick = %reading.tick,
                    entry = ?entry_id,
                    position = %reading.position,
                    speed_mps = record.speed_mps,
                    battery = record.battery_pct,
                    temperature = record.temperature_c,
                    "published"
                );
            }
            Ok(Delivery::Rejected) => {
                self.summary.rejected += 1;
                warn!(device = %record.device, tick = %reading.tick, "update rejected by service");
            }
            Err(e) => {
                self.summary.failed += 1;
                warn!(device = %record.device, tick = %reading.tick, error = %e, "publish failed");
            }
        }
        Ok(())
    }

    /// Loop until `max_ticks` is reached (or forever).  The only
    /// suspension points are the start delay and the inter-tick sleep.
    pub fn run(mut self) -> SimResult<WorkerSummary> {
        let span = info_span!("device", device = %self.id());
        let _guard = span.enter();

        if self.config.realtime && !self.config.start_delay.is_zero() {
            info!(delay_secs = self.config.start_delay.as_secs_f64(), "waiting before first tick");
            thread::sleep(self.config.start_delay);
        }
        info!(interval_secs = self.config.interval.as_secs_f64(), "worker started");

        loop {
            if self.config.max_ticks.is_some_and(|max| self.summary.ticks >= max) {
                break;
            }
            if let Err(e) = self.step() {
                error!(ticks = self.summary.ticks, error = %e, "worker stopped with an error");
                return Err(e);
            }
            let done = self.config.max_ticks.is_some_and(|max| self.summary.ticks >= max);
            if self.config.realtime && !done {
                thread::sleep(self.config.interval);
            }
        }

        info!(
            ticks = self.summary.ticks,
            accepted = self.summary.accepted,
            rejected = self.summary.rejected,
            failed = self.summary.failed,
            "worker finished"
        );
        Ok(self.summary)
    }
}

/// Run one worker on the calling thread.  Any error ends the run.
pub fn run_single<M: MotionModel>(worker: DeviceWorker<M>) -> SimResult<WorkerSummary> {
    info!(device = %worker.id(), "single-device publisher starting");
    worker.run()
}
