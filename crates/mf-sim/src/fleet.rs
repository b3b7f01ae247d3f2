//! Thread-per-device fleet.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use tracing::{dispatcher, error, info, Dispatch};

use mf_core::DeviceId;
use mf_device::MotionModel;

use crate::worker::{DeviceWorker, WorkerSummary};
use crate::SimResult;

/// Outcome of every worker in a fleet.
#[derive(Debug, Default)]
pub struct FleetReport {
    pub completed: Vec<WorkerSummary>,
    /// Workers that returned an error or panicked, with the reason.
    pub failed:    Vec<(DeviceId, String)>,
}

impl FleetReport {
    pub fn total_ticks(&self) -> u64 {
        self.completed.iter().map(|s| s.ticks).sum()
    }
}

/// Running device workers, one named OS thread each.
///
/// Workers share nothing mutable except the trip counter and the sink, so
/// one worker failing leaves the others running.
#[derive(Default)]
pub struct Fleet {
    handles: Vec<(DeviceId, JoinHandle<SimResult<WorkerSummary>>)>,
}

impl Fleet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `worker` on its own thread.
    pub fn spawn<M: MotionModel + 'static>(&mut self, worker: DeviceWorker<M>) -> SimResult<()> {
        let id = worker.id();
        // Workers log through whatever subscriber the spawning thread uses.
        let dispatch = dispatcher::get_default(Dispatch::clone);
        let handle = thread::Builder::new()
            .name(format!("device-{id}"))
            .spawn(move || {
                dispatcher::with_default(&dispatch, || {
                    match panic::catch_unwind(AssertUnwindSafe(move || worker.run())) {
                        Ok(result) => result,
                        Err(payload) => {
                            error!(device = %id, reason = %panic_message(payload.as_ref()), "worker panicked");
                            panic::resume_unwind(payload)
                        }
                    }
                })
            })?;
        info!(device = %id, "worker spawned");
        self.handles.push((id, handle));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for every worker.  A worker logs its own error or panic when it
    /// stops; here they are only collected, and never abort the join of the
    /// remaining workers.
    pub fn join(self) -> FleetReport {
        let mut report = FleetReport::default();
        for (id, handle) in self.handles {
            match handle.join() {
                Ok(Ok(summary)) => report.completed.push(summary),
                Ok(Err(e)) => report.failed.push((id, e.to_string())),
                Err(payload) => report.failed.push((id, panic_message(payload.as_ref()))),
            }
        }
        report
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}
