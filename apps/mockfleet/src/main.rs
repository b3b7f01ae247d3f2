//! mockfleet — simulated GPS/IoT devices publishing to ThingSpeak.
//!
//! ```text
//! mockfleet single                       # one device, 30 s interval
//! mockfleet fleet --devices 4            # four devices, 60 s interval, staggered
//! mockfleet fleet --csv run.csv --ticks 100 --seed 7
//! ```
//!
//! Credentials come from `THINGSPEAK_WRITE_API_KEY`, and in fleet mode also
//! `THINGSPEAK_CHANNEL_ID` and `THINGSPEAK_READ_API_KEY`.  With `--csv`
//! nothing leaves the machine and none of them are needed.

mod cli;
mod logging;
mod network;


use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{error, info};

use mf_core::{Clock, DeviceId, DeviceRng, TripId, ZonedClock};
use mf_device::{Device, DeviceParams, MotionModel, RouteFollower, TripCounter, Wanderer};
use mf_sim::{DeviceWorker, FleetBuilder, FleetConfig, WorkerConfig};
use mf_spatial::{DijkstraRouter, RoadNetwork};
use mf_telemetry::{
    CsvHistory, CsvSink, TelemetrySink, ThingSpeakClient, ThingSpeakConfig, TripHistory,
};

use cli::{Cli, CommonArgs, FleetArgs, Mode, Motion, SingleArgs};

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    let common = match &cli.mode {
        Mode::Single(a) => &a.common,
        Mode::Fleet(a) => &a.common,
    };
    logging::init(common.log_format, &common.log_level)?;

    match cli.mode {
        Mode::Single(args) => run_single(args),
        Mode::Fleet(args) => run_fleet(args),
    }
}

// ── Single device ─────────────────────────────────────────────────────────────

fn run_single(args: SingleArgs) -> Result<()> {
    let common = &args.common;
    let mut params = common.device_params(DeviceParams::single())?;
    if let Some(kmh) = args.max_speed_kmh {
        params.max_speed_kmh = kmh;
    }
    params.validate()?;

    let sink = make_sink(common)?;
    let clock = ZonedClock::from_name(&common.timezone)?;
    let interval = interval(args.interval_secs)?;
    let seed = common.seed();
    let id = DeviceId(1);
    let mut rng = DeviceRng::new(seed, id);

    let motion: Box<dyn MotionModel> = match common.motion {
        Motion::Street => {
            let network = Arc::new(load_network(common)?);
            Box::new(RouteFollower::new(
                network,
                DijkstraRouter,
                Arc::new(TripCounter::default()),
                params.max_speed_mps(),
            )?)
        }
        Motion::Wander => Box::new(Wanderer::new(params.wander.clone(), params.max_speed_mps(), &mut rng)),
    };

    let device = Device::new(id, &params, motion, rng, interval.as_secs_f64())?;
    let config = WorkerConfig { max_ticks: common.ticks, ..WorkerConfig::new(interval) };

    info!(
        seed,
        interval_secs = interval.as_secs(),
        max_speed_kmh = params.max_speed_kmh,
        timezone = %clock.timezone(),
        "starting single-device simulation"
    );
    let summary = mf_sim::run_single(DeviceWorker::new(device, sink, Arc::new(clock), config))?;
    info!(
        ticks = summary.ticks,
        accepted = summary.accepted,
        rejected = summary.rejected,
        failed = summary.failed,
        "simulation finished"
    );
    Ok(())
}

// ── Fleet ─────────────────────────────────────────────────────────────────────

fn run_fleet(args: FleetArgs) -> Result<()> {
    let common = &args.common;
    let mut params = common.device_params(DeviceParams::default())?;
    if let Some(kmh) = args.max_speed_kmh {
        params.max_speed_kmh = kmh;
    }
    params.validate()?;

    let read_access = args.require_read_access()?;
    let clock: Arc<dyn Clock> = Arc::new(ZonedClock::from_name(&common.timezone)?);
    let interval = interval(args.interval_secs)?;
    let stagger = args
        .stagger_secs
        .map(Duration::try_from_secs_f64)
        .transpose()
        .context("--stagger-secs must be a non-negative number")?;

    // Trip ids continue from the highest one already published.  Without
    // that number new ids could collide with old ones, so failure is fatal.
    let (sink, latest): (Arc<dyn TelemetrySink>, TripId) = match &common.csv {
        Some(path) => {
            let latest = CsvHistory::new(path).latest_trip_id()?;
            (Arc::new(CsvSink::open(path)?), latest)
        }
        None => {
            let client = Arc::new(thingspeak_client(common, read_access)?);
            let latest = client
                .latest_trip_id()
                .context("could not read previous trip ids; refusing to start")?;
            (client, latest)
        }
    };
    info!(last_trip = %latest, next_trip = %latest.next(), "trip history loaded");
    let trips = Arc::new(TripCounter::seeded(latest));

    let config = FleetConfig {
        devices: args.devices,
        interval,
        stagger,
        max_ticks: common.ticks,
        seed: common.seed(),
        params,
        realtime: true,
    };
    info!(
        devices = config.devices,
        interval_secs = interval.as_secs(),
        stagger_secs = config.stagger().as_secs_f64(),
        seed = config.seed,
        "starting fleet simulation"
    );

    let builder = FleetBuilder::new(config, sink, clock, trips);
    let fleet = match common.motion {
        Motion::Street => builder.spawn_street(Arc::new(load_network(common)?))?,
        Motion::Wander => builder.spawn_wander()?,
    };

    let report = fleet.join();
    for s in &report.completed {
        info!(
            device = %s.device,
            ticks = s.ticks,
            accepted = s.accepted,
            rejected = s.rejected,
            failed = s.failed,
            "device finished"
        );
    }
    for (device, reason) in &report.failed {
        error!(device = %device, %reason, "device stopped");
    }
    if report.completed.is_empty() && !report.failed.is_empty() {
        bail!("every device stopped with an error");
    }
    Ok(())
}

// ── Wiring helpers ────────────────────────────────────────────────────────────

fn interval(secs: u64) -> Result<Duration> {
    if secs == 0 {
        bail!("--interval-secs must be at least 1");
    }
    Ok(Duration::from_secs(secs))
}

fn load_network(common: &CommonArgs) -> Result<RoadNetwork> {
    let network = network::load(common.osm.as_deref())?;
    info!(
        nodes = network.node_count(),
        edges = network.edge_count(),
        utm_zone = network.projection().zone,
        source = common.osm.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "built-in grid".into()),
        "street network ready"
    );
    Ok(network)
}

fn thingspeak_client(common: &CommonArgs, read_access: Option<(&str, &str)>) -> Result<ThingSpeakClient> {
    let key = common.require_write_key()?.unwrap_or_default();
    let mut config = ThingSpeakConfig::new(key).with_base_url(common.base_url.as_str());
    if let Some((channel, read_key)) = read_access {
        config = config.with_read_access(channel, read_key);
    }
    Ok(ThingSpeakClient::new(config)?)
}

fn make_sink(common: &CommonArgs) -> Result<Arc<dyn TelemetrySink>> {
    match &common.csv {
        Some(path) => {
            let sink = CsvSink::open(path).with_context(|| format!("opening {}", path.display()))?;
            info!(path = %path.display(), "writing telemetry to CSV");
            Ok(Arc::new(sink))
        }
        None => Ok(Arc::new(thingspeak_client(common, None)?)),
    }
}
