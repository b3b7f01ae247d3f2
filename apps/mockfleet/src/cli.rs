//! Command-line and environment configuration.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};

use mf_device::DeviceParams;
use mf_telemetry::thingspeak::DEFAULT_BASE_URL;

#[derive(Debug, Parser)]
#[command(name = "mockfleet", version, about = "Mock GPS/IoT devices publishing telemetry to ThingSpeak")]
pub struct Cli {
    #[command(subcommand)]
    pub mode: Mode,
}

#[derive(Debug, Subcommand)]
pub enum Mode {
    /// One device publishing field1..field6 every interval.
    Single(SingleArgs),
    /// Several devices, one thread each, publishing device and trip ids too.
    Fleet(FleetArgs),
}

#[derive(Debug, Args)]
pub struct SingleArgs {
    /// Seconds between readings.
    #[arg(long, default_value_t = 30)]
    pub interval_secs: u64,

    /// Maximum vehicle speed [default: 50].
    #[arg(long)]
    pub max_speed_kmh: Option<f64>,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Args)]
pub struct FleetArgs {
    /// Seconds between readings of each device.
    #[arg(long, default_value_t = 60)]
    pub interval_secs: u64,

    /// Maximum vehicle speed [default: 25].
    #[arg(long)]
    pub max_speed_kmh: Option<f64>,

    /// Number of simulated devices.
    #[arg(long, default_value_t = 2)]
    pub devices: u32,

    /// Seconds between device starts [default: interval / 2].
    #[arg(long)]
    pub stagger_secs: Option<f64>,

    /// Channel to read previous trip ids from.
    #[arg(long, env = "THINGSPEAK_CHANNEL_ID")]
    pub channel_id: Option<String>,

    #[arg(long, env = "THINGSPEAK_READ_API_KEY", hide_env_values = true)]
    pub read_key: Option<String>,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Motion {
    /// Shortest paths on a street network.
    Street,
    /// Cardinal random walk from a fixed start point.
    Wander,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Args)]
pub struct CommonArgs {
    /// OSM PBF extract to drive on; a built-in Santiago grid when omitted.
    #[arg(long)]
    pub osm: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Motion::Street)]
    pub motion: Motion,

    /// Stop each device after this many readings.
    #[arg(long)]
    pub ticks: Option<u64>,

    /// RNG seed; random when omitted.
    #[arg(long)]
    pub seed: Option<u64>,

    /// IANA time zone for the temperature curve.
    #[arg(long, default_value = "America/Santiago")]
    pub timezone: String,

    /// Device parameter overrides: inline JSON or a path to a JSON file.
    #[arg(long)]
    pub params: Option<String>,

    /// Append records to this CSV file instead of publishing to ThingSpeak.
    #[arg(long)]
    pub csv: Option<PathBuf>,

    #[arg(long, env = "THINGSPEAK_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(long, env = "THINGSPEAK_WRITE_API_KEY", hide_env_values = true)]
    pub write_key: Option<String>,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Level or filter directive, e.g. `info` or `mf_device=debug,info`.
    #[arg(long, env = "MOCKFLEET_LOG", default_value = "info")]
    pub log_level: String,
}

impl CommonArgs {
    /// The write key, required unless writing to CSV.
    pub fn require_write_key(&self) -> Result<Option<&str>> {
        match (&self.csv, &self.write_key) {
            (Some(_), _) => Ok(None),
            (None, Some(key)) if !key.is_empty() => Ok(Some(key)),
            (None, _) => bail!("THINGSPEAK_WRITE_API_KEY is not set (or pass --csv for offline mode)"),
        }
    }

    /// `base` with the `--params` overrides applied on top.
    pub fn device_params(&self, base: DeviceParams) -> Result<DeviceParams> {
        let Some(raw) = &self.params else {
            return Ok(base);
        };
        let text = if raw.trim_start().starts_with('{') {
            raw.clone()
        } else {
            std::fs::read_to_string(raw).with_context(|| format!("reading device params from {raw}"))?
        };
        let overrides: serde_json::Value =
            serde_json::from_str(&text).context("device params are not valid JSON")?;
        let mut merged = serde_json::to_value(base)?;
        merge(&mut merged, overrides);
        let params: DeviceParams = serde_json::from_value(merged).context("invalid device params")?;
        params.validate()?;
        Ok(params)
    }

    pub fn seed(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }
}

impl FleetArgs {
    /// Channel id and read key, required unless writing to CSV.
    pub fn require_read_access(&self) -> Result<Option<(&str, &str)>> {
        if self.common.csv.is_some() {
            return Ok(None);
        }
        match (&self.channel_id, &self.read_key) {
            (Some(channel), Some(key)) if !channel.is_empty() && !key.is_empty() => {
                Ok(Some((channel, key)))
            }
            _ => bail!(
                "fleet mode reads previous trip ids: set THINGSPEAK_CHANNEL_ID and \
                 THINGSPEAK_READ_API_KEY (or pass --csv for offline mode)"
            ),
        }
    }
}

/// Recursively overlay `patch` onto `target`; objects merge, anything else
/// replaces.
fn merge(target: &mut serde_json::Value, patch: serde_json::Value) {
    match (target, patch) {
        (serde_json::Value::Object(t), serde_json::Value::Object(p)) => {
            for (k, v) in p {
                merge(t.entry(k).or_insert(serde_json::Value::Null), v);
            }
        }
        (t, p) => *t = p,
    }
}
