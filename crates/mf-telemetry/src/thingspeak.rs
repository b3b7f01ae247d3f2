//! ThingSpeak channel API client (blocking).
//!
//! Writes go to `POST {base}/update.json` as a form; ThingSpeak answers with
//! the stored entry as JSON, or the literal body `0` when it refuses the
//! update (most often because the channel's rate limit was hit).  Trip
//! history is read from `GET {base}/channels/{id}/fields/8.json`.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use mf_core::TripId;

use crate::sink::{parse_trip_id, Delivery, TelemetrySink, TripHistory};
use crate::{TelemetryError, TelemetryRecord, TelemetryResult};

pub const DEFAULT_BASE_URL: &str = "https://api.thingspeak.com";

const WRITE_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(20);
/// ThingSpeak's per-request cap on returned entries.
const HISTORY_RESULTS: u32 = 8_000;

/// Channel credentials.
#[derive(Clone, Debug)]
pub struct ThingSpeakConfig {
    pub base_url:     String,
    pub write_key:    String,
    pub channel_id:   Option<String>,
    pub read_key:     Option<String>,
}

impl ThingSpeakConfig {
    pub fn new(write_key: impl Into<String>) -> Self {
        Self {
            base_url:   DEFAULT_BASE_URL.to_owned(),
            write_key:  write_key.into(),
            channel_id: None,
            read_key:   None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn with_read_access(mut self, channel_id: impl Into<String>, read_key: impl Into<String>) -> Self {
        self.channel_id = Some(channel_id.into());
        self.read_key = Some(read_key.into());
        self
    }
}

/// Blocking ThingSpeak client.  `reqwest::blocking::Client` is `Sync`, so
/// one instance is shared by all device threads.
pub struct ThingSpeakClient {
    http:   reqwest::blocking::Client,
    config: ThingSpeakConfig,
}

impl ThingSpeakClient {
    pub fn new(config: ThingSpeakConfig) -> TelemetryResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(concat!("mockfleet/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ThingSpeakConfig {
        &self.config
    }
}

impl TelemetrySink for ThingSpeakClient {
    fn publish(&self, record: &TelemetryRecord) -> TelemetryResult<Delivery> {
        let url = format!("{}/update.json", self.config.base_url);
        let mut form = record.fields();
        form.insert(0, ("api_key", self.config.write_key.clone()));

        let body = self
            .http
            .post(&url)
            .timeout(WRITE_TIMEOUT)
            .form(&form)
            .send()?
            .error_for_status()?
            .text()?;
        debug!(device = %record.device, %body, "update response");
        Ok(interpret_update_body(&body))
    }
}

impl TripHistory for ThingSpeakClient {
    fn latest_trip_id(&self) -> TelemetryResult<TripId> {
        let (Some(channel), Some(key)) = (&self.config.channel_id, &self.config.read_key) else {
            return Err(TelemetryError::MissingReadAccess);
        };
        let url = format!("{}/channels/{channel}/fields/8.json", self.config.base_url);
        let results = HISTORY_RESULTS.to_string();
        let body = self
            .http
            .get(&url)
            .timeout(READ_TIMEOUT)
            .query(&[("api_key", key.as_str()), ("results", results.as_str())])
            .send()?
            .error_for_status()?
            .text()?;
        max_trip_id(&body)
    }
}

// ── Response parsing ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct UpdateResponse {
    entry_id: Option<u64>,
}

/// Classify the body of an update response.
pub fn interpret_update_body(body: &str) -> Delivery {
    let body = body.trim();
    if body == "0" {
        return Delivery::Rejected;
    }
    let entry_id = serde_json::from_str::<UpdateResponse>(body)
        .ok()
        .and_then(|r| r.entry_id)
        .or_else(|| body.parse().ok());
    Delivery::Accepted { entry_id }
}

#[derive(Deserialize)]
struct FieldFeed {
    #[serde(default)]
    feeds: Vec<FeedEntry>,
}

#[derive(Deserialize)]
struct FeedEntry {
    // Usually a string; null or anything else is skipped.
    #[serde(default)]
    field8: Option<serde_json::Value>,
}

/// Highest all-digit `field8` in a channel field feed; `TripId::NONE` when
/// there are no feeds or no valid ids.
pub fn max_trip_id(body: &str) -> TelemetryResult<TripId> {
    let feed: FieldFeed = serde_json::from_str(body)?;
    Ok(feed
        .feeds
        .iter()
        .filter_map(|f| f.field8.as_ref().and_then(|v| v.as_str()).and_then(parse_trip_id))
        .max()
        .unwrap_or(TripId::NONE))
}
