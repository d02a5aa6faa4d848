//! Live traffic feed: document parsing and HTTP client.
//!
//! The feed returns readings under `body.items` (current API) or `data`
//! (older deployments). Numeric fields are frequently sent as strings.

use chrono::{DateTime, NaiveDateTime};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::FeedError;
use crate::traits::TrafficFeed;
use crate::types::{BoundingBox, TrafficReading};

/// Timestamp layout used by the feed's `createdDate`.
const FEED_DATE_FORMAT: &str = "%Y%m%d%H%M%S";

/// Extracts readings from a feed document.
///
/// Items without a `linkId` are ignored. Missing `speed`/`travelTime` count
/// as zero; values that are present but negative or unparsable drop the item.
pub fn parse_feed_document(document: &Value) -> Vec<TrafficReading> {
    let items = document
        .pointer("/body/items")
        .and_then(Value::as_array)
        .or_else(|| document.get("data").and_then(Value::as_array));

    let Some(items) = items else {
        debug!("Traffic document has no body.items or data array");
        return Vec::new();
    };

    items.iter().filter_map(parse_item).collect()
}

fn parse_item(item: &Value) -> Option<TrafficReading> {
    let link_id = match item.get("linkId")? {
        Value::String(id) if !id.trim().is_empty() => id.trim().to_string(),
        Value::Number(id) => id.to_string(),
        _ => return None,
    };

    let speed_kmh = measurement(item, "speed", &link_id)?;
    let travel_time_seconds = measurement(item, "travelTime", &link_id)?;

    Some(TrafficReading {
        road_name: item
            .get("roadName")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string(),
        observed_at: item
            .get("createdDate")
            .and_then(Value::as_str)
            .and_then(parse_feed_date),
        link_id,
        speed_kmh,
        travel_time_seconds,
    })
}

fn measurement(item: &Value, field: &str, link_id: &str) -> Option<f64> {
    let value = match item.get(field) {
        None | Some(Value::Null) => return Some(0.0),
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) if text.trim().is_empty() => Some(0.0),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    match value {
        Some(value) if value.is_finite() && value >= 0.0 => Some(value),
        _ => {
            debug!(%link_id, field, "Dropping reading with malformed measurement");
            None
        }
    }
}

/// Parses `YYYYMMDDHHMMSS` or RFC 3339; anything else is `None`.
pub fn parse_feed_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, FEED_DATE_FORMAT)
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.naive_local()))
}

#[derive(Debug, Clone)]
pub struct TrafficConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openapi.its.go.kr:9443/trafficInfo".to_string(),
            api_key: None,
            timeout_secs: 10,
        }
    }
}

/// HTTP client for the ITS traffic-information API.
#[derive(Debug, Clone)]
pub struct ItsTrafficClient {
    config: TrafficConfig,
    client: reqwest::blocking::Client,
}

impl ItsTrafficClient {
    pub fn new(config: TrafficConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }
}

impl TrafficFeed for ItsTrafficClient {
    fn readings_for(&self, bbox: &BoundingBox) -> Result<Vec<TrafficReading>, FeedError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(FeedError::MissingApiKey)?;

        let params = [
            ("apiKey", api_key.to_string()),
            ("type", "all".to_string()),
            ("drcType", "all".to_string()),
            ("minX", format!("{:.6}", bbox.min_lng)),
            ("maxX", format!("{:.6}", bbox.max_lng)),
            ("minY", format!("{:.6}", bbox.min_lat)),
            ("maxY", format!("{:.6}", bbox.max_lat)),
            ("getType", "json".to_string()),
        ];

        let document: Value = self
            .client
            .get(&self.config.base_url)
            .query(&params)
            .send()
            .and_then(|resp| resp.error_for_status())?
            .json()?;

        if !document.is_object() {
            return Err(FeedError::Malformed("expected a JSON object".to_string()));
        }

        let readings = parse_feed_document(&document);
        info!(readings = readings.len(), "Fetched traffic readings");
        Ok(readings)
    }
}
