//! Environment-driven configuration.
//!
//! Every setting has a default except the traffic API key. Values that are
//! present but unparsable are rejected rather than silently defaulted.

use std::str::FromStr;

use crate::analysis::{AnalysisOptions, DEFAULT_BBOX_MARGIN_DEGREES};
use crate::error::AnalysisError;
use crate::matcher::DEFAULT_BUFFER_METERS;
use crate::osrm::OsrmConfig;
use crate::polyline::OSRM_POLYLINE_PRECISION;
use crate::store::{LinkTableSchema, StoreConfig};
use crate::traffic::TrafficConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub osrm: OsrmConfig,
    pub traffic: TrafficConfig,
    pub store: StoreConfig,
    pub analysis: AnalysisOptions,
}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick
    /// up a `.env` file.
    pub fn from_env() -> Result<Self, AnalysisError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<L>(lookup: L) -> Result<Self, AnalysisError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let positive_secs = |key: &str, default: u64| -> Result<u64, AnalysisError> {
            let secs = parse_or(key, get(key), default)?;
            if secs == 0 {
                return Err(AnalysisError::invalid_input(format!("{} must be at least 1", key)));
            }
            Ok(secs)
        };

        let osrm_defaults = OsrmConfig::default();
        let osrm = OsrmConfig {
            base_url: get("OSRM_BASE_URL").unwrap_or(osrm_defaults.base_url),
            profile: get("OSRM_PROFILE").unwrap_or(osrm_defaults.profile),
            timeout_secs: positive_secs("OSRM_TIMEOUT_SECS", osrm_defaults.timeout_secs)?,
        };

        let traffic_defaults = TrafficConfig::default();
        let traffic = TrafficConfig {
            base_url: get("TRAFFIC_API_URL").unwrap_or(traffic_defaults.base_url),
            api_key: get("TRAFFIC_API_KEY"),
            timeout_secs: positive_secs("TRAFFIC_TIMEOUT_SECS", traffic_defaults.timeout_secs)?,
        };

        let store_defaults = StoreConfig::default();
        let pool_size = parse_or("DB_POOL_SIZE", get("DB_POOL_SIZE"), store_defaults.pool_size)?;
        if pool_size == 0 {
            return Err(AnalysisError::invalid_input("DB_POOL_SIZE must be at least 1"));
        }
        let connect_timeout_secs = positive_secs("DB_CONNECT_TIMEOUT", store_defaults.connect_timeout_secs)?;
        let store = StoreConfig {
            database_url: get("DATABASE_URL").unwrap_or(store_defaults.database_url),
            connect_timeout_secs,
            pool_size,
            schemas: match get("LINK_TABLES") {
                Some(list) => LinkTableSchema::parse_list(&list)?,
                None => store_defaults.schemas,
            },
        };

        let buffer_meters = parse_or("MATCH_BUFFER_METERS", get("MATCH_BUFFER_METERS"), DEFAULT_BUFFER_METERS)?;
        let bbox_margin_degrees = parse_or(
            "BBOX_MARGIN_DEGREES",
            get("BBOX_MARGIN_DEGREES"),
            DEFAULT_BBOX_MARGIN_DEGREES,
        )?;
        if !buffer_meters.is_finite() || buffer_meters < 0.0 {
            return Err(AnalysisError::invalid_input("MATCH_BUFFER_METERS must be non-negative"));
        }
        if !bbox_margin_degrees.is_finite() || bbox_margin_degrees < 0.0 {
            return Err(AnalysisError::invalid_input("BBOX_MARGIN_DEGREES must be non-negative"));
        }

        Ok(Self {
            osrm,
            traffic,
            store,
            analysis: AnalysisOptions {
                buffer_meters,
                bbox_margin_degrees,
                polyline_precision: OSRM_POLYLINE_PRECISION,
            },
        })
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T, AnalysisError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|err| AnalysisError::invalid_input(format!("{}={:?}: {}", key, raw, err))),
    }
}
