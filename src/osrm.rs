//! OSRM HTTP adapter for route geometry.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::AnalysisError;
use crate::traits::RouteProvider;
use crate::types::Waypoint;

#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://router.project-osrm.org".to_string(),
            profile: "driving".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    /// `/route/v1` URL with full GeoJSON overview and turn-by-turn steps.
    pub fn route_url(&self, waypoints: &[Waypoint]) -> String {
        let coords = waypoints
            .iter()
            .map(|wp| format!("{:.6},{:.6}", wp.longitude, wp.latitude))
            .collect::<Vec<_>>()
            .join(";");

        format!(
            "{}/route/v1/{}/{}?overview=full&geometries=geojson&annotations=true&steps=true",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile,
            coords
        )
    }
}

impl RouteProvider for OsrmClient {
    fn route(&self, waypoints: &[Waypoint]) -> Result<Value, AnalysisError> {
        if waypoints.len() < 2 {
            return Err(AnalysisError::invalid_input("at least 2 waypoints are required"));
        }

        let url = self.route_url(waypoints);
        debug!(%url, "Requesting OSRM route");

        let body = self
            .client
            .get(&url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<Value>())
            .map_err(|err| {
                warn!(error = %err, "OSRM request failed");
                AnalysisError::RoutingUnavailable(err.to_string())
            })?;

        check_route_response(&body)?;
        Ok(body)
    }
}

#[derive(Debug, Deserialize)]
struct OsrmRouteStatus {
    code: Option<String>,
    message: Option<String>,
    #[serde(default)]
    routes: Vec<Value>,
}

/// Accepts only a response that reports `Ok` and carries at least one route.
pub fn check_route_response(body: &Value) -> Result<(), AnalysisError> {
    let status = OsrmRouteStatus::deserialize(body)
        .map_err(|err| AnalysisError::RoutingUnavailable(format!("unexpected OSRM response: {}", err)))?;

    match status.code.as_deref() {
        Some("Ok") | None => {}
        Some(code) => {
            return Err(AnalysisError::RoutingUnavailable(format!(
                "OSRM returned {}: {}",
                code,
                status.message.unwrap_or_default()
            )));
        }
    }

    if status.routes.is_empty() {
        return Err(AnalysisError::RoutingUnavailable(
            "OSRM returned no route between the waypoints".to_string(),
        ));
    }
    Ok(())
}
