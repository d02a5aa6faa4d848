//! Test fixtures for route-traffic.
//!
//! Provides realistic test data including:
//! - Real Seoul locations and road names
//! - Scripted routing, traffic and link-table collaborators

#![allow(dead_code)]

pub mod seoul_locations;

pub use seoul_locations::*;

use route_traffic::error::{AnalysisError, FeedError};
use route_traffic::haversine::InMemoryLinkTable;
use route_traffic::traits::{RouteProvider, TrafficFeed};
use route_traffic::types::{BoundingBox, Coordinate, TrafficReading, Waypoint};
use serde_json::{Value, json};
use std::sync::Mutex;

/// Returns the same OSRM response for every request and remembers what it was asked.
pub struct ScriptedRouter {
    response: Value,
    pub requests: Mutex<Vec<Vec<Waypoint>>>,
}

impl ScriptedRouter {
    pub fn new(response: Value) -> Self {
        Self {
            response,
            requests: Mutex::new(Vec::new()),
        }
    }
}

impl RouteProvider for ScriptedRouter {
    fn route(&self, waypoints: &[Waypoint]) -> Result<Value, AnalysisError> {
        self.requests.lock().unwrap().push(waypoints.to_vec());
        Ok(self.response.clone())
    }
}

/// Serves fixed readings and records the boxes it was queried with.
pub struct ScriptedFeed {
    readings: Vec<TrafficReading>,
    pub boxes: Mutex<Vec<BoundingBox>>,
}

impl ScriptedFeed {
    pub fn new(readings: Vec<TrafficReading>) -> Self {
        Self {
            readings,
            boxes: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

impl TrafficFeed for ScriptedFeed {
    fn readings_for(&self, bbox: &BoundingBox) -> Result<Vec<TrafficReading>, FeedError> {
        self.boxes.lock().unwrap().push(*bbox);
        Ok(self.readings.clone())
    }
}

pub fn reading(link_id: &str, speed_kmh: f64, road_name: &str) -> TrafficReading {
    TrafficReading {
        link_id: link_id.to_string(),
        speed_kmh,
        travel_time_seconds: 30.0,
        road_name: road_name.to_string(),
        observed_at: None,
    }
}

pub fn coord(location: &Location) -> Coordinate {
    Coordinate::new(location.lng, location.lat).unwrap()
}

/// Offsets `location` north by roughly `meters`.
pub fn north_of(location: &Location, meters: f64) -> Coordinate {
    Coordinate::new(location.lng, location.lat + meters / 111_195.0).unwrap()
}

/// Straight-line OSRM response from `start` to `end` with the given step names.
pub fn osrm_response(start: &Location, end: &Location, duration: f64, distance: f64, steps: &[&str]) -> Value {
    let steps: Vec<Value> = steps.iter().map(|name| json!({"name": name})).collect();
    json!({
        "code": "Ok",
        "routes": [{
            "duration": duration,
            "distance": distance,
            "geometry": {
                "type": "LineString",
                "coordinates": [[start.lng, start.lat], [end.lng, end.lat]]
            },
            "legs": [{"steps": steps}]
        }],
        "waypoints": []
    })
}

/// Links laid along the straight line between `start` and `end`, offset
/// north by `offset_meters`, one per id.
pub fn links_along(start: &Location, end: &Location, offset_meters: f64, ids: &[&str]) -> InMemoryLinkTable {
    let count = ids.len() as f64;
    let mut table = InMemoryLinkTable::new("fixture_links");
    for (idx, id) in ids.iter().enumerate() {
        let t0 = (idx as f64 + 0.25) / count;
        let t1 = (idx as f64 + 0.75) / count;
        let at = |t: f64| {
            Coordinate::new(
                start.lng + (end.lng - start.lng) * t,
                start.lat + (end.lat - start.lat) * t + offset_meters / 111_195.0,
            )
            .unwrap()
        };
        table.insert(*id, at(t0), at(t1));
    }
    table
}
