//! Shared data model for traffic-to-route matching.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// A (longitude, latitude) pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinate {
    /// Builds a coordinate, rejecting out-of-range or non-finite values.
    pub fn new(longitude: f64, latitude: f64) -> Result<Self, AnalysisError> {
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(AnalysisError::invalid_input(format!(
                "longitude {} out of range",
                longitude
            )));
        }
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(AnalysisError::invalid_input(format!(
                "latitude {} out of range",
                latitude
            )));
        }
        Ok(Self {
            longitude,
            latitude,
        })
    }
}

/// A caller-supplied stop on the route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Waypoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            name: None,
        }
    }

    pub fn named(latitude: f64, longitude: f64, name: impl Into<String>) -> Self {
        Self {
            latitude,
            longitude,
            name: Some(name.into()),
        }
    }

    pub fn coordinate(&self) -> Result<Coordinate, AnalysisError> {
        Coordinate::new(self.longitude, self.latitude)
    }
}

/// One live measurement from the traffic feed, keyed by network link.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrafficReading {
    pub link_id: String,
    pub speed_kmh: f64,
    pub travel_time_seconds: f64,
    pub road_name: String,
    /// Feed timestamp as reported (feed-local time).
    pub observed_at: Option<NaiveDateTime>,
}

/// Link geometry resolved from the network store for one reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NetworkLink {
    pub start: Coordinate,
    pub end: Coordinate,
    pub length_meters: f64,
    pub distance_to_route_meters: f64,
}

/// A traffic reading joined with its link geometry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedSegment {
    pub reading: TrafficReading,
    pub link: NetworkLink,
}

impl MatchedSegment {
    pub fn speed_kmh(&self) -> f64 {
        self.reading.speed_kmh
    }

    pub fn road_name(&self) -> &str {
        &self.reading.road_name
    }

    pub fn distance_to_route_meters(&self) -> f64 {
        self.link.distance_to_route_meters
    }
}

/// Axis-aligned box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min_lng: f64,
    pub max_lng: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}
