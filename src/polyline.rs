//! Route geometry as an ordered coordinate sequence.
//!
//! Routing documents carry geometry either as an encoded polyline string or
//! as GeoJSON. Both are normalized here into a [`RouteGeometry`]; anything that
//! cannot produce at least two valid coordinates is rejected.

use geo_types::{Coord, LineString};
use serde::Serialize;
use serde_json::Value;

use crate::error::AnalysisError;
use crate::types::{BoundingBox, Coordinate};

/// Precision used by OSRM's default `polyline` geometry format.
pub const OSRM_POLYLINE_PRECISION: u32 = 5;

/// The path actually driven, as (longitude, latitude) points.
///
/// Always holds at least two coordinates; construction fails otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteGeometry {
    points: Vec<Coordinate>,
}

impl RouteGeometry {
    pub fn new(points: Vec<Coordinate>) -> Result<Self, AnalysisError> {
        if points.len() < 2 {
            return Err(AnalysisError::invalid_geometry(format!(
                "route geometry needs at least 2 coordinates, got {}",
                points.len()
            )));
        }
        Ok(Self { points })
    }

    /// Decodes an encoded polyline string.
    pub fn decode(encoded: &str, precision: u32) -> Result<Self, AnalysisError> {
        let line = polyline::decode_polyline(encoded, precision)
            .map_err(|err| AnalysisError::invalid_geometry(format!("polyline decode failed: {:?}", err)))?;

        let points = line
            .coords()
            .map(|coord| Coordinate::new(coord.x, coord.y))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| AnalysisError::invalid_geometry(err.to_string()))?;

        Self::new(points)
    }

    /// Parses a GeoJSON `LineString` object or a bare `[[lng, lat], ...]` array.
    pub fn from_geojson(value: &Value) -> Result<Self, AnalysisError> {
        let coordinates = match value {
            Value::Array(items) => items,
            Value::Object(map) => match map.get("coordinates") {
                Some(Value::Array(items)) => items,
                _ => {
                    return Err(AnalysisError::invalid_geometry(
                        "geometry object has no coordinates array",
                    ));
                }
            },
            _ => {
                return Err(AnalysisError::invalid_geometry(
                    "geometry is neither a string nor a coordinate list",
                ));
            }
        };

        let mut points = Vec::with_capacity(coordinates.len());
        for pair in coordinates {
            let lng = pair.get(0).and_then(Value::as_f64);
            let lat = pair.get(1).and_then(Value::as_f64);
            match (lng, lat) {
                (Some(lng), Some(lat)) => points.push(
                    Coordinate::new(lng, lat)
                        .map_err(|err| AnalysisError::invalid_geometry(err.to_string()))?,
                ),
                _ => {
                    return Err(AnalysisError::invalid_geometry(format!(
                        "malformed coordinate {}",
                        pair
                    )));
                }
            }
        }

        Self::new(points)
    }

    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    /// As a `geo_types` line for use with the geo ecosystem.
    pub fn line_string(&self) -> LineString<f64> {
        LineString::new(
            self.points
                .iter()
                .map(|point| Coord {
                    x: point.longitude,
                    y: point.latitude,
                })
                .collect(),
        )
    }

    /// Well-known-text `LINESTRING(lng lat, ...)` for SRID 4326 queries.
    pub fn to_wkt(&self) -> String {
        let pairs = self
            .points
            .iter()
            .map(|point| format!("{} {}", point.longitude, point.latitude))
            .collect::<Vec<_>>()
            .join(", ");
        format!("LINESTRING({})", pairs)
    }

    /// Bounds of the route, grown by `margin_degrees` on every side.
    pub fn bounding_box(&self, margin_degrees: f64) -> BoundingBox {
        let mut bbox = BoundingBox {
            min_lng: f64::INFINITY,
            max_lng: f64::NEG_INFINITY,
            min_lat: f64::INFINITY,
            max_lat: f64::NEG_INFINITY,
        };
        for point in &self.points {
            bbox.min_lng = bbox.min_lng.min(point.longitude);
            bbox.max_lng = bbox.max_lng.max(point.longitude);
            bbox.min_lat = bbox.min_lat.min(point.latitude);
            bbox.max_lat = bbox.max_lat.max(point.latitude);
        }
        BoundingBox {
            min_lng: bbox.min_lng - margin_degrees,
            max_lng: bbox.max_lng + margin_degrees,
            min_lat: bbox.min_lat - margin_degrees,
            max_lat: bbox.max_lat + margin_degrees,
        }
    }
}

/// A route prepared for link lookups: the line once for in-process distance
/// checks and once as WKT for store queries.
#[derive(Debug, Clone)]
pub struct RouteLine {
    line: LineString<f64>,
    wkt: String,
}

impl RouteLine {
    pub fn new(geometry: &RouteGeometry) -> Self {
        Self {
            line: geometry.line_string(),
            wkt: geometry.to_wkt(),
        }
    }

    pub fn line(&self) -> &LineString<f64> {
        &self.line
    }

    pub fn wkt(&self) -> &str {
        &self.wkt
    }
}
