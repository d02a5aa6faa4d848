//! Geodesic distance helpers and an in-memory link table.
//!
//! Distances use great-circle math for lengths and a local equirectangular
//! projection for point/segment proximity, which is accurate to well under a
//! meter at the buffer distances used for matching.
//! [`InMemoryLinkTable`] is a store adapter that needs no database, for
//! embedding callers and tests that supply link geometry themselves.

use std::collections::HashMap;

use crate::error::LookupError;
use geo_types::{Coord, LineString};

use crate::polyline::RouteLine;
use crate::traits::LinkGeometryLookup;
use crate::types::{Coordinate, NetworkLink};

/// Mean Earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Great-circle distance between two coordinates in meters.
pub fn haversine_meters(from: &Coordinate, to: &Coordinate) -> f64 {
    let lat1_rad = from.latitude.to_radians();
    let lat2_rad = to.latitude.to_radians();
    let delta_lat = (to.latitude - from.latitude).to_radians();
    let delta_lng = (to.longitude - from.longitude).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_M * c
}

/// Planar (x, y) in meters relative to `origin`.
fn project(origin: &Coordinate, point: &Coordinate) -> (f64, f64) {
    let mean_lat = ((origin.latitude + point.latitude) / 2.0).to_radians();
    let x = (point.longitude - origin.longitude).to_radians() * mean_lat.cos() * EARTH_RADIUS_M;
    let y = (point.latitude - origin.latitude).to_radians() * EARTH_RADIUS_M;
    (x, y)
}

fn point_segment_distance(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq == 0.0 {
        0.0
    } else {
        (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len_sq).clamp(0.0, 1.0)
    };
    let (cx, cy) = (a.0 + t * dx, a.1 + t * dy);
    ((p.0 - cx).powi(2) + (p.1 - cy).powi(2)).sqrt()
}

fn cross(o: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}

fn segments_cross(a: (f64, f64), b: (f64, f64), c: (f64, f64), d: (f64, f64)) -> bool {
    let d1 = cross(c, d, a);
    let d2 = cross(c, d, b);
    let d3 = cross(a, b, c);
    let d4 = cross(a, b, d);
    ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
}

fn from_coord(coord: Coord<f64>) -> Coordinate {
    Coordinate {
        longitude: coord.x,
        latitude: coord.y,
    }
}

/// Shortest distance in meters between segment `start..end` and the route line.
pub fn distance_to_route_meters(start: &Coordinate, end: &Coordinate, route: &LineString<f64>) -> f64 {
    let origin = start;
    let a = project(origin, start);
    let b = project(origin, end);

    route
        .lines()
        .map(|line| {
            let c = project(origin, &from_coord(line.start));
            let d = project(origin, &from_coord(line.end));
            if segments_cross(a, b, c, d) {
                return 0.0;
            }
            point_segment_distance(a, c, d)
                .min(point_segment_distance(b, c, d))
                .min(point_segment_distance(c, a, b))
                .min(point_segment_distance(d, a, b))
        })
        .fold(f64::INFINITY, f64::min)
}

/// Link endpoints keyed by link identifier, held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLinkTable {
    name: String,
    links: HashMap<String, (Coordinate, Coordinate)>,
}

impl InMemoryLinkTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            links: HashMap::new(),
        }
    }

    pub fn insert(&mut self, link_id: impl Into<String>, start: Coordinate, end: Coordinate) {
        self.links.insert(link_id.into(), (start, end));
    }

    pub fn with_link(mut self, link_id: impl Into<String>, start: Coordinate, end: Coordinate) -> Self {
        self.insert(link_id, start, end);
        self
    }

}

impl LinkGeometryLookup for InMemoryLinkTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookup_link_geometry(
        &self,
        link_id: &str,
        route: &RouteLine,
        buffer_meters: f64,
    ) -> Result<Option<NetworkLink>, LookupError> {
        let Some((start, end)) = self.links.get(link_id) else {
            return Ok(None);
        };

        let distance = distance_to_route_meters(start, end, route.line());
        if distance > buffer_meters {
            return Ok(None);
        }

        Ok(Some(NetworkLink {
            start: *start,
            end: *end,
            length_meters: haversine_meters(start, end),
            distance_to_route_meters: distance,
        }))
    }
}
