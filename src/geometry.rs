//! Route document parsing and geometry resolution.
//!
//! Route documents arrive in two shapes: a bare OSRM response (`routes[]` at
//! the top level) or the wrapped form `{"result": [{"waypoints": [...],
//! "routes": [...]}]}`. [`RoutePlan::from_document`] validates either shape and
//! picks the first route; [`resolve`] turns that route into coordinates and the
//! set of road names it travels.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::error::AnalysisError;
use crate::polyline::RouteGeometry;
use crate::types::Waypoint;

/// Step names that carry no road identity.
const PLACEHOLDER_NAMES: [&str; 1] = ["unnamed"];

/// The first route of a validated route document.
#[derive(Debug, Clone)]
pub struct RoutePlan {
    pub duration_seconds: f64,
    pub distance_meters: f64,
    /// Raw `geometry` value: an encoded polyline or GeoJSON.
    pub geometry: Value,
    /// The selected route object, `legs` included.
    pub route: Value,
    /// Waypoints from the wrapped form; empty for a bare OSRM response.
    pub waypoints: Vec<Waypoint>,
}

impl RoutePlan {
    pub fn from_document(document: &Value) -> Result<Self, AnalysisError> {
        if !document.is_object() {
            return Err(AnalysisError::invalid_input("route document must be a JSON object"));
        }

        if let Some(result) = document.get("result") {
            let entry = result
                .as_array()
                .and_then(|entries| entries.first())
                .ok_or_else(|| AnalysisError::invalid_input("route document 'result' must be a non-empty array"))?;
            let waypoints = parse_waypoints(entry.get("waypoints"))?;
            let route = first_route(entry)?;
            return Self::from_route(route, waypoints);
        }

        if document.get("routes").is_some() {
            let route = first_route(document)?;
            return Self::from_route(route, Vec::new());
        }

        if document.get("duration").is_some() && document.get("distance").is_some() {
            return Self::from_route(document, Vec::new());
        }

        Err(AnalysisError::invalid_input(
            "route document has neither 'result' nor 'routes'",
        ))
    }

    fn from_route(route: &Value, waypoints: Vec<Waypoint>) -> Result<Self, AnalysisError> {
        let duration_seconds = non_negative(route, "duration")?;
        let distance_meters = non_negative(route, "distance")?;
        Ok(Self {
            duration_seconds,
            distance_meters,
            geometry: route.get("geometry").cloned().unwrap_or(Value::Null),
            route: route.clone(),
            waypoints,
        })
    }
}

fn first_route(container: &Value) -> Result<&Value, AnalysisError> {
    container
        .get("routes")
        .and_then(Value::as_array)
        .and_then(|routes| routes.first())
        .filter(|route| route.is_object())
        .ok_or_else(|| AnalysisError::invalid_input("route document has no routes"))
}

fn non_negative(route: &Value, field: &str) -> Result<f64, AnalysisError> {
    let value = route
        .get(field)
        .and_then(Value::as_f64)
        .ok_or_else(|| AnalysisError::invalid_input(format!("route is missing numeric '{}'", field)))?;
    if !value.is_finite() || value < 0.0 {
        return Err(AnalysisError::invalid_input(format!(
            "route '{}' must be non-negative, got {}",
            field, value
        )));
    }
    Ok(value)
}

fn parse_waypoints(value: Option<&Value>) -> Result<Vec<Waypoint>, AnalysisError> {
    let entries = value
        .and_then(Value::as_array)
        .ok_or_else(|| AnalysisError::invalid_input("route document is missing 'waypoints'"))?;
    if entries.len() < 2 {
        return Err(AnalysisError::invalid_input("at least 2 waypoints are required"));
    }

    entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            let location = entry.get("location");
            let latitude = location.and_then(|l| l.get("latitude")).and_then(Value::as_f64);
            let longitude = location.and_then(|l| l.get("longitude")).and_then(Value::as_f64);
            match (latitude, longitude) {
                (Some(latitude), Some(longitude)) => {
                    let waypoint = Waypoint {
                        latitude,
                        longitude,
                        name: entry.get("name").and_then(Value::as_str).map(str::to_string),
                    };
                    waypoint.coordinate()?;
                    Ok(waypoint)
                }
                _ => Err(AnalysisError::invalid_input(format!(
                    "waypoint {} is missing latitude or longitude",
                    idx
                ))),
            }
        })
        .collect()
}

/// Distinct road names a route travels. Order is not significant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteRoadSet {
    names: BTreeSet<String>,
}

impl RouteRoadSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a name unless it is blank or a placeholder.
    pub fn insert(&mut self, name: &str) -> bool {
        let trimmed = name.trim();
        if trimmed.is_empty()
            || PLACEHOLDER_NAMES
                .iter()
                .any(|placeholder| trimmed.eq_ignore_ascii_case(placeholder))
        {
            return false;
        }
        self.names.insert(trimmed.to_string())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.names.iter().cloned().collect()
    }
}

impl<'a> FromIterator<&'a str> for RouteRoadSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut set = Self::new();
        for name in iter {
            set.insert(name);
        }
        set
    }
}

/// Places legs are looked for, relative to the value handed in.
///
/// Anything else yields no names; it is never an error.
const LEG_PATHS: [&str; 3] = ["/legs", "/routes/0/legs", "/result/0/routes/0/legs"];

/// Collects step names from every recognized leg location in `value`.
pub fn extract_road_names(value: &Value) -> RouteRoadSet {
    let mut roads = RouteRoadSet::new();
    for path in LEG_PATHS {
        let Some(legs) = value.pointer(path).and_then(Value::as_array) else {
            continue;
        };
        for leg in legs {
            let Some(steps) = leg.get("steps").and_then(Value::as_array) else {
                continue;
            };
            for step in steps {
                if let Some(name) = step.get("name").and_then(Value::as_str) {
                    roads.insert(name);
                }
            }
        }
    }
    roads
}

/// Normalizes a raw geometry value into coordinates.
///
/// Strings are decoded as encoded polylines at `precision`; objects and arrays
/// are read as GeoJSON. A missing or undecodable geometry is an error.
pub fn resolve_geometry(raw: &Value, precision: u32) -> Result<RouteGeometry, AnalysisError> {
    match raw {
        Value::String(encoded) => RouteGeometry::decode(encoded, precision),
        Value::Object(_) | Value::Array(_) => RouteGeometry::from_geojson(raw),
        Value::Null => Err(AnalysisError::invalid_geometry("route has no geometry")),
        other => Err(AnalysisError::invalid_geometry(format!(
            "unsupported geometry value {}",
            other
        ))),
    }
}

/// Resolves a plan into its coordinate path and road-name set.
pub fn resolve(plan: &RoutePlan, precision: u32) -> Result<(RouteGeometry, RouteRoadSet), AnalysisError> {
    let geometry = resolve_geometry(&plan.geometry, precision)?;
    let roads = extract_road_names(&plan.route);
    Ok((geometry, roads))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn osrm_route() -> Value {
        json!({
            "duration": 600.3,
            "distance": 9703.7,
            "geometry": {
                "type": "LineString",
                "coordinates": [[126.812902, 37.577833], [126.85, 37.56], [126.895589, 37.538431]]
            },
            "legs": [{
                "steps": [
                    {"name": "Gonghang-daero"},
                    {"name": "Olympic-daero"},
                    {"name": ""},
                    {"name": "unnamed"},
                    {"name": "Olympic-daero"}
                ]
            }]
        })
    }

    fn wrapped(route: Value) -> Value {
        json!({
            "resultCode": "Ok",
            "result": [{
                "waypoints": [
                    {"waypointType": "break", "name": "Start", "location": {"longitude": 126.812902, "latitude": 37.577833}},
                    {"waypointType": "last", "name": "End", "location": {"longitude": 126.895589, "latitude": 37.538431}}
                ],
                "routes": [route]
            }]
        })
    }

    #[test]
    fn test_plan_from_wrapped_document() {
        let plan = RoutePlan::from_document(&wrapped(osrm_route())).unwrap();
        assert_eq!(plan.duration_seconds, 600.3);
        assert_eq!(plan.distance_meters, 9703.7);
        assert_eq!(plan.waypoints.len(), 2);
        assert_eq!(plan.waypoints[1].name.as_deref(), Some("End"));
    }

    #[test]
    fn test_plan_from_bare_osrm_response() {
        let doc = json!({"code": "Ok", "routes": [osrm_route()]});
        let plan = RoutePlan::from_document(&doc).unwrap();
        assert!(plan.waypoints.is_empty());
        assert!(plan.geometry.is_object());
    }

    #[test]
    fn test_plan_rejects_single_waypoint() {
        let mut doc = wrapped(osrm_route());
        doc["result"][0]["waypoints"].as_array_mut().unwrap().pop();
        assert!(matches!(
            RoutePlan::from_document(&doc),
            Err(AnalysisError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_plan_rejects_waypoint_without_location() {
        let mut doc = wrapped(osrm_route());
        doc["result"][0]["waypoints"][0]["location"] = json!({"longitude": 126.8});
        let err = RoutePlan::from_document(&doc).unwrap_err();
        assert!(err.to_string().contains("waypoint 0"));
    }

    #[test]
    fn test_plan_rejects_missing_duration() {
        let mut route = osrm_route();
        route.as_object_mut().unwrap().remove("duration");
        assert!(RoutePlan::from_document(&wrapped(route)).is_err());
    }

    #[test]
    fn test_plan_rejects_empty_routes() {
        let doc = json!({"code": "Ok", "routes": []});
        assert!(RoutePlan::from_document(&doc).is_err());
    }

    #[test]
    fn test_road_names_deduplicated_and_placeholders_dropped() {
        let roads = extract_road_names(&osrm_route());
        assert_eq!(roads.len(), 2);
        assert!(roads.contains("Gonghang-daero"));
        assert!(roads.contains("Olympic-daero"));
    }

    #[test]
    fn test_road_names_from_wrapped_document() {
        let roads = extract_road_names(&wrapped(osrm_route()));
        assert_eq!(roads.to_vec(), vec!["Gonghang-daero", "Olympic-daero"]);
    }

    #[test]
    fn test_road_names_missing_legs_is_empty() {
        let roads = extract_road_names(&json!({"duration": 1.0, "distance": 1.0}));
        assert!(roads.is_empty());
        let roads = extract_road_names(&json!({"legs": [{"summary": "no steps"}]}));
        assert!(roads.is_empty());
    }

    #[test]
    fn test_resolve_geojson_route() {
        let plan = RoutePlan::from_document(&wrapped(osrm_route())).unwrap();
        let (geometry, roads) = resolve(&plan, 5).unwrap();
        assert_eq!(geometry.points().len(), 3);
        assert_eq!(roads.len(), 2);
    }

    #[test]
    fn test_resolve_encoded_route() {
        let mut route = osrm_route();
        route["geometry"] = json!("_p~iF~ps|U_ulLnnqC_mqNvxq`@");
        let plan = RoutePlan::from_document(&json!({"routes": [route]})).unwrap();
        let (geometry, _) = resolve(&plan, 5).unwrap();
        assert_eq!(geometry.points().len(), 3);
    }

    #[test]
    fn test_undecodable_geometry_is_fatal() {
        let mut route = osrm_route();
        route["geometry"] = json!("");
        let plan = RoutePlan::from_document(&json!({"routes": [route]})).unwrap();
        assert!(matches!(resolve(&plan, 5), Err(AnalysisError::InvalidGeometry(_))));
    }

    #[test]
    fn test_missing_geometry_is_fatal() {
        let mut route = osrm_route();
        route.as_object_mut().unwrap().remove("geometry");
        let plan = RoutePlan::from_document(&json!({"routes": [route]})).unwrap();
        assert!(matches!(resolve(&plan, 5), Err(AnalysisError::InvalidGeometry(_))));
    }
}
