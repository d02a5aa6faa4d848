//! End-to-end route analysis.
//!
//! Resolve geometry, fetch traffic for the route's area, match links, keep the
//! ones on the route's roads, estimate, and advise. Each stage only consumes
//! the output of the one before it.

use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::error::AnalysisError;
use crate::estimate::{RouteAnalysisResult, TrafficCondition, aggregate};
use crate::geometry::{RoutePlan, RouteRoadSet, resolve};
use crate::matcher::{DEFAULT_BUFFER_METERS, match_traffic};
use crate::polyline::{OSRM_POLYLINE_PRECISION, RouteGeometry};
use crate::recommend::recommend;
use crate::relevance::filter_relevant;
use crate::report::RouteComparison;
use crate::traits::{LinkGeometryLookup, RouteProvider, TrafficFeed};
use crate::types::{BoundingBox, Waypoint};

/// Margin added around the route when asking the feed for readings.
pub const DEFAULT_BBOX_MARGIN_DEGREES: f64 = 0.005;

#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub buffer_meters: f64,
    pub bbox_margin_degrees: f64,
    /// Precision for string geometries.
    pub polyline_precision: u32,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            buffer_meters: DEFAULT_BUFFER_METERS,
            bbox_margin_degrees: DEFAULT_BBOX_MARGIN_DEGREES,
            polyline_precision: OSRM_POLYLINE_PRECISION,
        }
    }
}

/// What the caller hands in.
#[derive(Debug, Clone)]
pub enum AnalysisInput {
    /// A route document already planned by the routing service.
    RouteDocument(Value),
    /// Stops to plan a route through first.
    Waypoints(Vec<Waypoint>),
}

#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub input: AnalysisInput,
    pub route_name: Option<String>,
}

impl AnalysisRequest {
    pub fn document(document: Value) -> Self {
        Self {
            input: AnalysisInput::RouteDocument(document),
            route_name: None,
        }
    }

    pub fn waypoints(waypoints: Vec<Waypoint>) -> Self {
        Self {
            input: AnalysisInput::Waypoints(waypoints),
            route_name: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.route_name = Some(name.into());
        self
    }
}

/// Everything produced for one request.
#[derive(Debug, Clone)]
pub struct RouteAnalysis {
    pub route_name: String,
    pub plan: RoutePlan,
    pub geometry: RouteGeometry,
    pub route_roads: RouteRoadSet,
    pub bbox: BoundingBox,
    pub result: RouteAnalysisResult,
    pub recommendations: Vec<String>,
    pub analyzed_at: DateTime<Utc>,
}

impl RouteAnalysis {
    pub fn condition(&self) -> TrafficCondition {
        self.result.condition()
    }
}

/// Owns the collaborators for repeated analyses.
pub struct Analyzer<R, F> {
    router: R,
    feed: F,
    lookups: Vec<Box<dyn LinkGeometryLookup>>,
    options: AnalysisOptions,
}

impl<R: RouteProvider, F: TrafficFeed> Analyzer<R, F> {
    pub fn new(router: R, feed: F, options: AnalysisOptions) -> Self {
        Self {
            router,
            feed,
            lookups: Vec::new(),
            options,
        }
    }

    /// Appends a lookup; earlier lookups take priority.
    pub fn with_lookup(mut self, lookup: impl LinkGeometryLookup + 'static) -> Self {
        self.lookups.push(Box::new(lookup));
        self
    }

    pub fn with_lookups<L>(mut self, lookups: impl IntoIterator<Item = L>) -> Self
    where
        L: LinkGeometryLookup + 'static,
    {
        for lookup in lookups {
            self.lookups.push(Box::new(lookup));
        }
        self
    }

    pub fn analyze(&self, request: AnalysisRequest) -> Result<RouteAnalysis, AnalysisError> {
        let lookups: Vec<&dyn LinkGeometryLookup> = self.lookups.iter().map(|lookup| &**lookup).collect();
        analyze(request, &self.router, &self.feed, &lookups, &self.options)
    }

    /// Plans and analyzes a two-point trip named `<start>_to_<end>`.
    pub fn compare(&self, start: Waypoint, end: Waypoint) -> Result<RouteComparison, AnalysisError> {
        let start_name = start.name.clone().unwrap_or_else(|| "Start".to_string());
        let end_name = end.name.clone().unwrap_or_else(|| "End".to_string());
        let request = AnalysisRequest::waypoints(vec![start, end])
            .named(format!("{}_to_{}", start_name, end_name));
        let analysis = self.analyze(request)?;
        Ok(RouteComparison::from_analysis(&analysis, &start_name, &end_name))
    }
}

/// Runs the full pipeline for one request.
pub fn analyze<R, F>(
    request: AnalysisRequest,
    router: &R,
    feed: &F,
    lookups: &[&dyn LinkGeometryLookup],
    options: &AnalysisOptions,
) -> Result<RouteAnalysis, AnalysisError>
where
    R: RouteProvider,
    F: TrafficFeed,
{
    let analyzed_at = Utc::now();
    let (document, default_name) = match request.input {
        AnalysisInput::RouteDocument(document) => {
            (document, format!("route_{}", analyzed_at.format("%Y%m%d_%H%M%S")))
        }
        AnalysisInput::Waypoints(waypoints) => {
            validate_waypoints(&waypoints)?;
            let response = router.route(&waypoints)?;
            let name = waypoint_route_name(&waypoints);
            (wrap_route_response(&waypoints, response), name)
        }
    };
    let route_name = request.route_name.unwrap_or(default_name);
    info!(%route_name, "Analyzing route");

    let plan = RoutePlan::from_document(&document)?;
    let (geometry, route_roads) = resolve(&plan, options.polyline_precision)?;
    let bbox = geometry.bounding_box(options.bbox_margin_degrees);

    let readings = match feed.readings_for(&bbox) {
        Ok(readings) => readings,
        Err(err) => {
            warn!(error = %err, "Traffic feed unavailable, continuing without readings");
            Vec::new()
        }
    };

    let matched = match_traffic(&geometry, &readings, options.buffer_meters, lookups)?;
    let relevant = filter_relevant(&matched, &route_roads);
    info!(
        roads = route_roads.len(),
        matched = matched.len(),
        relevant = relevant.len(),
        "Filtered traffic to route roads"
    );

    let result = aggregate(plan.duration_seconds, plan.distance_meters, matched, relevant);
    let recommendations = recommend(&result);

    Ok(RouteAnalysis {
        route_name,
        plan,
        geometry,
        route_roads,
        bbox,
        result,
        recommendations,
        analyzed_at,
    })
}

/// At least two waypoints, each with an in-range position.
pub fn validate_waypoints(waypoints: &[Waypoint]) -> Result<(), AnalysisError> {
    if waypoints.len() < 2 {
        return Err(AnalysisError::invalid_input("at least 2 waypoints are required"));
    }
    for (idx, waypoint) in waypoints.iter().enumerate() {
        waypoint
            .coordinate()
            .map_err(|err| AnalysisError::invalid_input(format!("waypoint {}: {}", idx, err)))?;
    }
    Ok(())
}

fn waypoint_route_name(waypoints: &[Waypoint]) -> String {
    let start = waypoints
        .first()
        .and_then(|wp| wp.name.as_deref())
        .unwrap_or("start");
    let end = waypoints
        .last()
        .and_then(|wp| wp.name.as_deref())
        .unwrap_or("end");
    format!("{}_to_{}", start, end)
}

pub(crate) fn waypoint_type(idx: usize, len: usize) -> &'static str {
    if idx == 0 {
        "break"
    } else if idx + 1 == len {
        "last"
    } else {
        "via"
    }
}

/// Wraps a routing-service response in the `result[]` document shape.
pub fn wrap_route_response(waypoints: &[Waypoint], response: Value) -> Value {
    let entries: Vec<Value> = waypoints
        .iter()
        .enumerate()
        .map(|(idx, wp)| {
            json!({
                "waypointType": waypoint_type(idx, waypoints.len()),
                "name": wp.name.clone().unwrap_or_else(|| format!("Point {}", idx + 1)),
                "location": {"longitude": wp.longitude, "latitude": wp.latitude},
            })
        })
        .collect();

    let code = response
        .get("code")
        .cloned()
        .unwrap_or_else(|| Value::String("Ok".to_string()));
    let routes = response
        .get("routes")
        .cloned()
        .unwrap_or_else(|| Value::Array(Vec::new()));

    json!({
        "resultCode": "Ok",
        "result": [{
            "waypoints": entries,
            "routes": routes,
            "code": code,
        }]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeedError;
    use crate::estimate::TrafficCoverage;
    use crate::haversine::InMemoryLinkTable;
    use crate::types::{Coordinate, TrafficReading};

    struct FixedRouter(Value);

    impl RouteProvider for FixedRouter {
        fn route(&self, _waypoints: &[Waypoint]) -> Result<Value, AnalysisError> {
            Ok(self.0.clone())
        }
    }

    struct DownRouter;

    impl RouteProvider for DownRouter {
        fn route(&self, _waypoints: &[Waypoint]) -> Result<Value, AnalysisError> {
            Err(AnalysisError::RoutingUnavailable("connection refused".to_string()))
        }
    }

    struct FixedFeed(Vec<TrafficReading>);

    impl TrafficFeed for FixedFeed {
        fn readings_for(&self, _bbox: &BoundingBox) -> Result<Vec<TrafficReading>, FeedError> {
            Ok(self.0.clone())
        }
    }

    struct DownFeed;

    impl TrafficFeed for DownFeed {
        fn readings_for(&self, _bbox: &BoundingBox) -> Result<Vec<TrafficReading>, FeedError> {
            Err(FeedError::MissingApiKey)
        }
    }

    fn coord(lng: f64, lat: f64) -> Coordinate {
        Coordinate::new(lng, lat).unwrap()
    }

    fn osrm_response() -> Value {
        json!({
            "code": "Ok",
            "routes": [{
                "duration": 600.0,
                "distance": 9703.7,
                "geometry": {"type": "LineString", "coordinates": [[127.00, 37.50], [127.02, 37.50]]},
                "legs": [{"steps": [{"name": "Olympic-daero"}, {"name": ""}]}]
            }]
        })
    }

    fn reading(link_id: &str, speed: f64, road: &str) -> TrafficReading {
        TrafficReading {
            link_id: link_id.to_string(),
            speed_kmh: speed,
            travel_time_seconds: 20.0,
            road_name: road.to_string(),
            observed_at: None,
        }
    }

    fn links() -> InMemoryLinkTable {
        InMemoryLinkTable::new("links")
            .with_link("1", coord(127.001, 37.50), coord(127.003, 37.50))
            .with_link("2", coord(127.005, 37.5001), coord(127.007, 37.5001))
            .with_link("3", coord(127.010, 37.5002), coord(127.012, 37.5002))
    }

    fn waypoints() -> Vec<Waypoint> {
        vec![Waypoint::named(37.50, 127.00, "Jamsil"), Waypoint::named(37.50, 127.02, "Yeouido")]
    }

    #[test]
    fn test_waypoint_pipeline() {
        let feed = FixedFeed(vec![
            reading("1", 30.0, "Olympic-daero"),
            reading("2", 50.0, "OLYMPIC-DAERO (upper)"),
            reading("3", 5.0, "Teheran-ro"),
        ]);
        let table = links();
        let analysis = analyze(
            AnalysisRequest::waypoints(waypoints()),
            &FixedRouter(osrm_response()),
            &feed,
            &[&table],
            &AnalysisOptions::default(),
        )
        .unwrap();

        assert_eq!(analysis.route_name, "Jamsil_to_Yeouido");
        assert_eq!(analysis.result.matched_count(), 3);
        assert_eq!(analysis.result.relevant_count(), 2);
        assert_eq!(analysis.result.traffic_coverage, TrafficCoverage::Partial);
        assert_eq!(analysis.result.average_speed_kmh, Some(40.0));
        assert_eq!(analysis.condition(), TrafficCondition::HeavyDelay);
        assert_eq!(analysis.plan.waypoints.len(), 2);
    }

    #[test]
    fn test_route_document_input_keeps_name() {
        let feed = FixedFeed(Vec::new());
        let analysis = analyze(
            AnalysisRequest::document(osrm_response()).named("commute"),
            &DownRouter,
            &feed,
            &[],
            &AnalysisOptions::default(),
        )
        .unwrap();
        assert_eq!(analysis.route_name, "commute");
        assert_eq!(analysis.result.traffic_coverage, TrafficCoverage::NoData);
        assert_eq!(analysis.result.adjusted_duration_seconds, 600.0);
        assert_eq!(analysis.recommendations.len(), 1);
    }

    #[test]
    fn test_feed_failure_degrades_to_no_data() {
        let table = links();
        let analysis = analyze(
            AnalysisRequest::waypoints(waypoints()),
            &FixedRouter(osrm_response()),
            &DownFeed,
            &[&table],
            &AnalysisOptions::default(),
        )
        .unwrap();
        assert_eq!(analysis.result.traffic_coverage, TrafficCoverage::NoData);
        assert_eq!(analysis.result.time_delta_seconds, 0.0);
    }

    #[test]
    fn test_routing_failure_propagates() {
        let err = analyze(
            AnalysisRequest::waypoints(waypoints()),
            &DownRouter,
            &FixedFeed(Vec::new()),
            &[],
            &AnalysisOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::RoutingUnavailable(_)));
    }

    #[test]
    fn test_single_waypoint_rejected() {
        let err = analyze(
            AnalysisRequest::waypoints(vec![Waypoint::new(37.5, 127.0)]),
            &FixedRouter(osrm_response()),
            &FixedFeed(Vec::new()),
            &[],
            &AnalysisOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidInput(_)));
    }

    #[test]
    fn test_out_of_range_waypoint_rejected() {
        let err = validate_waypoints(&[Waypoint::new(95.0, 127.0), Waypoint::new(37.5, 127.0)]).unwrap_err();
        assert!(err.to_string().contains("waypoint 0"));
    }

    #[test]
    fn test_analyzer_compare() {
        let analyzer = Analyzer::new(
            FixedRouter(osrm_response()),
            FixedFeed(vec![reading("1", 30.0, "Olympic-daero"), reading("2", 50.0, "Olympic-daero")]),
            AnalysisOptions::default(),
        )
        .with_lookup(links());
        let comparison = analyzer
            .compare(Waypoint::named(37.50, 127.00, "Jamsil"), Waypoint::new(37.50, 127.02))
            .unwrap();
        assert_eq!(comparison.route, "Jamsil → End");
        assert_eq!(comparison.traffic_condition, TrafficCondition::HeavyDelay);
        assert_eq!(comparison.average_speed_kmh, Some(40.0));
        assert_eq!(comparison.roads_on_route, vec!["Olympic-daero".to_string()]);
    }

    #[test]
    fn test_wrap_route_response_shape() {
        let stops = vec![
            Waypoint::new(37.5, 127.0),
            Waypoint::new(37.51, 127.01),
            Waypoint::named(37.52, 127.02, "End"),
        ];
        let doc = wrap_route_response(&stops, osrm_response());
        let entries = doc["result"][0]["waypoints"].as_array().unwrap();
        assert_eq!(entries[0]["waypointType"], "break");
        assert_eq!(entries[1]["waypointType"], "via");
        assert_eq!(entries[1]["name"], "Point 2");
        assert_eq!(entries[2]["waypointType"], "last");
        assert_eq!(entries[2]["name"], "End");
        assert_eq!(doc["result"][0]["routes"][0]["duration"], 600.0);
    }
}
