//! Output shapes for a finished analysis.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Value, json};

use crate::analysis::{RouteAnalysis, waypoint_type};
use crate::estimate::{SpeedRange, TrafficCondition, TrafficCoverage};
use crate::types::BoundingBox;

#[derive(Debug, Clone, Serialize)]
pub struct OriginalRouteSummary {
    pub duration_seconds: f64,
    pub distance_meters: f64,
    pub average_speed_kmh: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrafficSummary {
    pub total_segments_in_area: usize,
    pub relevant_segments: usize,
    pub coverage: TrafficCoverage,
    pub bbox_used: BoundingBox,
}

/// Estimate after traffic adjustment.
#[derive(Debug, Clone, Serialize)]
pub struct AdjustedRoute {
    pub duration_seconds: f64,
    pub distance_meters: f64,
    pub average_speed_kmh: Option<f64>,
    pub time_difference_seconds: f64,
    pub time_difference_percent: f64,
    pub traffic_segments: usize,
    pub total_traffic_segments_in_area: usize,
    pub traffic_coverage: TrafficCoverage,
    pub traffic_condition: TrafficCondition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_range: Option<SpeedRange>,
}

impl AdjustedRoute {
    pub fn from_analysis(analysis: &RouteAnalysis) -> Self {
        let result = &analysis.result;
        Self {
            duration_seconds: result.adjusted_duration_seconds,
            distance_meters: result.original_distance_meters,
            average_speed_kmh: result
                .average_speed_kmh
                .or_else(|| result.original_average_speed_kmh()),
            time_difference_seconds: result.time_delta_seconds,
            time_difference_percent: result.time_delta_percent,
            traffic_segments: result.relevant_count(),
            total_traffic_segments_in_area: result.matched_count(),
            traffic_coverage: result.traffic_coverage,
            traffic_condition: result.condition(),
            speed_range: result.speed_range_kmh,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSection {
    pub original_route: OriginalRouteSummary,
    pub traffic_data: TrafficSummary,
}

/// Everything about one analysis, ready to print.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub status: &'static str,
    pub route_name: String,
    pub timestamp: DateTime<Utc>,
    pub analysis: AnalysisSection,
    pub traffic_adjusted_route: AdjustedRoute,
    pub route_roads_detected: Vec<String>,
    pub recommendations: Vec<String>,
    /// Present only when at least one relevant segment was used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traffic_adjusted_route_original_format: Option<Value>,
}

impl AnalysisReport {
    pub fn from_analysis(analysis: &RouteAnalysis) -> Self {
        let result = &analysis.result;
        Self {
            status: "success",
            route_name: analysis.route_name.clone(),
            timestamp: analysis.analyzed_at,
            analysis: AnalysisSection {
                original_route: OriginalRouteSummary {
                    duration_seconds: result.original_duration_seconds,
                    distance_meters: result.original_distance_meters,
                    average_speed_kmh: result.original_average_speed_kmh(),
                },
                traffic_data: TrafficSummary {
                    total_segments_in_area: result.matched_count(),
                    relevant_segments: result.relevant_count(),
                    coverage: result.traffic_coverage,
                    bbox_used: analysis.bbox,
                },
            },
            traffic_adjusted_route: AdjustedRoute::from_analysis(analysis),
            route_roads_detected: analysis.route_roads.to_vec(),
            recommendations: analysis.recommendations.clone(),
            traffic_adjusted_route_original_format: adjusted_route_document(analysis),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SimpleSummary {
    pub status: &'static str,
    pub route_name: String,
    pub duration_seconds: f64,
    pub time_difference_seconds: f64,
    pub time_difference_minutes: f64,
    pub traffic_condition: TrafficCondition,
    pub average_speed_kmh: Option<f64>,
}

impl SimpleSummary {
    pub fn from_analysis(analysis: &RouteAnalysis) -> Self {
        let result = &analysis.result;
        Self {
            status: "success",
            route_name: analysis.route_name.clone(),
            duration_seconds: result.adjusted_duration_seconds,
            time_difference_seconds: result.time_delta_seconds,
            time_difference_minutes: result.time_delta_minutes(),
            traffic_condition: result.condition(),
            average_speed_kmh: result.average_speed_kmh,
        }
    }
}

/// Planned versus traffic-adjusted time between two named points.
#[derive(Debug, Clone, Serialize)]
pub struct RouteComparison {
    pub status: &'static str,
    pub route: String,
    pub distance_km: f64,
    pub estimated_duration_minutes: f64,
    pub traffic_adjusted_duration_minutes: f64,
    pub time_difference_minutes: f64,
    pub traffic_condition: TrafficCondition,
    /// Live average when relevant traffic exists, otherwise the planned average.
    pub average_speed_kmh: Option<f64>,
    pub roads_on_route: Vec<String>,
}

impl RouteComparison {
    pub fn from_analysis(analysis: &RouteAnalysis, start_name: &str, end_name: &str) -> Self {
        let result = &analysis.result;
        Self {
            status: "success",
            route: format!("{} → {}", start_name, end_name),
            distance_km: result.original_distance_meters / 1000.0,
            estimated_duration_minutes: result.original_duration_seconds / 60.0,
            traffic_adjusted_duration_minutes: result.adjusted_duration_seconds / 60.0,
            time_difference_minutes: result.time_delta_minutes(),
            traffic_condition: result.condition(),
            average_speed_kmh: result
                .average_speed_kmh
                .or_else(|| result.original_average_speed_kmh()),
            roads_on_route: analysis.route_roads.to_vec(),
        }
    }
}

/// The adjusted route in the wrapped routing-document shape, with a
/// `traffic_metadata` block. `None` unless relevant traffic was used.
pub fn adjusted_route_document(analysis: &RouteAnalysis) -> Option<Value> {
    let result = &analysis.result;
    if result.relevant_count() == 0 {
        return None;
    }

    let waypoints: Vec<Value> = if analysis.plan.waypoints.len() >= 2 {
        let len = analysis.plan.waypoints.len();
        analysis
            .plan
            .waypoints
            .iter()
            .enumerate()
            .map(|(idx, wp)| {
                json!({
                    "waypointType": waypoint_type(idx, len),
                    "name": wp.name.clone().unwrap_or_else(|| format!("Point {}", idx + 1)),
                    "location": {"longitude": wp.longitude, "latitude": wp.latitude},
                })
            })
            .collect()
    } else {
        let points = analysis.geometry.points();
        let endpoints = [
            ("break", "Start Location", points.first()),
            ("last", "End Location", points.last()),
        ];
        endpoints
            .into_iter()
            .filter_map(|(kind, name, point)| {
                point.map(|point| {
                    json!({
                        "waypointType": kind,
                        "name": name,
                        "location": {"longitude": point.longitude, "latitude": point.latitude},
                    })
                })
            })
            .collect()
    };

    let duration = result.adjusted_duration_seconds;
    let distance = result.original_distance_meters;

    Some(json!({
        "resultCode": "Ok",
        "result": [{
            "waypoints": waypoints,
            "routes": [{
                "weight_name": "",
                "weight": 0,
                "legs": [{
                    "summary": "Traffic-adjusted route",
                    "steps": [],
                    "duration": duration,
                    "distance": distance,
                }],
                "geometry": analysis.plan.geometry.clone(),
                "duration": duration,
                "distance": distance,
            }],
            "code": "Ok",
        }],
        "traffic_metadata": {
            "original_duration": result.original_duration_seconds,
            "traffic_adjusted_duration": duration,
            "time_difference_seconds": result.time_delta_seconds,
            "time_difference_percent": result.time_delta_percent,
            "traffic_segments_used": result.relevant_count(),
            "total_traffic_segments_in_area": result.matched_count(),
            "route_roads_detected": analysis.route_roads.to_vec(),
            "average_traffic_speed_kmh": result.average_speed_kmh.unwrap_or_default(),
            "timestamp": analysis.analyzed_at.to_rfc3339(),
        }
    }))
}
