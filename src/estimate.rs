//! Traffic-adjusted duration estimate.

use serde::Serialize;

use crate::types::MatchedSegment;

/// How much of the matched traffic applies to the route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrafficCoverage {
    /// No traffic link matched the route at all.
    NoData,
    /// Links matched, but none on the route's own roads.
    NoRelevantData,
    Partial,
    Good,
}

/// Coarse label for the time delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrafficCondition {
    HeavyDelay,
    ModerateDelay,
    FasterThanExpected,
    Normal,
}

impl TrafficCondition {
    /// Thresholds are strict: exactly 20% is a moderate delay.
    pub fn classify(time_delta_percent: f64) -> Self {
        if time_delta_percent > 20.0 {
            TrafficCondition::HeavyDelay
        } else if time_delta_percent > 10.0 {
            TrafficCondition::ModerateDelay
        } else if time_delta_percent < -10.0 {
            TrafficCondition::FasterThanExpected
        } else {
            TrafficCondition::Normal
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TrafficCondition::HeavyDelay => "heavy_delay",
            TrafficCondition::ModerateDelay => "moderate_delay",
            TrafficCondition::FasterThanExpected => "faster_than_expected",
            TrafficCondition::Normal => "normal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpeedRange {
    pub min_kmh: f64,
    pub max_kmh: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteAnalysisResult {
    pub original_duration_seconds: f64,
    pub original_distance_meters: f64,
    pub matched_segments: Vec<MatchedSegment>,
    pub relevant_segments: Vec<MatchedSegment>,
    pub adjusted_duration_seconds: f64,
    pub time_delta_seconds: f64,
    pub time_delta_percent: f64,
    pub traffic_coverage: TrafficCoverage,
    /// Mean relevant speed; `None` when nothing relevant was found.
    pub average_speed_kmh: Option<f64>,
    pub speed_range_kmh: Option<SpeedRange>,
}

impl RouteAnalysisResult {
    pub fn condition(&self) -> TrafficCondition {
        TrafficCondition::classify(self.time_delta_percent)
    }

    pub fn time_delta_minutes(&self) -> f64 {
        self.time_delta_seconds / 60.0
    }

    pub fn matched_count(&self) -> usize {
        self.matched_segments.len()
    }

    pub fn relevant_count(&self) -> usize {
        self.relevant_segments.len()
    }

    /// Speed implied by the planned duration, when the duration is non-zero.
    pub fn original_average_speed_kmh(&self) -> Option<f64> {
        (self.original_duration_seconds > 0.0)
            .then(|| (self.original_distance_meters / 1000.0) / (self.original_duration_seconds / 3600.0))
    }
}

/// Reduces the relevant segments to an adjusted duration.
///
/// With nothing relevant the planned duration is returned untouched and the
/// coverage says so. A zero mean speed also falls back to the planned
/// duration, so the estimate is always finite.
pub fn aggregate(
    original_duration_seconds: f64,
    original_distance_meters: f64,
    matched_segments: Vec<MatchedSegment>,
    relevant_segments: Vec<MatchedSegment>,
) -> RouteAnalysisResult {
    if relevant_segments.is_empty() {
        let traffic_coverage = if matched_segments.is_empty() {
            TrafficCoverage::NoData
        } else {
            TrafficCoverage::NoRelevantData
        };
        return RouteAnalysisResult {
            original_duration_seconds,
            original_distance_meters,
            matched_segments,
            relevant_segments,
            adjusted_duration_seconds: original_duration_seconds,
            time_delta_seconds: 0.0,
            time_delta_percent: 0.0,
            traffic_coverage,
            average_speed_kmh: None,
            speed_range_kmh: None,
        };
    }

    let speeds: Vec<f64> = relevant_segments.iter().map(MatchedSegment::speed_kmh).collect();
    let average_speed_kmh = speeds.iter().sum::<f64>() / speeds.len() as f64;
    let speed_range = SpeedRange {
        min_kmh: speeds.iter().copied().fold(f64::INFINITY, f64::min),
        max_kmh: speeds.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    };

    let adjusted_duration_seconds = if average_speed_kmh > 0.0 {
        (original_distance_meters / 1000.0) / average_speed_kmh * 3600.0
    } else {
        original_duration_seconds
    };

    let time_delta_seconds = adjusted_duration_seconds - original_duration_seconds;
    let time_delta_percent = if original_duration_seconds > 0.0 {
        time_delta_seconds / original_duration_seconds * 100.0
    } else {
        0.0
    };

    let traffic_coverage = if relevant_segments.len() < matched_segments.len() {
        TrafficCoverage::Partial
    } else {
        TrafficCoverage::Good
    };

    RouteAnalysisResult {
        original_duration_seconds,
        original_distance_meters,
        matched_segments,
        relevant_segments,
        adjusted_duration_seconds,
        time_delta_seconds,
        time_delta_percent,
        traffic_coverage,
        average_speed_kmh: Some(average_speed_kmh),
        speed_range_kmh: Some(speed_range),
    }
}
