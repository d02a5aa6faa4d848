//! User-facing advice derived from an analysis result.

use crate::estimate::{RouteAnalysisResult, TrafficCoverage};

/// Delay beyond which the driver is told to plan around traffic.
const DELAY_ADVISORY_MINUTES: f64 = 5.0;
/// Gain beyond which an early arrival is announced.
const EARLY_ARRIVAL_MINUTES: f64 = -2.0;
const HEAVY_TRAFFIC_KMH: f64 = 20.0;
const MODERATE_TRAFFIC_KMH: f64 = 30.0;
/// Relevant share of matched segments below which coverage is called limited.
const LOW_COVERAGE_RATIO: f64 = 0.1;

/// Advisory lines for `result`. Never empty.
pub fn recommend(result: &RouteAnalysisResult) -> Vec<String> {
    if matches!(
        result.traffic_coverage,
        TrafficCoverage::NoData | TrafficCoverage::NoRelevantData
    ) {
        return vec![
            "No traffic data available for the specific roads on this route; use the original route time estimate"
                .to_string(),
        ];
    }

    let mut recommendations = Vec::new();
    let relevant = result.relevant_count();
    let delta_minutes = result.time_delta_minutes();

    if relevant == 0 {
        recommendations.push("Limited traffic data available for this route".to_string());
        recommendations.push("Use original route time estimate with caution".to_string());
    } else if delta_minutes > DELAY_ADVISORY_MINUTES {
        recommendations.push(format!(
            "Expect {:.1} minutes longer than planned due to traffic",
            delta_minutes
        ));
        recommendations.push("Consider departing earlier or finding an alternative route".to_string());
    } else if delta_minutes < EARLY_ARRIVAL_MINUTES {
        recommendations.push(format!(
            "Traffic is flowing well - you may arrive {:.1} minutes earlier",
            delta_minutes.abs()
        ));
    } else {
        recommendations.push("Current traffic conditions are close to normal expectations".to_string());
    }

    if relevant > 0 {
        let average = result.average_speed_kmh.unwrap_or_default();
        let flow = if average < HEAVY_TRAFFIC_KMH {
            "Heavy traffic detected on monitored segments"
        } else if average < MODERATE_TRAFFIC_KMH {
            "Moderate traffic on monitored segments"
        } else {
            "Good traffic flow on monitored segments"
        };
        recommendations.push(flow.to_string());

        if (relevant as f64) < result.matched_count() as f64 * LOW_COVERAGE_RATIO {
            recommendations.push(format!(
                "Limited coverage: only {} relevant traffic segments found",
                relevant
            ));
        }
    }

    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimate::aggregate;
    use crate::types::{Coordinate, MatchedSegment, NetworkLink, TrafficReading};

    fn segment(speed: f64) -> MatchedSegment {
        let point = Coordinate::new(127.0, 37.5).unwrap();
        MatchedSegment {
            reading: TrafficReading {
                link_id: "1".to_string(),
                speed_kmh: speed,
                travel_time_seconds: 10.0,
                road_name: "Olympic-daero".to_string(),
                observed_at: None,
            },
            link: NetworkLink {
                start: point,
                end: point,
                length_meters: 50.0,
                distance_to_route_meters: 1.0,
            },
        }
    }

    #[test]
    fn test_no_data_single_advisory() {
        let result = aggregate(600.0, 9703.7, Vec::new(), Vec::new());
        let advice = recommend(&result);
        assert_eq!(advice.len(), 1);
        assert!(advice[0].contains("No traffic data"));
    }

    #[test]
    fn test_no_relevant_data_stops_early() {
        let result = aggregate(600.0, 9703.7, vec![segment(10.0)], Vec::new());
        let advice = recommend(&result);
        assert_eq!(advice.len(), 1);
        assert!(advice[0].contains("specific roads"));
    }

    #[test]
    fn test_reference_scenario_is_under_advisory_threshold() {
        // 273 s of delay is about 4.6 minutes, below the 5 minute advisory.
        let relevant = vec![segment(30.0), segment(50.0)];
        let result = aggregate(600.0, 9703.7, relevant.clone(), relevant);
        let advice = recommend(&result);
        assert_eq!(
            advice,
            vec![
                "Current traffic conditions are close to normal expectations".to_string(),
                "Good traffic flow on monitored segments".to_string(),
            ]
        );
    }

    #[test]
    fn test_delay_over_five_minutes() {
        // 10 km at 20 km/h is 30 minutes against a 20 minute plan.
        let relevant = vec![segment(20.0)];
        let result = aggregate(1200.0, 10_000.0, relevant.clone(), relevant);
        let advice = recommend(&result);
        assert_eq!(advice[0], "Expect 10.0 minutes longer than planned due to traffic");
        assert_eq!(advice[1], "Consider departing earlier or finding an alternative route");
        assert_eq!(advice[2], "Moderate traffic on monitored segments");
    }

    #[test]
    fn test_early_arrival() {
        // 10 km at 60 km/h is 10 minutes against a 15 minute plan.
        let relevant = vec![segment(60.0)];
        let result = aggregate(900.0, 10_000.0, relevant.clone(), relevant);
        let advice = recommend(&result);
        assert_eq!(advice[0], "Traffic is flowing well - you may arrive 5.0 minutes earlier");
        assert_eq!(advice[1], "Good traffic flow on monitored segments");
    }

    #[test]
    fn test_heavy_traffic_note_and_low_coverage() {
        // 1 km at 15 km/h is 4 minutes; the plan is 3 minutes.
        let matched: Vec<_> = (0..11).map(|_| segment(15.0)).collect();
        let relevant = vec![segment(15.0)];
        let result = aggregate(180.0, 1000.0, matched, relevant);
        let advice = recommend(&result);
        assert_eq!(advice[0], "Current traffic conditions are close to normal expectations");
        assert_eq!(advice[1], "Heavy traffic detected on monitored segments");
        assert_eq!(advice[2], "Limited coverage: only 1 relevant traffic segments found");
    }

    #[test]
    fn test_never_empty() {
        let relevant = vec![segment(40.0)];
        let result = aggregate(900.0, 10_000.0, relevant.clone(), relevant);
        assert!(!recommend(&result).is_empty());
    }
}
