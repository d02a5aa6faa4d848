//! Narrowing matched segments to the roads the route actually uses.
//!
//! Feed road names and router step names follow different abbreviation
//! conventions, so a segment counts as on-route when either name contains the
//! other, ignoring case.

use crate::geometry::RouteRoadSet;
use crate::types::MatchedSegment;

/// How a segment's road name relates to the route's roads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoadNameMatch {
    /// The route reported no names; nothing can be judged.
    NoRouteNames,
    /// The feed reported no name for the segment; nothing can be judged.
    Unnamed,
    Matched,
    Unrelated,
}

impl RoadNameMatch {
    fn is_relevant(self) -> bool {
        !matches!(self, RoadNameMatch::Unrelated)
    }
}

/// Case-folded route names, prepared once per filter pass.
struct FoldedRoads(Vec<String>);

impl FoldedRoads {
    fn new(roads: &RouteRoadSet) -> Self {
        Self(roads.iter().map(str::to_lowercase).collect())
    }

    fn classify(&self, road_name: &str) -> RoadNameMatch {
        if self.0.is_empty() {
            return RoadNameMatch::NoRouteNames;
        }
        let name = road_name.trim().to_lowercase();
        if name.is_empty() {
            return RoadNameMatch::Unnamed;
        }
        if self
            .0
            .iter()
            .any(|route_road| name.contains(route_road.as_str()) || route_road.contains(name.as_str()))
        {
            RoadNameMatch::Matched
        } else {
            RoadNameMatch::Unrelated
        }
    }
}

/// Keeps the segments relevant to `roads`, preserving order.
///
/// With an empty road set every segment passes through unchanged.
pub fn filter_relevant(matched: &[MatchedSegment], roads: &RouteRoadSet) -> Vec<MatchedSegment> {
    if roads.is_empty() {
        return matched.to_vec();
    }
    let folded = FoldedRoads::new(roads);
    matched
        .iter()
        .filter(|segment| folded.classify(segment.road_name()).is_relevant())
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Coordinate, NetworkLink, TrafficReading};

    fn segment(link_id: &str, road_name: &str) -> MatchedSegment {
        let point = Coordinate::new(127.0, 37.5).unwrap();
        MatchedSegment {
            reading: TrafficReading {
                link_id: link_id.to_string(),
                speed_kmh: 40.0,
                travel_time_seconds: 20.0,
                road_name: road_name.to_string(),
                observed_at: None,
            },
            link: NetworkLink {
                start: point,
                end: point,
                length_meters: 100.0,
                distance_to_route_meters: 0.0,
            },
        }
    }

    fn roads(names: &[&str]) -> RouteRoadSet {
        names.iter().copied().collect()
    }

    #[test]
    fn test_empty_road_set_passes_everything() {
        let matched = vec![segment("1", "Gangbyeon-bukro"), segment("2", "Teheran-ro"), segment("3", "")];
        let relevant = filter_relevant(&matched, &RouteRoadSet::new());
        assert_eq!(relevant, matched);
    }

    #[test]
    fn test_feed_name_contains_route_name() {
        let matched = vec![segment("1", "Olympic-daero (Expressway)"), segment("2", "Teheran-ro")];
        let relevant = filter_relevant(&matched, &roads(&["Olympic-daero"]));
        assert_eq!(relevant.len(), 1);
        assert_eq!(relevant[0].reading.link_id, "1");
    }

    #[test]
    fn test_route_name_contains_feed_name() {
        let matched = vec![segment("1", "Olympic"), segment("2", "Teheran-ro")];
        let relevant = filter_relevant(&matched, &roads(&["Olympic-daero"]));
        assert_eq!(relevant.len(), 1);
    }

    #[test]
    fn test_case_insensitive_both_ways() {
        let matched = vec![segment("1", "olympic-daero"), segment("2", "teheran-ro"), segment("3", "Nambu")];
        let route_roads = roads(&["Olympic-Daero", "Nambu Beltway"]);
        let relevant = filter_relevant(&matched, &route_roads);

        let upper: Vec<_> = matched
            .iter()
            .map(|m| segment(&m.reading.link_id, &m.reading.road_name.to_uppercase()))
            .collect();
        let upper_roads = roads(&["OLYMPIC-DAERO", "NAMBU BELTWAY"]);
        let upper_relevant = filter_relevant(&upper, &upper_roads);

        let ids = |segments: &[MatchedSegment]| -> Vec<String> {
            segments.iter().map(|s| s.reading.link_id.clone()).collect()
        };
        assert_eq!(ids(&relevant), vec!["1", "3"]);
        assert_eq!(ids(&relevant), ids(&upper_relevant));
    }

    #[test]
    fn test_order_preserved() {
        let matched = vec![segment("c", "Olympic-daero"), segment("a", "Teheran-ro"), segment("b", "Olympic-daero")];
        let relevant = filter_relevant(&matched, &roads(&["Olympic-daero"]));
        let ids: Vec<_> = relevant.iter().map(|s| s.reading.link_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b"]);
    }

    #[test]
    fn test_unnamed_segment_cannot_be_judged() {
        let folded = FoldedRoads::new(&roads(&["Olympic-daero"]));
        assert_eq!(folded.classify("  "), RoadNameMatch::Unnamed);
        assert_eq!(folded.classify("Teheran-ro"), RoadNameMatch::Unrelated);
        assert_eq!(folded.classify("OLYMPIC-DAERO (upper)"), RoadNameMatch::Matched);
        assert_eq!(FoldedRoads::new(&RouteRoadSet::new()).classify("x"), RoadNameMatch::NoRouteNames);
        assert!(RoadNameMatch::Unnamed.is_relevant());

        let matched = vec![segment("blank", "  "), segment("other", "Teheran-ro")];
        let relevant = filter_relevant(&matched, &roads(&["Olympic-daero"]));
        assert_eq!(relevant.len(), 1);
        assert_eq!(relevant[0].reading.link_id, "blank");
    }
}
