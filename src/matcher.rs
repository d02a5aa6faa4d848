//! Spatial matching of traffic readings to a route.

use std::collections::HashMap;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{AnalysisError, LookupError};
use crate::polyline::{RouteGeometry, RouteLine};
use crate::traits::LinkGeometryLookup;
use crate::types::{MatchedSegment, TrafficReading};

/// Default search buffer around the route, in meters.
pub const DEFAULT_BUFFER_METERS: f64 = 50.0;

enum LinkOutcome {
    Matched(MatchedSegment),
    Missed,
    Unreachable(String),
}

/// Joins readings with link geometry lying within `buffer_meters` of the route.
///
/// Lookups are tried in order for each reading; a lookup that errors or has
/// no row falls through to the next. Readings nothing resolves are dropped.
/// The result is sorted by distance to the route, closest first, with input
/// order kept for ties.
///
/// Fails with `StoreUnavailable` only when the store cannot be reached at all.
pub fn match_traffic(
    geometry: &RouteGeometry,
    readings: &[TrafficReading],
    buffer_meters: f64,
    lookups: &[&dyn LinkGeometryLookup],
) -> Result<Vec<MatchedSegment>, AnalysisError> {
    if geometry.points().len() < 2 {
        return Err(AnalysisError::invalid_geometry(
            "route geometry needs at least 2 coordinates",
        ));
    }

    let candidates: Vec<&TrafficReading> = readings
        .iter()
        .filter(|reading| !reading.link_id.trim().is_empty())
        .collect();
    if candidates.len() < readings.len() {
        debug!(
            skipped = readings.len() - candidates.len(),
            "Skipping readings without a link id"
        );
    }
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let lookups = reachable_lookups(lookups)?;

    let line = RouteLine::new(geometry);
    let outcomes: Vec<LinkOutcome> = candidates
        .par_iter()
        .map(|reading| resolve_link(reading, &line, buffer_meters, &lookups))
        .collect();

    if outcomes
        .iter()
        .all(|outcome| matches!(outcome, LinkOutcome::Unreachable(_)))
    {
        let reason = outcomes
            .iter()
            .find_map(|outcome| match outcome {
                LinkOutcome::Unreachable(reason) => Some(reason.clone()),
                _ => None,
            })
            .unwrap_or_default();
        return Err(AnalysisError::StoreUnavailable(reason));
    }

    let mut matched: Vec<MatchedSegment> = outcomes
        .into_iter()
        .filter_map(|outcome| match outcome {
            LinkOutcome::Matched(segment) => Some(segment),
            LinkOutcome::Missed | LinkOutcome::Unreachable(_) => None,
        })
        .collect();

    // sort_by is stable, so equal distances keep reading order
    matched.sort_by(|a, b| {
        a.distance_to_route_meters()
            .total_cmp(&b.distance_to_route_meters())
    });

    info!(
        readings = readings.len(),
        matched = matched.len(),
        buffer_meters,
        "Matched traffic links to route"
    );
    Ok(matched)
}

/// Lookups whose store answers a connection check, in their original order.
///
/// Each distinct store is checked once, so a dead database costs one
/// connect timeout however many table layouts point at it.
fn reachable_lookups<'a>(
    lookups: &[&'a dyn LinkGeometryLookup],
) -> Result<Vec<&'a dyn LinkGeometryLookup>, AnalysisError> {
    let mut checked: HashMap<&str, bool> = HashMap::new();
    let mut last_error = String::from("no link lookups configured");
    let mut reachable = Vec::with_capacity(lookups.len());

    for &lookup in lookups {
        let key = lookup.store_key();
        let ok = match checked.get(key) {
            Some(ok) => *ok,
            None => {
                let ok = match lookup.check_connection() {
                    Ok(()) => true,
                    Err(err) => {
                        warn!(lookup = lookup.name(), error = %err, "Link store connection check failed");
                        last_error = err.to_string();
                        false
                    }
                };
                checked.insert(key, ok);
                ok
            }
        };
        if ok {
            reachable.push(lookup);
        }
    }

    if reachable.is_empty() {
        return Err(AnalysisError::StoreUnavailable(last_error));
    }
    Ok(reachable)
}

fn resolve_link(
    reading: &TrafficReading,
    line: &RouteLine,
    buffer_meters: f64,
    lookups: &[&dyn LinkGeometryLookup],
) -> LinkOutcome {
    let mut unreachable: Option<String> = None;
    let mut any_answered = false;

    for lookup in lookups {
        match lookup.lookup_link_geometry(&reading.link_id, line, buffer_meters) {
            Ok(Some(link)) => {
                return LinkOutcome::Matched(MatchedSegment {
                    reading: reading.clone(),
                    link,
                });
            }
            Ok(None) => any_answered = true,
            Err(LookupError::Query(reason)) => {
                any_answered = true;
                debug!(
                    link_id = %reading.link_id,
                    lookup = lookup.name(),
                    %reason,
                    "Link lookup failed, trying next"
                );
            }
            Err(LookupError::Unavailable(reason)) => {
                debug!(
                    link_id = %reading.link_id,
                    lookup = lookup.name(),
                    %reason,
                    "Link store unreachable for lookup"
                );
                unreachable = Some(reason);
            }
        }
    }

    match unreachable {
        Some(reason) if !any_answered => LinkOutcome::Unreachable(reason),
        _ => LinkOutcome::Missed,
    }
}
