//! Capability seams to the external collaborators.
//!
//! The analysis core only talks to the routing service, the live traffic
//! feed and the network-geometry store through these traits. Concrete
//! adapters live in `osrm`, `traffic`, `store` and `haversine`.

use serde_json::Value;

use crate::error::{AnalysisError, FeedError, LookupError};
use crate::polyline::RouteLine;
use crate::types::{BoundingBox, NetworkLink, TrafficReading, Waypoint};

/// Plans a route through the given waypoints.
pub trait RouteProvider {
    /// Returns an OSRM-compatible route response (`routes[]` at the top level).
    fn route(&self, waypoints: &[Waypoint]) -> Result<Value, AnalysisError>;
}

/// Supplies a batch of live traffic readings for an area.
pub trait TrafficFeed {
    fn readings_for(&self, bbox: &BoundingBox) -> Result<Vec<TrafficReading>, FeedError>;
}

/// One way of resolving a link identifier to geometry near a route.
///
/// A store with several possible layouts exposes one lookup per layout; the
/// matcher tries them in priority order.
pub trait LinkGeometryLookup: Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Looks up `link_id` and returns its geometry if it lies within
    /// `buffer_meters` of `route`.
    fn lookup_link_geometry(
        &self,
        link_id: &str,
        route: &RouteLine,
        buffer_meters: f64,
    ) -> Result<Option<NetworkLink>, LookupError>;

    /// Identifies the backing store. Lookups that share a store are
    /// connection-checked once per match.
    fn store_key(&self) -> &str {
        self.name()
    }

    /// Checks that the backing store can be reached at all.
    fn check_connection(&self) -> Result<(), LookupError> {
        Ok(())
    }
}
