//! route-traffic core
//!
//! Matches live traffic readings to a planned road route and re-estimates
//! its travel time.

pub mod analysis;
pub mod config;
pub mod error;
pub mod estimate;
pub mod geometry;
pub mod haversine;
pub mod matcher;
pub mod osrm;
pub mod polyline;
pub mod recommend;
pub mod relevance;
pub mod report;
pub mod store;
pub mod traffic;
pub mod traits;
pub mod types;
