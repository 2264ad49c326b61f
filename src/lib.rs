//! Route-assembly core for a road-network routing service.
//!
//! Given correlated user locations and high-level pathfinding engines,
//! this crate composes driveable itineraries with per-edge timing. Three
//! assembly paths feed the (external) trip-narrative builder:
//!
//! - [`trip`] orchestrates multi-leg routes: per-leg engine selection,
//!   a relaxation retry ladder, through-waypoint handling and one trip
//!   emitted per break-to-break segment.
//! - [`walk`] re-derives an edge sequence from the exact polyline of a
//!   prior route by walking the graph and matching node positions.
//! - [`mapmatch`] assembles the edge sequence underlying a sequence of
//!   map-matcher results and annotates it with cumulative travel time.

pub use graph::{GraphId, GraphReader};
pub use trip::{RouteResponse, RouteWorker};

pub mod costing;
pub mod geom;
pub mod graph;
pub mod location;
pub mod mapmatch;
pub mod path;
pub mod trip;
pub mod walk;

#[cfg(test)]
pub(crate) mod fixtures;

use thiserror::Error;

use crate::mapmatch::MapMatchError;
use crate::trip::TripError;
use crate::walk::WalkError;

/// Aggregate error surface of the crate. Each variant carries the
/// structured `{http_status, internal_code}` pair the outer transport
/// reports to callers.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Trip(#[from] TripError),

    #[error(transparent)]
    Walk(#[from] WalkError),

    #[error(transparent)]
    MapMatch(#[from] MapMatchError),
}

impl Error {
    pub fn http_status(&self) -> u16 {
        match self {
            Error::Trip(e) => e.http_status(),
            Error::Walk(e) => e.http_status(),
            Error::MapMatch(e) => e.http_status(),
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            Error::Trip(e) => e.code(),
            Error::Walk(e) => e.code(),
            Error::MapMatch(e) => e.code(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
