//! Per-edge output records and the cost-only predecessor label.

use crate::costing::TravelMode;
use crate::graph::{DirectedEdge, GraphId};

/// One entry of an assembled path: the edge plus the cumulative elapsed
/// time at its end, in whole seconds.
///
/// Elapsed times are accumulated in floating seconds and rounded only
/// here, at emission. Along any assembled path the entries are
/// non-decreasing in `elapsed` and adjacent entries never repeat an
/// edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathInfo {
    pub mode: TravelMode,
    pub elapsed: u32,
    pub edge: GraphId,
    pub trip_id: u32,
}

impl PathInfo {
    pub fn new(mode: TravelMode, elapsed: u32, edge: GraphId) -> Self {
        PathInfo {
            mode,
            elapsed,
            edge,
            trip_id: 0,
        }
    }

    /// Emission constructor: rounds a floating cumulative time to the
    /// nearest whole second.
    pub fn rounded(mode: TravelMode, elapsed: f64, edge: GraphId) -> Self {
        PathInfo::new(mode, elapsed.round() as u32, edge)
    }
}

/// Lightweight predecessor descriptor handed to transition costing.
/// Carries a copy of the directed edge so no tile borrow outlives a
/// fetch; there is no search state here.
#[derive(Clone, Copy, Debug)]
pub struct EdgeLabel {
    pub predecessor: Option<GraphId>,
    pub edge_id: GraphId,
    pub edge: DirectedEdge,
    pub restrictions: u8,
    pub opp_local_idx: u8,
    pub mode: TravelMode,
}

impl EdgeLabel {
    pub fn new(edge_id: GraphId, edge: DirectedEdge, mode: TravelMode) -> Self {
        EdgeLabel {
            predecessor: None,
            edge_id,
            edge,
            restrictions: edge.restrictions,
            opp_local_idx: edge.opp_local_idx,
            mode,
        }
    }
}

/// A matched stretch of one directed edge, with fractional entry and
/// exit positions. Produced by the map matcher's route construction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeSegment {
    pub edge: GraphId,
    /// Fractional position where travel enters the edge.
    pub source: f32,
    /// Fractional position where travel leaves the edge.
    pub target: f32,
}

impl EdgeSegment {
    /// A fully traversed edge.
    pub fn full(edge: GraphId) -> Self {
        EdgeSegment {
            edge,
            source: 0.0,
            target: 1.0,
        }
    }

    pub fn partial(edge: GraphId, source: f32, target: f32) -> Self {
        EdgeSegment {
            edge,
            source,
            target,
        }
    }
}
