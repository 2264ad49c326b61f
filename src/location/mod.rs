//! User locations correlated onto the graph by the request layer.

use crate::graph::GraphId;

/// Stop-type marker on a user location. A break terminates a trip
/// segment; a through waypoint shapes the route without splitting it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StopType {
    #[default]
    Break,
    Through,
}

/// A candidate edge for snapping a user location: the edge, and the
/// fractional position of the snap along it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathEdge {
    pub id: GraphId,
    /// Fractional position along the edge, in `[0, 1]`.
    pub dist: f32,
}

impl PathEdge {
    pub fn new(id: GraphId, dist: f32) -> Self {
        PathEdge { id, dist }
    }

    /// Whether the snap lies at the edge's begin node.
    pub fn begin_node(&self) -> bool {
        self.dist <= 0.0
    }

    /// Whether the snap lies at the edge's end node.
    pub fn end_node(&self) -> bool {
        self.dist >= 1.0
    }
}

/// A user-supplied location correlated to the graph: an ordered list of
/// candidate edges plus the stop type, and the departure or arrival
/// timestamp once one is known.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PathLocation {
    pub edges: Vec<PathEdge>,
    pub stop_type: StopType,
    pub date_time: Option<String>,
}

impl PathLocation {
    pub fn new(stop_type: StopType, edges: Vec<PathEdge>) -> Self {
        PathLocation {
            edges,
            stop_type,
            date_time: None,
        }
    }

    pub fn with_date_time(mut self, date_time: impl Into<String>) -> Self {
        self.date_time = Some(date_time.into());
        self
    }
}
