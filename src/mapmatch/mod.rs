//! Map-matched route assembly.
//!
//! A map-matching engine reduces a noisy trace to per-point match
//! results; this module turns those results into the underlying edge
//! sequence, annotated with cumulative travel time, ready for the trip
//! builder. The matcher itself is an external collaborator behind the
//! [`MapMatcher`] trait and its results are consumed opaquely.


use std::fmt::Display;

use log::debug;
use thiserror::Error;

use crate::costing::{CostingTable, TravelMode};
use crate::graph::{GraphReader, NodeInfo};
use crate::path::{EdgeLabel, EdgeSegment, PathInfo};

#[derive(Error, Debug)]
pub enum MapMatchError {
    /// Any failure while constructing or walking the matched route.
    /// Partial output is discarded.
    #[error("map-match route assembly failed: {0}")]
    Assembly(String),
}

impl MapMatchError {
    pub fn http_status(&self) -> u16 {
        400
    }

    pub fn code(&self) -> u16 {
        442
    }
}

/// External map-matching engine. The result type is opaque to this
/// crate; only the matcher knows how to expand results into ordered
/// [`EdgeSegment`]s.
pub trait MapMatcher {
    type MatchResult;
    type Error: Display;

    fn reader(&self) -> &GraphReader;

    /// Expands match results into the ordered edge segments of the
    /// matched route.
    fn construct_route(
        &self,
        results: &[Self::MatchResult],
    ) -> std::result::Result<Vec<EdgeSegment>, Self::Error>;
}

/// Forms the timed path underlying a sequence of match results.
///
/// Consecutive segments on the same edge collapse into one entry; the
/// first kept edge is costed with the tile-level density estimate and
/// every later edge with its start-node density plus the transition
/// from its predecessor.
pub fn form_path<M: MapMatcher>(
    matcher: &M,
    results: &[M::MatchResult],
    costing: &CostingTable,
    mode: TravelMode,
) -> std::result::Result<Vec<PathInfo>, MapMatchError> {
    let model = &costing[mode];
    let reader = matcher.reader();

    let segments = matcher
        .construct_route(results)
        .map_err(|err| MapMatchError::Assembly(err.to_string()))?;

    debug!("assembling {} matched segments", segments.len());

    let mut elapsed = 0f64;
    let mut path: Vec<PathInfo> = Vec::with_capacity(segments.len());
    let mut prior_edge = crate::graph::GraphId::INVALID;
    let mut prior: Option<(NodeInfo, EdgeLabel)> = None;

    for segment in segments {
        // Match results commonly span an edge with several segments;
        // keep only the first.
        if segment.edge == prior_edge {
            continue;
        }

        let missing = || MapMatchError::Assembly(format!("unresolvable edge {}", segment.edge));
        let edge = reader.directededge(segment.edge).ok_or_else(missing)?;

        let fraction = segment.target - segment.source;
        match &prior {
            Some((node, pred)) => {
                elapsed += f64::from(model.transition_cost(&edge, node, pred).secs);
                elapsed += f64::from(model.edge_cost(&edge, Some(node.density)).secs * fraction);
            }
            None => {
                let density = reader.edge_density(segment.edge);
                elapsed += f64::from(model.edge_cost(&edge, Some(density)).secs * fraction);
            }
        }

        prior_edge = segment.edge;
        let end_node = reader
            .node(edge.endnode)
            .ok_or_else(|| MapMatchError::Assembly(format!("unresolvable node {}", edge.endnode)))?;
        prior = Some((end_node, EdgeLabel::new(segment.edge, edge, mode)));

        path.push(PathInfo::rounded(mode, elapsed, segment.edge));
    }

    Ok(path)
}
