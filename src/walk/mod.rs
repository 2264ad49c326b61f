//! Shape-walking route reconstruction.
//!
//! When the input shape is the exact polyline of a prior computed
//! route, the edge sequence can be re-derived far cheaper than by
//! routing again: walk the graph from the begin edge and compare each
//! candidate edge's end-node position against the upcoming shape
//! vertices. A mismatch is not an error; the caller falls back to real
//! routing.


use std::sync::Arc;

use geo::{Distance, Haversine, Point};
use log::debug;
use smallvec::{smallvec, SmallVec};
use thiserror::Error;

use crate::costing::{CostingTable, DynamicCost, TravelMode};
use crate::geom::{approximately_equal, DistanceApproximator, EDGE_LENGTH_SLACK_M};
use crate::graph::{EdgeUse, GraphId, GraphReader, GraphTile};
use crate::location::{PathEdge, PathLocation};
use crate::path::{EdgeLabel, PathInfo};

/// Precondition failures of the walk. Distinct from a shape mismatch,
/// which is an expected outcome reported as `Ok(None)`.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum WalkError {
    #[error("no valid begin edge on the first correlated location")]
    InvalidBeginEdge,

    #[error("no valid end edge on the last correlated location")]
    InvalidEndEdge,

    #[error("tile not found for {0}")]
    MissingTile(GraphId),

    #[error("node {0} missing from its tile")]
    MissingNode(GraphId),

    #[error("directed edge {0} missing from its tile")]
    MissingEdge(GraphId),
}

impl WalkError {
    pub fn http_status(&self) -> u16 {
        400
    }

    pub fn code(&self) -> u16 {
        443
    }
}

/// Re-derives the directed-edge sequence of `shape` between the begin
/// and end candidates of `correlated`, annotating each edge with
/// cumulative elapsed seconds.
///
/// Returns `Ok(None)` when the shape cannot be matched to a connected
/// edge sequence; the caller is expected to fall back to true routing.
pub fn form_path(
    costing: &CostingTable,
    mode: TravelMode,
    reader: &GraphReader,
    shape: &[Point<f64>],
    correlated: &[PathLocation],
) -> Result<Option<Vec<PathInfo>>, WalkError> {
    let begin = find_begin_edge(correlated).ok_or(WalkError::InvalidBeginEdge)?;
    let end = find_end_edge(correlated).ok_or(WalkError::InvalidEndEdge)?;

    let begin_tile = reader.tile(begin.id).ok_or(WalkError::MissingTile(begin.id))?;
    let end_tile = reader.tile(end.id).ok_or(WalkError::MissingTile(end.id))?;

    let model = &costing[mode];
    let begin_edge = *begin_tile
        .directededge(begin.id)
        .ok_or(WalkError::MissingEdge(begin.id))?;

    // Begin and end on the same edge: a single partial traversal.
    if begin.id == end.id {
        let elapsed = f64::from(model.edge_cost(&begin_edge, None).secs * (end.dist - begin.dist));
        return Ok(Some(vec![PathInfo::rounded(mode, elapsed, begin.id)]));
    }

    // The walk stops at the start node of the end edge, reached as the
    // end node of its opposing edge.
    let opposing = reader
        .opposing_edge_id(end.id)
        .ok_or(WalkError::MissingEdge(end.id))?;
    let stop_node = reader
        .directededge(opposing)
        .ok_or(WalkError::MissingEdge(opposing))?
        .endnode;

    let begin_end_tile = reader
        .tile(begin_edge.endnode)
        .ok_or(WalkError::MissingTile(begin_edge.endnode))?;
    let begin_end_ll = begin_end_tile
        .node(begin_edge.endnode)
        .ok_or(WalkError::MissingNode(begin_edge.endnode))?
        .position;

    // Scan forward while the shape stays within the remaining length of
    // the begin edge, looking for its end node.
    let bound =
        (f64::from(begin_edge.length_m) * f64::from(1.0 - begin.dist)).round() + EDGE_LENGTH_SLACK_M;

    let mut index = 0;
    while index < shape.len() && Haversine.distance(shape[0], shape[index]).round() < bound {
        if approximately_equal(shape[index], begin_end_ll) {
            let elapsed = f64::from(model.edge_cost(&begin_edge, None).secs * (1.0 - begin.dist));

            let mut walker = Walker {
                model,
                mode,
                reader,
                shape,
                elapsed,
                prev_label: EdgeLabel::new(begin.id, begin_edge, mode),
                path: vec![PathInfo::rounded(mode, elapsed, begin.id)],
            };

            if !walker.expand(begin_end_tile, begin_edge.endnode, index, stop_node)? {
                debug!("walk lost the shape after {} edges", walker.path.len());
                return Ok(None);
            }

            // Transition onto the end edge, then its partial traversal.
            let end_edge = *end_tile
                .directededge(end.id)
                .ok_or(WalkError::MissingEdge(end.id))?;
            let stop_info = *end_tile
                .node(stop_node)
                .ok_or(WalkError::MissingNode(stop_node))?;

            walker.elapsed +=
                f64::from(model.transition_cost(&end_edge, &stop_info, &walker.prev_label).secs);
            walker.elapsed += f64::from(model.edge_cost(&end_edge, None).secs * end.dist);
            walker.path.push(PathInfo::rounded(mode, walker.elapsed, end.id));

            return Ok(Some(walker.path));
        }
        index += 1;
    }

    Ok(None)
}

/// First begin candidate not snapped at the edge's end node. An origin
/// at a node must not start on an inbound edge.
fn find_begin_edge(correlated: &[PathLocation]) -> Option<PathEdge> {
    correlated
        .first()?
        .edges
        .iter()
        .find(|edge| !edge.end_node() && edge.id.is_valid())
        .copied()
}

/// First end candidate not snapped at the edge's begin node; the mirror
/// of [`find_begin_edge`] for a destination at a node.
fn find_end_edge(correlated: &[PathLocation]) -> Option<PathEdge> {
    correlated
        .last()?
        .edges
        .iter()
        .find(|edge| !edge.begin_node() && edge.id.is_valid())
        .copied()
}

/// How a frame was entered, which decides what its failure means to the
/// frames below it.
enum FrameEntry {
    Root,
    /// Entered through a hierarchy transition. Failure resumes the
    /// parent's edge scan after restoring the recorded walk state.
    Transition {
        path_len: usize,
        elapsed: f64,
        prev_label: EdgeLabel,
    },
    /// Entered by committing an emitted edge. Once an edge is emitted
    /// the walk is committed to it, so failure propagates downward.
    Committed,
}

struct Frame {
    tile: Arc<GraphTile>,
    node: GraphId,
    shape_index: usize,
    from_transition: bool,
    entry: FrameEntry,
    /// Next outgoing-edge slot to try.
    slot: u32,
}

struct Walker<'a> {
    model: &'a dyn DynamicCost,
    mode: TravelMode,
    reader: &'a GraphReader,
    shape: &'a [Point<f64>],
    elapsed: f64,
    prev_label: EdgeLabel,
    path: Vec<PathInfo>,
}

impl Walker<'_> {
    /// Depth-first expansion from `node` toward `stop_node`, matching
    /// each candidate edge's end node against upcoming shape vertices.
    /// Implemented with an explicit frame stack; recursion depth here
    /// is the edge count of the walked route.
    fn expand(
        &mut self,
        tile: Arc<GraphTile>,
        node: GraphId,
        shape_index: usize,
        stop_node: GraphId,
    ) -> Result<bool, WalkError> {
        let mut stack: SmallVec<[Frame; 8]> = smallvec![Frame {
            tile,
            node,
            shape_index,
            from_transition: false,
            entry: FrameEntry::Root,
            slot: 0,
        }];

        'expand: while !stack.is_empty() {
            let top = stack.len() - 1;
            let (tile, node, shape_index, from_transition) = {
                let frame = &stack[top];
                (
                    Arc::clone(&frame.tile),
                    frame.node,
                    frame.shape_index,
                    frame.from_transition,
                )
            };

            if node == stop_node {
                return Ok(true);
            }

            let node_info = *tile.node(node).ok_or(WalkError::MissingNode(node))?;

            while stack[top].slot < node_info.edge_count {
                let edge_id = node.with_index(node_info.edge_index + stack[top].slot);
                stack[top].slot += 1;

                let edge = *tile
                    .directededge(edge_id)
                    .ok_or(WalkError::MissingEdge(edge_id))?;

                // Shortcuts and transit connections are never part of a
                // walked shape.
                if edge.shortcut || edge.use_category == EdgeUse::TransitConnection {
                    continue;
                }

                // Loop guard: an edge shorter than the coordinate
                // tolerance would otherwise bounce the walk back and
                // forth, so never re-take one of the last two emitted
                // edges.
                let emitted = self.path.len();
                if self.path[emitted.saturating_sub(2)..]
                    .iter()
                    .any(|info| info.edge == edge_id)
                {
                    continue;
                }

                if edge.is_transition() {
                    // One transition at a time; a transition reached
                    // through another transition is never taken.
                    if from_transition {
                        continue;
                    }

                    let Some(end_tile) = self.reader.tile(edge.endnode) else {
                        continue;
                    };

                    stack.push(Frame {
                        tile: end_tile,
                        node: edge.endnode,
                        shape_index,
                        from_transition: true,
                        entry: FrameEntry::Transition {
                            path_len: self.path.len(),
                            elapsed: self.elapsed,
                            prev_label: self.prev_label,
                        },
                        slot: 0,
                    });
                    continue 'expand;
                }

                let Some(end_tile) = self.reader.tile(edge.endnode) else {
                    continue;
                };
                let Some(end_node) = end_tile.node(edge.endnode).copied() else {
                    continue;
                };

                // Scan shape vertices until one matches the end node or
                // the shape runs past the edge length.
                let bound = f64::from(edge.length_m) + EDGE_LENGTH_SLACK_M;
                let bound_sq = bound * bound;
                let approximator = DistanceApproximator::new(end_node.position);

                let mut index = shape_index + 1;
                while index < self.shape.len()
                    && approximator.distance_squared(self.shape[index]) < bound_sq
                {
                    if approximately_equal(self.shape[index], end_node.position) {
                        self.elapsed += f64::from(
                            self.model
                                .transition_cost(&edge, &node_info, &self.prev_label)
                                .secs,
                        );
                        self.elapsed += f64::from(self.model.edge_cost(&edge, None).secs);

                        self.path.push(PathInfo::rounded(self.mode, self.elapsed, edge_id));
                        self.prev_label = EdgeLabel::new(edge_id, edge, self.mode);

                        stack.push(Frame {
                            tile: end_tile,
                            node: edge.endnode,
                            shape_index: index,
                            from_transition: false,
                            entry: FrameEntry::Committed,
                            slot: 0,
                        });
                        continue 'expand;
                    }
                    index += 1;
                }
            }

            // Every outgoing edge tried and none continued the shape.
            match stack.pop() {
                None | Some(Frame {
                    entry: FrameEntry::Root,
                    ..
                }) => return Ok(false),
                Some(Frame {
                    entry:
                        FrameEntry::Transition {
                            path_len,
                            elapsed,
                            prev_label,
                        },
                    ..
                }) => self.unwind(path_len, elapsed, prev_label),
                Some(Frame {
                    entry: FrameEntry::Committed,
                    ..
                }) => {
                    // The walk committed to an emitted edge that turned
                    // out to be a dead end; the failure belongs to every
                    // frame down to the transition (or root) that led
                    // here.
                    loop {
                        match stack.pop() {
                            None
                            | Some(Frame {
                                entry: FrameEntry::Root,
                                ..
                            }) => return Ok(false),
                            Some(Frame {
                                entry:
                                    FrameEntry::Transition {
                                        path_len,
                                        elapsed,
                                        prev_label,
                                    },
                                ..
                            }) => {
                                self.unwind(path_len, elapsed, prev_label);
                                break;
                            }
                            Some(Frame {
                                entry: FrameEntry::Committed,
                                ..
                            }) => continue,
                        }
                    }
                }
            }
        }

        Ok(false)
    }

    /// Restores walk state to what it was when a failed transition
    /// subtree was entered, discarding anything it emitted.
    fn unwind(&mut self, path_len: usize, elapsed: f64, prev_label: EdgeLabel) {
        self.path.truncate(path_len);
        self.elapsed = elapsed;
        self.prev_label = prev_label;
    }
}
