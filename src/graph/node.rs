use geo::Point;

use crate::graph::GraphId;

/// A graph node. Its outgoing edges are the contiguous arena range
/// `edge_index .. edge_index + edge_count` on the node's own tile.
#[derive(Clone, Copy, Debug)]
pub struct NodeInfo {
    pub edge_index: u32,
    pub edge_count: u32,
    /// Relative road density around the node, fed to edge costing.
    pub density: u32,
    pub position: Point<f64>,
}

impl NodeInfo {
    /// Ids of the node's outgoing edges, given the node's own id (the
    /// edges share its tile and level).
    pub fn edge_ids(&self, node: GraphId) -> impl Iterator<Item = GraphId> {
        let (edge_index, edge_count) = (self.edge_index, self.edge_count);
        (0..edge_count).map(move |slot| node.with_index(edge_index + slot))
    }
}
