use std::sync::Arc;

use log::debug;
use rustc_hash::FxHashMap;

use crate::graph::{DirectedEdge, GraphId, GraphTile, NodeInfo};

/// Tile-addressable storage. One reader is owned per worker and serves
/// a single request thread; tiles are handed out as [`Arc`]s so callers
/// can hold one across subsequent lookups without borrowing the reader.
pub struct GraphReader {
    tiles: FxHashMap<(u8, u32), Arc<GraphTile>>,
}

impl GraphReader {
    pub fn new(tiles: impl IntoIterator<Item = GraphTile>) -> Self {
        let mut reader = GraphReader {
            tiles: FxHashMap::default(),
        };

        for tile in tiles {
            reader.insert(tile);
        }

        reader
    }

    pub fn insert(&mut self, tile: GraphTile) {
        let key = (tile.level(), tile.tile());

        if self.tiles.insert(key, Arc::new(tile)).is_some() {
            debug!("replaced tile {}/{}", key.0, key.1);
        }
    }

    /// Resolves an id to its owning tile.
    pub fn tile(&self, id: GraphId) -> Option<Arc<GraphTile>> {
        id.is_valid()
            .then(|| self.tiles.get(&id.tile_key()).cloned())
            .flatten()
    }

    pub fn directededge(&self, id: GraphId) -> Option<DirectedEdge> {
        self.tile(id)?.directededge(id).copied()
    }

    pub fn node(&self, id: GraphId) -> Option<NodeInfo> {
        self.tile(id)?.node(id).copied()
    }

    /// Resolves the opposing directed edge, crossing into the end
    /// node's tile when the edge spans a tile boundary.
    pub fn opposing_edge_id(&self, id: GraphId) -> Option<GraphId> {
        let edge = self.directededge(id)?;
        let end_node = self.node(edge.endnode)?;

        Some(
            edge.endnode
                .with_index(end_node.edge_index + u32::from(edge.opp_local_idx)),
        )
    }

    /// Tile-level density estimate for an edge, used only when no
    /// start-node context exists.
    pub fn edge_density(&self, id: GraphId) -> u32 {
        self.tile(id).map_or(0, |tile| tile.edge_density(id))
    }
}
