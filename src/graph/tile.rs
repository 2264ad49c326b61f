use crate::graph::{DirectedEdge, GraphId, NodeInfo};

/// Arena of nodes and directed edges for one `(level, tile)` address
/// space. Lookups validate that the id actually belongs to this tile,
/// so a stale id from another tile resolves to `None` rather than to an
/// unrelated entity.
pub struct GraphTile {
    level: u8,
    tile: u32,
    nodes: Vec<NodeInfo>,
    edges: Vec<DirectedEdge>,
    /// Tile-wide density estimate, used when an edge must be costed
    /// without a start-node context.
    density: u32,
}

impl GraphTile {
    pub fn new(
        level: u8,
        tile: u32,
        nodes: Vec<NodeInfo>,
        edges: Vec<DirectedEdge>,
        density: u32,
    ) -> Self {
        GraphTile {
            level,
            tile,
            nodes,
            edges,
            density,
        }
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn tile(&self) -> u32 {
        self.tile
    }

    fn owns(&self, id: GraphId) -> bool {
        id.is_valid() && id.level() == self.level && id.tile() == self.tile
    }

    pub fn node(&self, id: GraphId) -> Option<&NodeInfo> {
        self.owns(id)
            .then(|| self.nodes.get(id.index() as usize))
            .flatten()
    }

    pub fn directededge(&self, id: GraphId) -> Option<&DirectedEdge> {
        self.owns(id)
            .then(|| self.edges.get(id.index() as usize))
            .flatten()
    }

    /// Density estimate for an edge when no node context is available.
    pub fn edge_density(&self, _edge: GraphId) -> u32 {
        self.density
    }
}
