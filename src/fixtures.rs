//! Shared test scaffolding: a small network builder that produces
//! consistent tiles (contiguous edge ranges, correct opposing indices),
//! deterministic cost models, scripted engines and a recording
//! composer.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use geo::Point;
use rustc_hash::FxHashMap;

use crate::costing::{Cost, CostingTable, DynamicCost, TravelMode};
use crate::graph::{DirectedEdge, EdgeUse, GraphId, GraphReader, GraphTile, NodeInfo};
use crate::location::PathLocation;
use crate::path::{EdgeLabel, PathInfo};
use crate::trip::{EngineSet, PathAlgorithm, TripComposer};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub(crate) struct NodeRef {
    pub level: u8,
    pub tile: u32,
    pub index: usize,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub(crate) struct EdgeRef {
    pub from: NodeRef,
    pub slot: usize,
}

pub(crate) struct EdgeDraft {
    pub to: NodeRef,
    pub length_m: f32,
    pub use_category: EdgeUse,
    pub shortcut: bool,
    pub trans_up: bool,
    pub trans_down: bool,
    pub not_thru: bool,
    pub restrictions: u8,
    opp_slot: Option<usize>,
}

struct NodeDraft {
    position: Point<f64>,
    density: u32,
    edges: Vec<EdgeDraft>,
}

#[derive(Default)]
pub(crate) struct NetworkBuilder {
    tiles: FxHashMap<(u8, u32), Vec<NodeDraft>>,
    densities: FxHashMap<(u8, u32), u32>,
}

impl NetworkBuilder {
    pub fn new() -> Self {
        NetworkBuilder::default()
    }

    pub fn tile_density(&mut self, level: u8, tile: u32, density: u32) {
        self.densities.insert((level, tile), density);
    }

    pub fn node(&mut self, level: u8, tile: u32, lng: f64, lat: f64) -> NodeRef {
        self.node_with_density(level, tile, lng, lat, 0)
    }

    pub fn node_with_density(
        &mut self,
        level: u8,
        tile: u32,
        lng: f64,
        lat: f64,
        density: u32,
    ) -> NodeRef {
        let nodes = self.tiles.entry((level, tile)).or_default();
        nodes.push(NodeDraft {
            position: Point::new(lng, lat),
            density,
            edges: Vec::new(),
        });

        NodeRef {
            level,
            tile,
            index: nodes.len() - 1,
        }
    }

    fn push_edge(&mut self, from: NodeRef, draft: EdgeDraft) -> EdgeRef {
        let edges = &mut self.tiles.get_mut(&(from.level, from.tile)).unwrap()[from.index].edges;
        edges.push(draft);

        EdgeRef {
            from,
            slot: edges.len() - 1,
        }
    }

    fn slot_count(&self, node: NodeRef) -> usize {
        self.tiles[&(node.level, node.tile)][node.index].edges.len()
    }

    fn draft(to: NodeRef, length_m: f32, opp_slot: Option<usize>) -> EdgeDraft {
        EdgeDraft {
            to,
            length_m,
            use_category: EdgeUse::default(),
            shortcut: false,
            trans_up: false,
            trans_down: false,
            not_thru: false,
            restrictions: 0,
            opp_slot,
        }
    }

    /// A twinned pair of directed edges between `a` and `b`, with
    /// opposing indices wired both ways.
    pub fn link(&mut self, a: NodeRef, b: NodeRef, length_m: f32) -> (EdgeRef, EdgeRef) {
        let a_slot = self.slot_count(a);
        let b_slot = self.slot_count(b);

        let forward = self.push_edge(a, Self::draft(b, length_m, Some(b_slot)));
        let reverse = self.push_edge(b, Self::draft(a, length_m, Some(a_slot)));

        (forward, reverse)
    }

    /// A single directed edge with no opposing twin.
    pub fn one_way(&mut self, a: NodeRef, b: NodeRef, length_m: f32) -> EdgeRef {
        self.push_edge(a, Self::draft(b, length_m, None))
    }

    /// A twinned pair of hierarchy transitions between the same
    /// geographic node on two levels. Direction flags follow the level
    /// numbering: lower level numbers are less detailed.
    pub fn transition(&mut self, a: NodeRef, b: NodeRef) -> (EdgeRef, EdgeRef) {
        let (forward, reverse) = self.link(a, b, 0.0);

        let up = b.level < a.level;
        self.edge_mut(forward).trans_up = up;
        self.edge_mut(forward).trans_down = !up;
        self.edge_mut(reverse).trans_up = !up;
        self.edge_mut(reverse).trans_down = up;

        (forward, reverse)
    }

    pub fn edge_mut(&mut self, edge: EdgeRef) -> &mut EdgeDraft {
        &mut self.tiles.get_mut(&(edge.from.level, edge.from.tile)).unwrap()[edge.from.index]
            .edges[edge.slot]
    }

    pub fn build(self) -> Network {
        let mut node_ids = FxHashMap::default();
        let mut edge_ids = FxHashMap::default();
        let mut edge_index = FxHashMap::default();

        // First pass: assign node ids and edge arena offsets.
        for (&(level, tile), nodes) in &self.tiles {
            let mut offset = 0u32;
            for (index, node) in nodes.iter().enumerate() {
                let node_ref = NodeRef { level, tile, index };
                node_ids.insert(node_ref, GraphId::new(level, tile, index as u32));
                edge_index.insert(node_ref, offset);

                for slot in 0..node.edges.len() {
                    edge_ids.insert(
                        EdgeRef {
                            from: node_ref,
                            slot,
                        },
                        GraphId::new(level, tile, offset + slot as u32),
                    );
                }
                offset += node.edges.len() as u32;
            }
        }

        // Second pass: materialise tiles.
        let mut tiles = Vec::new();
        for (&(level, tile), nodes) in &self.tiles {
            let mut node_infos = Vec::new();
            let mut edges = Vec::new();

            for (index, node) in nodes.iter().enumerate() {
                let node_ref = NodeRef { level, tile, index };
                node_infos.push(NodeInfo {
                    edge_index: edge_index[&node_ref],
                    edge_count: node.edges.len() as u32,
                    density: node.density,
                    position: node.position,
                });

                for draft in &node.edges {
                    edges.push(DirectedEdge {
                        length_m: draft.length_m,
                        endnode: node_ids[&draft.to],
                        use_category: draft.use_category,
                        shortcut: draft.shortcut,
                        trans_up: draft.trans_up,
                        trans_down: draft.trans_down,
                        not_thru: draft.not_thru,
                        restrictions: draft.restrictions,
                        opp_local_idx: draft.opp_slot.unwrap_or(0) as u8,
                    });
                }
            }

            let density = self.densities.get(&(level, tile)).copied().unwrap_or(0);
            tiles.push(GraphTile::new(level, tile, node_infos, edges, density));
        }

        Network {
            reader: GraphReader::new(tiles),
            node_ids,
            edge_ids,
        }
    }
}

pub(crate) struct Network {
    pub reader: GraphReader,
    node_ids: FxHashMap<NodeRef, GraphId>,
    edge_ids: FxHashMap<EdgeRef, GraphId>,
}

impl Network {
    pub fn node_id(&self, node: NodeRef) -> GraphId {
        self.node_ids[&node]
    }

    pub fn edge_id(&self, edge: EdgeRef) -> GraphId {
        self.edge_ids[&edge]
    }

    pub fn position(&self, node: NodeRef) -> Point<f64> {
        self.reader.node(self.node_id(node)).unwrap().position
    }
}

/// Deterministic costing: an edge costs its length in seconds, scaled
/// by start-node density when a weight is configured.
#[derive(Default)]
pub(crate) struct UnitCosting {
    pub transition_secs: f32,
    pub density_weight: f32,
}

impl DynamicCost for UnitCosting {
    fn edge_cost(&self, edge: &DirectedEdge, density: Option<u32>) -> Cost {
        let secs = edge.length_m * (1.0 + density.unwrap_or(0) as f32 * self.density_weight);
        Cost::new(secs, secs)
    }

    fn transition_cost(&self, _edge: &DirectedEdge, _node: &NodeInfo, _pred: &EdgeLabel) -> Cost {
        Cost::new(self.transition_secs, self.transition_secs)
    }

    fn allow_multi_pass(&self) -> bool {
        true
    }

    fn relax_hierarchy_limits(&mut self, _relax_factor: f32, _expansion_within_factor: f32) {}

    fn disable_highway_transitions(&mut self) {}
}

/// Costing that records the mutations the retry ladder applies to it.
pub(crate) struct RecordingCosting {
    pub multi_pass: bool,
    pub relaxations: Rc<RefCell<Vec<(f32, f32)>>>,
    pub highway_disabled: Rc<Cell<bool>>,
}

impl RecordingCosting {
    pub fn new(multi_pass: bool) -> Self {
        RecordingCosting {
            multi_pass,
            relaxations: Rc::new(RefCell::new(Vec::new())),
            highway_disabled: Rc::new(Cell::new(false)),
        }
    }
}

impl DynamicCost for RecordingCosting {
    fn edge_cost(&self, edge: &DirectedEdge, _density: Option<u32>) -> Cost {
        Cost::new(edge.length_m, edge.length_m)
    }

    fn transition_cost(&self, _edge: &DirectedEdge, _node: &NodeInfo, _pred: &EdgeLabel) -> Cost {
        Cost::default()
    }

    fn allow_multi_pass(&self) -> bool {
        self.multi_pass
    }

    fn relax_hierarchy_limits(&mut self, relax_factor: f32, expansion_within_factor: f32) {
        self.relaxations
            .borrow_mut()
            .push((relax_factor, expansion_within_factor));
    }

    fn disable_highway_transitions(&mut self) {
        self.highway_disabled.set(true);
    }
}

pub(crate) fn table_of(make: impl Fn() -> Box<dyn DynamicCost>) -> CostingTable {
    CostingTable::new([make(), make(), make(), make()])
}

pub(crate) fn unit_table() -> CostingTable {
    table_of(|| Box::new(UnitCosting::default()))
}

/// Engine answering from a canned script, recording every invocation
/// and clear. An exhausted script keeps answering "no path".
pub(crate) struct ScriptedEngine {
    script: VecDeque<Vec<PathInfo>>,
    pub calls: Rc<RefCell<Vec<(PathLocation, PathLocation)>>>,
    pub clears: Rc<Cell<usize>>,
}

impl ScriptedEngine {
    pub fn new(script: Vec<Vec<PathInfo>>) -> Self {
        ScriptedEngine {
            script: script.into(),
            calls: Rc::new(RefCell::new(Vec::new())),
            clears: Rc::new(Cell::new(0)),
        }
    }

    pub fn idle() -> Self {
        ScriptedEngine::new(Vec::new())
    }
}

impl PathAlgorithm for ScriptedEngine {
    fn best_path(
        &mut self,
        origin: &PathLocation,
        destination: &PathLocation,
        _reader: &GraphReader,
        _costing: &CostingTable,
        _mode: TravelMode,
    ) -> Vec<PathInfo> {
        self.calls
            .borrow_mut()
            .push((origin.clone(), destination.clone()));
        self.script.pop_front().unwrap_or_default()
    }

    fn clear(&mut self) {
        self.clears.set(self.clears.get() + 1);
    }
}

pub(crate) fn engines(
    forward: ScriptedEngine,
    bidirectional: ScriptedEngine,
    multi_modal: ScriptedEngine,
) -> EngineSet {
    EngineSet::new(
        Box::new(forward),
        Box::new(bidirectional),
        Box::new(multi_modal),
    )
}

/// One composed break-to-break leg, captured verbatim.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ComposedLeg {
    pub origin: PathLocation,
    pub destination: PathLocation,
    pub through: Vec<PathLocation>,
    pub path: Vec<PathInfo>,
}

/// Composer standing in for the trip builder. Optionally writes
/// computed-looking timestamps onto the leg endpoints, the way the real
/// builder does.
#[derive(Default)]
pub(crate) struct RecordingComposer {
    pub origin_date_time: Option<String>,
    pub destination_date_time: Option<String>,
}

impl TripComposer for RecordingComposer {
    type Trip = ComposedLeg;

    fn compose(
        &mut self,
        _reader: &GraphReader,
        _costing: &CostingTable,
        path: &[PathInfo],
        origin: &mut PathLocation,
        destination: &mut PathLocation,
        through: &[PathLocation],
    ) -> ComposedLeg {
        if let Some(date_time) = &self.origin_date_time {
            origin.date_time = Some(date_time.clone());
        }
        if let Some(date_time) = &self.destination_date_time {
            destination.date_time = Some(date_time.clone());
        }

        ComposedLeg {
            origin: origin.clone(),
            destination: destination.clone(),
            through: through.to_vec(),
            path: path.to_vec(),
        }
    }
}

pub(crate) fn pi(edge: GraphId, elapsed: u32) -> PathInfo {
    PathInfo::new(TravelMode::Drive, elapsed, edge)
}
