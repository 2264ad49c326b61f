//! Travel modes and the costing seam.
//!
//! The shortest-path engines and the assembly paths in this crate never
//! hardcode travel times; they consult a [`DynamicCost`] model chosen by
//! travel mode from a [`CostingTable`]. The set of modes is closed and
//! the table is a parallel array, so a mode is an index, not a lookup.
//!
//! Costing state is not read-only: the retry ladder in [`crate::trip`]
//! relaxes hierarchy limits on the active model between passes, and that
//! relaxation deliberately persists for the remainder of the request.

#[doc(hidden)]
pub mod vehicle;


#[doc(inline)]
pub use vehicle::*;

use std::ops::{Add, Index, IndexMut};

use crate::graph::{DirectedEdge, NodeInfo};
use crate::path::EdgeLabel;

/// Enumerated travel category. Doubles as the index into the parallel
/// cost-model array carried by every request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum TravelMode {
    #[default]
    Drive = 0,
    Bicycle = 1,
    Pedestrian = 2,
    Transit = 3,
}

impl TravelMode {
    pub const COUNT: usize = 4;

    /// Mode implied by a costing identifier from the request layer.
    pub fn from_costing(costing: &str) -> TravelMode {
        match costing {
            "multimodal" | "transit" => TravelMode::Transit,
            "bicycle" => TravelMode::Bicycle,
            "pedestrian" => TravelMode::Pedestrian,
            _ => TravelMode::Drive,
        }
    }
}

/// Cost of traversing graph entities: seconds of travel time plus the
/// engine's unit cost. Assembly only ever consumes `secs`; `cost` rides
/// along for the engines.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Cost {
    pub secs: f32,
    pub cost: f32,
}

impl Cost {
    pub fn new(secs: f32, cost: f32) -> Self {
        Cost { secs, cost }
    }
}

impl Add for Cost {
    type Output = Cost;

    fn add(self, rhs: Cost) -> Cost {
        Cost {
            secs: self.secs + rhs.secs,
            cost: self.cost + rhs.cost,
        }
    }
}

/// Polymorphic cost model for one travel mode.
///
/// Implementations are expected to be cheap per call; the assembly
/// paths invoke `edge_cost` and `transition_cost` once per edge.
pub trait DynamicCost {
    /// Cost of traversing the full edge. `density` is the start-node
    /// density when a node context exists; `None` falls back to the
    /// model's neutral assumption.
    fn edge_cost(&self, edge: &DirectedEdge, density: Option<u32>) -> Cost;

    /// Cost of moving from the predecessor onto `edge` across the
    /// shared node.
    fn transition_cost(&self, edge: &DirectedEdge, node: &NodeInfo, pred: &EdgeLabel) -> Cost;

    /// Whether the retry ladder may re-run a failed search with relaxed
    /// limits.
    fn allow_multi_pass(&self) -> bool;

    /// Loosens hierarchy pruning. Stateful: stays in effect for every
    /// later search against this model within the request.
    fn relax_hierarchy_limits(&mut self, relax_factor: f32, expansion_within_factor: f32);

    /// Forbids transitioning onto highway-class hierarchy levels.
    /// Stateful, like relaxation.
    fn disable_highway_transitions(&mut self);
}

/// Parallel array of cost models, one per [`TravelMode`].
pub struct CostingTable {
    models: [Box<dyn DynamicCost>; TravelMode::COUNT],
}

impl CostingTable {
    pub fn new(models: [Box<dyn DynamicCost>; TravelMode::COUNT]) -> Self {
        CostingTable { models }
    }
}

impl Default for CostingTable {
    /// A vehicle-profile model per mode; the request layer may swap in
    /// its own implementations.
    fn default() -> Self {
        CostingTable::new([
            Box::new(VehicleCosting::drive()),
            Box::new(VehicleCosting::bicycle()),
            Box::new(VehicleCosting::pedestrian()),
            Box::new(VehicleCosting::drive()),
        ])
    }
}

impl Index<TravelMode> for CostingTable {
    type Output = dyn DynamicCost;

    fn index(&self, mode: TravelMode) -> &Self::Output {
        self.models[mode as usize].as_ref()
    }
}

impl IndexMut<TravelMode> for CostingTable {
    fn index_mut(&mut self, mode: TravelMode) -> &mut Self::Output {
        self.models[mode as usize].as_mut()
    }
}
