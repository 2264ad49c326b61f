use crate::costing::{Cost, DynamicCost};
use crate::graph::{DirectedEdge, EdgeUse, NodeInfo};
use crate::path::EdgeLabel;

const KPH_TO_MPS: f32 = 1.0 / 3.6;

/// Slow-down applied per unit of start-node density.
const DENSITY_FACTOR: f32 = 0.03;

/// Base cost of crossing an intersection, scaled up by node density.
const BASE_TURN_SECS: f32 = 1.5;
const DENSITY_TURN_SECS: f32 = 0.25;

/// Penalty for taking a turn the restriction mask discourages, and for
/// entering a not-through region.
const RESTRICTED_TURN_SECS: f32 = 60.0;
const NOT_THRU_SECS: f32 = 15.0;

/// Assumed speeds in km/h per edge category.
#[derive(Clone, Copy, Debug)]
pub struct SpeedProfile {
    pub highway: f32,
    pub arterial: f32,
    pub local: f32,
    pub ramp: f32,
    pub transit_connection: f32,
}

impl SpeedProfile {
    fn speed_for(&self, category: EdgeUse) -> f32 {
        match category {
            EdgeUse::Highway => self.highway,
            EdgeUse::Arterial => self.arterial,
            EdgeUse::Local => self.local,
            EdgeUse::Ramp => self.ramp,
            EdgeUse::TransitConnection => self.transit_connection,
        }
    }
}

/// Default surface-vehicle cost model. Speeds come from a static
/// profile, intersections cost more in dense areas, and the hierarchy
/// state mutated by the retry ladder is recorded on the model itself
/// for the engines to consult.
pub struct VehicleCosting {
    profile: SpeedProfile,
    relax_factor: f32,
    expansion_within_factor: f32,
    highway_transitions_disabled: bool,
}

impl VehicleCosting {
    pub fn new(profile: SpeedProfile) -> Self {
        VehicleCosting {
            profile,
            relax_factor: 1.0,
            expansion_within_factor: 1.0,
            highway_transitions_disabled: false,
        }
    }

    pub fn drive() -> Self {
        VehicleCosting::new(SpeedProfile {
            highway: 105.0,
            arterial: 65.0,
            local: 35.0,
            ramp: 45.0,
            transit_connection: 5.0,
        })
    }

    pub fn bicycle() -> Self {
        VehicleCosting::new(SpeedProfile {
            highway: 25.0,
            arterial: 22.0,
            local: 18.0,
            ramp: 15.0,
            transit_connection: 5.0,
        })
    }

    pub fn pedestrian() -> Self {
        VehicleCosting::new(SpeedProfile {
            highway: 5.0,
            arterial: 5.0,
            local: 5.0,
            ramp: 5.0,
            transit_connection: 5.0,
        })
    }

    pub fn relax_factor(&self) -> f32 {
        self.relax_factor
    }

    pub fn expansion_within_factor(&self) -> f32 {
        self.expansion_within_factor
    }

    pub fn highway_transitions_disabled(&self) -> bool {
        self.highway_transitions_disabled
    }
}

impl DynamicCost for VehicleCosting {
    fn edge_cost(&self, edge: &DirectedEdge, density: Option<u32>) -> Cost {
        let speed = self.profile.speed_for(edge.use_category) * KPH_TO_MPS;
        let secs = edge.length_m / speed * (1.0 + density.unwrap_or(0) as f32 * DENSITY_FACTOR);

        Cost::new(secs, secs)
    }

    fn transition_cost(&self, edge: &DirectedEdge, node: &NodeInfo, pred: &EdgeLabel) -> Cost {
        let mut secs = BASE_TURN_SECS + node.density as f32 * DENSITY_TURN_SECS;

        if edge.restrictions & (1 << (pred.opp_local_idx & 0x7)) != 0 {
            secs += RESTRICTED_TURN_SECS;
        }

        if edge.not_thru && !pred.edge.not_thru {
            secs += NOT_THRU_SECS;
        }

        Cost::new(secs, secs)
    }

    fn allow_multi_pass(&self) -> bool {
        true
    }

    fn relax_hierarchy_limits(&mut self, relax_factor: f32, expansion_within_factor: f32) {
        self.relax_factor *= relax_factor;
        self.expansion_within_factor *= expansion_within_factor;
    }

    fn disable_highway_transitions(&mut self) {
        self.highway_transitions_disabled = true;
    }
}
