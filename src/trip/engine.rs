use itertools::Itertools;

use crate::costing::{CostingTable, TravelMode};
use crate::graph::GraphReader;
use crate::location::PathLocation;
use crate::path::PathInfo;

/// A shortest-path engine. Engines keep internal search state between
/// calls and must be [`PathAlgorithm::clear`]ed before reuse; an empty
/// result means no path was found at the current costing tightness.
pub trait PathAlgorithm {
    fn best_path(
        &mut self,
        origin: &PathLocation,
        destination: &PathLocation,
        reader: &GraphReader,
        costing: &CostingTable,
        mode: TravelMode,
    ) -> Vec<PathInfo>;

    fn clear(&mut self);
}

/// The closed set of engine variants a worker carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlgorithmKind {
    Forward,
    Bidirectional,
    MultiModal,
}

/// One engine per variant, owned by the worker for the lifetime of a
/// request stream.
pub struct EngineSet {
    forward: Box<dyn PathAlgorithm>,
    bidirectional: Box<dyn PathAlgorithm>,
    multi_modal: Box<dyn PathAlgorithm>,
}

impl EngineSet {
    pub fn new(
        forward: Box<dyn PathAlgorithm>,
        bidirectional: Box<dyn PathAlgorithm>,
        multi_modal: Box<dyn PathAlgorithm>,
    ) -> Self {
        EngineSet {
            forward,
            bidirectional,
            multi_modal,
        }
    }

    pub fn engine_mut(&mut self, kind: AlgorithmKind) -> &mut dyn PathAlgorithm {
        match kind {
            AlgorithmKind::Forward => self.forward.as_mut(),
            AlgorithmKind::Bidirectional => self.bidirectional.as_mut(),
            AlgorithmKind::MultiModal => self.multi_modal.as_mut(),
        }
    }
}

/// Chooses the engine for one location pair. Transit costings always
/// route multi-modally; a shared candidate edge forces plain forward
/// A*, since the bidirectional engine cannot safely handle the trivial
/// one-way case; everything else goes bidirectional.
pub fn select_algorithm(
    costing: &str,
    origin: &PathLocation,
    destination: &PathLocation,
) -> AlgorithmKind {
    if costing == "multimodal" || costing == "transit" {
        return AlgorithmKind::MultiModal;
    }

    let shared = origin
        .edges
        .iter()
        .cartesian_product(destination.edges.iter())
        .any(|(a, b)| a.id == b.id);

    if shared {
        AlgorithmKind::Forward
    } else {
        AlgorithmKind::Bidirectional
    }
}
