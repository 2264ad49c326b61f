use crate::costing::CostingTable;
use crate::graph::GraphReader;
use crate::location::PathLocation;
use crate::path::PathInfo;

/// Seam to the external trip-narrative builder. The orchestrator hands
/// it one fully merged break-to-break leg at a time, in travel order.
///
/// `origin` and `destination` are mutable so the builder can write the
/// departure and arrival times it computes back onto the locations; the
/// orchestrator reads them there to schedule adjacent legs.
pub trait TripComposer {
    type Trip;

    #[allow(clippy::too_many_arguments)]
    fn compose(
        &mut self,
        reader: &GraphReader,
        costing: &CostingTable,
        path: &[PathInfo],
        origin: &mut PathLocation,
        destination: &mut PathLocation,
        through: &[PathLocation],
    ) -> Self::Trip;
}

/// A composed leg with its endpoints, through waypoints and timed edge
/// sequence. This is what [`TripPathComposer`] packages for callers
/// that serialize trips themselves.
#[derive(Clone, Debug, PartialEq)]
pub struct TripPath {
    pub origin: PathLocation,
    pub destination: PathLocation,
    pub through: Vec<PathLocation>,
    pub edges: Vec<PathInfo>,
}

/// Default composer: packages the leg without narrative synthesis.
#[derive(Default)]
pub struct TripPathComposer;

impl TripComposer for TripPathComposer {
    type Trip = TripPath;

    fn compose(
        &mut self,
        _reader: &GraphReader,
        _costing: &CostingTable,
        path: &[PathInfo],
        origin: &mut PathLocation,
        destination: &mut PathLocation,
        through: &[PathLocation],
    ) -> TripPath {
        TripPath {
            origin: origin.clone(),
            destination: destination.clone(),
            through: through.to_vec(),
            edges: path.to_vec(),
        }
    }
}
