//! Multi-leg route orchestration.
//!
//! The [`RouteWorker`] walks an ordered list of correlated locations,
//! picks a shortest-path engine per adjacent pair, retries failed legs
//! with progressively relaxed costing, stitches consecutive legs into a
//! continuous edge sequence, and emits one trip per break-to-break
//! segment through the external [`TripComposer`].
//!
//! Depart-at requests iterate the locations forward and append trips;
//! arrive-by requests iterate in reverse and prepend, so the emitted
//! trip list is always in travel order.

#[doc(hidden)]
pub mod compose;
#[doc(hidden)]
pub mod engine;


#[doc(inline)]
pub use compose::*;
#[doc(inline)]
pub use engine::*;

use std::time::Instant;

use log::{debug, warn};
use thiserror::Error;

use crate::costing::{CostingTable, TravelMode};
use crate::graph::{GraphId, GraphReader};
use crate::location::{PathLocation, StopType};
use crate::path::PathInfo;

/// Milliseconds per location above which a request is logged as slow.
const DEFAULT_LONG_REQUEST_MS: f64 = 100.0;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TripError {
    /// No path between a consecutive origin/destination pair, after the
    /// full relaxation ladder.
    #[error("no path could be found between a consecutive origin and destination pair")]
    NoPath,

    #[error("at least two correlated locations are required, got {0}")]
    TooFewLocations(usize),
}

impl TripError {
    pub fn http_status(&self) -> u16 {
        400
    }

    pub fn code(&self) -> u16 {
        match self {
            TripError::NoPath => 442,
            TripError::TooFewLocations(_) => 120,
        }
    }
}

/// Scheduling intent of a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateTimeType {
    DepartAt,
    DepartAtReverse,
    ArriveBy,
}

/// Result of one routing request: the raw request payload echoed back,
/// followed by one composed trip per break segment, in travel order.
#[derive(Debug)]
pub struct RouteResponse<T> {
    pub request: String,
    pub trips: Vec<T>,
}

/// Per-thread route orchestrator. Owns its graph reader, its costing
/// table and one engine per [`AlgorithmKind`]; nothing is shared across
/// workers and nothing persists between requests except the engines'
/// cleared state.
pub struct RouteWorker {
    reader: GraphReader,
    costing: CostingTable,
    engines: EngineSet,
    mode: TravelMode,
    long_request_ms: f64,
}

impl RouteWorker {
    pub fn new(reader: GraphReader, costing: CostingTable, engines: EngineSet) -> Self {
        RouteWorker {
            reader,
            costing,
            engines,
            mode: TravelMode::default(),
            long_request_ms: DEFAULT_LONG_REQUEST_MS,
        }
    }

    /// Tunes the slow-request logging threshold. Log-only; requests are
    /// never cancelled.
    pub fn with_long_request(mut self, threshold_ms: f64) -> Self {
        self.long_request_ms = threshold_ms;
        self
    }

    /// Routes through `locations` in order and composes one trip per
    /// break segment. `request` is echoed into the response ahead of
    /// the trips.
    pub fn route<C: TripComposer>(
        &mut self,
        composer: &mut C,
        locations: Vec<PathLocation>,
        costing_name: &str,
        date_time_type: Option<DateTimeType>,
        request: &str,
    ) -> Result<RouteResponse<C::Trip>, TripError> {
        if locations.len() < 2 {
            return Err(TripError::TooFewLocations(locations.len()));
        }

        self.mode = TravelMode::from_costing(costing_name);

        let started = Instant::now();
        let count = locations.len();

        let trips = match date_time_type {
            Some(DateTimeType::ArriveBy) => self.path_arrive_by(composer, locations, costing_name),
            _ => self.path_depart_at(composer, locations, costing_name, date_time_type),
        }?;

        let elapsed_ms = started.elapsed().as_secs_f64() * 1_000.0;
        if elapsed_ms / count as f64 > self.long_request_ms {
            warn!("route elapsed time (ms): {elapsed_ms:.1}");
            warn!("route exceeded threshold: {request}");
        }

        Ok(RouteResponse {
            request: request.to_string(),
            trips,
        })
    }

    /// Forward iteration: one leg per adjacent pair, trips appended at
    /// each break destination.
    fn path_depart_at<C: TripComposer>(
        &mut self,
        composer: &mut C,
        locations: Vec<PathLocation>,
        costing_name: &str,
        date_time_type: Option<DateTimeType>,
    ) -> Result<Vec<C::Trip>, TripError> {
        let mut trips = Vec::new();

        let mut prior_is_node = false;
        let mut through_edge = GraphId::INVALID;
        let mut through_locations: Vec<PathLocation> = Vec::new();
        let mut path_edges: Vec<PathInfo> = Vec::new();

        let mut origin_date_time: Option<String> = None;
        let mut dest_date_time: Option<String> = None;
        let mut last_break_origin = locations[0].clone();

        for pair in 1..locations.len() {
            let mut origin = locations[pair - 1].clone();
            let mut destination = locations[pair].clone();
            let is_last = pair == locations.len() - 1;

            // A break origin inherits the arrival computed for the
            // previous leg's destination.
            if matches!(
                date_time_type,
                Some(DateTimeType::DepartAt | DateTimeType::DepartAtReverse)
            ) && dest_date_time.is_some()
                && origin.stop_type == StopType::Break
            {
                origin.date_time = dest_date_time.clone();
            }

            // A valid through edge means the previous destination was a
            // through waypoint; constrain this origin to continue past it.
            if through_edge.is_valid() {
                self.update_origin(&mut origin, prior_is_node, through_edge);
            } else {
                last_break_origin = origin.clone();
            }

            let kind = select_algorithm(costing_name, &origin, &destination);
            let temp_path = self.best_path_with_retry(kind, &origin, &destination);
            if temp_path.is_empty() {
                return Err(TripError::NoPath);
            }

            if date_time_type == Some(DateTimeType::DepartAt)
                && origin_date_time.is_none()
                && origin.stop_type == StopType::Break
            {
                last_break_origin.date_time = origin.date_time.clone();
            }

            merge_leg(&mut path_edges, temp_path);

            if destination.stop_type == StopType::Break || is_last {
                let trip = composer.compose(
                    &self.reader,
                    &self.costing,
                    &path_edges,
                    &mut last_break_origin,
                    &mut destination,
                    &through_locations,
                );

                if date_time_type.is_some() {
                    origin_date_time = last_break_origin.date_time.clone();
                    dest_date_time = destination.date_time.clone();
                }

                trips.push(trip);

                path_edges.clear();
                through_edge = GraphId::INVALID;
                through_locations.clear();
            } else {
                (prior_is_node, through_edge) = record_through(&destination, &path_edges);
                through_locations.push(destination);
            }

            if !is_last {
                self.engines.engine_mut(kind).clear();
            }
        }

        Ok(trips)
    }

    /// Reverse iteration for arrive-by: the latest break destination
    /// anchors the schedule and trips are prepended, keeping the output
    /// in travel order.
    fn path_arrive_by<C: TripComposer>(
        &mut self,
        composer: &mut C,
        locations: Vec<PathLocation>,
        costing_name: &str,
    ) -> Result<Vec<C::Trip>, TripError> {
        let mut trips = Vec::new();

        let mut prior_is_node = false;
        let mut through_edge = GraphId::INVALID;
        let mut through_locations: Vec<PathLocation> = Vec::new();
        let mut path_edges: Vec<PathInfo> = Vec::new();

        let mut origin_date_time: Option<String> = None;
        let mut last_break_dest = locations[locations.len() - 1].clone();

        for pair in (0..locations.len() - 1).rev() {
            let mut origin = locations[pair].clone();
            let destination = locations[pair + 1].clone();
            let is_last = pair == 0;

            // A valid through edge means the previous origin was a
            // through waypoint.
            if through_edge.is_valid() {
                self.update_origin(&mut origin, prior_is_node, through_edge);
            } else {
                last_break_dest = destination.clone();
            }

            let kind = select_algorithm(costing_name, &origin, &destination);
            let temp_path = self.best_path_with_retry(kind, &origin, &destination);
            if temp_path.is_empty() {
                return Err(TripError::NoPath);
            }

            merge_leg(&mut path_edges, temp_path);

            if origin.stop_type == StopType::Break || is_last {
                // The departure computed for the later leg becomes this
                // break's effective destination time.
                if origin_date_time.is_some() {
                    last_break_dest.date_time = origin_date_time.clone();
                }

                let trip = composer.compose(
                    &self.reader,
                    &self.costing,
                    &path_edges,
                    &mut origin,
                    &mut last_break_dest,
                    &through_locations,
                );

                if origin.date_time.is_some() {
                    origin_date_time = origin.date_time.clone();
                }

                trips.insert(0, trip);

                path_edges.clear();
                through_edge = GraphId::INVALID;
                through_locations.clear();
            } else {
                (prior_is_node, through_edge) = record_through(&origin, &path_edges);
                through_locations.push(origin);
            }

            if !is_last {
                self.engines.engine_mut(kind).clear();
            }
        }

        Ok(trips)
    }

    /// Invokes the selected engine, escalating through the relaxation
    /// ladder when no path is found: a second pass with loosened
    /// hierarchy limits, and for forward A* a third with highway
    /// transitions disabled. Relaxation mutates the costing model and
    /// deliberately stays in effect for later legs of the request.
    fn best_path_with_retry(
        &mut self,
        kind: AlgorithmKind,
        origin: &PathLocation,
        destination: &PathLocation,
    ) -> Vec<PathInfo> {
        let RouteWorker {
            reader,
            costing,
            engines,
            mode,
            ..
        } = self;
        let engine = engines.engine_mut(kind);

        debug!("path pass 1 via {kind:?}");
        let mut path = engine.best_path(origin, destination, reader, costing, *mode);
        if !path.is_empty() || !costing[*mode].allow_multi_pass() {
            return path;
        }

        // Second pass: less aggressive hierarchy transitioning.
        engine.clear();
        let forward = kind == AlgorithmKind::Forward;
        let (relax_factor, expansion_within_factor) = if forward { (16.0, 4.0) } else { (8.0, 2.0) };
        costing[*mode].relax_hierarchy_limits(relax_factor, expansion_within_factor);

        debug!("path pass 2 via {kind:?}");
        path = engine.best_path(origin, destination, reader, costing, *mode);

        if path.is_empty() && forward {
            engine.clear();
            costing[*mode].disable_highway_transitions();

            debug!("path pass 3 via {kind:?}");
            path = engine.best_path(origin, destination, reader, costing, *mode);
        }

        path
    }

    /// Rewrites a leg origin that sits on the previous leg's through
    /// waypoint so the router continues past it instead of doubling
    /// back.
    fn update_origin(&self, origin: &mut PathLocation, prior_is_node: bool, through_edge: GraphId) {
        if prior_is_node {
            // The snap was at a node: every outbound candidate stays
            // permitted.
            // TODO - strip the opposing inbound edge here, unless every
            // outbound edge enters a not-through region.
            return;
        }

        let Some(edge) = self.reader.directededge(through_edge) else {
            return;
        };

        // Leave candidates untouched when the through edge enters a
        // not-through region, so the router may escape back through the
        // opposing edge.
        if edge.not_thru {
            return;
        }

        let ends_at_node = origin
            .edges
            .iter()
            .any(|e| e.id == through_edge && e.end_node());

        if ends_at_node {
            // The through point sits at the edge's end node: drop the
            // through edge and its opposing edge so the continuation
            // leaves on a different edge.
            let opposing = self.reader.opposing_edge_id(through_edge);
            origin
                .edges
                .retain(|e| e.id != through_edge && Some(e.id) != opposing);
        } else if let Some(edge) = origin.edges.iter().find(|e| e.id == through_edge).copied() {
            // Mid-edge through point: force continuity along the same
            // edge.
            origin.edges.clear();
            origin.edges.push(edge);
        }
    }
}

/// Extends a running edge sequence with the next leg, biasing the new
/// leg's cumulative times by the time already accrued and dropping a
/// duplicated edge at the join.
fn merge_leg(path_edges: &mut Vec<PathInfo>, temp_path: Vec<PathInfo>) {
    if path_edges.is_empty() {
        *path_edges = temp_path;
        return;
    }

    let bias = path_edges.last().map_or(0, |info| info.elapsed);
    if path_edges.last().map(|info| info.edge) == temp_path.first().map(|info| info.edge) {
        path_edges.pop();
    }

    path_edges.extend(temp_path.into_iter().map(|mut info| {
        info.elapsed += bias;
        info
    }));
}

/// Captures the state needed to constrain the next leg past a through
/// waypoint: the last edge produced, and whether the waypoint snapped
/// onto it at a node boundary.
fn record_through(boundary: &PathLocation, path_edges: &[PathInfo]) -> (bool, GraphId) {
    let back = path_edges.last().map_or(GraphId::INVALID, |info| info.edge);

    let prior_is_node = boundary
        .edges
        .iter()
        .find(|e| e.id == back)
        .map(|e| e.begin_node() || e.end_node())
        .unwrap_or(false);

    (prior_is_node, back)
}
