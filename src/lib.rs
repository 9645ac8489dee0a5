//! # Trip planner
//!
//! Plans a multi-day trip: destinations are spread over the days of the trip
//! and each day's visits are put into the shortest order between that day's
//! fixed start and end points.
//!
//! The pipeline runs in a fixed order, each stage consuming the state left by
//! the one before:
//!
//! 1. [`allocation`] splits the destination count over days by weight;
//! 2. [`cluster`] groups spots with k-means and orders the groups from the
//!    trip start towards the trip end;
//! 3. [`placement`] puts clusters and restaurants on days within capacity and
//!    pours overflow into empty days;
//! 4. [`suggestion`] proposes a day for everything still unplaced;
//! 5. [`sequence`] orders each day's stops against a distance oracle.
//!
//! Routing is delegated to a [`DistanceOracle`](oracle::DistanceOracle)
//! supplied by the caller, such as the [`RoadNetwork`](network::RoadNetwork).

pub mod allocation;
pub mod cluster;
pub mod config;
pub mod error;
pub mod network;
pub mod oracle;
pub mod placement;
pub mod problem;
pub mod sequence;
pub mod solution;
pub mod suggestion;
pub mod utils;

use crate::allocation::{Allocation, DayAllocator};
use crate::cluster::ClusterSequencer;
use crate::config::PlannerConfig;
use crate::error::PlanError;
use crate::oracle::{DistanceOracle, NodeMap};
use crate::placement::{PlacementState, Placer, Rebalancer};
use crate::problem::{Category, DayKey, TripProblem, TripRequest};
use crate::sequence::{DayAnchors, RouteSequencer};
use crate::solution::{DayRoute, Itinerary, Role, RouteStop, Suggestion};
use crate::suggestion::SuggestionGenerator;

use log::info;
use std::time::Instant;

/// Plans one trip against a shared distance oracle.
///
/// All request state lives in the planner; the oracle is only read.
pub struct TripPlanner<'a, O: DistanceOracle + ?Sized> {
    pub problem: TripProblem,
    pub config: PlannerConfig,
    oracle: &'a O,
}

impl<'a, O: DistanceOracle + ?Sized> TripPlanner<'a, O> {
    /// Validate the configuration and the request and create a planner.
    pub fn new(request: TripRequest, config: PlannerConfig, oracle: &'a O) -> Result<Self, PlanError> {
        config.validate()?;
        let problem = request.validate(&config)?;

        Ok(TripPlanner {
            problem,
            config,
            oracle,
        })
    }

    /// Resolve every named place onto the oracle's network.
    pub fn resolve(&self) -> Result<NodeMap, PlanError> {
        NodeMap::build(self.problem.places(), self.oracle)
    }

    /// Spread destination names over days by weight.
    pub fn allocate(&self) -> Result<Allocation, PlanError> {
        let names = self.problem.destination_names();
        Ok(DayAllocator::allocate(&names, &self.problem.weights)?)
    }

    /// Run clustering, placement and rebalancing.
    pub fn place(&self, allocation: &Allocation) -> Result<PlacementState, PlanError> {
        let cluster_days = allocation.active_days();
        let spots = self.problem.destinations_of(Category::Spot);
        let restaurants = self.problem.destinations_of(Category::Restaurant);

        let clusters = ClusterSequencer::new(&self.config).sequence(
            &spots,
            cluster_days.len(),
            self.problem.start.coordinate(),
            self.problem.end.coordinate(),
        )?;

        let mut state = PlacementState::new(self.problem.capacities());
        let placer = Placer::new(&self.problem);
        placer.place_spots(&mut state, &clusters.clusters, &cluster_days);
        placer.place_restaurants(&mut state, &restaurants);

        Rebalancer::rebalance(&self.problem, &mut state);

        Ok(state)
    }

    /// Suggest days for whatever is still waiting.
    pub fn suggest(&self, state: &PlacementState) -> Vec<Suggestion> {
        SuggestionGenerator::suggest(&self.problem, &state.plan, &state.waiting)
    }

    /// Order every day's stops.
    pub fn sequence(&self, state: &PlacementState, node_map: &NodeMap) -> Result<Vec<DayRoute>, PlanError> {
        let sequencer = RouteSequencer::new(self.oracle, node_map, self.config.no_path_penalty_km());

        (0..self.problem.day_count())
            .map(|day| {
                let anchors = DayAnchors::for_day(&self.problem, day);

                let mut interior: Vec<RouteStop> =
                    state.plan.day(day).iter().map(RouteStop::visit).collect();

                if !self.problem.is_arrival_day(day) && !self.problem.is_rest_day(day) {
                    if let Some(stay) = self.problem.accommodation(day).filter(|a| a.midday_rest) {
                        interior.push(RouteStop::with_role(stay.name.clone(), Role::Accommodation));
                    }
                }

                let route = sequencer.sequence(&anchors, &interior)?;

                Ok(DayRoute {
                    day: DayKey::from_index(day),
                    route: route.stops,
                    distance_km: route.distance_km,
                })
            })
            .collect()
    }

    /// Run the whole pipeline.
    pub fn run(&self) -> Result<Itinerary, PlanError> {
        let started = Instant::now();

        let node_map = self.resolve()?;
        let allocation = self.allocate()?;
        let state = self.place(&allocation)?;
        let suggestions = self.suggest(&state);

        let placed = state.plan.placed_count();
        if placed + suggestions.len() != self.problem.destinations.len() {
            return Err(PlanError::Internal(format!(
                "{} destinations in, {} placed and {} suggested",
                self.problem.destinations.len(),
                placed,
                suggestions.len()
            )));
        }

        let days = self.sequence(&state, &node_map)?;

        info!(
            "planned {} days: {} placed, {} unplaced, in {:?}",
            days.len(),
            placed,
            suggestions.len(),
            started.elapsed()
        );

        Ok(Itinerary { days, suggestions })
    }
}

/// Validate `request` and plan it in one call.
pub fn plan_trip<O: DistanceOracle + ?Sized>(
    request: TripRequest,
    config: PlannerConfig,
    oracle: &O,
) -> Result<Itinerary, PlanError> {
    TripPlanner::new(request, config, oracle)?.run()
}
