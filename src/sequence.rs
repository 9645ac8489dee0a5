//! Per-day route sequencing by exhaustive permutation search.
//!
//! A day's route runs from a fixed start anchor through every interior stop
//! to an optional fixed end anchor. All orderings of the interior stops are
//! scored against the distance oracle and the shortest wins. The search is
//! factorial in the number of interior stops; the per-day capacity ceilings
//! keep that number small.

use itertools::Itertools;
use log::{debug, warn};

use crate::error::PlanError;
use crate::oracle::{DistanceOracle, NodeMap};
use crate::problem::TripProblem;
use crate::solution::{Role, RouteStop};

/// Fixed ends of a day's route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayAnchors {
    pub start: RouteStop,
    /// `None` leaves the route open after its last interior stop
    pub end: Option<RouteStop>,
}

impl DayAnchors {
    /// Work out the anchors of `day`.
    ///
    /// * the first day starts at the trip start;
    /// * the arrival day starts at the last accommodation and ends at the
    ///   trip end;
    /// * any other day starts at its own accommodation when luggage is
    ///   dropped there first, otherwise at the previous night's stay, and
    ///   ends at its own accommodation.
    pub fn for_day(problem: &TripProblem, day: usize) -> Self {
        let origin = || RouteStop::with_role(problem.start.name.clone(), Role::Origin);
        let stay = |name: &str| RouteStop::with_role(name, Role::Accommodation);

        let start = if day == 0 {
            origin()
        } else if problem.is_arrival_day(day) {
            problem
                .previous_accommodation(day)
                .map_or_else(origin, |a| stay(&a.name))
        } else {
            match problem.accommodation(day) {
                Some(own) if own.drop_luggage => stay(&own.name),
                _ => problem
                    .previous_accommodation(day)
                    .map_or_else(origin, |a| stay(&a.name)),
            }
        };

        let end = if problem.is_arrival_day(day) {
            Some(RouteStop::with_role(problem.end.name.clone(), Role::Destination))
        } else {
            problem.accommodation(day).map(|a| stay(&a.name))
        };

        DayAnchors { start, end }
    }
}

/// Best ordering found for one day.
#[derive(Debug, Clone, PartialEq)]
pub struct SequencedRoute {
    pub stops: Vec<RouteStop>,
    /// Route length in kilometres, penalties included
    pub distance_km: f64,
}

/// Orders interior stops between fixed anchors.
pub struct RouteSequencer<'a, O: DistanceOracle + ?Sized> {
    oracle: &'a O,
    node_map: &'a NodeMap,
    penalty_km: f64,
}

impl<'a, O: DistanceOracle + ?Sized> RouteSequencer<'a, O> {
    /// Create a sequencer; `penalty_km` replaces the length of any leg with
    /// no path.
    pub fn new(oracle: &'a O, node_map: &'a NodeMap, penalty_km: f64) -> Self {
        RouteSequencer {
            oracle,
            node_map,
            penalty_km,
        }
    }

    /// Length in kilometres of the leg between two named places.
    pub fn leg_distance(&self, from: &str, to: &str) -> Result<f64, PlanError> {
        let a = self.node(from)?;
        let b = self.node(to)?;

        match self.oracle.shortest_path_distance(a, b) {
            Some(metres) => Ok(metres / 1000.0),
            None => {
                warn!("no path between {:?} and {:?}, applying penalty", from, to);
                Ok(self.penalty_km)
            }
        }
    }

    /// Total length in kilometres of visiting `names` in order.
    pub fn route_distance(&self, names: &[&str]) -> Result<f64, PlanError> {
        let mut total = 0.0;
        for pair in names.windows(2) {
            total += self.leg_distance(pair[0], pair[1])?;
        }
        Ok(total)
    }

    /// Find the shortest ordering of `interior` between the anchors.
    ///
    /// Every pairwise leg is fetched from the oracle once; permutations are
    /// then scored against that matrix. The first permutation reaching the
    /// minimum is kept.
    pub fn sequence(
        &self,
        anchors: &DayAnchors,
        interior: &[RouteStop],
    ) -> Result<SequencedRoute, PlanError> {
        let mut stops: Vec<&RouteStop> = Vec::with_capacity(interior.len() + 2);
        stops.push(&anchors.start);
        stops.extend(interior);
        if let Some(end) = &anchors.end {
            stops.push(end);
        }

        let n = stops.len();
        let mut matrix = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    matrix[i][j] = self.leg_distance(&stops[i].name, &stops[j].name)?;
                }
            }
        }

        let m = interior.len();
        let end_index = anchors.end.as_ref().map(|_| n - 1);

        let cost = |perm: &[usize]| -> f64 {
            let mut total = 0.0;
            let mut prev = 0;
            for &k in perm {
                total += matrix[prev][k + 1];
                prev = k + 1;
            }
            if let Some(end) = end_index {
                total += matrix[prev][end];
            }
            total
        };

        let mut best_perm: Vec<usize> = (0..m).collect();
        let mut best_cost = cost(&best_perm);

        if m > 1 {
            for perm in (0..m).permutations(m) {
                let c = cost(&perm);
                if c < best_cost {
                    best_cost = c;
                    best_perm = perm;
                }
            }
        }

        debug!(
            "sequenced {} interior stops from {:?}: {:.3} km",
            m, anchors.start.name, best_cost
        );

        let mut route = Vec::with_capacity(n);
        route.push(anchors.start.clone());
        route.extend(best_perm.iter().map(|&k| interior[k].clone()));
        if let Some(end) = &anchors.end {
            route.push(end.clone());
        }

        Ok(SequencedRoute {
            stops: route,
            distance_km: best_cost,
        })
    }

    fn node(&self, name: &str) -> Result<usize, PlanError> {
        self.node_map
            .get(name)
            .ok_or_else(|| PlanError::Internal(format!("no routable node recorded for {name:?}")))
    }
}
