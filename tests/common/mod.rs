//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::collections::HashSet;

use trip_planner::error::ResolveError;
use trip_planner::oracle::{DistanceOracle, NodeId};
use trip_planner::problem::{Accommodation, Coordinate, Destination, Place, TripRequest};

/// Oracle over a fixed list of points with planar distances.
///
/// Distances are the Euclidean length in degree space times 1000, so one
/// degree reads back as one kilometre. Pairs listed in `blocked` have no path,
/// and coordinates in `unknown` cannot be resolved.
pub struct GridOracle {
    pub points: Vec<Coordinate>,
    pub blocked: HashSet<(NodeId, NodeId)>,
    pub unknown: Vec<Coordinate>,
}

impl GridOracle {
    pub fn new(points: Vec<Coordinate>) -> Self {
        GridOracle {
            points,
            blocked: HashSet::new(),
            unknown: Vec::new(),
        }
    }

    pub fn for_request(request: &TripRequest) -> Self {
        GridOracle::new(request.places().into_iter().map(|(_, c)| c).collect())
    }

    /// Remove the path between the nodes at `a` and `b`, both directions.
    pub fn block(&mut self, a: Coordinate, b: Coordinate) {
        let na = self.resolve_node(a).unwrap();
        let nb = self.resolve_node(b).unwrap();
        self.blocked.insert((na, nb));
        self.blocked.insert((nb, na));
    }

    pub fn refuse(&mut self, coordinate: Coordinate) {
        self.unknown.push(coordinate);
    }
}

impl DistanceOracle for GridOracle {
    fn resolve_node(&self, coordinate: Coordinate) -> Result<NodeId, ResolveError> {
        if self.unknown.contains(&coordinate) {
            return Err(ResolveError::TooFar {
                distance_m: 1e6,
                limit_m: 2_000.0,
            });
        }
        self.points
            .iter()
            .position(|p| *p == coordinate)
            .ok_or(ResolveError::EmptyNetwork)
    }

    fn shortest_path_distance(&self, from: NodeId, to: NodeId) -> Option<f64> {
        if self.blocked.contains(&(from, to)) {
            return None;
        }
        let a = self.points.get(from)?;
        let b = self.points.get(to)?;
        Some(a.euclidean(b) * 1000.0)
    }
}

/// Start "A" at (0, 0), end "Z" at (10, 10), one night at "H" (5, 5) and four
/// spots on the diagonal between them.
pub fn create_line_request() -> TripRequest {
    TripRequest::new(Place::new("A", 0.0, 0.0), Place::new("Z", 10.0, 10.0), 1)
        .with_destinations(vec![
            Destination::spot("S1", 2.0, 2.0),
            Destination::spot("S2", 3.0, 3.0),
            Destination::spot("S3", 7.0, 7.0),
            Destination::spot("S4", 8.0, 8.0),
        ])
        .with_daily_weights(vec![1u32, 1])
        .with_accommodation(1, Accommodation::new("H", 5.0, 5.0))
        .with_capacity(5, 3)
}

/// A three-night trip with two spot clusters, restaurants and hotels.
pub fn create_tour_request() -> TripRequest {
    TripRequest::new(Place::new("Start", 0.0, 0.0), Place::new("End", 30.0, 0.0), 3)
        .with_destinations(vec![
            Destination::spot("West1", 1.0, 1.0),
            Destination::spot("West2", 1.5, 0.5),
            Destination::spot("West3", 2.0, 1.5),
            Destination::spot("East1", 20.0, 1.0),
            Destination::spot("East2", 20.5, 0.5),
            Destination::spot("East3", 21.0, 1.5),
            Destination::restaurant("WestFood", 1.2, 0.8),
            Destination::restaurant("EastFood", 20.2, 0.8),
        ])
        .with_daily_weights(vec![1u32, 1, 1, 1])
        .with_accommodation(1, Accommodation::new("Inn1", 3.0, 0.0))
        .with_accommodation(2, Accommodation::new("Inn2", 15.0, 0.0))
        .with_accommodation(3, Accommodation::new("Inn3", 22.0, 0.0))
        .with_capacity(3, 2)
}
