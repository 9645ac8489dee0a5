//! Distance oracle interface and the name-to-node map.
//!
//! The planner never owns its routing backend: an oracle is built once and
//! passed in by reference, so many trips can be planned against the same
//! read-only network at the same time.

use std::collections::HashMap;

use crate::error::{PlanError, ResolveError};
use crate::problem::Coordinate;

/// Identifier of a routable node.
pub type NodeId = usize;

/// Provides node lookup and shortest-path distances.
///
/// Implementations must be usable through a shared reference; the planner
/// never mutates an oracle.
pub trait DistanceOracle {
    /// Map a coordinate onto the nearest routable node.
    fn resolve_node(&self, coordinate: Coordinate) -> Result<NodeId, ResolveError>;

    /// Shortest-path length between two nodes in metres, or `None` when no
    /// path exists.
    fn shortest_path_distance(&self, from: NodeId, to: NodeId) -> Option<f64>;
}

/// Routable node of every named place in a trip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeMap {
    nodes: HashMap<String, NodeId>,
}

impl NodeMap {
    /// Resolve every place once.
    ///
    /// The first place that cannot be resolved aborts the build and is named
    /// in the error.
    pub fn build<'p, O, I>(places: I, oracle: &O) -> Result<Self, PlanError>
    where
        O: DistanceOracle + ?Sized,
        I: IntoIterator<Item = (&'p str, Coordinate)>,
    {
        let mut nodes = HashMap::new();

        for (name, coordinate) in places {
            if nodes.contains_key(name) {
                continue;
            }
            let node = oracle
                .resolve_node(coordinate)
                .map_err(|source| PlanError::MissingLocation {
                    name: name.to_string(),
                    source,
                })?;
            nodes.insert(name.to_string(), node);
        }

        Ok(NodeMap { nodes })
    }

    pub fn get(&self, name: &str) -> Option<NodeId> {
        self.nodes.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Great-circle distances between a fixed set of points.
///
/// Used when no road network is available: every pair is reachable and the
/// distance is the haversine length.
#[derive(Debug, Clone, Default)]
pub struct StraightLineOracle {
    points: Vec<Coordinate>,
}

impl StraightLineOracle {
    pub fn new(points: Vec<Coordinate>) -> Self {
        StraightLineOracle { points }
    }

    pub fn from_coordinates<I: IntoIterator<Item = Coordinate>>(points: I) -> Self {
        StraightLineOracle::new(points.into_iter().collect())
    }
}

impl DistanceOracle for StraightLineOracle {
    fn resolve_node(&self, coordinate: Coordinate) -> Result<NodeId, ResolveError> {
        self.points
            .iter()
            .enumerate()
            .map(|(i, p)| (i, p.haversine_m(&coordinate)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
            .ok_or(ResolveError::EmptyNetwork)
    }

    fn shortest_path_distance(&self, from: NodeId, to: NodeId) -> Option<f64> {
        let a = self.points.get(from)?;
        let b = self.points.get(to)?;
        Some(a.haversine_m(b))
    }
}
