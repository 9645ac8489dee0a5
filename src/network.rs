//! Road network graph backed by `petgraph`.
//!
//! Nodes carry coordinates and edges carry lengths in metres. The graph is
//! undirected and never changes after construction, so a single network can
//! serve concurrent planning requests.

use petgraph::algo::dijkstra;
use petgraph::graph::{NodeIndex, UnGraph};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::{NetworkError, ResolveError};
use crate::oracle::{DistanceOracle, NodeId};
use crate::problem::Coordinate;

/// A node as written in a network file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkNode {
    pub id: u64,
    pub lat: f64,
    pub lng: f64,
}

/// An edge as written in a network file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkEdge {
    pub from: u64,
    pub to: u64,
    /// Length in metres; the great-circle distance between the endpoints when absent
    #[serde(default)]
    pub length: Option<f64>,
}

/// Serialized form of a road network.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkData {
    pub nodes: Vec<NetworkNode>,
    pub edges: Vec<NetworkEdge>,
}

/// Undirected road graph answering shortest-path queries.
#[derive(Debug, Clone)]
pub struct RoadNetwork {
    graph: UnGraph<Coordinate, f64>,
    max_snap_distance_m: f64,
}

impl RoadNetwork {
    /// Build a network from nodes and edges.
    pub fn from_data(data: NetworkData, max_snap_distance_m: f64) -> Result<Self, NetworkError> {
        let mut graph = UnGraph::with_capacity(data.nodes.len(), data.edges.len());
        let mut index: HashMap<u64, NodeIndex> = HashMap::with_capacity(data.nodes.len());

        for node in &data.nodes {
            if index.contains_key(&node.id) {
                return Err(NetworkError::DuplicateNode(node.id));
            }
            let idx = graph.add_node(Coordinate::new(node.lat, node.lng));
            index.insert(node.id, idx);
        }

        for (i, edge) in data.edges.iter().enumerate() {
            let a = *index.get(&edge.from).ok_or(NetworkError::UnknownNode {
                edge: i,
                node: edge.from,
            })?;
            let b = *index.get(&edge.to).ok_or(NetworkError::UnknownNode {
                edge: i,
                node: edge.to,
            })?;

            let length = match edge.length {
                Some(length) => length,
                None => graph[a].haversine_m(&graph[b]),
            };
            if !(length.is_finite() && length >= 0.0) {
                return Err(NetworkError::InvalidLength { edge: i, length });
            }

            graph.add_edge(a, b, length);
        }

        Ok(RoadNetwork {
            graph,
            max_snap_distance_m,
        })
    }

    /// Read a network from JSON.
    pub fn from_reader<R: Read>(reader: R, max_snap_distance_m: f64) -> Result<Self, NetworkError> {
        let data: NetworkData = serde_json::from_reader(reader)?;
        Self::from_data(data, max_snap_distance_m)
    }

    /// Load a network from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P, max_snap_distance_m: f64) -> Result<Self, NetworkError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file), max_snap_distance_m)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Coordinate of a node.
    pub fn coordinate(&self, node: NodeId) -> Option<Coordinate> {
        self.graph.node_weight(NodeIndex::new(node)).copied()
    }
}

impl DistanceOracle for RoadNetwork {
    fn resolve_node(&self, coordinate: Coordinate) -> Result<NodeId, ResolveError> {
        let (node, distance_m) = self
            .graph
            .node_indices()
            .map(|idx| (idx, self.graph[idx].haversine_m(&coordinate)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .ok_or(ResolveError::EmptyNetwork)?;

        if distance_m > self.max_snap_distance_m {
            return Err(ResolveError::TooFar {
                distance_m,
                limit_m: self.max_snap_distance_m,
            });
        }

        Ok(node.index())
    }

    fn shortest_path_distance(&self, from: NodeId, to: NodeId) -> Option<f64> {
        let count = self.graph.node_count();
        if from >= count || to >= count {
            return None;
        }
        if from == to {
            return Some(0.0);
        }

        let target = NodeIndex::new(to);
        let costs = dijkstra(&self.graph, NodeIndex::new(from), Some(target), |e| {
            *e.weight()
        });

        costs.get(&target).copied()
    }
}
