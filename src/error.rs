//! Error types for trip planning.
//!
//! Configuration problems, resolution failures and unexpected faults are kept
//! as distinct variants so a caller can tell them apart. Routing gaps are not
//! errors at all: the route sequencer absorbs them as a distance penalty.

use thiserror::Error;

use crate::problem::DayKey;

/// A request or planner configuration that cannot be planned.
///
/// Raised while validating a [`TripRequest`](crate::problem::TripRequest),
/// before any allocation work starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("daily weights sum to zero")]
    ZeroWeightSum,
    #[error("expected {expected} daily weights (one per day), found {found}")]
    WeightCount { expected: usize, found: usize },
    #[error("{field} must be between 1 and {max}, got {value}")]
    CapacityOutOfRange {
        field: &'static str,
        value: usize,
        max: usize,
    },
    #[error("a trip of {nights} nights exceeds the supported maximum of {max}")]
    TooManyNights { nights: usize, max: usize },
    #[error("destination {0:?} is listed more than once")]
    DuplicateDestination(String),
    #[error("destination {0:?} shares its name with the trip start or end")]
    ReservedName(String),
    #[error("place {0:?} is given two different coordinates")]
    ConflictingPlace(String),
    #[error("place {0:?} has a non-finite coordinate")]
    InvalidCoordinate(String),
    #[error("accommodation keyed to {day} but the trip only has {nights} nights")]
    AccommodationOutOfRange { day: DayKey, nights: usize },
    #[error("invalid planner setting: {0}")]
    InvalidSetting(String),
}

/// Failure to map a coordinate onto a routable node.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    #[error("the network has no nodes")]
    EmptyNetwork,
    #[error("nearest node is {distance_m:.0} m away, beyond the {limit_m:.0} m snap limit")]
    TooFar { distance_m: f64, limit_m: f64 },
}

/// Failure to build a [`RoadNetwork`](crate::network::RoadNetwork).
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("failed to read road network: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse road network JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("edge {edge} references unknown node {node}")]
    UnknownNode { edge: usize, node: u64 },
    #[error("node id {0} is defined more than once")]
    DuplicateNode(u64),
    #[error("edge {edge} has invalid length {length}")]
    InvalidLength { edge: usize, length: f64 },
}

/// Everything that can stop a plan from being produced.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("missing location {name:?}: {source}")]
    MissingLocation {
        name: String,
        #[source]
        source: ResolveError,
    },
    #[error("internal error: {0}")]
    Internal(String),
}

impl PlanError {
    /// The place that could not be resolved, if this is a resolution failure.
    pub fn missing_place(&self) -> Option<&str> {
        match self {
            PlanError::MissingLocation { name, .. } => Some(name),
            _ => None,
        }
    }
}
