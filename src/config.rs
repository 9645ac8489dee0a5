//! Configuration parameters for the trip planner.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Most interior stops a single day may ever hold.
///
/// Every day is sequenced by trying all orderings, so this caps the search
/// at `9!` permutations.
pub const MAX_INTERIOR_STOPS: usize = 9;

/// Configuration settings for the planning pipeline.
///
/// These are engine-level settings shared by every request; per-trip limits
/// (capacity per day, number of nights) live on the request itself and are
/// checked against the ceilings defined here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Seed for the k-means initialisation
    pub cluster_seed: u64,
    /// Maximum Lloyd iterations per k-means run
    pub kmeans_max_iterations: u64,
    /// Convergence tolerance for k-means
    pub kmeans_tolerance: f64,
    /// Number of k-means restarts; the lowest inertia wins
    pub kmeans_runs: usize,
    /// Distance substituted for a pair with no path, in metres
    pub no_path_penalty_m: f64,
    /// Upper bound accepted for the per-day spot limit
    pub spot_limit_ceiling: usize,
    /// Upper bound accepted for the per-day restaurant limit
    pub restaurant_limit_ceiling: usize,
    /// Longest trip accepted, in nights
    pub max_nights: usize,
    /// Furthest a place may be from its nearest road node, in metres
    pub max_snap_distance_m: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig {
            cluster_seed: 42,
            kmeans_max_iterations: 300,
            kmeans_tolerance: 1e-4,
            kmeans_runs: 10,
            no_path_penalty_m: 1e9,
            spot_limit_ceiling: 5,
            restaurant_limit_ceiling: 3,
            max_nights: 7,
            max_snap_distance_m: 2_000.0,
        }
    }
}

impl PlannerConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        PlannerConfig::default()
    }

    /// Set the k-means seed.
    pub fn with_cluster_seed(mut self, seed: u64) -> Self {
        self.cluster_seed = seed;
        self
    }

    /// Set the k-means iteration cap.
    pub fn with_kmeans_max_iterations(mut self, iterations: u64) -> Self {
        self.kmeans_max_iterations = iterations;
        self
    }

    /// Set the k-means convergence tolerance.
    pub fn with_kmeans_tolerance(mut self, tolerance: f64) -> Self {
        self.kmeans_tolerance = tolerance;
        self
    }

    /// Set the number of k-means restarts.
    pub fn with_kmeans_runs(mut self, runs: usize) -> Self {
        self.kmeans_runs = runs;
        self
    }

    /// Set the no-path penalty in metres.
    pub fn with_no_path_penalty_m(mut self, penalty: f64) -> Self {
        self.no_path_penalty_m = penalty;
        self
    }

    /// Set the ceiling for the per-day spot limit.
    pub fn with_spot_limit_ceiling(mut self, ceiling: usize) -> Self {
        self.spot_limit_ceiling = ceiling;
        self
    }

    /// Set the ceiling for the per-day restaurant limit.
    pub fn with_restaurant_limit_ceiling(mut self, ceiling: usize) -> Self {
        self.restaurant_limit_ceiling = ceiling;
        self
    }

    /// Set the longest accepted trip.
    pub fn with_max_nights(mut self, nights: usize) -> Self {
        self.max_nights = nights;
        self
    }

    /// Set the snap distance used when resolving places onto a road network.
    pub fn with_max_snap_distance_m(mut self, distance: f64) -> Self {
        self.max_snap_distance_m = distance;
        self
    }

    /// The no-path penalty in kilometres, the unit routes are scored in.
    pub fn no_path_penalty_km(&self) -> f64 {
        self.no_path_penalty_m / 1000.0
    }

    /// Check that the settings describe a usable planner.
    ///
    /// The ceilings bound the per-day permutation search, so they must stay
    /// small and positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.spot_limit_ceiling == 0 || self.restaurant_limit_ceiling == 0 {
            return Err(ConfigError::InvalidSetting(
                "capacity ceilings must be at least 1".to_string(),
            ));
        }
        // a midday rest adds the accommodation as one more interior stop
        let interior = self
            .spot_limit_ceiling
            .saturating_add(self.restaurant_limit_ceiling)
            .saturating_add(1);
        if interior > MAX_INTERIOR_STOPS {
            return Err(ConfigError::InvalidSetting(format!(
                "capacity ceilings allow {} stops per day (midday rest included), at most {} are supported",
                interior, MAX_INTERIOR_STOPS
            )));
        }
        if self.kmeans_max_iterations == 0 || self.kmeans_runs == 0 {
            return Err(ConfigError::InvalidSetting(
                "k-means needs at least one run and one iteration".to_string(),
            ));
        }
        if !(self.kmeans_tolerance > 0.0) {
            return Err(ConfigError::InvalidSetting(format!(
                "k-means tolerance must be positive, got {}",
                self.kmeans_tolerance
            )));
        }
        if !(self.no_path_penalty_m.is_finite() && self.no_path_penalty_m > 0.0) {
            return Err(ConfigError::InvalidSetting(format!(
                "no-path penalty must be a positive finite distance, got {}",
                self.no_path_penalty_m
            )));
        }
        if !(self.max_snap_distance_m > 0.0) {
            return Err(ConfigError::InvalidSetting(format!(
                "snap distance must be positive, got {}",
                self.max_snap_distance_m
            )));
        }
        Ok(())
    }
}
