//! Spatial clustering of spots into day-sized groups.
//!
//! Spots are partitioned with k-means (seeded, so identical input always
//! yields the same clusters), the cluster count is chosen by silhouette
//! score, and the clusters are ordered so that walking their centroids from
//! the trip start to the trip end is as short as possible.

use itertools::Itertools;
use linfa::prelude::*;
use linfa_clustering::KMeans;
use log::{debug, warn};
use ndarray::Array2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::config::PlannerConfig;
use crate::error::PlanError;
use crate::problem::{Coordinate, Destination};

/// Spots grouped into clusters, in visiting order.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterPlan {
    /// Member names per cluster, farthest from the centroid first
    pub clusters: Vec<Vec<String>>,
    /// Centroid of each cluster, parallel to `clusters`
    pub centroids: Vec<Coordinate>,
    /// Silhouette score of the chosen partition, if more than one cluster
    pub silhouette: Option<f64>,
}

impl ClusterPlan {
    fn empty() -> Self {
        ClusterPlan {
            clusters: Vec::new(),
            centroids: Vec::new(),
            silhouette: None,
        }
    }
}

/// Groups spots and orders the groups into a day sequence.
pub struct ClusterSequencer<'a> {
    config: &'a PlannerConfig,
}

impl<'a> ClusterSequencer<'a> {
    pub fn new(config: &'a PlannerConfig) -> Self {
        ClusterSequencer { config }
    }

    /// Cluster `spots` into at most `max_clusters` groups and order them
    /// along the path from `start` to `end`.
    pub fn sequence(
        &self,
        spots: &[&Destination],
        max_clusters: usize,
        start: Coordinate,
        end: Coordinate,
    ) -> Result<ClusterPlan, PlanError> {
        if spots.is_empty() {
            return Ok(ClusterPlan::empty());
        }

        let points: Vec<Coordinate> = spots.iter().map(|s| s.coordinate()).collect();
        let (labels, silhouette) = self.choose_partition(&points, max_clusters.max(1))?;
        let groups = group_by_label(&labels);

        let centroids: Vec<Coordinate> = groups
            .iter()
            .map(|members| centroid(members.iter().map(|&i| points[i])))
            .collect();

        let order = order_clusters(&centroids, start, end);
        debug!(
            "ordered {} clusters as {:?} (silhouette {:?})",
            groups.len(),
            order,
            silhouette
        );

        let mut clusters = Vec::with_capacity(order.len());
        let mut ordered_centroids = Vec::with_capacity(order.len());

        for &c in &order {
            let center = centroids[c];
            let members = groups[c]
                .iter()
                .map(|&i| spots[i])
                .sorted_by(|a, b| {
                    let da = a.coordinate().euclidean(&center);
                    let db = b.coordinate().euclidean(&center);
                    db.total_cmp(&da).then_with(|| a.name.cmp(&b.name))
                })
                .map(|d| d.name.clone())
                .collect();

            clusters.push(members);
            ordered_centroids.push(center);
        }

        Ok(ClusterPlan {
            clusters,
            centroids: ordered_centroids,
            silhouette,
        })
    }

    /// Pick the partition with the best silhouette score.
    ///
    /// Candidates `k` run from 2 to `min(n - 1, max_clusters)`; a single
    /// cluster is used when there are fewer than two points or no candidate
    /// yields at least two distinct labels.
    fn choose_partition(
        &self,
        points: &[Coordinate],
        max_clusters: usize,
    ) -> Result<(Vec<usize>, Option<f64>), PlanError> {
        let n = points.len();
        let single = (vec![0; n], None);

        if n < 2 {
            return Ok(single);
        }

        let upper = (n - 1).min(max_clusters);
        let mut best: Option<(Vec<usize>, f64)> = None;

        for k in 2..=upper {
            let labels = match self.fit(points, k)? {
                Some(labels) => labels,
                None => continue,
            };

            if labels.iter().unique().count() < 2 {
                debug!("k = {} collapsed to a single label, skipping", k);
                continue;
            }

            let score = silhouette_score(points, &labels);
            debug!("k = {} silhouette {:.4}", k, score);

            if best.as_ref().map_or(true, |(_, s)| score > *s) {
                best = Some((labels, score));
            }
        }

        Ok(match best {
            Some((labels, score)) => (labels, Some(score)),
            None => single,
        })
    }

    /// Fit k-means with the configured seed and return the labels.
    ///
    /// A fit that fails (for example on degenerate, coincident points) is
    /// logged and treated as an unusable candidate.
    pub fn fit(&self, points: &[Coordinate], k: usize) -> Result<Option<Vec<usize>>, PlanError> {
        let flat: Vec<f64> = points.iter().flat_map(|p| [p.lat, p.lng]).collect();
        let observations = Array2::from_shape_vec((points.len(), 2), flat)
            .map_err(|e| PlanError::Internal(format!("bad observation matrix: {e}")))?;
        let dataset = DatasetBase::from(observations);

        let rng = ChaCha8Rng::seed_from_u64(self.config.cluster_seed);
        let model = match KMeans::params_with_rng(k, rng)
            .n_runs(self.config.kmeans_runs)
            .max_n_iterations(self.config.kmeans_max_iterations)
            .tolerance(self.config.kmeans_tolerance)
            .fit(&dataset)
        {
            Ok(model) => model,
            Err(err) => {
                warn!("k-means with k = {} failed: {}", k, err);
                return Ok(None);
            }
        };

        let centers: Vec<Coordinate> = model
            .centroids()
            .rows()
            .into_iter()
            .map(|row| Coordinate::new(row[0], row[1]))
            .collect();

        Ok(Some(points.iter().map(|p| nearest(p, &centers)).collect()))
    }
}

/// Index of the centre closest to `point`; the lowest index wins ties.
fn nearest(point: &Coordinate, centers: &[Coordinate]) -> usize {
    centers
        .iter()
        .map(|c| point.euclidean(c))
        .position_min_by(|a, b| a.total_cmp(b))
        .unwrap_or(0)
}

/// Group point indices by label, in ascending label order.
///
/// Labels need not be contiguous; empty clusters simply do not appear.
fn group_by_label(labels: &[usize]) -> Vec<Vec<usize>> {
    labels
        .iter()
        .copied()
        .unique()
        .sorted()
        .map(|label| {
            labels
                .iter()
                .enumerate()
                .filter(|(_, &l)| l == label)
                .map(|(i, _)| i)
                .collect()
        })
        .collect()
}

/// Mean of a set of coordinates.
pub fn centroid<I: IntoIterator<Item = Coordinate>>(points: I) -> Coordinate {
    let mut sum_lat = 0.0;
    let mut sum_lng = 0.0;
    let mut count = 0;

    for p in points {
        sum_lat += p.lat;
        sum_lng += p.lng;
        count += 1;
    }

    if count > 0 {
        Coordinate::new(sum_lat / count as f64, sum_lng / count as f64)
    } else {
        Coordinate::new(0.0, 0.0)
    }
}

/// Mean silhouette coefficient of a labelling.
///
/// For each point, `a` is the mean distance to the rest of its own cluster
/// and `b` the smallest mean distance to another cluster; the point scores
/// `(b - a) / max(a, b)`, or 0 when it is alone in its cluster.
pub fn silhouette_score(points: &[Coordinate], labels: &[usize]) -> f64 {
    let clusters: Vec<usize> = labels.iter().copied().unique().collect();
    if points.is_empty() || clusters.len() < 2 {
        return 0.0;
    }

    let mut total = 0.0;

    for (i, p) in points.iter().enumerate() {
        let own = labels[i];
        let own_size = labels.iter().filter(|&&l| l == own).count();

        if own_size <= 1 {
            continue;
        }

        let mean_to = |label: usize| -> f64 {
            let (sum, count) = points
                .iter()
                .zip(labels)
                .enumerate()
                .filter(|&(j, (_, &l))| l == label && j != i)
                .fold((0.0, 0usize), |(s, c), (_, (q, _))| (s + p.euclidean(q), c + 1));
            sum / count as f64
        };

        let a = mean_to(own);
        let b = clusters
            .iter()
            .filter(|&&l| l != own)
            .map(|&l| mean_to(l))
            .fold(f64::INFINITY, f64::min);

        let denom = a.max(b);
        if denom > 0.0 {
            total += (b - a) / denom;
        }
    }

    total / points.len() as f64
}

/// Order clusters to minimise `start -> c_1 -> ... -> c_k -> end`.
///
/// Every permutation is tried; the first one reaching the minimum wins.
pub fn order_clusters(centroids: &[Coordinate], start: Coordinate, end: Coordinate) -> Vec<usize> {
    let k = centroids.len();
    if k == 0 {
        return Vec::new();
    }

    let mut best_order: Vec<usize> = (0..k).collect();
    let mut best_length = f64::INFINITY;

    for perm in (0..k).permutations(k) {
        let mut length = start.euclidean(&centroids[perm[0]]);
        for pair in perm.windows(2) {
            length += centroids[pair[0]].euclidean(&centroids[pair[1]]);
        }
        length += centroids[perm[k - 1]].euclidean(&end);

        if length < best_length {
            best_length = length;
            best_order = perm;
        }
    }

    best_order
}
