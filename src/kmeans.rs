//! K-means clustering implementation.

use std::time::Instant;

use log::debug;
use rand::Rng;
use rayon::prelude::*;

use crate::distance::{argmin, relative_shift, squared_euclidean};
use crate::error::{Result, invalid_argument};
use crate::sampling::{distinct_count, sample_distinct};

const DEFAULT_TOLERANCE: f32 = 0.01;
const RAYON_BLOCK_SIZE: usize = 64;

/// Assign vectors to centroids in single thread.
pub fn base_assign<P: AsRef<[f32]>>(
    points: &[P],
    centroids: &[f32],
    dim: usize,
    labels: &mut [u32],
) {
    let mut distances = vec![f32::MAX; centroids.len() / dim];
    for (label, point) in labels.iter_mut().zip(points.iter()) {
        for (j, centroid) in centroids.chunks(dim).enumerate() {
            distances[j] = squared_euclidean(point.as_ref(), centroid);
        }
        *label = argmin(&distances) as u32;
    }
}

/// Assign vectors to centroids in multi-threads.
///
/// Produces exactly the same labels as [`base_assign`].
pub fn base_assign_parallel<P: AsRef<[f32]> + Sync>(
    points: &[P],
    centroids: &[f32],
    dim: usize,
    labels: &mut [u32],
) {
    labels
        .par_chunks_mut(RAYON_BLOCK_SIZE)
        .zip(points.par_chunks(RAYON_BLOCK_SIZE))
        .for_each(|(labels, points)| base_assign(points, centroids, dim, labels));
}

/// Outcome of one update step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateStats {
    /// Clusters that received no vector and kept their previous centroid.
    pub empty: usize,
    /// Largest relative change over every axis of every centroid.
    pub max_shift: f32,
}

/// Update centroids to the mean of assigned vectors.
///
/// Sums are accumulated in `f64` and in point order, so large clusters keep an exact mean
/// and the result does not depend on threading. The centroid of an empty cluster is left
/// untouched.
pub fn update_centroids<P: AsRef<[f32]>>(
    points: &[P],
    centroids: &mut [f32],
    dim: usize,
    labels: &[u32],
) -> UpdateStats {
    let mut means = vec![0.0f64; centroids.len()];
    let mut elements = vec![0usize; centroids.len() / dim];
    for (point, &label) in points.iter().zip(labels.iter()) {
        let label = label as usize;
        elements[label] += 1;
        means[label * dim..(label + 1) * dim]
            .iter_mut()
            .zip(point.as_ref().iter())
            .for_each(|(m, &v)| *m += v as f64);
    }

    let mut stats = UpdateStats {
        empty: 0,
        max_shift: 0.0,
    };
    for ((centroid, mean), &element) in centroids
        .chunks_mut(dim)
        .zip(means.chunks(dim))
        .zip(elements.iter())
    {
        if element == 0 {
            stats.empty += 1;
            continue;
        }
        let count = element as f64;
        for (c, &m) in centroid.iter_mut().zip(mean.iter()) {
            let updated = (m / count) as f32;
            stats.max_shift = stats.max_shift.max(relative_shift(*c, updated));
            *c = updated;
        }
    }
    stats
}

/// Final state of a k-means run.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusteringResult<'a> {
    /// One centroid per cluster, in cluster index order.
    pub centroids: Vec<Vec<f32>>,
    /// Input vectors grouped by cluster, index-aligned with `centroids`.
    ///
    /// This is the partition computed in the last iteration, i.e. the assignment made
    /// against the centroids *before* their final update.
    pub clusters: Vec<Vec<&'a [f32]>>,
    /// Cluster index of every input vector, by input position.
    pub labels: Vec<u32>,
    /// Number of iterations executed, including the converging one.
    pub iterations: usize,
    /// Whether the centroids stabilized before hitting `max_iter`.
    pub converged: bool,
    /// Total number of empty clusters seen across all iterations.
    pub empty_clusters: usize,
}

impl ClusteringResult<'_> {
    /// Sum of squared distances from every vector to the centroid of its cluster.
    pub fn inertia(&self) -> f32 {
        self.clusters
            .iter()
            .zip(self.centroids.iter())
            .map(|(cluster, centroid)| {
                cluster
                    .iter()
                    .map(|point| squared_euclidean(point, centroid))
                    .sum::<f32>()
            })
            .sum()
    }
}

/// K-means clustering algorithm (Lloyd's variant).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KMeans {
    n_cluster: usize,
    max_iter: usize,
    tolerance: f32,
    parallel: bool,
}

impl KMeans {
    /// Create a new KMeans instance.
    ///
    /// # Arguments
    ///
    /// * `n_cluster` - number of clusters, must not exceed the number of distinct input vectors
    /// * `max_iter` - max number of iterations
    ///
    /// The convergence tolerance defaults to 0.01: the run stops once no axis of any centroid
    /// moved by more than 1% relative to its previous value.
    pub fn new(n_cluster: usize, max_iter: usize) -> Result<Self> {
        if n_cluster < 1 {
            return Err(invalid_argument!("n_cluster must be greater than 0"));
        }
        if max_iter < 1 {
            return Err(invalid_argument!("max_iter must be greater than 0"));
        }
        Ok(Self {
            n_cluster,
            max_iter,
            tolerance: DEFAULT_TOLERANCE,
            parallel: true,
        })
    }

    /// Set the relative-change tolerance used by the convergence test.
    pub fn with_tolerance(mut self, tolerance: f32) -> Result<Self> {
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(invalid_argument!(
                "tolerance must be a finite non-negative number, got {}",
                tolerance
            ));
        }
        self.tolerance = tolerance;
        Ok(self)
    }

    /// Toggle the multi-threaded assignment step.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Number of clusters.
    pub fn n_cluster(&self) -> usize {
        self.n_cluster
    }

    /// Iteration cap.
    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    /// Convergence tolerance.
    pub fn tolerance(&self) -> f32 {
        self.tolerance
    }

    /// Check the input vectors and return their dimension.
    fn check_points<P: AsRef<[f32]>>(&self, points: &[P]) -> Result<usize> {
        let Some(first) = points.first() else {
            return Err(invalid_argument!("input must contain at least one vector"));
        };
        let dim = first.as_ref().len();
        if dim == 0 {
            return Err(invalid_argument!("vectors must have at least one dimension"));
        }
        for (i, point) in points.iter().enumerate() {
            let point = point.as_ref();
            if point.len() != dim {
                return Err(invalid_argument!(
                    "vector {} has dimension {}, expected {}",
                    i,
                    point.len(),
                    dim
                ));
            }
            if point.iter().any(|v| !v.is_finite()) {
                return Err(invalid_argument!("vector {} contains a non-finite value", i));
            }
        }
        if points.len() < self.n_cluster {
            return Err(invalid_argument!(
                "number of vectors {} is less than n_cluster {}",
                points.len(),
                self.n_cluster
            ));
        }
        Ok(dim)
    }

    /// Fit the KMeans configuration to the given vectors.
    ///
    /// The initial centroids are distinct vectors drawn uniformly from `points` with `rng`,
    /// so a seeded generator makes the whole run reproducible.
    pub fn fit<'a, P, R>(&self, points: &'a [P], rng: &mut R) -> Result<ClusteringResult<'a>>
    where
        P: AsRef<[f32]> + Sync,
        R: Rng + ?Sized,
    {
        let dim = self.check_points(points)?;
        let distinct = distinct_count(points);
        if distinct < self.n_cluster {
            return Err(invalid_argument!(
                "n_cluster {} exceeds the number of distinct vectors {}",
                self.n_cluster,
                distinct
            ));
        }
        debug!(
            "num of points: {}, distinct: {}, num of clusters: {}",
            points.len(),
            distinct,
            self.n_cluster
        );

        let centroids = sample_distinct(points, self.n_cluster, rng);
        Ok(self.lloyd(points, centroids, dim))
    }

    /// Fit the KMeans configuration starting from the given centroids.
    ///
    /// `initial` must hold exactly `n_cluster` pairwise distinct vectors with the same
    /// dimension as `points`.
    pub fn fit_from<'a, P, C>(
        &self,
        points: &'a [P],
        initial: &[C],
    ) -> Result<ClusteringResult<'a>>
    where
        P: AsRef<[f32]> + Sync,
        C: AsRef<[f32]>,
    {
        let dim = self.check_points(points)?;
        if initial.len() != self.n_cluster {
            return Err(invalid_argument!(
                "expected {} initial centroids, got {}",
                self.n_cluster,
                initial.len()
            ));
        }
        let mut centroids: Vec<f32> = Vec::with_capacity(self.n_cluster * dim);
        for (i, centroid) in initial.iter().enumerate() {
            let centroid = centroid.as_ref();
            if centroid.len() != dim {
                return Err(invalid_argument!(
                    "initial centroid {} has dimension {}, expected {}",
                    i,
                    centroid.len(),
                    dim
                ));
            }
            if centroid.iter().any(|v| !v.is_finite()) {
                return Err(invalid_argument!(
                    "initial centroid {} contains a non-finite value",
                    i
                ));
            }
            if centroids.chunks(dim).any(|c| c == centroid) {
                return Err(invalid_argument!("initial centroid {} is a duplicate", i));
            }
            centroids.extend_from_slice(centroid);
        }
        Ok(self.lloyd(points, centroids, dim))
    }

    fn lloyd<'a, P>(
        &self,
        points: &'a [P],
        mut centroids: Vec<f32>,
        dim: usize,
    ) -> ClusteringResult<'a>
    where
        P: AsRef<[f32]> + Sync,
    {
        let mut labels = vec![0u32; points.len()];
        let mut iterations = 0;
        let mut converged = false;
        let mut empty_clusters = 0;

        debug!("start training");
        for i in 0..self.max_iter {
            let start_time = Instant::now();
            if self.parallel {
                base_assign_parallel(points, &centroids, dim, &mut labels);
            } else {
                base_assign(points, &centroids, dim, &mut labels);
            }
            let stats = update_centroids(points, &mut centroids, dim, &labels);
            iterations = i + 1;
            if stats.empty != 0 {
                empty_clusters += stats.empty;
                debug!("froze {} empty clusters", stats.empty);
            }
            debug!(
                "iter {} takes {} s, max relative shift {}",
                i,
                start_time.elapsed().as_secs_f32(),
                stats.max_shift
            );
            if stats.max_shift <= self.tolerance {
                debug!("converged at iter {}", i);
                converged = true;
                break;
            }
        }
        if !converged {
            debug!("stopped at max_iter {} without converging", self.max_iter);
        }

        let mut clusters: Vec<Vec<&'a [f32]>> = vec![Vec::new(); self.n_cluster];
        for (point, &label) in points.iter().zip(labels.iter()) {
            clusters[label as usize].push(point.as_ref());
        }

        ClusteringResult {
            centroids: centroids.chunks(dim).map(<[f32]>::to_vec).collect(),
            clusters,
            labels,
            iterations,
            converged,
            empty_clusters,
        }
    }
}
