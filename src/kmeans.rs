//! K-means training.
//!
//! Partitions feature vectors into k clusters by minimizing
//! **within-cluster sum of squares** (inertia):
//!
//! ```text
//! J = Σₖ Σᵢ∈Cₖ ||xᵢ - μₖ||²
//! ```
//!
//! # Lloyd's Algorithm
//!
//! 1. Initialize k centroids via k-means++
//! 2. **Assign**: each vector → nearest centroid (lowest id on exact ties)
//! 3. **Update**: each centroid → mean of its assigned vectors
//! 4. Repeat until the summed squared centroid displacement drops to the
//!    tolerance, or the iteration cap is hit
//!
//! Each assign/update pair either decreases inertia or leaves it
//! unchanged, and inertia is bounded below by zero, so the loop always
//! terminates. Exhausting the iteration cap is not a failure: the model
//! comes back with `converged = false` in its diagnostics.
//!
//! ## K-means++ Seeding
//!
//! The first centroid is a uniformly random vector; each subsequent one
//! is sampled with probability proportional to D(x)², the squared
//! distance to the nearest centroid chosen so far. Passing a seed makes
//! the whole run reproducible.
//!
//! ## Empty Clusters
//!
//! A cluster that loses all members after an update is reseeded to the
//! vector currently farthest from its own assigned centroid. The event
//! is logged and counted in the diagnostics; it is recoverable, never an
//! error.
//!
//! ## Parallel Accumulation
//!
//! With the `parallel` feature the assignment step fans vectors out
//! across workers in fixed-size chunks, each folding into its own
//! partial sum matrix and count vector. Partials merge by a commutative
//! reduction in chunk order before the update step, so a fixed seed
//! reproduces the same model regardless of thread count.

use std::cmp::Ordering;

use log::{debug, warn};
use ndarray::{Array2, ArrayView1};
use rand::prelude::*;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::assign;
use crate::error::{Error, Result};
use crate::model::{Centroid, Model, TrainingDiagnostics};

/// Vectors per worker-owned partial accumulator during parallel training.
#[cfg(feature = "parallel")]
const ACCUMULATOR_CHUNK: usize = 512;

/// K-means trainer.
#[derive(Debug, Clone)]
pub struct Kmeans {
    /// Number of clusters.
    k: usize,
    /// Maximum iterations.
    max_iter: usize,
    /// Convergence tolerance on the summed squared centroid displacement.
    tol: f64,
    /// Random seed.
    seed: Option<u64>,
}

impl Kmeans {
    /// Create a new trainer.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iter: 100,
            tol: 1e-4,
            seed: None,
        }
    }

    /// Set maximum iterations.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set convergence tolerance.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Train a model on the given feature vectors.
    ///
    /// Requires a non-empty dataset of equal-dimension vectors and
    /// `1 <= k <= n`. The returned model is immutable and carries
    /// training diagnostics; training has no other effects beyond log
    /// records.
    pub fn train(&self, data: &[Vec<f64>]) -> Result<Model> {
        if data.is_empty() {
            return Err(Error::EmptyDataset);
        }

        let n = data.len();
        let d = data[0].len();

        if self.k == 0 || self.k > n {
            return Err(Error::InvalidClusterCount {
                requested: self.k,
                n_items: n,
            });
        }

        // Flatten into one matrix, checking every row's dimension.
        let mut flat: Vec<f64> = Vec::with_capacity(n * d);
        for point in data {
            if point.len() != d {
                return Err(Error::DimensionMismatch {
                    expected: d,
                    found: point.len(),
                });
            }
            flat.extend(point);
        }
        let data_arr =
            Array2::from_shape_vec((n, d), flat).map_err(|_| Error::InvalidParameter {
                name: "data",
                message: "vectors do not form a rectangular matrix",
            })?;

        let mut rng: Box<dyn RngCore> = match self.seed {
            Some(s) => Box::new(StdRng::seed_from_u64(s)),
            None => Box::new(rand::rng()),
        };

        let mut centroids = self.init_centroids(&data_arr, &mut rng);
        let mut labels = vec![0usize; n];
        let mut min_dists = vec![0.0f64; n];

        let mut iterations = 0;
        let mut converged = false;
        let mut reseeded_clusters = 0;

        for iter in 0..self.max_iter {
            iterations = iter + 1;

            // Assignment step: nearest centroid per vector, folded into
            // per-worker partial sums merged by a commutative reduction.
            let (sums, counts) = self.assign_step(&data_arr, &centroids, &mut labels, &mut min_dists);

            debug!(
                "iteration {}: inertia {:.6}",
                iterations,
                min_dists.iter().sum::<f64>()
            );

            // Update step: componentwise means.
            let mut new_centroids = Array2::<f64>::zeros((self.k, d));
            let mut empty: Vec<usize> = Vec::new();
            for kk in 0..self.k {
                if counts[kk] > 0 {
                    for j in 0..d {
                        new_centroids[[kk, j]] = sums[[kk, j]] / counts[kk] as f64;
                    }
                } else {
                    empty.push(kk);
                }
            }

            // Empty clusters reseed to the vectors farthest from their own
            // assigned centroids, in descending distance order.
            if !empty.is_empty() {
                let mut taken: Vec<usize> = Vec::new();
                for kk in empty {
                    let far = (0..n)
                        .filter(|i| !taken.contains(i))
                        .max_by(|&a, &b| {
                            min_dists[a]
                                .partial_cmp(&min_dists[b])
                                .unwrap_or(Ordering::Equal)
                        })
                        .unwrap_or(0);
                    warn!(
                        "iteration {iterations}: cluster {kk} emptied, reseeding to vector {far}"
                    );
                    new_centroids.row_mut(kk).assign(&data_arr.row(far));
                    taken.push(far);
                    reseeded_clusters += 1;
                }
            }

            // Convergence: summed squared centroid displacement.
            let shift: f64 = centroids
                .iter()
                .zip(new_centroids.iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum();

            centroids = new_centroids;

            if shift <= self.tol {
                converged = true;
                break;
            }
        }

        if !converged {
            warn!(
                "training stopped at the {} iteration cap before reaching tolerance {:e}",
                self.max_iter, self.tol
            );
        }

        let model = Model::new(
            centroids
                .rows()
                .into_iter()
                .enumerate()
                .map(|(id, row)| Centroid {
                    id,
                    coords: row.to_vec(),
                })
                .collect(),
            None,
        );

        // Final inertia, measured through the assigner against the
        // finalized centroids.
        let inertia: f64 = assign::assign_batch(&model, data)?
            .iter()
            .map(|a| a.assigned_distance())
            .sum();

        Ok(model.with_diagnostics(TrainingDiagnostics {
            iterations,
            inertia,
            converged,
            reseeded_clusters,
        }))
    }

    /// One assignment pass: writes each vector's nearest centroid id and
    /// squared distance, returns the merged per-cluster coordinate sums
    /// and member counts.
    ///
    /// Workers own one fixed chunk of vectors each and fold into their
    /// own partial accumulators; partials merge in chunk order after the
    /// barrier, so a fixed seed reproduces bit-identically regardless of
    /// thread count.
    #[cfg(feature = "parallel")]
    fn assign_step(
        &self,
        data: &Array2<f64>,
        centroids: &Array2<f64>,
        labels: &mut [usize],
        min_dists: &mut [f64],
    ) -> (Array2<f64>, Vec<usize>) {
        let d = data.ncols();

        let partials: Vec<(Array2<f64>, Vec<usize>)> = labels
            .par_chunks_mut(ACCUMULATOR_CHUNK)
            .zip(min_dists.par_chunks_mut(ACCUMULATOR_CHUNK))
            .enumerate()
            .map(|(chunk_idx, (label_chunk, dist_chunk))| {
                let base = chunk_idx * ACCUMULATOR_CHUNK;
                let mut sums = Array2::<f64>::zeros((self.k, d));
                let mut counts = vec![0usize; self.k];

                for (offset, (label, min_dist)) in
                    label_chunk.iter_mut().zip(dist_chunk.iter_mut()).enumerate()
                {
                    let point = data.row(base + offset);
                    let (best, dist) = self.nearest(&point, centroids);
                    *label = best;
                    *min_dist = dist;
                    for (j, v) in point.iter().enumerate() {
                        sums[[best, j]] += v;
                    }
                    counts[best] += 1;
                }

                (sums, counts)
            })
            .collect();

        let mut sums = Array2::<f64>::zeros((self.k, d));
        let mut counts = vec![0usize; self.k];
        for (partial_sums, partial_counts) in partials {
            sums += &partial_sums;
            for (total, partial) in counts.iter_mut().zip(&partial_counts) {
                *total += partial;
            }
        }

        (sums, counts)
    }

    #[cfg(not(feature = "parallel"))]
    fn assign_step(
        &self,
        data: &Array2<f64>,
        centroids: &Array2<f64>,
        labels: &mut [usize],
        min_dists: &mut [f64],
    ) -> (Array2<f64>, Vec<usize>) {
        let d = data.ncols();
        let mut sums = Array2::<f64>::zeros((self.k, d));
        let mut counts = vec![0usize; self.k];

        for (i, (label, min_dist)) in labels.iter_mut().zip(min_dists.iter_mut()).enumerate() {
            let point = data.row(i);
            let (best, dist) = self.nearest(&point, centroids);
            *label = best;
            *min_dist = dist;
            for (j, v) in point.iter().enumerate() {
                sums[[best, j]] += v;
            }
            counts[best] += 1;
        }

        (sums, counts)
    }

    /// Nearest centroid by squared distance; lowest id wins exact ties.
    fn nearest(&self, point: &ArrayView1<'_, f64>, centroids: &Array2<f64>) -> (usize, f64) {
        let mut best = 0;
        let mut best_dist = f64::MAX;
        for kk in 0..self.k {
            let dist = row_distance(point, &centroids.row(kk));
            if dist < best_dist {
                best_dist = dist;
                best = kk;
            }
        }
        (best, best_dist)
    }

    /// Initialize centroids using the k-means++ algorithm.
    fn init_centroids(&self, data: &Array2<f64>, rng: &mut impl Rng) -> Array2<f64> {
        let n = data.nrows();
        let d = data.ncols();
        let mut centroids = Array2::zeros((self.k, d));

        // First centroid: random point.
        let first = rng.random_range(0..n);
        centroids.row_mut(0).assign(&data.row(first));

        // Remaining centroids: sample proportional to squared distance to
        // the nearest already-chosen centroid.
        for i in 1..self.k {
            let mut distances: Vec<f64> = Vec::with_capacity(n);

            for j in 0..n {
                let point = data.row(j);
                let min_dist = (0..i)
                    .map(|c| row_distance(&point, &centroids.row(c)))
                    .fold(f64::MAX, f64::min);
                distances.push(min_dist);
            }

            let total: f64 = distances.iter().sum();
            if total == 0.0 {
                // All remaining mass is on already-chosen points.
                let idx = rng.random_range(0..n);
                centroids.row_mut(i).assign(&data.row(idx));
                continue;
            }

            let threshold = rng.random::<f64>() * total;
            let mut cumsum = 0.0;
            let mut selected = 0;

            for (j, &dist) in distances.iter().enumerate() {
                cumsum += dist;
                if cumsum >= threshold {
                    selected = j;
                    break;
                }
            }

            centroids.row_mut(i).assign(&data.row(selected));
        }

        centroids
    }
}

/// Squared Euclidean distance between two array rows.
#[inline]
fn row_distance(a: &ArrayView1<'_, f64>, b: &ArrayView1<'_, f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two 3-point blobs at opposite ends of the plane.
    fn two_blobs() -> Vec<Vec<f64>> {
        vec![
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![10.0, 10.0],
            vec![10.0, 11.0],
            vec![11.0, 10.0],
        ]
    }

    #[test]
    fn test_train_two_blobs() {
        let model = Kmeans::new(2).with_seed(42).train(&two_blobs()).unwrap();

        assert_eq!(model.k(), 2);
        assert_eq!(model.dimension(), 2);

        // One centroid near (1/3, 1/3), the other near (31/3, 31/3).
        let mut means: Vec<f64> = model
            .centroids()
            .iter()
            .map(|c| c.coords.iter().sum::<f64>() / 2.0)
            .collect();
        means.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert!((means[0] - 1.0 / 3.0).abs() < 1e-9);
        assert!((means[1] - 31.0 / 3.0).abs() < 1e-9);

        // Each blob keeps its three members.
        let assignments = assign::assign_batch(&model, &two_blobs()).unwrap();
        let low = assignments[0].cluster_id;
        assert!(assignments[..3].iter().all(|a| a.cluster_id == low));
        assert!(assignments[3..].iter().all(|a| a.cluster_id != low));
    }

    #[test]
    fn test_train_model_is_well_formed() {
        let data: Vec<Vec<f64>> = (0..40)
            .map(|i| vec![(i % 7) as f64, (i % 5) as f64, i as f64 * 0.1])
            .collect();

        let model = Kmeans::new(4).with_seed(7).train(&data).unwrap();

        assert_eq!(model.centroids().len(), 4);
        for centroid in model.centroids() {
            assert_eq!(centroid.dimension(), 3);
            assert!(centroid.coords.iter().all(|v| v.is_finite()));
        }
        let diag = model.diagnostics().unwrap();
        assert!(diag.inertia.is_finite());
        assert!(diag.iterations >= 1);
    }

    #[test]
    fn test_train_deterministic_with_seed() {
        let data = two_blobs();

        let a = Kmeans::new(2).with_seed(42).train(&data).unwrap();
        let b = Kmeans::new(2).with_seed(42).train(&data).unwrap();

        for (ca, cb) in a.centroids().iter().zip(b.centroids()) {
            assert_eq!(ca.coords, cb.coords);
        }
        assert_eq!(a.diagnostics(), b.diagnostics());
    }

    #[test]
    fn test_train_k_equals_distinct_points() {
        let data = vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]];

        let model = Kmeans::new(3).with_seed(42).train(&data).unwrap();
        let diag = model.diagnostics().unwrap();

        // Every point is its own centroid.
        assert_eq!(diag.inertia, 0.0);
        let assignments = assign::assign_batch(&model, &data).unwrap();
        let unique: std::collections::HashSet<_> =
            assignments.iter().map(|a| a.cluster_id).collect();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn test_inertia_non_increasing_in_iteration_budget() {
        let data: Vec<Vec<f64>> = (0..30)
            .map(|i| vec![(i % 6) as f64 * 2.0, (i % 4) as f64 * 3.0])
            .collect();

        let mut last = f64::MAX;
        for budget in 1..=6 {
            let model = Kmeans::new(3)
                .with_seed(9)
                .with_max_iter(budget)
                .with_tol(0.0)
                .train(&data)
                .unwrap();
            let inertia = model.diagnostics().unwrap().inertia;
            assert!(
                inertia <= last + 1e-9,
                "inertia rose from {last} to {inertia} at budget {budget}"
            );
            last = inertia;
        }
    }

    #[test]
    fn test_convergence_flag() {
        let data = two_blobs();

        // A generous budget converges well before the cap.
        let settled = Kmeans::new(2).with_seed(42).train(&data).unwrap();
        let diag = settled.diagnostics().unwrap();
        assert!(diag.converged);
        assert!(diag.iterations < 100);

        // One iteration with zero tolerance cannot settle.
        let capped = Kmeans::new(2)
            .with_seed(42)
            .with_max_iter(1)
            .with_tol(0.0)
            .train(&data)
            .unwrap();
        assert!(!capped.diagnostics().unwrap().converged);
    }

    #[test]
    fn test_train_empty_dataset() {
        let data: Vec<Vec<f64>> = vec![];
        assert_eq!(
            Kmeans::new(2).train(&data).unwrap_err(),
            Error::EmptyDataset
        );
    }

    #[test]
    fn test_train_invalid_k() {
        let data = vec![vec![0.0, 0.0], vec![1.0, 1.0]];

        assert_eq!(
            Kmeans::new(0).train(&data).unwrap_err(),
            Error::InvalidClusterCount {
                requested: 0,
                n_items: 2
            }
        );
        assert_eq!(
            Kmeans::new(5).train(&data).unwrap_err(),
            Error::InvalidClusterCount {
                requested: 5,
                n_items: 2
            }
        );
    }

    #[test]
    fn test_train_ragged_rows() {
        let data = vec![vec![0.0, 0.0], vec![1.0]];
        assert_eq!(
            Kmeans::new(1).train(&data).unwrap_err(),
            Error::DimensionMismatch {
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_train_single_cluster() {
        let data = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];

        let model = Kmeans::new(1).with_seed(0).train(&data).unwrap();
        let centroid = &model.centroids()[0];
        assert!((centroid.coords[0] - 3.0).abs() < 1e-12);
        assert!((centroid.coords[1] - 4.0).abs() < 1e-12);
    }
}
