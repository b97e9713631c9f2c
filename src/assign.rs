//! Cluster assignment against a trained model.
//!
//! Pure and read-only: identical `(model, vector)` inputs always yield
//! identical output, so assignment is safe to call concurrently and
//! repeatedly. Batch assignment fans out across threads when the
//! `parallel` feature is enabled; the model is only ever shared
//! immutably.

use crate::error::{Error, Result};
use crate::model::Model;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Result of assigning one vector to a model's clusters.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// Id of the nearest centroid (lowest id wins exact ties).
    pub cluster_id: usize,
    /// Squared Euclidean distance to every centroid, indexed by
    /// centroid id. The minimum sits at `cluster_id`.
    pub distances: Vec<f64>,
}

impl Assignment {
    /// Squared distance to the assigned centroid.
    #[inline]
    pub fn assigned_distance(&self) -> f64 {
        self.distances[self.cluster_id]
    }
}

/// Squared Euclidean distance between two equal-length slices.
#[inline]
fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Assign a vector to the nearest centroid of `model`.
///
/// Computes the squared Euclidean distance to every centroid and returns
/// the id of the minimum along with the full distance vector. Exact ties
/// go to the lowest centroid id. Fails with `DimensionMismatch` before
/// computing anything when the vector length differs from the model's
/// dimension.
pub fn assign(model: &Model, vector: &[f64]) -> Result<Assignment> {
    if vector.len() != model.dimension() {
        return Err(Error::DimensionMismatch {
            expected: model.dimension(),
            found: vector.len(),
        });
    }

    let mut distances = Vec::with_capacity(model.k());
    let mut best_id = 0;
    let mut best_dist = f64::MAX;

    for centroid in model.centroids() {
        let dist = squared_distance(vector, &centroid.coords);
        // Strict < keeps the lowest id on exact ties.
        if dist < best_dist {
            best_dist = dist;
            best_id = centroid.id;
        }
        distances.push(dist);
    }

    Ok(Assignment {
        cluster_id: best_id,
        distances,
    })
}

/// Assign every vector in a batch.
///
/// Fails on the first vector whose length disagrees with the model; no
/// partial result is returned.
pub fn assign_batch(model: &Model, vectors: &[Vec<f64>]) -> Result<Vec<Assignment>> {
    #[cfg(feature = "parallel")]
    {
        vectors.par_iter().map(|v| assign(model, v)).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        vectors.iter().map(|v| assign(model, v)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Centroid;

    fn model_at(points: &[&[f64]]) -> Model {
        Model::new(
            points
                .iter()
                .enumerate()
                .map(|(id, p)| Centroid {
                    id,
                    coords: p.to_vec(),
                })
                .collect(),
            None,
        )
    }

    #[test]
    fn test_assign_nearest() {
        let model = model_at(&[&[0.0, 0.0], &[10.0, 10.0]]);

        let near_origin = assign(&model, &[1.0, 1.0]).unwrap();
        assert_eq!(near_origin.cluster_id, 0);
        assert_eq!(near_origin.distances.len(), 2);
        assert_eq!(near_origin.assigned_distance(), 2.0);

        let near_far = assign(&model, &[9.0, 9.0]).unwrap();
        assert_eq!(near_far.cluster_id, 1);
    }

    #[test]
    fn test_assign_tie_breaks_to_lowest_id() {
        // Query equidistant from both centroids.
        let model = model_at(&[&[0.0], &[2.0]]);
        let result = assign(&model, &[1.0]).unwrap();
        assert_eq!(result.cluster_id, 0);
        assert_eq!(result.distances[0], result.distances[1]);
    }

    #[test]
    fn test_assign_dimension_mismatch() {
        let model = model_at(&[&[0.0, 0.0]]);
        let err = assign(&model, &[1.0, 2.0, 3.0]).unwrap_err();
        assert_eq!(
            err,
            Error::DimensionMismatch {
                expected: 2,
                found: 3
            }
        );
    }

    #[test]
    fn test_assign_deterministic() {
        let model = model_at(&[&[0.0, 0.0], &[5.0, 5.0], &[10.0, 0.0]]);
        let vector = [3.0, 4.0];

        let first = assign(&model, &vector).unwrap();
        let second = assign(&model, &vector).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_assign_batch_matches_single() {
        let model = model_at(&[&[0.0, 0.0], &[10.0, 10.0]]);
        let vectors = vec![vec![0.5, 0.5], vec![9.5, 9.5], vec![4.0, 4.0]];

        let batch = assign_batch(&model, &vectors).unwrap();
        assert_eq!(batch.len(), 3);
        for (v, a) in vectors.iter().zip(&batch) {
            assert_eq!(assign(&model, v).unwrap(), *a);
        }
    }

    #[test]
    fn test_assign_batch_rejects_ragged_input() {
        let model = model_at(&[&[0.0, 0.0]]);
        let vectors = vec![vec![0.5, 0.5], vec![1.0]];
        assert!(assign_batch(&model, &vectors).is_err());
    }
}
