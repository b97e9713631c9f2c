//! Cluster statistics over a batch of assignments.
//!
//! Everything here is derived: given the assignments, the original
//! vectors, and a choice of feature indices, `summarize` can be rerun at
//! any time and always produces the same report.
//!
//! The global distance figure is the mean Euclidean norm of each
//! vector's full per-centroid distance vector: separation from the
//! whole centroid set, not proximity to the chosen cluster. That choice
//! is inherited from the system this engine replaces. Per-feature
//! averages, by contrast, are computed from the original feature
//! values.

use core::fmt;

use crate::assign::Assignment;
use crate::error::{Error, Result};

/// Statistics for one cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSummary {
    /// Cluster id.
    pub cluster_id: usize,
    /// Number of member vectors.
    pub count: usize,
    /// Mean original value per selected feature, parallel to the
    /// report's `selected_features`. Zero for empty clusters.
    pub feature_means: Vec<f64>,
}

/// Derived statistics over a full batch of assignments.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterReport {
    /// One summary per cluster id, in id order (empty clusters included).
    pub clusters: Vec<ClusterSummary>,
    /// Feature indices the per-cluster means were computed over.
    pub selected_features: Vec<usize>,
    /// Mean over all vectors of the Euclidean norm of the full
    /// per-centroid distance vector.
    pub avg_distance: f64,
}

impl ClusterReport {
    /// Total number of vectors accounted for across clusters.
    pub fn total_vectors(&self) -> usize {
        self.clusters.iter().map(|c| c.count).sum()
    }
}

/// Summarize a batch of assignments against the original vectors.
///
/// `assignments` and `vectors` are parallel sequences from the same
/// inference run; `selected_features` picks which original feature
/// columns get per-cluster averages.
pub fn summarize(
    assignments: &[Assignment],
    vectors: &[Vec<f64>],
    selected_features: &[usize],
) -> Result<ClusterReport> {
    if assignments.is_empty() {
        return Err(Error::EmptyDataset);
    }
    if assignments.len() != vectors.len() {
        return Err(Error::InvalidParameter {
            name: "assignments",
            message: "assignments and vectors must have equal length",
        });
    }

    let k = assignments[0].distances.len();
    let d = vectors[0].len();

    for feature in selected_features {
        if *feature >= d {
            return Err(Error::InvalidParameter {
                name: "selected_features",
                message: "feature index out of range for the vector dimension",
            });
        }
    }

    let mut counts = vec![0usize; k];
    let mut feature_sums = vec![vec![0.0f64; selected_features.len()]; k];
    let mut norm_total = 0.0f64;

    for (assignment, vector) in assignments.iter().zip(vectors) {
        if assignment.distances.len() != k || assignment.cluster_id >= k {
            return Err(Error::InvalidParameter {
                name: "assignments",
                message: "assignments disagree on the number of clusters",
            });
        }
        if vector.len() != d {
            return Err(Error::DimensionMismatch {
                expected: d,
                found: vector.len(),
            });
        }

        let cid = assignment.cluster_id;
        counts[cid] += 1;
        for (slot, &feature) in selected_features.iter().enumerate() {
            feature_sums[cid][slot] += vector[feature];
        }

        norm_total += assignment
            .distances
            .iter()
            .map(|dist| dist * dist)
            .sum::<f64>()
            .sqrt();
    }

    let clusters = counts
        .iter()
        .enumerate()
        .map(|(cluster_id, &count)| ClusterSummary {
            cluster_id,
            count,
            feature_means: feature_sums[cluster_id]
                .iter()
                .map(|sum| if count > 0 { sum / count as f64 } else { 0.0 })
                .collect(),
        })
        .collect();

    Ok(ClusterReport {
        clusters,
        selected_features: selected_features.to_vec(),
        avg_distance: norm_total / assignments.len() as f64,
    })
}

impl fmt::Display for ClusterReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cluster statistics:")?;
        for cluster in &self.clusters {
            writeln!(f, "Cluster {}:", cluster.cluster_id)?;
            writeln!(f, "  vectors: {}", cluster.count)?;
            for (feature, mean) in self.selected_features.iter().zip(&cluster.feature_means) {
                writeln!(f, "  feature {feature} mean: {mean:.2}")?;
            }
        }
        writeln!(f)?;
        write!(
            f,
            "Average distance to centroid set: {:.2}",
            self.avg_distance
        )
    }
}
