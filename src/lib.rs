//! # centra
//!
//! Centroid-based partitional clustering: k-means training with
//! k-means++ seeding, a binary persisted model, nearest-centroid
//! assignment, and per-cluster diagnostics.
//!
//! The model returned by training is an immutable value threaded
//! explicitly through persistence, assignment, and reporting. There is
//! no process-wide clustering state.
//!
//! ```rust
//! use centra::{assign_batch, summarize, Kmeans};
//!
//! let vectors = vec![
//!     vec![0.0, 0.0],
//!     vec![0.1, 0.1],
//!     vec![10.0, 10.0],
//!     vec![10.1, 10.1],
//! ];
//!
//! let model = Kmeans::new(2).with_seed(42).train(&vectors).unwrap();
//!
//! // Persist and reload, bit-identical.
//! let bytes = centra::persist::to_bytes(&model);
//! let reloaded = centra::persist::from_bytes(&bytes).unwrap();
//!
//! let assignments = assign_batch(&reloaded, &vectors).unwrap();
//! assert_eq!(assignments[0].cluster_id, assignments[1].cluster_id);
//! assert_ne!(assignments[0].cluster_id, assignments[2].cluster_id);
//!
//! let report = summarize(&assignments, &vectors, &[0, 1]).unwrap();
//! assert_eq!(report.total_vectors(), 4);
//! ```

pub mod assign;
/// Error types used across `centra`.
pub mod error;
pub mod features;
pub mod kmeans;
pub mod model;
pub mod persist;
pub mod report;


pub use assign::{assign, assign_batch, Assignment};
pub use error::{Error, Result};
pub use features::{FeatureVectorBuilder, FieldMap, Record};
pub use kmeans::Kmeans;
pub use model::{Centroid, Model, TrainingDiagnostics};
pub use report::{summarize, ClusterReport, ClusterSummary};
