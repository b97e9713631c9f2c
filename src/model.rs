//! Trained model types.

use core::fmt;

/// Representative point of one cluster.
///
/// `id` equals the centroid's position in its model's centroid sequence
/// and is the cluster label assignments refer to.
#[derive(Debug, Clone, PartialEq)]
pub struct Centroid {
    /// Cluster id in `[0, k)`.
    pub id: usize,
    /// Coordinates, one per feature dimension.
    pub coords: Vec<f64>,
}

impl Centroid {
    /// Number of feature dimensions.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.coords.len()
    }
}

/// Diagnostics recorded while training a model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingDiagnostics {
    /// Iterations performed before stopping.
    pub iterations: usize,
    /// Sum of squared distances from each vector to its assigned centroid,
    /// measured against the final centroids.
    pub inertia: f64,
    /// Whether the centroid shift dropped below tolerance before the
    /// iteration cap. `false` means the cap was exhausted; the model is
    /// still usable.
    pub converged: bool,
    /// How many times an empty cluster had to be reseeded.
    pub reseeded_clusters: usize,
}

/// A trained clustering model.
///
/// Immutable once produced: the constructor is crate-private, so a model
/// only ever comes out of training or out of a persisted artifact, fully
/// formed. Assignment and serialization read it; nothing mutates it.
#[derive(Debug, Clone)]
pub struct Model {
    centroids: Vec<Centroid>,
    dimension: usize,
    diagnostics: Option<TrainingDiagnostics>,
}

impl Model {
    /// Build a model from finalized centroids.
    ///
    /// Callers guarantee centroid ids equal their positions and all
    /// coordinates share one dimension.
    pub(crate) fn new(centroids: Vec<Centroid>, diagnostics: Option<TrainingDiagnostics>) -> Self {
        debug_assert!(!centroids.is_empty());
        debug_assert!(centroids.iter().enumerate().all(|(i, c)| c.id == i));
        let dimension = centroids[0].dimension();
        debug_assert!(centroids.iter().all(|c| c.dimension() == dimension));
        Self {
            centroids,
            dimension,
            diagnostics,
        }
    }

    /// Attach training diagnostics once the final inertia is known.
    pub(crate) fn with_diagnostics(mut self, diagnostics: TrainingDiagnostics) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    /// Number of clusters.
    #[inline]
    pub fn k(&self) -> usize {
        self.centroids.len()
    }

    /// Feature dimension every input vector must have.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Centroids in id order.
    #[inline]
    pub fn centroids(&self) -> &[Centroid] {
        &self.centroids
    }

    /// Centroid for a cluster id, if it exists.
    pub fn centroid(&self, id: usize) -> Option<&Centroid> {
        self.centroids.get(id)
    }

    /// Training diagnostics.
    ///
    /// `None` for models reloaded from a persisted artifact: training
    /// history is not part of the stored format.
    pub fn diagnostics(&self) -> Option<&TrainingDiagnostics> {
        self.diagnostics.as_ref()
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "model(k={}, d={})", self.k(), self.dimension)
    }
}
