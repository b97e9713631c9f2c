use core::fmt;

/// Result alias for `centra`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the clustering engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Training was given zero vectors.
    EmptyDataset,

    /// Invalid number of clusters requested.
    InvalidClusterCount {
        /// Requested count.
        requested: usize,
        /// Number of vectors available.
        n_items: usize,
    },

    /// Vector dimension mismatch.
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Found dimension.
        found: usize,
    },

    /// A named field requested during vector assembly was absent.
    MissingField {
        /// Name of the missing field.
        field: String,
    },

    /// A persisted model artifact could not be decoded.
    CorruptModel {
        /// What was wrong with the artifact.
        reason: String,
    },

    /// Invalid parameter value.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// Filesystem error while reading or writing a model artifact.
    ///
    /// Stores the rendered message so the enum stays `Clone + PartialEq`.
    Io(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyDataset => write!(f, "empty dataset provided"),
            Error::InvalidClusterCount { requested, n_items } => {
                write!(f, "cannot create {requested} clusters from {n_items} vectors")
            }
            Error::DimensionMismatch { expected, found } => {
                write!(f, "dimension mismatch: expected {expected}, found {found}")
            }
            Error::MissingField { field } => {
                write!(f, "record has no numeric field named '{field}'")
            }
            Error::CorruptModel { reason } => {
                write!(f, "corrupt model artifact: {reason}")
            }
            Error::InvalidParameter { name, message } => {
                write!(f, "invalid parameter '{name}': {message}")
            }
            Error::Io(msg) => write!(f, "i/o error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}
