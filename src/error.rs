use thiserror::Error;

/// Reasons for which a single reconstruction request is rejected.
///
/// Numerical degeneracies inside the solvers never appear here: they stop the
/// iteration early and the partial solution is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconstructionError {

    #[error("model `{key}` has not been loaded")]
    ModelNotFound { key: String },

    #[error("unknown algorithm `{name}`: expected CGNE or CGNR")]
    UnknownAlgorithm { name: String },

    #[error("signal has {actual} samples but model `{model}` expects {expected}")]
    DimensionMismatch { model: String, expected: usize, actual: usize },

    #[error("cannot lay out {len} values on a square grid")]
    InvalidGridSize { len: usize },
}

pub type Result<T> = std::result::Result<T, ReconstructionError>;
