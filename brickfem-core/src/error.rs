//! Error types for brickfem operations.

use thiserror::Error;

/// Result type alias using the brickfem [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building, solving or exporting a model.
#[derive(Error, Debug)]
pub enum Error {
    /// Mesh construction or query errors.
    #[error("mesh error: {0}")]
    Mesh(String),

    /// Malformed mesh file.
    #[error("import error at line {line}: {message}")]
    Import { line: usize, message: String },

    /// Finite element space errors (unknown fem name, bad degree, ...).
    #[error("fem error: {0}")]
    Fem(String),

    /// Brick-level errors (unknown parameter, unsupported query).
    #[error("brick error: {0}")]
    Brick(String),

    /// Model composition errors.
    #[error("model error: {0}")]
    Model(String),

    /// Solver errors.
    #[error("solver error: {0}")]
    Solver(String),

    /// Matrix singularity or conditioning issues.
    #[error("singular matrix: {0}")]
    SingularMatrix(String),

    /// Newton iterations ran out before reaching the target residual.
    #[error("no convergence after {iterations} iterations (residual {residual:e})")]
    NotConverged { iterations: usize, residual: f64 },

    /// Invalid material properties.
    #[error("invalid material: {0}")]
    InvalidMaterial(String),

    /// Invalid numerical parameter.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Export errors.
    #[error("export error: {0}")]
    Export(String),

    /// I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialisation errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Formatting into an output buffer failed.
    #[error("format error: {0}")]
    Format(#[from] std::fmt::Error),
}
