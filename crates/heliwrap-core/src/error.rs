//! Error types for the curve fitter and helix generator.

use thiserror::Error;

/// Errors that can occur while fitting a skeleton curve.
#[derive(Error, Debug)]
pub enum FitError {
    /// Spline order / sample-count combination is infeasible.
    #[error("invalid fit parameters: {0}")]
    InvalidParameters(String),

    /// Fewer input points than the chosen order allows.
    #[error("not enough input points: got {got}, need at least {need}")]
    NotEnoughPoints {
        /// Number of points supplied.
        got: usize,
        /// Minimum required for the chosen order.
        need: usize,
    },

    /// Velocity vanished at a sample, leaving the moving frame undefined.
    #[error("degenerate frame at sample {index}: zero velocity")]
    DegenerateFrame {
        /// Index of the offending sample.
        index: usize,
    },

    /// The least-squares spline solve failed.
    #[error("spline solve failed: {0}")]
    SolveFailed(String),
}

/// Errors that can occur while generating a single helix curve.
#[derive(Error, Debug)]
pub enum HelixError {
    /// Helix specification rejected at validation.
    #[error("invalid helix spec: {0}")]
    InvalidSpec(String),

    /// Velocity vanished at a sample of the fitted curve.
    #[error("degenerate frame at sample {sample}: zero velocity")]
    DegenerateFrame {
        /// Index of the offending sample.
        sample: usize,
    },

    /// A radius ray escaped the mesh without intersecting it.
    #[error("radius undefined at sample {sample}: ray found no intersection")]
    RadiusUndefined {
        /// Index of the offending sample.
        sample: usize,
    },
}

/// Result type for fitting operations.
pub type FitResult<T> = std::result::Result<T, FitError>;

/// Result type for helix generation.
pub type HelixResult<T> = std::result::Result<T, HelixError>;
