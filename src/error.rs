//! Error types for the star reduction pipeline.

use thiserror::Error;

use crate::detect::DetectionError;

/// Errors produced by the star reduction pipeline.
///
/// Every failed run surfaces exactly one of these; a failed run never yields a
/// partial result. An empty star catalog is not an error (the composite then
/// equals the source), see [`crate::pipeline::PipelineResult::star_count`].
#[derive(Error, Debug)]
pub enum ReduceError {
    /// A per-channel normalization was requested on a flat channel (min == max).
    ///
    /// Joint normalization never produces this: a flat frame normalizes to
    /// all zeros by documented policy.
    #[error("flat channel: min == max, per-channel normalization is undefined")]
    NormalizationDegenerate,

    /// The configured detector signaled a failure (distinct from zero stars).
    #[error("star detection failed: {0}")]
    Detection(#[from] DetectionError),

    /// Two arrays that must share a shape do not.
    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// Shape of the reference array (rows, cols).
        expected: (usize, usize),
        /// Shape of the offending array (rows, cols).
        actual: (usize, usize),
    },

    /// A parameter value falls outside its fixed valid range.
    #[error("parameter {name} = {value} outside valid range [{min}, {max}]")]
    ParameterOutOfRange {
        /// Parameter field name.
        name: &'static str,
        /// Rejected value.
        value: f64,
        /// Lower bound (inclusive).
        min: f64,
        /// Upper bound (inclusive).
        max: f64,
    },

    /// A kernel-size parameter that must be odd is even.
    #[error("parameter {name} = {value} must be an odd kernel size")]
    ParameterNotOdd {
        /// Parameter field name.
        name: &'static str,
        /// Rejected value.
        value: usize,
    },

    /// A run was requested with no source frame (or pair) loaded.
    #[error("no source image loaded")]
    SourceUnavailable,
}

/// Result alias for pipeline operations.
pub type ReduceResult<T> = Result<T, ReduceError>;
