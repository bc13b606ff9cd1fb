//! Animation error types

use crate::keyframe::ValueShape;
use thiserror::Error;

/// Errors raised while building or configuring a timeline
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimelineError {
    /// A path's keyframes cannot be interpolated
    #[error("Invalid path at keyframe {index}: {reason}")]
    InvalidPath { index: usize, reason: String },

    /// Two values of different shapes were interpolated against each other
    #[error("Cannot interpolate {left} against {right}")]
    ShapeMismatch { left: ValueShape, right: ValueShape },

    /// Timescale must be a positive, finite multiplier
    #[error("Invalid timescale: {0}")]
    InvalidTimescale(f64),
}

/// Result type for timeline operations
pub type Result<T> = std::result::Result<T, TimelineError>;
