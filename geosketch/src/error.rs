//! Error types used by the crate.

use thiserror::Error;

/// Geosketch error type.
///
/// Validation variants are raised synchronously from setters and capture handlers; a
/// failed setter always leaves the previous valid value in place. [`SketchError::Geodesy`]
/// aborts the in-flight preview or commit without touching the session state, so the
/// caller may simply retry on the next event.
#[derive(Debug, Error)]
pub enum SketchError {
    /// A distance value was negative.
    #[error("distance cannot be negative: {0}")]
    NegativeDistance(f64),
    /// Ring count is outside the allowed bounds.
    #[error("ring count must be between {min} and {max}, got {value}")]
    RingCountOutOfBounds {
        /// The rejected value.
        value: u32,
        /// Lower bound, inclusive.
        min: u32,
        /// Upper bound, inclusive.
        max: u32,
    },
    /// Radial count is outside the allowed bounds.
    #[error("radial count must be at most {max}, got {value}")]
    RadialCountOutOfBounds {
        /// The rejected value.
        value: u32,
        /// Upper bound, inclusive.
        max: u32,
    },
    /// Ellipse minor axis would exceed the major axis.
    #[error("minor axis ({minor} m) cannot exceed major axis ({major} m)")]
    MinorAxisExceedsMajor {
        /// Rejected minor semi-axis in meters.
        minor: f64,
        /// Current major semi-axis in meters.
        major: f64,
    },
    /// User-entered text could not be parsed as a number.
    #[error("cannot parse {0:?} as a number")]
    UnparsableNumber(String),
    /// An operation required an azimuth that has not been provided.
    #[error("azimuth value is required but not set")]
    MissingAzimuth,
    /// Commit was requested before the shape had all required inputs.
    #[error("shape is not complete: {0}")]
    IncompleteShape(&'static str),
    /// The geodesy primitive service failed or returned degenerate geometry.
    #[error("geodesy service failed: {0}")]
    Geodesy(String),
}

impl SketchError {
    /// Whether the error came from a rejected input value rather than a failed
    /// geodesy computation.
    pub fn is_validation(&self) -> bool {
        !matches!(self, SketchError::Geodesy(_))
    }
}
