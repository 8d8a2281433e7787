//! Error types for the ride simulation.

use std::fmt;

/// Result type for track construction.
pub type Result<T> = std::result::Result<T, TrackError>;

/// Errors that can occur while building a track.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackError {
    /// Not enough control points to form a closed spline.
    TooFewPoints {
        /// Number of points supplied.
        count: usize,
        /// Minimum number of points required.
        required: usize,
    },
    /// A control point contains NaN or infinity.
    NonFinitePoint {
        /// Index of the offending point.
        index: usize,
    },
}

impl fmt::Display for TrackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewPoints { count, required } => {
                write!(
                    f,
                    "closed track needs at least {required} control points, got {count}"
                )
            }
            Self::NonFinitePoint { index } => {
                write!(f, "control point {index} is not finite")
            }
        }
    }
}

impl std::error::Error for TrackError {}

/// Faults raised inside a single motion update.
///
/// These never escape [`crate::VehicleMotion::update`]; they are absorbed
/// there and reported through [`crate::StepOutcome`].
#[derive(Debug, Clone, PartialEq)]
pub enum MotionError {
    /// The track could not produce a usable sample.
    SampleUnavailable {
        /// Which sample was requested.
        sample: &'static str,
        /// Curve parameter the sample was requested at.
        parameter: f64,
    },
    /// An intermediate value of the update became NaN or infinite.
    NonFinite {
        /// Which quantity went bad.
        quantity: &'static str,
    },
}

impl fmt::Display for MotionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SampleUnavailable { sample, parameter } => {
                write!(f, "track {sample} unavailable at t = {parameter:.5}")
            }
            Self::NonFinite { quantity } => {
                write!(f, "{quantity} became non-finite")
            }
        }
    }
}

impl std::error::Error for MotionError {}
