//! Failure conditions of an alignment run
//!
//! Every variant is terminal for the current run. The host reports it and
//! keeps whatever state it had before the run.

use thiserror::Error;

/// Errors from validating solutions and computing the alignment
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlignError {
    #[error("Missing plate solution metadata: {0}")]
    MissingMetadata(&'static str),
    #[error("Incompatible image dimensions: {a_width}x{a_height} vs {b_width}x{b_height}")]
    IncompatibleDimensions {
        a_width: u32,
        a_height: u32,
        b_width: u32,
        b_height: u32,
    },
    #[error("Wrong parity")]
    BadParity,
    #[error("Nowhere near (>25 deg) the poles! (dec {a_dec:.2}, {b_dec:.2})")]
    NotNearPole { a_dec: f64, b_dec: f64 },
    #[error("The pole does not project into the image (dec {dec:.2})")]
    PoleOffImage { dec: f64 },
    #[error(transparent)]
    Axis(#[from] AxisError),
}

/// Axis locator failures
///
/// Kept apart so the host can tell "retake the images" from "rotate further".
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AxisError {
    #[error("RA axis not found after {iterations} iterations (residual {residual:.3e} px)")]
    AxisNotFound { iterations: usize, residual: f64 },
    #[error("Degenerate rotation: the two images barely differ, rotate the mount further")]
    DegenerateRotation,
}

pub type Result<T, E = AlignError> = std::result::Result<T, E>;
