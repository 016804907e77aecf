//! Errors
//!
//! Custom error types used throughout the `wdrl` crate.
use thiserror::Error;

/// Errors that can occur while estimating treatment effects.
#[derive(Debug, Error)]
pub enum WdrlError {
    /// A matched pair has an empty or under-determined arm.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),
    /// Every combination containing the treatment has zero empirical weight.
    #[error("Degenerate weights for treatment {0}: no observed combination containing it has a nonzero frequency.")]
    DegenerateWeight(String),
    /// Input slices or matrices disagree on their dimensions.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),
    /// First value is the name of the parameter, second is expected, third is what was passed.
    #[error("Invalid parameter value passed for {0}, expected {1} but {2} provided.")]
    InvalidParameter(String, String, String),
    /// More treatments than the combination encoding can hold.
    #[error("{0} treatments provided, at most {1} are supported.")]
    TooManyTreatments(usize, usize),
    /// A model could not be fitted, or produced non-finite output.
    #[error("Unable to fit {0}: {1}")]
    FitFailed(String, String),
    /// Unable to write configuration to file.
    #[error("Unable to write configuration to file: {0}")]
    UnableToWrite(String),
    /// Unable to read configuration from file.
    #[error("Unable to read configuration from a file {0}")]
    UnableToRead(String),
}
