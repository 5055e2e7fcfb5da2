//! Error types for spectral analysis

use thiserror::Error;

/// Errors returned by the analysis core
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// A frequency, bin index or frame was malformed
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// A band or engine configuration was rejected
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// A band reaches past the nyquist frequency of the frame being analyzed
    #[error("Band '{band}' reaches {high_hz} Hz, above the frame nyquist of {nyquist} Hz")]
    OutOfRange {
        band: String,
        high_hz: f32,
        nyquist: f32,
    },
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, AnalysisError>;
