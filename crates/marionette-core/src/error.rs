//! Error types for the Marionette pipeline

use thiserror::Error;

use crate::Parameter;

/// Core Marionette errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarionetteError {
    // Sample errors
    #[error("Invalid landmark count: expected {expected}, got {actual}")]
    InvalidLandmarkCount { expected: usize, actual: usize },

    #[error("Degenerate landmark geometry")]
    DegenerateGeometry,

    // Channel diagnostics
    #[error("Channel overflow on {parameter:?}: {dropped} oldest values dropped")]
    ChannelOverflow { parameter: Parameter, dropped: u64 },

    // Configuration errors
    #[error("Invalid calibration range: [{min}, {max}] must be finite with max > min")]
    CalibrationRangeInvalid { min: f32, max: f32 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Lifecycle errors
    #[error("Session already running")]
    AlreadyRunning,

    #[error("Session not running")]
    NotRunning,
}

impl MarionetteError {
    /// Errors that only drop the offending sample
    pub fn is_sample_error(&self) -> bool {
        matches!(
            self,
            MarionetteError::InvalidLandmarkCount { .. } | MarionetteError::DegenerateGeometry
        )
    }
}

/// Result type for Marionette operations
pub type MarionetteResult<T> = Result<T, MarionetteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_errors() {
        assert!(MarionetteError::DegenerateGeometry.is_sample_error());
        assert!(MarionetteError::InvalidLandmarkCount {
            expected: 68,
            actual: 12
        }
        .is_sample_error());

        let overflow = MarionetteError::ChannelOverflow {
            parameter: Parameter::EyeLOpen,
            dropped: 4,
        };
        assert!(!overflow.is_sample_error());
        assert!(!MarionetteError::NotRunning.is_sample_error());
        assert_eq!(
            overflow.to_string(),
            "Channel overflow on EyeLOpen: 4 oldest values dropped"
        );
    }
}
