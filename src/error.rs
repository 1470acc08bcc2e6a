//! Error types for SSVEP classification.

use thiserror::Error;

use crate::linalg::LinalgError;

/// Result type for classification operations
pub type Result<T> = core::result::Result<T, SsvepError>;

/// Errors that can occur while building or running a classifier
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SsvepError {
    /// EEG segment length does not match the configured window
    #[error("segment has {actual} samples, classifier is configured for {expected}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// Flat buffer or channel rows do not describe a rectangular segment
    #[error("invalid segment: {len} values for {channels} channels x {samples} samples")]
    InvalidSegment {
        channels: usize,
        samples: usize,
        len: usize,
    },

    /// Not enough samples for the requested estimate
    #[error("need at least {required} samples, got {actual}")]
    InsufficientSamples { required: usize, actual: usize },

    /// Signal is too short for zero-phase edge padding
    #[error("signal of {len} samples is too short for zero-phase filtering (need more than {required})")]
    SignalTooShort { len: usize, required: usize },

    /// Sub-band edges are unusable after clamping to Nyquist
    #[error("sub-band {index} has invalid normalized edges [{low:.4}, {high:.4}]")]
    InvalidBand { index: usize, low: f64, high: f64 },

    /// Preprocessing pass band does not fit below Nyquist
    #[error("invalid pass band {low_hz}-{high_hz} Hz at {sampling_rate} Hz sampling rate")]
    InvalidPassband {
        low_hz: f64,
        high_hz: f64,
        sampling_rate: f64,
    },

    /// Butterworth design could not be factored into second-order sections
    #[error("filter design failed: {0}")]
    FilterDesign(&'static str),

    /// Linear algebra failure inside CCA
    #[error("linear algebra failure: {0}")]
    Linalg(#[from] LinalgError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch_message() {
        let err = SsvepError::ShapeMismatch {
            expected: 1025,
            actual: 1000,
        };
        assert_eq!(
            err.to_string(),
            "segment has 1000 samples, classifier is configured for 1025"
        );
    }

    #[test]
    fn test_invalid_passband_message() {
        let err = SsvepError::InvalidPassband {
            low_hz: 30.0,
            high_hz: 10.0,
            sampling_rate: 256.0,
        };
        assert_eq!(
            err.to_string(),
            "invalid pass band 30-10 Hz at 256 Hz sampling rate"
        );
    }

    #[test]
    fn test_linalg_conversion() {
        let err: SsvepError = LinalgError::NotPositiveDefinite.into();
        assert_eq!(err, SsvepError::Linalg(LinalgError::NotPositiveDefinite));
    }
}
