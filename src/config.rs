//! Classifier configuration.
//!
//! Everything a classifier needs is captured here and fixed at
//! construction: target frequencies, harmonic orders, the analysis window
//! and the scoring variant. With the `serde` feature every type can be
//! loaded from the caller's own configuration files.

use crate::filter::{SubbandLayout, SubbandWeighting};
use crate::reference::ReferenceShape;

/// Default Tikhonov factor, relative to the mean covariance diagonal.
pub const DEFAULT_REGULARIZATION: f64 = 1e-6;

/// How references are correlated with the EEG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScoringMode {
    /// One joint CCA against all harmonics at once.
    #[default]
    Stacked,
    /// One CCA per harmonic, projections pooled before correlating.
    PerHarmonic,
}

impl ScoringMode {
    /// Reference layout this mode consumes.
    pub fn reference_shape(self) -> ReferenceShape {
        match self {
            ScoringMode::Stacked => ReferenceShape::Stacked,
            ScoringMode::PerHarmonic => ReferenceShape::PerHarmonic,
        }
    }
}

/// Configuration shared by the CCA and FBCCA classifiers.
///
/// # Example
///
/// ```
/// use ssvepcore::{ClassifierConfig, ScoringMode};
///
/// let config = ClassifierConfig::new([9.25, 11.25, 13.25], [1, 2, 3], 256.0, 1025)
///     .stack_harmonics(false);
/// assert_eq!(config.mode, ScoringMode::PerHarmonic);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClassifierConfig {
    /// Target frequencies in Hz, in tie-break order.
    pub frequencies: Vec<f64>,
    /// Harmonic multipliers, e.g. `[1, 2, 3]`.
    pub harmonics: Vec<u32>,
    pub sampling_rate: f64,
    /// Samples per analysis window; every segment must match.
    pub n_samples: usize,
    pub mode: ScoringMode,
    pub regularization: f64,
}

impl ClassifierConfig {
    pub fn new(
        frequencies: impl Into<Vec<f64>>,
        harmonics: impl Into<Vec<u32>>,
        sampling_rate: f64,
        n_samples: usize,
    ) -> Self {
        Self {
            frequencies: frequencies.into(),
            harmonics: harmonics.into(),
            sampling_rate,
            n_samples,
            mode: ScoringMode::Stacked,
            regularization: DEFAULT_REGULARIZATION,
        }
    }

    /// `true` selects [`ScoringMode::Stacked`], `false` [`ScoringMode::PerHarmonic`].
    pub fn stack_harmonics(self, stack: bool) -> Self {
        self.with_mode(if stack {
            ScoringMode::Stacked
        } else {
            ScoringMode::PerHarmonic
        })
    }

    pub fn with_mode(mut self, mode: ScoringMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_regularization(mut self, regularization: f64) -> Self {
        self.regularization = regularization;
        self
    }
}

/// Filter bank layout for FBCCA.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FilterBankConfig {
    pub num_subbands: usize,
    /// Base band low edge in Hz.
    pub low_hz: f64,
    /// Base band high edge in Hz.
    pub high_hz: f64,
    /// Butterworth prototype order; each band has this many biquads.
    pub order: usize,
    pub layout: SubbandLayout,
    pub weighting: SubbandWeighting,
}

impl Default for FilterBankConfig {
    fn default() -> Self {
        Self {
            num_subbands: 5,
            low_hz: 6.0,
            high_hz: 40.0,
            order: 4,
            layout: SubbandLayout::Scaled,
            weighting: SubbandWeighting::Uniform,
        }
    }
}

impl FilterBankConfig {
    pub fn with_subbands(mut self, num_subbands: usize) -> Self {
        self.num_subbands = num_subbands;
        self
    }

    pub fn with_band(mut self, low_hz: f64, high_hz: f64) -> Self {
        self.low_hz = low_hz;
        self.high_hz = high_hz;
        self
    }

    pub fn with_order(mut self, order: usize) -> Self {
        self.order = order;
        self
    }

    pub fn with_layout(mut self, layout: SubbandLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_weighting(mut self, weighting: SubbandWeighting) -> Self {
        self.weighting = weighting;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClassifierConfig::new(vec![10.0], vec![1, 2], 250.0, 500);
        assert_eq!(config.mode, ScoringMode::Stacked);
        assert_eq!(config.regularization, DEFAULT_REGULARIZATION);

        let bank = FilterBankConfig::default();
        assert_eq!(bank.num_subbands, 5);
        assert_eq!((bank.low_hz, bank.high_hz), (6.0, 40.0));
        assert_eq!(bank.order, 4);
        assert_eq!(bank.weighting, SubbandWeighting::Uniform);
    }

    #[test]
    fn test_stack_harmonics_maps_to_mode() {
        let config = ClassifierConfig::new([8.0], [1], 128.0, 256);
        assert_eq!(config.clone().stack_harmonics(true).mode, ScoringMode::Stacked);
        assert_eq!(config.stack_harmonics(false).mode, ScoringMode::PerHarmonic);
        assert_eq!(
            ScoringMode::PerHarmonic.reference_shape(),
            ReferenceShape::PerHarmonic
        );
    }

    #[test]
    fn test_bank_builders() {
        let bank = FilterBankConfig::default()
            .with_subbands(3)
            .with_band(7.0, 50.0)
            .with_order(2)
            .with_layout(SubbandLayout::Harmonic)
            .with_weighting(SubbandWeighting::PowerLaw { a: 1.25, b: 0.25 });

        assert_eq!(bank.num_subbands, 3);
        assert_eq!(bank.high_hz, 50.0);
        assert_eq!(bank.layout, SubbandLayout::Harmonic);
    }
}
