//! Filter-bank CCA (FBCCA).
//!
//! The segment is split into band-passed copies once per call; each target
//! is then scored by stacked CCA on every sub-band against the unfiltered
//! reference, and the sub-band scores are fused by the bank's weighting.

use tracing::debug;

use crate::cca::Cca;
use crate::classifier::{check_samples, log_classification, stacked_score, Classification, SsvepClassifier};
use crate::config::{ClassifierConfig, FilterBankConfig};
use crate::error::Result;
use crate::filter::FilterBank;
use crate::parallel::try_map_indexed;
use crate::reference::{ReferenceSet, ReferenceShape};
use crate::segment::EegSegment;

/// Filter-bank CCA classifier. Always scores with stacked references.
///
/// # Example
///
/// ```
/// use ssvepcore::{ClassifierConfig, EegSegment, FbccaClassifier, FilterBankConfig, SsvepClassifier};
///
/// let fs = 256.0;
/// let n = 512;
/// let tone: Vec<f64> = (0..n)
///     .map(|i| (2.0 * core::f64::consts::PI * 10.0 * i as f64 / fs).sin())
///     .collect();
///
/// let config = ClassifierConfig::new([8.0, 10.0, 13.0], [1, 2], fs, n);
/// let classifier = FbccaClassifier::new(config, FilterBankConfig::default()).unwrap();
/// let result = classifier.classify(&EegSegment::replicate(&tone, 3)).unwrap();
/// assert_eq!(result.frequency, Some(10.0));
/// ```
#[derive(Debug, Clone)]
pub struct FbccaClassifier {
    config: ClassifierConfig,
    bank: FilterBank,
    references: ReferenceSet,
    cca: Cca,
}

impl FbccaClassifier {
    /// Designs the filter bank and synthesizes stacked references.
    ///
    /// # Errors
    ///
    /// `SsvepError::InvalidBand` or `SsvepError::FilterDesign` if a sub-band
    /// cannot be built at the configured sampling rate.
    pub fn new(config: ClassifierConfig, bank: FilterBankConfig) -> Result<Self> {
        let filter_bank = FilterBank::new(&bank, config.sampling_rate)?;
        let references = ReferenceSet::generate(
            &config.frequencies,
            &config.harmonics,
            config.sampling_rate,
            config.n_samples,
            ReferenceShape::Stacked,
        );
        let cca = Cca::new(1).with_regularization(config.regularization);

        debug!(
            "FBCCA classifier: {} targets, {} sub-bands, {} samples at {} Hz",
            config.frequencies.len(),
            filter_bank.len(),
            config.n_samples,
            config.sampling_rate
        );

        Ok(Self {
            config,
            bank: filter_bank,
            references,
            cca,
        })
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn filter_bank(&self) -> &FilterBank {
        &self.bank
    }

    pub fn references(&self) -> &ReferenceSet {
        &self.references
    }

    /// Per-target, per-sub-band correlations (`[target][band]`).
    ///
    /// # Errors
    ///
    /// `SsvepError::ShapeMismatch` for a segment of the wrong length,
    /// `SsvepError::SignalTooShort` if the window is too short to filter.
    pub fn subband_scores(&self, segment: &EegSegment) -> Result<Vec<Vec<f64>>> {
        check_samples(segment, self.references.n_samples())?;
        let observations: Vec<_> = self
            .bank
            .decompose(segment)?
            .iter()
            .map(EegSegment::observations)
            .collect();
        let refs = self.references.as_slice();

        try_map_indexed(refs.len(), |i| {
            observations
                .iter()
                .map(|obs| stacked_score(&self.cca, obs, refs[i].matrix()))
                .collect()
        })
    }

    /// Fused score of every target, in configured order.
    pub fn scores(&self, segment: &EegSegment) -> Result<Vec<f64>> {
        Ok(self
            .subband_scores(segment)?
            .iter()
            .map(|bands| self.bank.fuse(bands))
            .collect())
    }

    /// Same as [`SsvepClassifier::classify`].
    pub fn fbcca_analysis(&self, segment: &EegSegment) -> Result<Classification> {
        self.classify(segment)
    }
}

impl SsvepClassifier for FbccaClassifier {
    fn classify(&self, segment: &EegSegment) -> Result<Classification> {
        let scores = self.scores(segment)?;
        let result = Classification::from_scores(&self.config.frequencies, scores);
        log_classification("FBCCA", &self.config.frequencies, &result);
        Ok(result)
    }

    fn frequencies(&self) -> &[f64] {
        &self.config.frequencies
    }

    fn sampling_rate(&self) -> f64 {
        self.config.sampling_rate
    }
}
