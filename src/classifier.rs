//! CCA-based SSVEP frequency classification.
//!
//! A classifier scores every configured target frequency against an EEG
//! segment and picks the highest score. Scoring may run in parallel, but
//! selection is always a sequential scan in configured order so that ties
//! resolve to the first target.

use tracing::{debug, trace};

use crate::cca::{leading_correlation, Cca};
use crate::config::{ClassifierConfig, ScoringMode};
use crate::error::{Result, SsvepError};
use crate::linalg::Matrix;
use crate::parallel::try_map_indexed;
use crate::reference::{ReferenceSet, ReferenceSignal};
use crate::segment::EegSegment;
use crate::snr::{SnrConfig, SnrEstimator, SnrResult};

/// Outcome of classifying one segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Winning frequency, `None` when no target scored above zero.
    pub frequency: Option<f64>,
    /// Position of the winner in the configured list.
    pub index: Option<usize>,
    /// Winning score, `0.0` when there is no winner.
    pub score: f64,
    /// One score per configured target, in configured order.
    pub scores: Vec<f64>,
}

impl Classification {
    /// Applies the selection rule to per-target scores.
    pub fn from_scores(frequencies: &[f64], scores: Vec<f64>) -> Self {
        match select_best(&scores) {
            Some((index, score)) => Self {
                frequency: frequencies.get(index).copied(),
                index: Some(index),
                score,
                scores,
            },
            None => Self {
                frequency: None,
                index: None,
                score: 0.0,
                scores,
            },
        }
    }

    pub fn is_detected(&self) -> bool {
        self.frequency.is_some()
    }
}

/// Index and value of the first strict maximum above zero.
///
/// `NaN` never compares greater, so it never wins.
pub fn select_best(scores: &[f64]) -> Option<(usize, f64)> {
    let mut best = None;
    let mut best_score = 0.0;
    for (i, &score) in scores.iter().enumerate() {
        if score > best_score {
            best_score = score;
            best = Some(i);
        }
    }
    best.map(|i| (i, best_score))
}

/// Common interface of the CCA and filter-bank classifiers.
pub trait SsvepClassifier {
    /// Scores every target and selects the winner.
    fn classify(&self, segment: &EegSegment) -> Result<Classification>;

    /// Target frequencies in configured order.
    fn frequencies(&self) -> &[f64];

    fn sampling_rate(&self) -> f64;

    /// Welch SNR of `segment` at every target frequency.
    fn snr(&self, segment: &EegSegment, noise_bandwidth: f64) -> Result<SnrResult> {
        SnrEstimator::new(self.sampling_rate(), SnrConfig::default()).calculate_snr(
            segment,
            self.frequencies(),
            noise_bandwidth,
        )
    }
}

/// Leading canonical correlation between `observations` (samples × channels)
/// and a stacked reference (samples × components).
pub fn stacked_score(cca: &Cca, observations: &Matrix, reference: &Matrix) -> Result<f64> {
    let (u, v) = cca.fit_transform(observations, reference)?;
    Ok(leading_correlation(&u, &v))
}

/// Per-harmonic score: one CCA per (sin, cos) pair, projections pooled
/// column-wise, then the first pooled columns correlated.
pub fn per_harmonic_score(
    cca: &Cca,
    observations: &Matrix,
    reference: &ReferenceSignal,
) -> Result<f64> {
    let mut pooled: Option<(Matrix, Matrix)> = None;
    for i in 0..reference.n_harmonics() {
        let (u, v) = cca.fit_transform(observations, &reference.harmonic_pair(i))?;
        pooled = Some(match pooled {
            None => (u, v),
            Some((pu, pv)) => (pu.hstack(&u)?, pv.hstack(&v)?),
        });
    }
    Ok(match pooled {
        Some((u, v)) => leading_correlation(&u, &v),
        None => f64::NAN,
    })
}

/// Ensures `segment` has the configured window length.
pub(crate) fn check_samples(segment: &EegSegment, expected: usize) -> Result<()> {
    if segment.n_samples() != expected {
        return Err(SsvepError::ShapeMismatch {
            expected,
            actual: segment.n_samples(),
        });
    }
    Ok(())
}

pub(crate) fn log_classification(kind: &str, frequencies: &[f64], result: &Classification) {
    for (i, (f, s)) in frequencies.iter().zip(&result.scores).enumerate() {
        trace!("{} target {} ({} Hz): score {:.4}", kind, i, f, s);
    }
    match result.frequency {
        Some(f) => debug!("{} winner: {} Hz (score {:.4})", kind, f, result.score),
        None => debug!("{}: no target scored above zero", kind),
    }
}

/// Plain CCA classifier.
///
/// # Example
///
/// ```
/// use ssvepcore::{CcaClassifier, ClassifierConfig, EegSegment, SsvepClassifier};
///
/// let fs = 256.0;
/// let n = 512;
/// let tone: Vec<f64> = (0..n)
///     .map(|i| (2.0 * core::f64::consts::PI * 12.0 * i as f64 / fs).sin())
///     .collect();
///
/// let classifier = CcaClassifier::new(ClassifierConfig::new([8.0, 12.0, 15.0], [1, 2], fs, n));
/// let result = classifier.classify(&EegSegment::replicate(&tone, 4)).unwrap();
/// assert_eq!(result.frequency, Some(12.0));
/// ```
#[derive(Debug, Clone)]
pub struct CcaClassifier {
    config: ClassifierConfig,
    references: ReferenceSet,
    cca: Cca,
}

impl CcaClassifier {
    /// Synthesizes the references for `config`.
    pub fn new(config: ClassifierConfig) -> Self {
        let references = ReferenceSet::generate(
            &config.frequencies,
            &config.harmonics,
            config.sampling_rate,
            config.n_samples,
            config.mode.reference_shape(),
        );
        let cca = Cca::new(1).with_regularization(config.regularization);

        debug!(
            "CCA classifier: {} targets, {} harmonics, {} samples at {} Hz, {:?} scoring",
            config.frequencies.len(),
            config.harmonics.len(),
            config.n_samples,
            config.sampling_rate,
            config.mode
        );

        Self {
            config,
            references,
            cca,
        }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn references(&self) -> &ReferenceSet {
        &self.references
    }

    /// Score of every target, in configured order.
    ///
    /// # Errors
    ///
    /// `SsvepError::ShapeMismatch` if the segment length differs from the
    /// configured window.
    pub fn scores(&self, segment: &EegSegment) -> Result<Vec<f64>> {
        check_samples(segment, self.references.n_samples())?;
        let observations = segment.observations();
        let refs = self.references.as_slice();

        try_map_indexed(refs.len(), |i| match self.config.mode {
            ScoringMode::Stacked => stacked_score(&self.cca, &observations, refs[i].matrix()),
            ScoringMode::PerHarmonic => per_harmonic_score(&self.cca, &observations, &refs[i]),
        })
    }
}

impl SsvepClassifier for CcaClassifier {
    fn classify(&self, segment: &EegSegment) -> Result<Classification> {
        let scores = self.scores(segment)?;
        let result = Classification::from_scores(&self.config.frequencies, scores);
        log_classification("CCA", &self.config.frequencies, &result);
        Ok(result)
    }

    fn frequencies(&self) -> &[f64] {
        &self.config.frequencies
    }

    fn sampling_rate(&self) -> f64 {
        self.config.sampling_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f64::consts::PI;

    fn tone(freq: f64, fs: f64, n: usize) -> Vec<f64> {
        (0..n).map(|i| (2.0 * PI * freq * i as f64 / fs).sin()).collect()
    }

    #[test]
    fn test_select_best_first_strict_maximum() {
        assert_eq!(select_best(&[0.2, 0.8, 0.8, 0.1]), Some((1, 0.8)));
        assert_eq!(select_best(&[f64::NAN, 0.3]), Some((1, 0.3)));
        assert_eq!(select_best(&[0.0, -0.5, f64::NAN]), None);
        assert_eq!(select_best(&[]), None);
    }

    #[test]
    fn test_classification_without_winner() {
        let result = Classification::from_scores(&[10.0, 12.0], vec![0.0, f64::NAN]);
        assert_eq!(result.frequency, None);
        assert_eq!(result.index, None);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.scores.len(), 2);
        assert!(!result.is_detected());
    }

    #[test]
    fn test_stacked_detects_tone() {
        let config = ClassifierConfig::new([9.0, 11.0, 14.0], [1, 2, 3], 256.0, 768);
        let classifier = CcaClassifier::new(config);
        let segment = EegSegment::replicate(&tone(14.0, 256.0, 768), 4);

        let result = classifier.classify(&segment).unwrap();
        assert_eq!(result.frequency, Some(14.0));
        assert_eq!(result.index, Some(2));
        assert!(result.score > 0.9);
        assert_eq!(result.scores.len(), 3);
    }

    #[test]
    fn test_per_harmonic_detects_tone() {
        let config = ClassifierConfig::new([9.0, 11.0, 14.0], [1, 2], 256.0, 768).stack_harmonics(false);
        let classifier = CcaClassifier::new(config);
        let segment = EegSegment::replicate(&tone(11.0, 256.0, 768), 3);

        let result = classifier.classify(&segment).unwrap();
        assert_eq!(result.frequency, Some(11.0));
        assert!(result.score > 0.9);
    }

    #[test]
    fn test_per_harmonic_pools_first_harmonic() {
        let fs = 200.0;
        let n = 400;
        let observations = EegSegment::replicate(&tone(10.0, fs, n), 2).observations();
        let reference =
            ReferenceSignal::generate(10.0, &[1, 2, 3], fs, n, crate::reference::ReferenceShape::PerHarmonic);
        let cca = Cca::new(1);

        let pooled = per_harmonic_score(&cca, &observations, &reference).unwrap();
        let first = stacked_score(&cca, &observations, &reference.harmonic_pair(0)).unwrap();
        assert!((pooled - first).abs() < 1e-12);
    }

    #[test]
    fn test_shape_mismatch_in_both_modes() {
        for stack in [true, false] {
            let config = ClassifierConfig::new([10.0], [1, 2], 250.0, 500).stack_harmonics(stack);
            let classifier = CcaClassifier::new(config);
            let segment = EegSegment::replicate(&tone(10.0, 250.0, 499), 2);

            assert_eq!(
                classifier.classify(&segment).unwrap_err(),
                SsvepError::ShapeMismatch {
                    expected: 500,
                    actual: 499
                }
            );
        }
    }

    #[test]
    fn test_empty_configuration() {
        let classifier = CcaClassifier::new(ClassifierConfig::new(Vec::new(), [1], 250.0, 100));
        let result = classifier.classify(&EegSegment::replicate(&tone(10.0, 250.0, 100), 2)).unwrap();
        assert_eq!(result.frequency, None);
        assert!(result.scores.is_empty());
    }

    #[test]
    fn test_snr_uses_configured_targets() {
        let fs = 256.0;
        let classifier = CcaClassifier::new(ClassifierConfig::new([12.0, 20.0], [1], fs, 1024));
        let mut state = 99u32;
        let signal: Vec<f64> = tone(12.0, fs, 1024)
            .into_iter()
            .map(|x| {
                state = state.wrapping_mul(1103515245).wrapping_add(12345);
                x + 0.05 * ((state as f64 / u32::MAX as f64) * 2.0 - 1.0)
            })
            .collect();
        let snr = classifier.snr(&EegSegment::replicate(&signal, 2), 1.0).unwrap();

        assert_eq!(snr.len(), 2);
        assert!(snr.get(12.0).unwrap() > snr.get(20.0).unwrap());
    }

    #[test]
    fn test_classifier_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CcaClassifier>();
    }
}
