//! Filter bank for FBCCA.
//!
//! Splits a segment into several band-passed copies. Sub-band edges are
//! derived from a base band and a [`SubbandLayout`]; edges at or beyond
//! Nyquist are pulled back to `0.99 * Nyquist`.

use tracing::debug;

use super::design::butterworth_bandpass;
use super::iir::BiquadCoeffs;
use super::zero_phase::{filtfilt, padlen};
use crate::config::FilterBankConfig;
use crate::error::{Result, SsvepError};
use crate::parallel::try_map_indexed;
use crate::segment::EegSegment;

/// Fraction of Nyquist that clamped upper edges are set to.
pub const NYQUIST_MARGIN: f64 = 0.99;

/// How sub-band edges grow with the band index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SubbandLayout {
    /// Band `i` spans `[low * (i + 1), high * (i + 1)]`.
    #[default]
    Scaled,
    /// Band `i` spans `[low * (i + 1), high]`.
    Harmonic,
    /// `[low, high]` split into equal-width neighbouring bands.
    Contiguous,
}

/// How sub-band correlations are fused into one score.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SubbandWeighting {
    /// Plain mean.
    #[default]
    Uniform,
    /// Weighted mean with `w(n) = n^(-a) + b`, `n` starting at 1.
    PowerLaw { a: f64, b: f64 },
}

impl SubbandWeighting {
    /// Weights for `count` sub-bands.
    pub fn weights(&self, count: usize) -> Vec<f64> {
        match *self {
            SubbandWeighting::Uniform => vec![1.0; count],
            SubbandWeighting::PowerLaw { a, b } => (1..=count)
                .map(|n| libm::pow(n as f64, -a) + b)
                .collect(),
        }
    }
}

/// One band-pass channel of the bank.
#[derive(Debug, Clone, PartialEq)]
pub struct SubbandFilter {
    index: usize,
    low_hz: f64,
    high_hz: f64,
    sections: Vec<BiquadCoeffs>,
}

impl SubbandFilter {
    /// Designs the band `[low_hz, high_hz]`, clamping the upper edge below
    /// Nyquist.
    ///
    /// # Errors
    ///
    /// `SsvepError::InvalidBand` if the low edge is not positive or not below
    /// the clamped high edge.
    pub fn design(
        index: usize,
        low_hz: f64,
        high_hz: f64,
        sampling_rate: f64,
        order: usize,
    ) -> Result<Self> {
        let nyquist = sampling_rate / 2.0;
        let high_hz = if high_hz >= nyquist {
            NYQUIST_MARGIN * nyquist
        } else {
            high_hz
        };

        let low = low_hz / nyquist;
        let high = high_hz / nyquist;
        if !(low > 0.0 && low < high) {
            return Err(SsvepError::InvalidBand { index, low, high });
        }

        let sections = butterworth_bandpass(order, low, high)?;
        Ok(Self {
            index,
            low_hz,
            high_hz,
            sections,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Pass band in Hz after clamping.
    pub fn band(&self) -> (f64, f64) {
        (self.low_hz, self.high_hz)
    }

    pub fn sections(&self) -> &[BiquadCoeffs] {
        &self.sections
    }

    /// Minimum signal length is one more than this.
    pub fn padlen(&self) -> usize {
        padlen(self.sections.len())
    }

    /// Zero-phase filters one channel.
    pub fn apply(&self, signal: &[f64]) -> Result<Vec<f64>> {
        filtfilt(&self.sections, signal)
    }

    /// Zero-phase filters every channel of `segment`.
    pub fn apply_segment(&self, segment: &EegSegment) -> Result<EegSegment> {
        segment.try_map_channels(|channel| self.apply(channel))
    }
}

/// The sub-band filters and their fusion weights.
///
/// # Example
///
/// ```
/// use ssvepcore::filter::FilterBank;
/// use ssvepcore::FilterBankConfig;
///
/// let bank = FilterBank::new(&FilterBankConfig::default(), 256.0).unwrap();
/// assert_eq!(bank.len(), 5);
/// // 5th band [30, 200] Hz is clamped below Nyquist
/// assert_eq!(bank.filters()[4].band(), (30.0, 126.72));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FilterBank {
    filters: Vec<SubbandFilter>,
    weights: Vec<f64>,
}

impl FilterBank {
    /// Designs every sub-band of `config` for `sampling_rate`.
    ///
    /// # Errors
    ///
    /// `SsvepError::InvalidBand` for an unusable band,
    /// `SsvepError::FilterDesign` if a band cannot be realized.
    pub fn new(config: &FilterBankConfig, sampling_rate: f64) -> Result<Self> {
        let width = (config.high_hz - config.low_hz) / config.num_subbands.max(1) as f64;
        let filters = (0..config.num_subbands)
            .map(|i| {
                let scale = (i + 1) as f64;
                let (low, high) = match config.layout {
                    SubbandLayout::Scaled => (config.low_hz * scale, config.high_hz * scale),
                    SubbandLayout::Harmonic => (config.low_hz * scale, config.high_hz),
                    SubbandLayout::Contiguous => (
                        config.low_hz + i as f64 * width,
                        config.low_hz + scale * width,
                    ),
                };
                SubbandFilter::design(i, low, high, sampling_rate, config.order)
            })
            .collect::<Result<Vec<_>>>()?;

        for f in &filters {
            let (low, high) = f.band();
            debug!("sub-band {}: {:.2}-{:.2} Hz, {} sections", f.index(), low, high, f.sections().len());
        }

        Ok(Self {
            weights: config.weighting.weights(filters.len()),
            filters,
        })
    }

    pub fn filters(&self) -> &[SubbandFilter] {
        &self.filters
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// One filtered copy of `segment` per sub-band, in band order.
    ///
    /// # Errors
    ///
    /// `SsvepError::SignalTooShort` if the segment cannot be padded.
    pub fn decompose(&self, segment: &EegSegment) -> Result<Vec<EegSegment>> {
        try_map_indexed(self.filters.len(), |i| self.filters[i].apply_segment(segment))
    }

    /// Weighted mean of per-band scores. `NaN` scores propagate.
    pub fn fuse(&self, scores: &[f64]) -> f64 {
        let total: f64 = self.weights.iter().sum();
        if total == 0.0 {
            return f64::NAN;
        }
        let weighted: f64 = scores.iter().zip(&self.weights).map(|(s, w)| s * w).sum();
        weighted / total
    }
}
