//! Spectral signal-to-noise ratio at the stimulation frequencies.
//!
//! The SNR of a target is the PSD at the bin nearest the target divided by
//! the mean PSD of the surrounding bins within `± noise_bandwidth` Hz (the
//! target bin itself excluded), expressed in dB. It is a diagnostic that
//! runs independently of classification on the same segment.

use tracing::{debug, warn};

use crate::error::{Result, SsvepError};
use crate::segment::EegSegment;
use crate::welch::{PowerSpectrum, Welch};

/// How a multichannel segment is reduced to a single spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChannelCombine {
    /// Channels joined end to end into one long signal before Welch.
    #[default]
    Concatenate,
    /// One Welch PSD per channel, averaged bin by bin.
    AveragePsd,
}

/// SNR estimator settings.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SnrConfig {
    pub welch: Welch,
    pub combine: ChannelCombine,
}

impl Default for SnrConfig {
    fn default() -> Self {
        Self {
            welch: Welch::new(),
            combine: ChannelCombine::Concatenate,
        }
    }
}

impl SnrConfig {
    pub fn with_welch(mut self, welch: Welch) -> Self {
        self.welch = welch;
        self
    }

    pub fn with_combine(mut self, combine: ChannelCombine) -> Self {
        self.combine = combine;
        self
    }
}

/// SNR of one frequency in dB. `NaN` when the noise window held no bins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencySnr {
    pub frequency: f64,
    pub snr_db: f64,
}

/// SNR per frequency, in request order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SnrResult {
    entries: Vec<FrequencySnr>,
}

impl SnrResult {
    /// SNR of the first entry whose frequency equals `frequency`.
    pub fn get(&self, frequency: f64) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.frequency == frequency)
            .map(|e| e.snr_db)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrequencySnr> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[FrequencySnr] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<FrequencySnr> for SnrResult {
    fn from_iter<I: IntoIterator<Item = FrequencySnr>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Welch-based SNR estimator.
///
/// # Example
///
/// ```
/// use ssvepcore::snr::{SnrConfig, SnrEstimator};
/// use ssvepcore::EegSegment;
///
/// let fs = 256.0;
/// // 12 Hz tone over a pseudo-random floor
/// let tone: Vec<f64> = (0..2048)
///     .map(|i| {
///         let floor = ((i * 7919) % 101) as f64 / 1010.0;
///         (2.0 * core::f64::consts::PI * 12.0 * i as f64 / fs).sin() + floor
///     })
///     .collect();
/// let segment = EegSegment::replicate(&tone, 2);
///
/// let estimator = SnrEstimator::new(fs, SnrConfig::default());
/// let result = estimator.calculate_snr(&segment, &[12.0, 20.0], 1.0).unwrap();
/// assert!(result.get(12.0).unwrap() > result.get(20.0).unwrap());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SnrEstimator {
    sampling_rate: f64,
    config: SnrConfig,
}

impl SnrEstimator {
    pub fn new(sampling_rate: f64, config: SnrConfig) -> Self {
        Self {
            sampling_rate,
            config,
        }
    }

    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    pub fn config(&self) -> &SnrConfig {
        &self.config
    }

    /// PSD of the segment, combined across channels per [`ChannelCombine`].
    ///
    /// # Errors
    ///
    /// `SsvepError::InsufficientSamples` for a segment without samples.
    pub fn power_spectrum(&self, segment: &EegSegment) -> Result<PowerSpectrum> {
        match self.config.combine {
            ChannelCombine::Concatenate => self
                .config
                .welch
                .estimate(segment.flattened(), self.sampling_rate),
            ChannelCombine::AveragePsd => {
                let mut spectra = segment
                    .channels()
                    .map(|c| self.config.welch.estimate(c, self.sampling_rate));
                let first = spectra.next().ok_or(SsvepError::InsufficientSamples {
                    required: 1,
                    actual: 0,
                })??;

                let mut density = first.density().to_vec();
                let mut count = 1usize;
                for spectrum in spectra {
                    for (acc, p) in density.iter_mut().zip(spectrum?.density()) {
                        *acc += p;
                    }
                    count += 1;
                }
                density.iter_mut().for_each(|p| *p /= count as f64);

                Ok(PowerSpectrum::from_parts(
                    first.frequencies().to_vec(),
                    density,
                    first.segments(),
                ))
            }
        }
    }

    /// SNR in dB at each target frequency.
    ///
    /// # Errors
    ///
    /// `SsvepError::InsufficientSamples` for a segment without samples.
    pub fn calculate_snr(
        &self,
        segment: &EegSegment,
        targets: &[f64],
        noise_bandwidth: f64,
    ) -> Result<SnrResult> {
        let psd = self.power_spectrum(segment)?;
        Ok(targets
            .iter()
            .map(|&frequency| FrequencySnr {
                frequency,
                snr_db: snr_at(&psd, frequency, noise_bandwidth),
            })
            .collect())
    }

    /// SNR of every PSD bin against its own `± noise_bandwidth` neighborhood.
    pub fn snr_spectrum(&self, segment: &EegSegment, noise_bandwidth: f64) -> Result<SnrResult> {
        let psd = self.power_spectrum(segment)?;
        Ok((0..psd.len())
            .map(|k| {
                let frequency = psd.frequencies()[k];
                FrequencySnr {
                    frequency,
                    snr_db: snr_of_bin(&psd, k, frequency, noise_bandwidth),
                }
            })
            .collect())
    }
}

/// SNR in dB of the bin nearest `frequency`.
pub fn snr_at(psd: &PowerSpectrum, frequency: f64, noise_bandwidth: f64) -> f64 {
    let bin = psd.nearest_bin(frequency);
    let offset = (psd.frequencies()[bin] - frequency).abs();
    if offset > psd.resolution() {
        debug!(
            "{} Hz is outside the spectrum, using bin at {} Hz",
            frequency,
            psd.frequencies()[bin]
        );
    }
    snr_of_bin(psd, bin, frequency, noise_bandwidth)
}

fn snr_of_bin(psd: &PowerSpectrum, bin: usize, center: f64, noise_bandwidth: f64) -> f64 {
    let lo = center - noise_bandwidth;
    let hi = center + noise_bandwidth;

    let mut noise = 0.0;
    let mut count = 0usize;
    for (k, (&f, &p)) in psd.frequencies().iter().zip(psd.density()).enumerate() {
        if k != bin && f >= lo && f <= hi {
            noise += p;
            count += 1;
        }
    }

    if count == 0 {
        warn!(
            "empty noise window around {} Hz (bandwidth {} Hz)",
            center, noise_bandwidth
        );
        return f64::NAN;
    }

    10.0 * libm::log10(psd.density()[bin] / (noise / count as f64))
}
