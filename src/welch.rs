//! Welch's method for power spectral density estimation.
//!
//! Welch's method reduces variance in PSD estimates by averaging multiple
//! overlapping windowed periodograms. The estimator here reproduces
//! `scipy.signal.welch` with its defaults:
//!
//! 1. Segment length `nperseg = min(segment_len, signal.len())`
//! 2. Overlap `nperseg / 2` unless set explicitly
//! 3. Per-segment mean removal (constant detrend)
//! 4. Periodic window, real FFT, one-sided density in V²/Hz
//! 5. Mean of the per-segment periodograms
//!
//! # Example
//!
//! ```
//! use ssvepcore::welch::Welch;
//!
//! let fs = 256.0;
//! let signal: Vec<f64> = (0..2048)
//!     .map(|i| (2.0 * core::f64::consts::PI * 16.0 * i as f64 / fs).sin())
//!     .collect();
//!
//! let psd = Welch::new().with_segment_len(256).estimate(&signal, fs).unwrap();
//! assert_eq!(psd.len(), 129);
//! assert_eq!(psd.nearest_bin(16.0), 16);
//! ```

use rustfft::num_complex::Complex64;
use rustfft::FftPlanner;

use crate::error::{Result, SsvepError};
use crate::window::{window, WindowType};

/// Default segment length, matching the SNR estimator's `nperseg`.
pub const DEFAULT_SEGMENT_LEN: usize = 1024;

/// Welch PSD estimator configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Welch {
    segment_len: usize,
    overlap: Option<usize>,
    window: WindowType,
}

impl Default for Welch {
    fn default() -> Self {
        Self::new()
    }
}

impl Welch {
    /// Hann window, 1024-sample segments, 50% overlap.
    pub fn new() -> Self {
        Self {
            segment_len: DEFAULT_SEGMENT_LEN,
            overlap: None,
            window: WindowType::Hann,
        }
    }

    /// Upper bound on the segment length. Shorter signals use their full length.
    ///
    /// # Panics
    ///
    /// Panics if `segment_len == 0`.
    pub fn with_segment_len(mut self, segment_len: usize) -> Self {
        assert!(segment_len > 0, "segment length must be positive");
        self.segment_len = segment_len;
        self
    }

    /// Fixed overlap in samples. Clamped below the effective segment length.
    pub fn with_overlap(mut self, overlap: usize) -> Self {
        self.overlap = Some(overlap);
        self
    }

    pub fn with_window(mut self, window: WindowType) -> Self {
        self.window = window;
        self
    }

    pub fn segment_len(&self) -> usize {
        self.segment_len
    }

    pub fn window(&self) -> WindowType {
        self.window
    }

    /// Effective `(nperseg, noverlap)` for a signal of `signal_len` samples.
    pub fn segmentation(&self, signal_len: usize) -> (usize, usize) {
        let nperseg = self.segment_len.min(signal_len);
        let noverlap = self
            .overlap
            .unwrap_or(nperseg / 2)
            .min(nperseg.saturating_sub(1));
        (nperseg, noverlap)
    }

    /// Number of segments averaged for a signal of `signal_len` samples.
    pub fn num_segments(&self, signal_len: usize) -> usize {
        let (nperseg, noverlap) = self.segmentation(signal_len);
        if nperseg == 0 {
            return 0;
        }
        (signal_len - nperseg) / (nperseg - noverlap) + 1
    }

    /// Estimate the one-sided power spectral density of `signal`.
    ///
    /// # Errors
    ///
    /// `SsvepError::InsufficientSamples` if `signal` is empty.
    pub fn estimate(&self, signal: &[f64], sample_rate: f64) -> Result<PowerSpectrum> {
        if signal.is_empty() {
            return Err(SsvepError::InsufficientSamples {
                required: 1,
                actual: 0,
            });
        }

        let (nperseg, noverlap) = self.segmentation(signal.len());
        let step = nperseg - noverlap;
        let num_segments = self.num_segments(signal.len());
        let n_bins = nperseg / 2 + 1;

        let taper = window(self.window, nperseg, true);
        let window_s2: f64 = taper.iter().map(|w| w * w).sum();

        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(nperseg);
        let mut buffer = vec![Complex64::new(0.0, 0.0); nperseg];
        let mut density = vec![0.0; n_bins];

        for seg in 0..num_segments {
            let segment = &signal[seg * step..seg * step + nperseg];
            let mean = segment.iter().sum::<f64>() / nperseg as f64;

            for ((slot, &x), &w) in buffer.iter_mut().zip(segment).zip(&taper) {
                *slot = Complex64::new((x - mean) * w, 0.0);
            }
            fft.process(&mut buffer);

            for (acc, bin) in density.iter_mut().zip(&buffer) {
                *acc += bin.norm_sqr();
            }
        }

        let scale = 1.0 / (sample_rate * window_s2 * num_segments as f64);
        // DC is never doubled, Nyquist only exists for even lengths
        let doubled_end = if nperseg % 2 == 0 { n_bins - 1 } else { n_bins };
        for (k, value) in density.iter_mut().enumerate() {
            *value *= scale;
            if k > 0 && k < doubled_end {
                *value *= 2.0;
            }
        }

        let resolution = sample_rate / nperseg as f64;
        let frequencies = (0..n_bins).map(|k| k as f64 * resolution).collect();

        Ok(PowerSpectrum {
            frequencies,
            density,
            segments: num_segments,
        })
    }
}

/// One-sided PSD with its bin frequencies.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerSpectrum {
    frequencies: Vec<f64>,
    density: Vec<f64>,
    segments: usize,
}

impl PowerSpectrum {
    pub(crate) fn from_parts(frequencies: Vec<f64>, density: Vec<f64>, segments: usize) -> Self {
        Self {
            frequencies,
            density,
            segments,
        }
    }

    /// Bin center frequencies in Hz, `k * fs / nperseg`.
    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// Power spectral density per bin, V²/Hz.
    pub fn density(&self) -> &[f64] {
        &self.density
    }

    /// Number of periodograms averaged.
    pub fn segments(&self) -> usize {
        self.segments
    }

    pub fn len(&self) -> usize {
        self.density.len()
    }

    pub fn is_empty(&self) -> bool {
        self.density.is_empty()
    }

    /// Frequency spacing between bins.
    pub fn resolution(&self) -> f64 {
        match self.frequencies.get(1) {
            Some(&f1) => f1,
            None => 0.0,
        }
    }

    /// Index of the bin closest to `frequency`; the lower bin wins a tie.
    pub fn nearest_bin(&self, frequency: f64) -> usize {
        let mut best = 0;
        let mut best_dist = f64::INFINITY;
        for (k, &f) in self.frequencies.iter().enumerate() {
            let dist = (f - frequency).abs();
            if dist < best_dist {
                best = k;
                best_dist = dist;
            }
        }
        best
    }

    /// Total power, the density integrated over all bins.
    pub fn total_power(&self) -> f64 {
        self.density.iter().sum::<f64>() * self.resolution()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f64::consts::PI;

    fn sine(freq: f64, amplitude: f64, fs: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| amplitude * (2.0 * PI * freq * i as f64 / fs).sin())
            .collect()
    }

    #[test]
    fn test_sinusoid_peak_at_correct_frequency() {
        // 1 Hz per bin at 256 Hz with 256-point segments
        let signal = sine(10.0, 1.0, 256.0, 1024);
        let psd = Welch::new().with_segment_len(256).estimate(&signal, 256.0).unwrap();

        let peak_bin = psd.density()[1..]
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .map(|(i, _)| i + 1)
            .unwrap();
        assert_eq!(peak_bin, 10, "Peak should be at bin 10 (10 Hz)");
        assert_eq!(psd.segments(), 7);
    }

    #[test]
    fn test_sinusoid_power_level() {
        // A pure sinusoid with amplitude A has power A²/2
        let amplitude = 2.0;
        let signal = sine(10.0, amplitude, 256.0, 2048);
        let psd = Welch::new().with_segment_len(256).estimate(&signal, 256.0).unwrap();

        let ratio = psd.total_power() / (amplitude * amplitude / 2.0);
        assert!(
            (ratio - 1.0).abs() < 0.05,
            "Total power ratio: {} (expected ~1.0)",
            ratio
        );
    }

    #[test]
    fn test_short_signal_uses_full_length() {
        // 1025 samples with the default 1024 cap gives a single segment
        let signal = sine(11.25, 1.0, 256.0, 1025);
        let welch = Welch::new();
        assert_eq!(welch.segmentation(1025), (1024, 512));
        assert_eq!(welch.num_segments(1025), 1);

        let psd = welch.estimate(&signal[..300], 256.0).unwrap();
        assert_eq!(psd.len(), 151);
        assert_eq!(psd.segments(), 1);
    }

    #[test]
    fn test_bin_frequencies() {
        let psd = Welch::new().estimate(&[0.0; 1024], 256.0).unwrap();
        assert_eq!(psd.len(), 513);
        assert!((psd.resolution() - 0.25).abs() < 1e-12);
        assert!((psd.frequencies()[512] - 128.0).abs() < 1e-12);
        assert!(psd.density().iter().all(|&p| p == 0.0));
    }

    #[test]
    fn test_nearest_bin_tie_goes_low() {
        let psd = Welch::new().with_segment_len(8).estimate(&[1.0; 8], 8.0).unwrap();
        // Bins at 0, 1, 2, 3, 4 Hz
        assert_eq!(psd.nearest_bin(1.5), 1);
        assert_eq!(psd.nearest_bin(2.6), 3);
        assert_eq!(psd.nearest_bin(100.0), 4);
    }

    #[test]
    fn test_constant_signal_is_detrended() {
        let psd = Welch::new().with_segment_len(64).estimate(&[3.0; 256], 128.0).unwrap();
        assert!(psd.density().iter().all(|&p| p.abs() < 1e-20));
    }

    #[test]
    fn test_odd_segment_doubles_last_bin() {
        // nperseg = 9 has no Nyquist bin; a 4/9 fs tone lands in the last bin
        let fs = 9.0;
        let signal = sine(4.0, 1.0, fs, 9);
        let psd = Welch::new()
            .with_window(WindowType::Rectangular)
            .estimate(&signal, fs)
            .unwrap();
        assert_eq!(psd.len(), 5);

        let ratio = psd.total_power() / 0.5;
        assert!((ratio - 1.0).abs() < 1e-9, "ratio = {}", ratio);
    }

    #[test]
    fn test_empty_signal_errors() {
        let err = Welch::new().estimate(&[], 256.0).unwrap_err();
        assert_eq!(
            err,
            SsvepError::InsufficientSamples {
                required: 1,
                actual: 0
            }
        );
    }
}
