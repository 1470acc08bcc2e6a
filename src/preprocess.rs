//! Causal preprocessing and per-channel summary features.
//!
//! Unlike the filter bank, the preprocessing band-pass runs a single forward
//! pass, so it introduces the usual Butterworth phase delay. Every channel
//! starts from a zeroed filter state.

use tracing::debug;

use crate::error::{Result, SsvepError};
use crate::filter::{butterworth_bandpass, IirFilter};
use crate::segment::EegSegment;
use crate::stats::OnlineStats;

/// Single-pass Butterworth band-pass applied channel by channel.
///
/// # Example
///
/// ```
/// use ssvepcore::preprocess::Preprocessor;
/// use ssvepcore::EegSegment;
///
/// let pre = Preprocessor::default_for(256.0).unwrap();
/// let segment = EegSegment::replicate(&[1.0; 64], 2);
/// let filtered = pre.apply(&segment).unwrap();
/// assert_eq!(filtered.n_samples(), 64);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Preprocessor {
    filter: IirFilter,
    low_hz: f64,
    high_hz: f64,
}

impl Preprocessor {
    pub const DEFAULT_LOW_HZ: f64 = 0.5;
    pub const DEFAULT_HIGH_HZ: f64 = 30.0;
    pub const DEFAULT_ORDER: usize = 5;

    /// Designs a band-pass over `[low_hz, high_hz]`.
    ///
    /// # Errors
    ///
    /// `SsvepError::InvalidPassband` unless `0 < low_hz < high_hz < fs / 2`,
    /// `SsvepError::FilterDesign` for an order of zero.
    pub fn bandpass(sampling_rate: f64, low_hz: f64, high_hz: f64, order: usize) -> Result<Self> {
        let nyquist = sampling_rate / 2.0;
        let low = low_hz / nyquist;
        let high = high_hz / nyquist;
        if !(low > 0.0 && low < high && high < 1.0) {
            return Err(SsvepError::InvalidPassband {
                low_hz,
                high_hz,
                sampling_rate,
            });
        }

        let sections = butterworth_bandpass(order, low, high)?;
        debug!(
            "preprocessing band-pass {}-{} Hz, order {}, {} sections",
            low_hz,
            high_hz,
            order,
            sections.len()
        );

        Ok(Self {
            filter: IirFilter::new(sections),
            low_hz,
            high_hz,
        })
    }

    /// 0.5-30 Hz, order 5.
    pub fn default_for(sampling_rate: f64) -> Result<Self> {
        Self::bandpass(
            sampling_rate,
            Self::DEFAULT_LOW_HZ,
            Self::DEFAULT_HIGH_HZ,
            Self::DEFAULT_ORDER,
        )
    }

    pub fn band(&self) -> (f64, f64) {
        (self.low_hz, self.high_hz)
    }

    pub fn filter(&self) -> &IirFilter {
        &self.filter
    }

    /// Filters one channel from rest.
    pub fn apply_channel(&self, signal: &[f64]) -> Vec<f64> {
        let mut filter = self.filter.clone();
        filter.reset();
        let mut out = signal.to_vec();
        filter.process_block(&mut out);
        out
    }

    /// Filters every channel of `segment`.
    pub fn apply(&self, segment: &EegSegment) -> Result<EegSegment> {
        segment.try_map_channels(|channel| Ok(self.apply_channel(channel)))
    }
}

/// Mean and population standard deviation of one channel.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelFeatures {
    pub mean: f64,
    pub std: f64,
}

/// One [`ChannelFeatures`] per channel, in channel order.
pub fn channel_features(segment: &EegSegment) -> Vec<ChannelFeatures> {
    let mut stats = OnlineStats::new(segment.n_channels());
    let mut sample = vec![0.0; segment.n_channels()];
    for t in 0..segment.n_samples() {
        for (c, value) in sample.iter_mut().enumerate() {
            *value = segment.channel(c)[t];
        }
        stats.update(&sample);
    }

    stats
        .mean()
        .iter()
        .zip(stats.population_variance())
        .map(|(&mean, var)| ChannelFeatures {
            mean,
            std: libm::sqrt(var),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use core::f64::consts::PI;

    fn rms(x: &[f64]) -> f64 {
        libm::sqrt(x.iter().map(|v| v * v).sum::<f64>() / x.len() as f64)
    }

    fn tone(freq: f64, fs: f64, n: usize) -> Vec<f64> {
        (0..n).map(|i| libm::sin(2.0 * PI * freq * i as f64 / fs)).collect()
    }

    #[test]
    fn test_default_band() {
        let pre = Preprocessor::default_for(256.0).unwrap();
        assert_eq!(pre.band(), (0.5, 30.0));
        assert_eq!(pre.filter().num_sections(), 5);
    }

    #[test]
    fn test_passes_alpha_rejects_high_tone() {
        let fs = 256.0;
        let pre = Preprocessor::default_for(fs).unwrap();

        let low = pre.apply_channel(&tone(10.0, fs, 2048));
        let high = pre.apply_channel(&tone(100.0, fs, 2048));

        assert!(rms(&low[1024..]) > 0.6);
        assert!(rms(&high[1024..]) < 0.01);
    }

    #[test]
    fn test_channels_filtered_independently() {
        let fs = 250.0;
        let pre = Preprocessor::bandpass(fs, 5.0, 20.0, 4).unwrap();
        let a = tone(8.0, fs, 300);
        let b = tone(15.0, fs, 300);
        let segment = EegSegment::from_channels(&[a.clone(), b.clone()]).unwrap();

        let filtered = pre.apply(&segment).unwrap();
        assert_eq!(filtered.channel(0), pre.apply_channel(&a).as_slice());
        assert_eq!(filtered.channel(1), pre.apply_channel(&b).as_slice());
    }

    #[test]
    fn test_invalid_passband() {
        assert_eq!(
            Preprocessor::bandpass(256.0, 30.0, 10.0, 4).unwrap_err(),
            SsvepError::InvalidPassband {
                low_hz: 30.0,
                high_hz: 10.0,
                sampling_rate: 256.0
            }
        );
        assert!(matches!(
            Preprocessor::bandpass(256.0, 1.0, 128.0, 4),
            Err(SsvepError::InvalidPassband { .. })
        ));
        assert!(matches!(
            Preprocessor::bandpass(256.0, 0.0, 30.0, 4),
            Err(SsvepError::InvalidPassband { .. })
        ));
        assert!(matches!(
            Preprocessor::bandpass(256.0, 1.0, 30.0, 0),
            Err(SsvepError::FilterDesign(_))
        ));
    }

    #[test]
    fn test_channel_features() {
        let segment = EegSegment::from_channels(&[vec![1.0, 2.0, 3.0, 4.0], vec![5.0; 4]]).unwrap();
        let features = channel_features(&segment);

        assert_eq!(features.len(), 2);
        assert_relative_eq!(features[0].mean, 2.5);
        assert_relative_eq!(features[0].std, libm::sqrt(1.25));
        assert_relative_eq!(features[1].mean, 5.0);
        assert_relative_eq!(features[1].std, 0.0);
    }
}
