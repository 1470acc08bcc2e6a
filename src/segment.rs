//! Multichannel EEG segment.
//!
//! A segment is the unit of analysis: a fixed block of `n_channels ×
//! n_samples` values handed over by the acquisition layer. Data is stored
//! channel-major, so each channel is one contiguous slice and the
//! channel-concatenated signal used for SNR estimation is the raw buffer.
//!
//! ```text
//! [ch0 t0, ch0 t1, ..., ch0 tN-1, ch1 t0, ch1 t1, ..., chC-1 tN-1]
//! ```

use crate::error::{Result, SsvepError};
use crate::linalg::Matrix;

/// Immutable EEG block, channels × samples.
#[derive(Debug, Clone, PartialEq)]
pub struct EegSegment {
    n_channels: usize,
    n_samples: usize,
    data: Vec<f64>,
}

impl EegSegment {
    /// Wrap a channel-major buffer.
    ///
    /// # Errors
    ///
    /// `SsvepError::InvalidSegment` if `data.len() != n_channels * n_samples`.
    pub fn new(n_channels: usize, n_samples: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != n_channels * n_samples {
            return Err(SsvepError::InvalidSegment {
                channels: n_channels,
                samples: n_samples,
                len: data.len(),
            });
        }
        Ok(Self {
            n_channels,
            n_samples,
            data,
        })
    }

    /// Build a segment from one row per channel.
    ///
    /// # Errors
    ///
    /// `SsvepError::InvalidSegment` if the rows have different lengths.
    ///
    /// # Example
    ///
    /// ```
    /// use ssvepcore::EegSegment;
    ///
    /// let seg = EegSegment::from_channels(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
    /// assert_eq!(seg.n_channels(), 2);
    /// assert_eq!(seg.channel(1), &[4.0, 5.0, 6.0]);
    /// ```
    pub fn from_channels<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
        let n_samples = rows.first().map_or(0, |r| r.as_ref().len());
        let mut data = Vec::with_capacity(rows.len() * n_samples);
        for row in rows {
            let row = row.as_ref();
            if row.len() != n_samples {
                return Err(SsvepError::InvalidSegment {
                    channels: rows.len(),
                    samples: n_samples,
                    len: data.len() + row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Self::new(rows.len(), n_samples, data)
    }

    /// Replicate a single signal across `n_channels` channels.
    pub fn replicate(signal: &[f64], n_channels: usize) -> Self {
        let mut data = Vec::with_capacity(signal.len() * n_channels);
        for _ in 0..n_channels {
            data.extend_from_slice(signal);
        }
        Self {
            n_channels,
            n_samples: signal.len(),
            data,
        }
    }

    pub fn n_channels(&self) -> usize {
        self.n_channels
    }

    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    /// Samples of channel `c`.
    ///
    /// # Panics
    ///
    /// Panics if `c >= n_channels`.
    pub fn channel(&self, c: usize) -> &[f64] {
        assert!(c < self.n_channels, "channel index out of bounds");
        &self.data[c * self.n_samples..(c + 1) * self.n_samples]
    }

    /// Iterate over channels in order.
    pub fn channels(&self) -> impl Iterator<Item = &[f64]> {
        // chunks_exact panics on a zero chunk size
        let size = self.n_samples.max(1);
        self.data.chunks_exact(size).take(self.n_channels)
    }

    /// All channels concatenated end to end.
    pub fn flattened(&self) -> &[f64] {
        &self.data
    }

    /// Observation matrix, samples × channels, as CCA consumes it.
    pub fn observations(&self) -> Matrix {
        Matrix::from_fn(self.n_samples, self.n_channels, |t, c| {
            self.data[c * self.n_samples + t]
        })
    }

    /// Apply a per-channel transform producing a segment of the same shape.
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by `f`; a transform that changes
    /// the channel length yields `SsvepError::InvalidSegment`.
    pub fn try_map_channels<F>(&self, mut f: F) -> Result<Self>
    where
        F: FnMut(&[f64]) -> Result<Vec<f64>>,
    {
        let mut data = Vec::with_capacity(self.data.len());
        for channel in self.channels() {
            data.extend(f(channel)?);
        }
        Self::new(self.n_channels, self.n_samples, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_wrong_length() {
        let err = EegSegment::new(2, 3, vec![0.0; 5]).unwrap_err();
        assert_eq!(
            err,
            SsvepError::InvalidSegment {
                channels: 2,
                samples: 3,
                len: 5
            }
        );
    }

    #[test]
    fn test_from_channels_rejects_ragged() {
        let rows = [vec![1.0, 2.0], vec![3.0]];
        assert!(EegSegment::from_channels(&rows).is_err());
    }

    #[test]
    fn test_observations_transposes() {
        let seg = EegSegment::from_channels(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]).unwrap();
        let obs = seg.observations();

        assert_eq!(obs.rows(), 3);
        assert_eq!(obs.cols(), 2);
        assert_eq!(obs.row(0), &[1.0, 4.0]);
        assert_eq!(obs.row(2), &[3.0, 6.0]);
    }

    #[test]
    fn test_flattened_is_channel_concatenation() {
        let seg = EegSegment::from_channels(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();
        assert_eq!(seg.flattened(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_replicate_and_channels() {
        let seg = EegSegment::replicate(&[0.5, -0.5, 0.25], 4);
        assert_eq!(seg.n_channels(), 4);
        assert_eq!(seg.channels().count(), 4);
        assert!(seg.channels().all(|c| c == [0.5, -0.5, 0.25]));
    }

    #[test]
    fn test_try_map_channels() {
        let seg = EegSegment::from_channels(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();
        let doubled = seg
            .try_map_channels(|c| Ok(c.iter().map(|x| x * 2.0).collect()))
            .unwrap();
        assert_eq!(doubled.channel(1), &[6.0, 8.0]);

        let truncated = seg.try_map_channels(|c| Ok(c[..1].to_vec()));
        assert!(truncated.is_err());
    }
}
