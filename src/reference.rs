//! Sinusoidal reference signals for SSVEP targets.
//!
//! Each target frequency gets sin/cos pairs at the fundamental and every
//! configured harmonic:
//! `[sin(2*pi*h1*f*t), cos(2*pi*h1*f*t), sin(2*pi*h2*f*t), cos(2*pi*h2*f*t), ...]`
//! with `t[i] = i / sample_rate` over the half-open window `0..n_samples`.
//!
//! References are synthesized once when a classifier is built and reused
//! for every segment. No normalization is applied.

use core::f64::consts::PI;

use crate::linalg::Matrix;

/// Layout of a reference matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReferenceShape {
    /// `n_samples × 2·harmonics`, one column per component (joint CCA).
    Stacked,
    /// `2·harmonics × n_samples`, one row per component (pairwise CCA).
    PerHarmonic,
}

/// Reference components for a single target frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceSignal {
    frequency: f64,
    shape: ReferenceShape,
    matrix: Matrix,
}

impl ReferenceSignal {
    /// Synthesize the reference for one frequency.
    pub fn generate(
        frequency: f64,
        harmonics: &[u32],
        sample_rate: f64,
        n_samples: usize,
        shape: ReferenceShape,
    ) -> Self {
        let n_components = 2 * harmonics.len();
        let component = |k: usize, t: usize| {
            let harmonic = harmonics[k / 2] as f64;
            let angle = 2.0 * PI * harmonic * frequency * (t as f64 / sample_rate);
            if k % 2 == 0 {
                libm::sin(angle)
            } else {
                libm::cos(angle)
            }
        };

        let matrix = match shape {
            ReferenceShape::Stacked => Matrix::from_fn(n_samples, n_components, |t, k| component(k, t)),
            ReferenceShape::PerHarmonic => Matrix::from_fn(n_components, n_samples, component),
        };

        Self {
            frequency,
            shape,
            matrix,
        }
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn shape(&self) -> ReferenceShape {
        self.shape
    }

    /// The reference matrix in its stored layout.
    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    /// Number of time samples, independent of layout.
    pub fn n_samples(&self) -> usize {
        match self.shape {
            ReferenceShape::Stacked => self.matrix.rows(),
            ReferenceShape::PerHarmonic => self.matrix.cols(),
        }
    }

    /// Number of sin/cos components (2 per harmonic).
    pub fn n_components(&self) -> usize {
        match self.shape {
            ReferenceShape::Stacked => self.matrix.cols(),
            ReferenceShape::PerHarmonic => self.matrix.rows(),
        }
    }

    pub fn n_harmonics(&self) -> usize {
        self.n_components() / 2
    }

    /// The (sin, cos) pair of harmonic `i` as an `n_samples × 2` matrix.
    ///
    /// # Panics
    ///
    /// Panics if `i >= n_harmonics()`.
    pub fn harmonic_pair(&self, i: usize) -> Matrix {
        assert!(i < self.n_harmonics(), "harmonic index out of bounds");
        match self.shape {
            ReferenceShape::Stacked => {
                Matrix::from_fn(self.matrix.rows(), 2, |t, k| self.matrix.get(t, 2 * i + k))
            }
            ReferenceShape::PerHarmonic => {
                Matrix::from_fn(self.matrix.cols(), 2, |t, k| self.matrix.get(2 * i + k, t))
            }
        }
    }
}

/// The references for every target of a classifier, in configured order.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceSet {
    signals: Vec<ReferenceSignal>,
    n_samples: usize,
}

impl ReferenceSet {
    /// Synthesize one reference per frequency.
    ///
    /// # Example
    ///
    /// ```
    /// use ssvepcore::reference::{ReferenceSet, ReferenceShape};
    ///
    /// let refs = ReferenceSet::generate(&[9.25, 11.25], &[1, 2, 3], 256.0, 1025, ReferenceShape::Stacked);
    /// let r = refs.get(11.25).unwrap();
    /// assert_eq!(r.matrix().rows(), 1025);
    /// assert_eq!(r.matrix().cols(), 6);
    /// ```
    pub fn generate(
        frequencies: &[f64],
        harmonics: &[u32],
        sample_rate: f64,
        n_samples: usize,
        shape: ReferenceShape,
    ) -> Self {
        let signals = frequencies
            .iter()
            .map(|&f| ReferenceSignal::generate(f, harmonics, sample_rate, n_samples, shape))
            .collect();
        Self { signals, n_samples }
    }

    /// First reference whose frequency equals `frequency` exactly.
    pub fn get(&self, frequency: f64) -> Option<&ReferenceSignal> {
        self.signals.iter().find(|s| s.frequency == frequency)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReferenceSignal> {
        self.signals.iter()
    }

    pub fn as_slice(&self) -> &[ReferenceSignal] {
        &self.signals
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Window length every reference was generated for.
    pub fn n_samples(&self) -> usize {
        self.n_samples
    }
}
