//! Tapering windows for Welch segments.
//!
//! Filter design wants the symmetric form (`N - 1` denominator). Spectral
//! estimation wants the periodic, DFT-even form (`N` denominator), which is
//! what `scipy.signal.get_window` returns and what [`crate::welch::Welch`]
//! uses.

use core::f64::consts::PI;

/// Supported window shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WindowType {
    Rectangular,
    /// Raised cosine, the Welch default.
    #[default]
    Hann,
    /// Does not taper to zero at the endpoints.
    Hamming,
    /// 3-term Blackman.
    Blackman,
}

/// Coefficient `index` of a `length`-point window.
///
/// # Panics
///
/// Panics if `index >= length` or `length == 0`.
///
/// # Example
///
/// ```
/// use ssvepcore::window::{window_coefficient, WindowType};
///
/// let n = 64;
/// assert!(window_coefficient(WindowType::Hann, 0, n, false) < 1e-12);
/// assert!(window_coefficient(WindowType::Hann, n - 1, n, false) < 1e-12);
/// // Periodic Hann peaks exactly at N/2
/// assert!((window_coefficient(WindowType::Hann, n / 2, n, true) - 1.0).abs() < 1e-12);
/// ```
#[inline]
pub fn window_coefficient(window: WindowType, index: usize, length: usize, periodic: bool) -> f64 {
    assert!(length > 0, "window length must be positive");
    assert!(index < length, "window index out of range");

    if length == 1 {
        return 1.0;
    }

    let denom = (if periodic { length } else { length - 1 }) as f64;
    let ratio = index as f64 / denom;

    let value = match window {
        WindowType::Rectangular => 1.0,

        // Hann: 0.5 * (1 - cos(2*pi*n/D))
        WindowType::Hann => 0.5 * (1.0 - libm::cos(2.0 * PI * ratio)),

        // Hamming: 0.54 - 0.46 * cos(2*pi*n/D)
        WindowType::Hamming => 0.54 - 0.46 * libm::cos(2.0 * PI * ratio),

        // Blackman: 0.42 - 0.5*cos(2*pi*n/D) + 0.08*cos(4*pi*n/D)
        WindowType::Blackman => {
            0.42 - 0.5 * libm::cos(2.0 * PI * ratio) + 0.08 * libm::cos(4.0 * PI * ratio)
        }
    };

    // Blackman dips a hair below zero at the endpoints
    if value < 0.0 {
        0.0
    } else {
        value
    }
}

/// Builds the full window of `length` coefficients.
pub fn window(window: WindowType, length: usize, periodic: bool) -> Vec<f64> {
    (0..length)
        .map(|i| window_coefficient(window, i, length, periodic))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangular_window() {
        let w = window(WindowType::Rectangular, 16, true);
        assert!(w.iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_symmetric_hann_is_symmetric() {
        let n = 33;
        let w = window(WindowType::Hann, n, false);
        for i in 0..n / 2 {
            assert!((w[i] - w[n - 1 - i]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_periodic_hann_matches_scipy_definition() {
        // scipy.signal.get_window('hann', 8) = 0.5 - 0.5 cos(2 pi n / 8)
        let w = window(WindowType::Hann, 8, true);
        let expected = [0.0, 0.146447, 0.5, 0.853553, 1.0, 0.853553, 0.5, 0.146447];
        for (a, b) in w.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_hamming_endpoints() {
        let w = window(WindowType::Hamming, 64, false);
        assert!((w[0] - 0.08).abs() < 1e-12);
        assert!((w[63] - 0.08).abs() < 1e-12);
    }

    #[test]
    fn test_blackman_non_negative() {
        let w = window(WindowType::Blackman, 128, false);
        assert!(w.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn test_single_sample_window() {
        assert_eq!(window(WindowType::Blackman, 1, true), vec![1.0]);
    }
}
