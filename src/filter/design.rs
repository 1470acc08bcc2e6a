//! Butterworth band-pass design as cascaded second-order sections.
//!
//! Cutoffs are normalized to Nyquist (`1.0` = `fs / 2`). The design follows
//! the classic analog route:
//!
//! 1. Butterworth low-pass prototype poles on the unit circle
//! 2. Low-pass to band-pass transform around the pre-warped band edges
//! 3. Bilinear transform to the z-plane
//! 4. Conjugate pole pairs grouped into biquads with numerator `1 - z^-2`
//!
//! Every section is scaled to unit gain at the digital band center, so the
//! cascade has unit gain there too.

use core::f64::consts::PI;

use rustfft::num_complex::Complex64;

use super::iir::BiquadCoeffs;
use crate::error::{Result, SsvepError};

// Bilinear transform constant 2*fs with fs = 2 (Nyquist-normalized edges)
const FS2: f64 = 4.0;

/// Designs an `order`-pole Butterworth band-pass, returning `order` sections.
///
/// `low` and `high` are normalized to Nyquist and must satisfy
/// `0 < low < high < 1`.
///
/// # Errors
///
/// `SsvepError::FilterDesign` for an order of zero, invalid edges, or if
/// the poles cannot be grouped into `order` real-coefficient sections.
pub fn butterworth_bandpass(order: usize, low: f64, high: f64) -> Result<Vec<BiquadCoeffs>> {
    if order == 0 {
        return Err(SsvepError::FilterDesign("order must be at least 1"));
    }
    if !(low > 0.0 && low < high && high < 1.0) {
        return Err(SsvepError::FilterDesign("band edges must satisfy 0 < low < high < 1"));
    }

    let warped_low = FS2 * libm::tan(PI * low / 2.0);
    let warped_high = FS2 * libm::tan(PI * high / 2.0);
    let bandwidth = warped_high - warped_low;
    let center = libm::sqrt(warped_low * warped_high);

    let mut complex_poles = Vec::with_capacity(order);
    let mut real_poles = Vec::new();

    for k in 0..order {
        let theta = PI * (2 * k + 1) as f64 / (2 * order) as f64;
        let prototype = Complex64::new(-libm::sin(theta), libm::cos(theta));

        let half = prototype * (bandwidth / 2.0);
        let root = (half * half - center * center).sqrt();
        for s in [half + root, half - root] {
            let z = (FS2 + s) / (FS2 - s);
            if z.im.abs() <= 1e-12 * z.norm().max(1.0) {
                real_poles.push(z.re);
            } else if z.im > 0.0 {
                complex_poles.push(z);
            }
        }
    }

    if real_poles.len() % 2 != 0 {
        return Err(SsvepError::FilterDesign("unpaired real pole"));
    }
    real_poles.sort_by(|a, b| a.total_cmp(b));

    let mut sections: Vec<BiquadCoeffs> = complex_poles
        .iter()
        .map(|z| BiquadCoeffs::new(1.0, 0.0, -1.0, -2.0 * z.re, z.norm_sqr()))
        .collect();
    sections.extend(
        real_poles
            .chunks_exact(2)
            .map(|p| BiquadCoeffs::new(1.0, 0.0, -1.0, -(p[0] + p[1]), p[0] * p[1])),
    );

    if sections.len() != order {
        return Err(SsvepError::FilterDesign("pole count does not match order"));
    }

    let omega_center = 2.0 * libm::atan(center / FS2);
    for section in sections.iter_mut() {
        let gain = section.frequency_response(omega_center).norm();
        if !(gain > 0.0 && gain.is_finite()) {
            return Err(SsvepError::FilterDesign("degenerate section gain"));
        }
        section.b0 /= gain;
        section.b2 /= gain;
    }

    Ok(sections)
}

/// Digital band center in rad/sample for Nyquist-normalized edges.
pub fn band_center(low: f64, high: f64) -> f64 {
    let warped_low = FS2 * libm::tan(PI * low / 2.0);
    let warped_high = FS2 * libm::tan(PI * high / 2.0);
    2.0 * libm::atan(libm::sqrt(warped_low * warped_high) / FS2)
}
