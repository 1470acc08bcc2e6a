//! Forward-backward (zero-phase) filtering.
//!
//! Equivalent to `scipy.signal.filtfilt` with its default odd extension:
//!
//! ```text
//! [2x0 - x[p]..2x0 - x[1]] x [2xN - x[N-1-1]..2xN - x[N-1-p]]
//!  <------ padlen ------>      <---------- padlen ---------->
//! ```
//!
//! The filter state is primed with the steady state for the first sample
//! of each pass, the extended signal is filtered forward, reversed, filtered
//! again and reversed, then the padding is stripped.

use super::iir::{BiquadCoeffs, IirFilter};
use crate::error::{Result, SsvepError};

/// Edge padding used for a cascade of `sections` biquads.
///
/// Matches filtfilt's `3 * max(len(a), len(b))` for the expanded transfer
/// function of order `2 * sections`.
pub fn padlen(sections: usize) -> usize {
    3 * (2 * sections + 1)
}

/// Filters `signal` forward and backward through `sections`.
///
/// # Errors
///
/// `SsvepError::SignalTooShort` if `signal.len() <= padlen(sections.len())`.
pub fn filtfilt(sections: &[BiquadCoeffs], signal: &[f64]) -> Result<Vec<f64>> {
    let pad = padlen(sections.len());
    let n = signal.len();
    if n <= pad {
        return Err(SsvepError::SignalTooShort {
            len: n,
            required: pad,
        });
    }

    let first = signal[0];
    let last = signal[n - 1];
    let mut extended = Vec::with_capacity(n + 2 * pad);
    extended.extend((1..=pad).rev().map(|i| 2.0 * first - signal[i]));
    extended.extend_from_slice(signal);
    extended.extend((1..=pad).map(|i| 2.0 * last - signal[n - 1 - i]));

    let mut filter = IirFilter::new(sections.to_vec());

    filter.prime(extended[0]);
    filter.process_block(&mut extended);
    extended.reverse();

    filter.reset();
    filter.prime(extended[0]);
    filter.process_block(&mut extended);
    extended.reverse();

    Ok(extended[pad..pad + n].to_vec())
}
