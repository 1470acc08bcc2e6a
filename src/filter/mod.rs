mod bank;
mod design;
mod iir;
mod zero_phase;

pub use bank::{FilterBank, SubbandFilter, SubbandLayout, SubbandWeighting, NYQUIST_MARGIN};
pub use design::{band_center, butterworth_bandpass};
pub use iir::{BiquadCoeffs, IirFilter};
pub use zero_phase::{filtfilt, padlen};
