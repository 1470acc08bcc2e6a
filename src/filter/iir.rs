use rustfft::num_complex::Complex64;

/// One second-order section, normalized so that `a0 = 1`:
///
/// `y[n] = b0 x[n] + b1 x[n-1] + b2 x[n-2] - a1 y[n-1] - a2 y[n-2]`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BiquadCoeffs {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl BiquadCoeffs {
    pub const fn new(b0: f64, b1: f64, b2: f64, a1: f64, a2: f64) -> Self {
        Self { b0, b1, b2, a1, a2 }
    }

    /// Identity section.
    pub const fn passthrough() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0, 0.0)
    }

    /// Complex response at normalized angular frequency `omega` (rad/sample).
    pub fn frequency_response(&self, omega: f64) -> Complex64 {
        let z1 = Complex64::from_polar(1.0, -omega);
        let z2 = z1 * z1;
        let num = self.b0 + z1 * self.b1 + z2 * self.b2;
        let den = 1.0 + z1 * self.a1 + z2 * self.a2;
        num / den
    }

    /// Gain for a constant input, `H(z = 1)`.
    pub fn dc_gain(&self) -> f64 {
        (self.b0 + self.b1 + self.b2) / (1.0 + self.a1 + self.a2)
    }
}

/// IIR filter built from cascaded biquad sections.
///
/// Each section runs in transposed direct form II, which keeps two state
/// values per section and lets the state be primed for a constant input
/// (see [`IirFilter::prime`]).
///
/// # Example
/// ```
/// use ssvepcore::filter::{butterworth_bandpass, IirFilter};
///
/// // 8-40 Hz at 256 Hz: edges normalized to Nyquist
/// let sections = butterworth_bandpass(4, 8.0 / 128.0, 40.0 / 128.0).unwrap();
/// let mut filter = IirFilter::new(sections);
/// let filtered = filter.process_sample(0.5);
/// assert!(filtered.is_finite());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct IirFilter {
    sections: Vec<BiquadCoeffs>,
    // [z0, z1] per section
    state: Vec<[f64; 2]>,
}

impl IirFilter {
    /// Creates a new IIR filter with zeroed state.
    pub fn new(sections: Vec<BiquadCoeffs>) -> Self {
        let state = vec![[0.0; 2]; sections.len()];
        Self { sections, state }
    }

    /// Processes a single sample through all cascaded sections.
    #[inline]
    pub fn process_sample(&mut self, input: f64) -> f64 {
        let mut x = input;

        for (c, s) in self.sections.iter().zip(self.state.iter_mut()) {
            let y = c.b0 * x + s[0];
            s[0] = c.b1 * x - c.a1 * y + s[1];
            s[1] = c.b2 * x - c.a2 * y;
            x = y; // Output becomes input to next section
        }

        x
    }

    /// Processes multiple samples in place.
    pub fn process_block(&mut self, samples: &mut [f64]) {
        for sample in samples.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }

    /// Resets filter state to zero (clears delay lines).
    pub fn reset(&mut self) {
        self.state.iter_mut().for_each(|s| *s = [0.0; 2]);
    }

    /// Sets the state to the steady state reached after an infinitely long
    /// constant input of value `level`, so that feeding `level` produces no
    /// start-up transient.
    pub fn prime(&mut self, level: f64) {
        let mut x = level;
        for (c, s) in self.sections.iter().zip(self.state.iter_mut()) {
            let y = c.dc_gain() * x;
            s[1] = c.b2 * x - c.a2 * y;
            s[0] = c.b1 * x - c.a1 * y + s[1];
            x = y;
        }
    }

    pub fn sections(&self) -> &[BiquadCoeffs] {
        &self.sections
    }

    pub fn num_sections(&self) -> usize {
        self.sections.len()
    }

    /// Magnitude response of the whole cascade at `omega` (rad/sample).
    pub fn magnitude(&self, omega: f64) -> f64 {
        self.sections
            .iter()
            .map(|c| c.frequency_response(omega).norm())
            .product()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // RBJ cookbook lowpass at fc/fs, Q = 1/sqrt(2)
    fn lowpass(fs: f64, fc: f64) -> BiquadCoeffs {
        let omega = 2.0 * core::f64::consts::PI * fc / fs;
        let alpha = omega.sin() / core::f64::consts::SQRT_2;
        let a0 = 1.0 + alpha;
        let b0 = (1.0 - omega.cos()) / 2.0;
        BiquadCoeffs::new(
            b0 / a0,
            2.0 * b0 / a0,
            b0 / a0,
            -2.0 * omega.cos() / a0,
            (1.0 - alpha) / a0,
        )
    }

    #[test]
    fn test_iir_passthrough() {
        let mut filter = IirFilter::new(vec![BiquadCoeffs::passthrough()]);

        // Passthrough should not change the signal
        assert_eq!(filter.process_sample(1.0), 1.0);
        assert_eq!(filter.process_sample(2.5), 2.5);
        assert_eq!(filter.process_sample(-1.5), -1.5);
    }

    #[test]
    fn test_iir_lowpass_dc() {
        let mut filter = IirFilter::new(vec![lowpass(1000.0, 100.0), lowpass(1000.0, 100.0)]);

        for _ in 0..200 {
            filter.process_sample(1.0);
        }

        let output = filter.process_sample(1.0);
        assert!((output - 1.0).abs() < 1e-6, "DC should pass through lowpass");
    }

    #[test]
    fn test_prime_removes_transient() {
        let mut filter = IirFilter::new(vec![lowpass(1000.0, 40.0), lowpass(1000.0, 40.0)]);
        filter.prime(2.5);

        for _ in 0..10 {
            let y = filter.process_sample(2.5);
            assert!((y - 2.5).abs() < 1e-12, "primed output {}", y);
        }
    }

    #[test]
    fn test_iir_reset() {
        let mut filter = IirFilter::new(vec![lowpass(1000.0, 40.0)]);
        for i in 0..10 {
            filter.process_sample(i as f64);
        }
        filter.reset();

        let mut fresh = IirFilter::new(vec![lowpass(1000.0, 40.0)]);
        assert_eq!(filter.process_sample(5.0), fresh.process_sample(5.0));
    }

    #[test]
    fn test_frequency_response_matches_dc_gain() {
        let c = lowpass(500.0, 30.0);
        let h0 = c.frequency_response(0.0);
        assert!((h0.re - c.dc_gain()).abs() < 1e-12);
        assert!(h0.im.abs() < 1e-12);

        let filter = IirFilter::new(vec![c, c]);
        assert!(filter.magnitude(core::f64::consts::PI) < 1e-6);
    }

    #[test]
    fn test_process_block_matches_samples() {
        let sections = vec![lowpass(250.0, 20.0)];
        let input: Vec<f64> = (0..32).map(|i| (i as f64 * 0.3).sin()).collect();

        let mut a = IirFilter::new(sections.clone());
        let mut block = input.clone();
        a.process_block(&mut block);

        let mut b = IirFilter::new(sections);
        let single: Vec<f64> = input.iter().map(|&x| b.process_sample(x)).collect();
        assert_eq!(block, single);
    }
}
