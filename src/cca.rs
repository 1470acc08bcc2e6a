//! Canonical Correlation Analysis (CCA) for SSVEP-based BCIs.
//!
//! CCA finds linear combinations of two sets of multivariate signals that are
//! maximally correlated. For SSVEP detection, it correlates multi-channel EEG
//! with sinusoidal reference templates at target frequencies.
//!
//! # Algorithm
//!
//! Given signals X (T x C) and references Y (T x H):
//! 1. Center both views, compute Cxx, Cyy and Cxy normalized by T - 1
//! 2. Regularize: add `lambda * mean(diag)` to each auto-covariance
//! 3. Whiten: K = Lx^{-1} * Cxy * Ly^{-T} where Lx = chol(Cxx), Ly = chol(Cyy)
//! 4. Eigendecompose K^T K (H x H symmetric matrix)
//! 5. Canonical correlations = sqrt(eigenvalues)
//! 6. Weights: b = Ly^{-T} q, a = Lx^{-T} (K q / |K q|)
//!
//! The weight construction makes every canonical pair positively correlated.
//!
//! # References
//!
//! - Lin et al. (2007): "Frequency recognition based on CCA for SSVEP-based BCIs"
//! - Chen et al. (2015): "Filter bank CCA for SSVEP frequency recognition"

use crate::config::DEFAULT_REGULARIZATION;
use crate::error::{Result, SsvepError};
use crate::linalg::{LinalgError, Matrix};
use crate::stats::pearson;

const JACOBI_SWEEPS: usize = 100;
const JACOBI_TOL: f64 = 1e-12;

/// CCA estimator settings.
///
/// # Example
///
/// ```
/// use ssvepcore::cca::Cca;
/// use ssvepcore::linalg::Matrix;
///
/// // 2 channels vs 2 reference components of the same 10 Hz tone
/// let t = 250;
/// let x = Matrix::from_fn(t, 2, |i, c| {
///     let phase = 2.0 * core::f64::consts::PI * 10.0 * i as f64 / 250.0;
///     if c == 0 { phase.sin() + 0.5 * phase.cos() } else { phase.cos() }
/// });
/// let y = Matrix::from_fn(t, 2, |i, k| {
///     let phase = 2.0 * core::f64::consts::PI * 10.0 * i as f64 / 250.0;
///     if k == 0 { phase.sin() } else { phase.cos() }
/// });
///
/// let fit = Cca::new(1).fit(&x, &y).unwrap();
/// assert!(fit.correlations()[0] > 0.99);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cca {
    n_components: usize,
    regularization: f64,
}

impl Default for Cca {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Cca {
    /// Keep at most `n_components` canonical pairs.
    pub fn new(n_components: usize) -> Self {
        Self {
            n_components,
            regularization: DEFAULT_REGULARIZATION,
        }
    }

    /// Tikhonov factor relative to the mean covariance diagonal.
    pub fn with_regularization(mut self, regularization: f64) -> Self {
        self.regularization = regularization;
        self
    }

    pub fn n_components(&self) -> usize {
        self.n_components
    }

    pub fn regularization(&self) -> f64 {
        self.regularization
    }

    /// Fit canonical weights between the row-aligned views `x` and `y`.
    ///
    /// # Errors
    ///
    /// * `Linalg(DimensionMismatch)` - row counts differ or a view has no columns
    /// * `InsufficientSamples` - fewer than 2 rows
    /// * `Linalg(NotPositiveDefinite | ConvergenceFailed)` - numerical failure
    pub fn fit(&self, x: &Matrix, y: &Matrix) -> Result<CcaFit> {
        let t = x.rows();
        if y.rows() != t || x.cols() == 0 || y.cols() == 0 {
            return Err(LinalgError::DimensionMismatch.into());
        }
        if t < 2 {
            return Err(SsvepError::InsufficientSamples {
                required: 2,
                actual: t,
            });
        }

        let x_mean = column_means(x);
        let y_mean = column_means(y);
        let xc = center(x, &x_mean);
        let yc = center(y, &y_mean);

        let scale = 1.0 / (t as f64 - 1.0);
        let mut cxx = xc.transpose_matmul(&xc)?.scale(scale);
        let mut cyy = yc.transpose_matmul(&yc)?.scale(scale);
        let cxy = xc.transpose_matmul(&yc)?.scale(scale);

        regularize(&mut cxx, self.regularization);
        regularize(&mut cyy, self.regularization);

        let lx = cxx.cholesky()?;
        let ly = cyy.cholesky()?;

        // W = Lx^{-1} Cxy, one column at a time
        let (c, h) = (x.cols(), y.cols());
        let mut w = Matrix::zeros(c, h);
        for j in 0..h {
            for (i, v) in lx.forward_substitute(&cxy.column(j)).into_iter().enumerate() {
                w.set(i, j, v);
            }
        }

        // Row i of K = W Ly^{-T} is Ly^{-1} applied to row i of W
        let mut k = Matrix::zeros(c, h);
        for i in 0..c {
            for (j, v) in ly.forward_substitute(w.row(i)).into_iter().enumerate() {
                k.set(i, j, v);
            }
        }

        let eigen = k.transpose_matmul(&k)?.eigen_symmetric(JACOBI_SWEEPS, JACOBI_TOL)?;

        let n = self.n_components.min(c).min(h);
        let mut correlations = Vec::with_capacity(n);
        let mut x_weights = Matrix::zeros(c, n);
        let mut y_weights = Matrix::zeros(h, n);

        for comp in 0..n {
            let ev = eigen.eigenvalues[comp];
            let rho = if ev > 0.0 { libm::sqrt(ev).min(1.0) } else { 0.0 };
            correlations.push(rho);

            let q = eigen.eigenvector(comp);
            for (j, v) in ly.backward_substitute(&q).into_iter().enumerate() {
                y_weights.set(j, comp, v);
            }

            let kq: Vec<f64> = (0..c)
                .map(|i| k.row(i).iter().zip(&q).map(|(a, b)| a * b).sum())
                .collect();
            let norm = libm::sqrt(kq.iter().map(|v| v * v).sum::<f64>());
            // No cross-covariance along q: leave the x weights at zero
            if norm > 0.0 {
                let unit: Vec<f64> = kq.iter().map(|v| v / norm).collect();
                for (i, v) in lx.backward_substitute(&unit).into_iter().enumerate() {
                    x_weights.set(i, comp, v);
                }
            }
        }

        Ok(CcaFit {
            correlations,
            x_weights,
            y_weights,
            x_mean,
            y_mean,
        })
    }

    /// Canonical correlations only, in descending order.
    pub fn canonical_correlations(&self, x: &Matrix, y: &Matrix) -> Result<Vec<f64>> {
        Ok(self.fit(x, y)?.correlations)
    }

    /// Fit, then project the training views onto the canonical weights.
    pub fn fit_transform(&self, x: &Matrix, y: &Matrix) -> Result<(Matrix, Matrix)> {
        self.fit(x, y)?.transform(x, y)
    }
}

/// Fitted canonical weights.
#[derive(Debug, Clone, PartialEq)]
pub struct CcaFit {
    correlations: Vec<f64>,
    x_weights: Matrix,
    y_weights: Matrix,
    x_mean: Vec<f64>,
    y_mean: Vec<f64>,
}

impl CcaFit {
    /// Canonical correlations in descending order, each in `[0, 1]`.
    pub fn correlations(&self) -> &[f64] {
        &self.correlations
    }

    /// C x n_components.
    pub fn x_weights(&self) -> &Matrix {
        &self.x_weights
    }

    /// H x n_components.
    pub fn y_weights(&self) -> &Matrix {
        &self.y_weights
    }

    pub fn n_components(&self) -> usize {
        self.correlations.len()
    }

    /// Projects `x` and `y` (centered with the fitted means) to `(U, V)`.
    ///
    /// # Errors
    ///
    /// `Linalg(DimensionMismatch)` if the column counts differ from the fit.
    pub fn transform(&self, x: &Matrix, y: &Matrix) -> Result<(Matrix, Matrix)> {
        if x.cols() != self.x_mean.len() || y.cols() != self.y_mean.len() {
            return Err(LinalgError::DimensionMismatch.into());
        }
        let u = center(x, &self.x_mean).matmul(&self.x_weights)?;
        let v = center(y, &self.y_mean).matmul(&self.y_weights)?;
        Ok((u, v))
    }
}

/// Pearson correlation between the first columns of two projection matrices.
///
/// `NaN` if either column has zero variance or a matrix has no columns.
pub fn leading_correlation(u: &Matrix, v: &Matrix) -> f64 {
    if u.cols() == 0 || v.cols() == 0 {
        return f64::NAN;
    }
    pearson(&u.column(0), &v.column(0))
}

fn column_means(m: &Matrix) -> Vec<f64> {
    let mut means = vec![0.0; m.cols()];
    for i in 0..m.rows() {
        for (acc, v) in means.iter_mut().zip(m.row(i)) {
            *acc += v;
        }
    }
    let n = m.rows().max(1) as f64;
    means.iter_mut().for_each(|v| *v /= n);
    means
}

fn center(m: &Matrix, means: &[f64]) -> Matrix {
    Matrix::from_fn(m.rows(), m.cols(), |i, j| m.get(i, j) - means[j])
}

// lambda * mean(diag); a zero diagonal falls back to lambda itself
fn regularize(cov: &mut Matrix, lambda: f64) {
    let n = cov.rows();
    let mean_diag = if n > 0 { cov.trace() / n as f64 } else { 0.0 };
    let scale = if mean_diag > 0.0 { mean_diag } else { 1.0 };
    cov.add_diagonal(lambda * scale);
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use core::f64::consts::PI;

    fn lcg(state: &mut u64) -> f64 {
        *state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((*state >> 33) as f64 / (1u64 << 31) as f64) * 2.0 - 1.0
    }

    // C channels of a phase-shifted tone plus uniform noise
    fn ssvep(c: usize, t: usize, fs: f64, freq: f64, amplitude: f64) -> Matrix {
        let mut state = 12345u64;
        Matrix::from_fn(t, c, |i, ch| {
            let phase = ch as f64 * 0.3;
            amplitude * libm::sin(2.0 * PI * freq * i as f64 / fs + phase) + lcg(&mut state)
        })
    }

    fn references(t: usize, fs: f64, freq: f64, harmonics: usize) -> Matrix {
        Matrix::from_fn(t, 2 * harmonics, |i, k| {
            let angle = 2.0 * PI * (k / 2 + 1) as f64 * freq * i as f64 / fs;
            if k % 2 == 0 {
                libm::sin(angle)
            } else {
                libm::cos(angle)
            }
        })
    }

    #[test]
    fn test_cca_perfect_correlation() {
        let y = references(500, 250.0, 10.0, 1);
        // X is an invertible mix of Y
        let x = Matrix::from_fn(500, 2, |i, c| {
            if c == 0 {
                y.get(i, 0) + 0.3 * y.get(i, 1)
            } else {
                y.get(i, 1) - 0.2 * y.get(i, 0)
            }
        });

        let fit = Cca::new(2).fit(&x, &y).unwrap();
        assert_eq!(fit.n_components(), 2);
        assert!(fit.correlations()[0] > 0.999);
        assert!(fit.correlations()[1] > 0.999);
    }

    #[test]
    fn test_cca_frequency_discrimination() {
        let x = ssvep(4, 1000, 250.0, 12.0, 2.0);
        let right = Cca::new(1).canonical_correlations(&x, &references(1000, 250.0, 12.0, 2)).unwrap();
        let wrong = Cca::new(1).canonical_correlations(&x, &references(1000, 250.0, 17.0, 2)).unwrap();

        assert!(right[0] > 0.8, "matching frequency: {}", right[0]);
        assert!(wrong[0] < 0.3, "other frequency: {}", wrong[0]);
    }

    #[test]
    fn test_cca_returns_descending_bounded_correlations() {
        let x = ssvep(6, 800, 250.0, 9.0, 1.0);
        let rho = Cca::new(6).canonical_correlations(&x, &references(800, 250.0, 9.0, 3)).unwrap();

        assert_eq!(rho.len(), 6);
        for pair in rho.windows(2) {
            assert!(pair[0] >= pair[1]);
        }
        assert!(rho.iter().all(|&r| (0.0..=1.0).contains(&r)));
    }

    #[test]
    fn test_projection_correlation_matches_canonical() {
        let x = ssvep(3, 600, 200.0, 15.0, 1.0);
        let y = references(600, 200.0, 15.0, 2);

        let fit = Cca::new(1).fit(&x, &y).unwrap();
        let (u, v) = fit.transform(&x, &y).unwrap();
        assert_eq!((u.rows(), u.cols()), (600, 1));

        let r = leading_correlation(&u, &v);
        assert!(r > 0.0, "projections are positively correlated");
        assert_relative_eq!(r, fit.correlations()[0], epsilon = 1e-4);
    }

    #[test]
    fn test_rank_deficient_channels() {
        // Identical channels make Cxx rank one; regularization keeps it solvable
        let y = references(1025, 256.0, 11.25, 3);
        let x = Matrix::from_fn(1025, 6, |i, _| y.get(i, 0));

        let (u, v) = Cca::new(1).fit_transform(&x, &y).unwrap();
        assert!(leading_correlation(&u, &v) > 0.99);
    }

    #[test]
    fn test_regularization_is_scale_invariant() {
        let x = ssvep(3, 400, 250.0, 10.0, 1.0);
        let y = references(400, 250.0, 10.0, 2);
        let scaled = x.scale(1e-6);

        let a = Cca::new(1).canonical_correlations(&x, &y).unwrap();
        let b = Cca::new(1).canonical_correlations(&scaled, &y).unwrap();
        assert_relative_eq!(a[0], b[0], epsilon = 1e-9);
    }

    #[test]
    fn test_zero_variance_view_gives_nan_score() {
        let y = references(300, 250.0, 10.0, 1);
        let x = Matrix::zeros(300, 2);

        let (u, v) = Cca::new(1).fit_transform(&x, &y).unwrap();
        assert!(leading_correlation(&u, &v).is_nan());
    }

    #[test]
    fn test_cca_dimension_mismatch() {
        let x = Matrix::zeros(10, 2);
        let y = Matrix::zeros(11, 2);
        assert_eq!(
            Cca::new(1).fit(&x, &y).unwrap_err(),
            SsvepError::Linalg(LinalgError::DimensionMismatch)
        );
        assert!(Cca::new(1).fit(&Matrix::zeros(10, 0), &Matrix::zeros(10, 2)).is_err());
    }

    #[test]
    fn test_cca_insufficient_samples() {
        let err = Cca::new(1).fit(&Matrix::zeros(1, 2), &Matrix::zeros(1, 2)).unwrap_err();
        assert_eq!(err, SsvepError::InsufficientSamples { required: 2, actual: 1 });
    }

    #[test]
    fn test_cca_16_channels() {
        let x = ssvep(16, 1000, 250.0, 8.0, 1.0);
        let rho = Cca::new(2).canonical_correlations(&x, &references(1000, 250.0, 8.0, 2)).unwrap();
        assert_eq!(rho.len(), 2);
        assert!(rho[0] > 0.5);
    }

    #[test]
    fn test_transform_rejects_wrong_width() {
        let x = ssvep(3, 100, 250.0, 10.0, 1.0);
        let y = references(100, 250.0, 10.0, 1);
        let fit = Cca::new(1).fit(&x, &y).unwrap();
        assert!(fit.transform(&Matrix::zeros(100, 2), &y).is_err());
    }
}
