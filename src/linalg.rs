//! Dense linear algebra for CCA.
//!
//! Provides a heap-backed, runtime-sized matrix together with the
//! decompositions canonical correlation analysis needs: Cholesky
//! factorization, triangular solves and a cyclic Jacobi eigensolver for
//! symmetric matrices.
//!
//! # Matrix Storage
//!
//! Matrices are stored in row-major order as a flat `Vec<f64>`. For an
//! R×C matrix the element at row i, column j lives at index `i * C + j`.
//!
//! # Numerical Stability
//!
//! Covariance matrices built from EEG are frequently rank deficient (e.g.
//! bridged electrodes or duplicated channels). Regularize them with
//! [`Matrix::add_diagonal`] before calling [`Matrix::cholesky`].

use thiserror::Error;

/// Errors that can occur during matrix operations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinalgError {
    /// Matrix is not positive definite (Cholesky failed)
    #[error("matrix is not positive definite")]
    NotPositiveDefinite,

    /// Eigenvalue decomposition did not converge
    #[error("eigenvalue decomposition did not converge")]
    ConvergenceFailed,

    /// Matrix dimensions incompatible
    #[error("matrix dimensions are incompatible")]
    DimensionMismatch,
}

/// A dense matrix stored in row-major order.
///
/// # Example
///
/// ```
/// use ssvepcore::linalg::Matrix;
///
/// let eye = Matrix::identity(2);
/// assert_eq!(eye.get(0, 0), 1.0);
/// assert_eq!(eye.get(0, 1), 0.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Create a zero matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Create an n×n identity matrix.
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.data[i * n + i] = 1.0;
        }
        m
    }

    /// Create a matrix from a flat row-major buffer.
    ///
    /// Returns `LinalgError::DimensionMismatch` if `data.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self, LinalgError> {
        if data.len() != rows * cols {
            return Err(LinalgError::DimensionMismatch);
        }
        Ok(Self { rows, cols, data })
    }

    /// Create a matrix whose element (i, j) is `f(i, j)`.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                data.push(f(i, j));
            }
        }
        Self { rows, cols, data }
    }

    /// Number of rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Get element at row i, column j.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(i < self.rows && j < self.cols, "Index out of bounds");
        self.data[i * self.cols + j]
    }

    /// Set element at row i, column j.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        assert!(i < self.rows && j < self.cols, "Index out of bounds");
        self.data[i * self.cols + j] = value;
    }

    /// Borrow row i as a slice.
    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Copy column j into a new vector.
    pub fn column(&self, j: usize) -> Vec<f64> {
        (0..self.rows).map(|i| self.get(i, j)).collect()
    }

    /// Underlying row-major data.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Transpose the matrix.
    pub fn transpose(&self) -> Self {
        Self::from_fn(self.cols, self.rows, |i, j| self.get(j, i))
    }

    /// Add a constant to the diagonal (for regularization).
    ///
    /// This is used to improve numerical stability: A + λI
    pub fn add_diagonal(&mut self, lambda: f64) {
        let n = self.rows.min(self.cols);
        for i in 0..n {
            self.data[i * self.cols + i] += lambda;
        }
    }

    /// Sum of the diagonal elements.
    pub fn trace(&self) -> f64 {
        let n = self.rows.min(self.cols);
        (0..n).map(|i| self.data[i * self.cols + i]).sum()
    }

    /// Compute matrix multiplication: self × other.
    pub fn matmul(&self, other: &Self) -> Result<Self, LinalgError> {
        if self.cols != other.rows {
            return Err(LinalgError::DimensionMismatch);
        }

        let mut result = Self::zeros(self.rows, other.cols);
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a_ik = self.data[i * self.cols + k];
                if a_ik == 0.0 {
                    continue;
                }
                let out = &mut result.data[i * other.cols..(i + 1) * other.cols];
                for (o, &b_kj) in out.iter_mut().zip(other.row(k)) {
                    *o += a_ik * b_kj;
                }
            }
        }

        Ok(result)
    }

    /// Compute `selfᵀ × other` without materializing the transpose.
    ///
    /// Both matrices must have the same number of rows. This is the
    /// cross-product used for (co)variance accumulation.
    pub fn transpose_matmul(&self, other: &Self) -> Result<Self, LinalgError> {
        if self.rows != other.rows {
            return Err(LinalgError::DimensionMismatch);
        }

        let mut result = Self::zeros(self.cols, other.cols);
        for t in 0..self.rows {
            let a = self.row(t);
            let b = other.row(t);
            for (i, &a_ti) in a.iter().enumerate() {
                let out = &mut result.data[i * other.cols..(i + 1) * other.cols];
                for (o, &b_tj) in out.iter_mut().zip(b) {
                    *o += a_ti * b_tj;
                }
            }
        }

        Ok(result)
    }

    /// Concatenate two matrices column-wise (`[self | other]`).
    pub fn hstack(&self, other: &Self) -> Result<Self, LinalgError> {
        if self.rows != other.rows {
            return Err(LinalgError::DimensionMismatch);
        }
        let cols = self.cols + other.cols;
        Ok(Self::from_fn(self.rows, cols, |i, j| {
            if j < self.cols {
                self.get(i, j)
            } else {
                other.get(i, j - self.cols)
            }
        }))
    }

    /// Scalar multiplication.
    pub fn scale(&self, scalar: f64) -> Self {
        let mut result = self.clone();
        for v in result.data.iter_mut() {
            *v *= scalar;
        }
        result
    }

    /// Cholesky decomposition: A = LL^T where L is lower triangular.
    ///
    /// Uses the Cholesky-Banachiewicz algorithm. Matrix must be square,
    /// symmetric and positive definite.
    ///
    /// # Errors
    ///
    /// Returns `LinalgError::NotPositiveDefinite` if a pivot is not positive,
    /// `LinalgError::DimensionMismatch` if the matrix is not square.
    pub fn cholesky(&self) -> Result<Self, LinalgError> {
        if self.rows != self.cols {
            return Err(LinalgError::DimensionMismatch);
        }
        let n = self.rows;
        let mut l = Self::zeros(n, n);

        for j in 0..n {
            for i in j..n {
                let mut sum = self.get(i, j);

                for k in 0..j {
                    sum -= l.get(i, k) * l.get(j, k);
                }

                if i == j {
                    if !(sum > 0.0) {
                        return Err(LinalgError::NotPositiveDefinite);
                    }
                    l.set(i, j, libm::sqrt(sum));
                } else {
                    let l_jj = l.get(j, j);
                    if libm::fabs(l_jj) < 1e-300 {
                        return Err(LinalgError::NotPositiveDefinite);
                    }
                    l.set(i, j, sum / l_jj);
                }
            }
        }

        Ok(l)
    }

    /// Forward substitution: solve Lx = b where L (self) is lower triangular.
    ///
    /// The diagonal of L must be non-zero, which holds for any factor
    /// returned by [`Matrix::cholesky`].
    pub fn forward_substitute(&self, b: &[f64]) -> Vec<f64> {
        debug_assert_eq!(b.len(), self.rows);
        let n = self.rows;
        let mut x = vec![0.0; n];

        for i in 0..n {
            let row = self.row(i);
            let mut sum = b[i];
            for (l_ij, x_j) in row[..i].iter().zip(&x[..i]) {
                sum -= l_ij * x_j;
            }
            x[i] = sum / row[i];
        }

        x
    }

    /// Backward substitution: solve L^T x = b where L (self) is lower triangular.
    pub fn backward_substitute(&self, b: &[f64]) -> Vec<f64> {
        debug_assert_eq!(b.len(), self.rows);
        let n = self.rows;
        let mut x = vec![0.0; n];

        for i in (0..n).rev() {
            let mut sum = b[i];
            for j in (i + 1)..n {
                sum -= self.get(j, i) * x[j]; // transpose indexing
            }
            x[i] = sum / self.get(i, i);
        }

        x
    }

    /// Eigenvalue decomposition of a symmetric matrix by cyclic Jacobi sweeps.
    ///
    /// Each sweep rotates every off-diagonal pair once. Iteration stops when
    /// the off-diagonal Frobenius norm falls below `tol` times the norm of
    /// the whole matrix.
    ///
    /// # Returns
    ///
    /// Eigenvalues in descending order with corresponding eigenvectors.
    ///
    /// # Errors
    ///
    /// `LinalgError::ConvergenceFailed` if `max_sweeps` is exhausted,
    /// `LinalgError::DimensionMismatch` if the matrix is not square.
    pub fn eigen_symmetric(
        &self,
        max_sweeps: usize,
        tol: f64,
    ) -> Result<EigenDecomposition, LinalgError> {
        if self.rows != self.cols {
            return Err(LinalgError::DimensionMismatch);
        }
        let n = self.rows;
        let mut a = self.clone();
        let mut v = Self::identity(n);

        let total = libm::sqrt(a.data.iter().map(|x| x * x).sum::<f64>());
        let threshold = tol * if total > 0.0 { total } else { 1.0 };

        for _sweep in 0..=max_sweeps {
            if off_diagonal_norm(&a) <= threshold {
                let mut eigenvalues: Vec<f64> = (0..n).map(|i| a.get(i, i)).collect();
                sort_eigen(&mut eigenvalues, &mut v);
                return Ok(EigenDecomposition {
                    eigenvalues,
                    eigenvectors: v,
                });
            }

            for p in 0..n {
                for q in (p + 1)..n {
                    if a.get(p, q) == 0.0 {
                        continue;
                    }
                    let (c, s) = compute_jacobi_rotation(&a, p, q);
                    apply_jacobi_rotation(&mut a, p, q, c, s);
                    apply_rotation_to_vectors(&mut v, p, q, c, s);
                }
            }
        }

        Err(LinalgError::ConvergenceFailed)
    }
}

/// Result of eigenvalue decomposition.
#[derive(Debug, Clone)]
pub struct EigenDecomposition {
    /// Eigenvalues in descending order
    pub eigenvalues: Vec<f64>,

    /// Eigenvectors as columns (eigenvectors.get(row, col) = col-th eigenvector, row-th element)
    pub eigenvectors: Matrix,
}

impl EigenDecomposition {
    /// Get the k-th eigenvector.
    pub fn eigenvector(&self, k: usize) -> Vec<f64> {
        self.eigenvectors.column(k)
    }
}

fn off_diagonal_norm(a: &Matrix) -> f64 {
    let n = a.rows();
    let mut sum = 0.0;
    for i in 0..n {
        for j in 0..n {
            if i != j {
                let v = a.get(i, j);
                sum += v * v;
            }
        }
    }
    libm::sqrt(sum)
}

/// Compute Jacobi rotation parameters to annihilate A[p,q].
fn compute_jacobi_rotation(a: &Matrix, p: usize, q: usize) -> (f64, f64) {
    let a_pp = a.get(p, p);
    let a_qq = a.get(q, q);
    let a_pq = a.get(p, q);

    let tau = (a_qq - a_pp) / (2.0 * a_pq);
    let t = if tau >= 0.0 {
        1.0 / (tau + libm::sqrt(1.0 + tau * tau))
    } else {
        -1.0 / (-tau + libm::sqrt(1.0 + tau * tau))
    };

    let cos_theta = 1.0 / libm::sqrt(1.0 + t * t);
    let sin_theta = t * cos_theta;

    (cos_theta, sin_theta)
}

/// Apply A' = Rᵀ A R for the rotation in the (p, q) plane.
fn apply_jacobi_rotation(a: &mut Matrix, p: usize, q: usize, c: f64, s: f64) {
    let n = a.rows();

    // Columns
    for k in 0..n {
        let a_kp = a.get(k, p);
        let a_kq = a.get(k, q);
        a.set(k, p, c * a_kp - s * a_kq);
        a.set(k, q, s * a_kp + c * a_kq);
    }

    // Rows
    for k in 0..n {
        let a_pk = a.get(p, k);
        let a_qk = a.get(q, k);
        a.set(p, k, c * a_pk - s * a_qk);
        a.set(q, k, s * a_pk + c * a_qk);
    }

    a.set(p, q, 0.0);
    a.set(q, p, 0.0);
}

/// Apply rotation to eigenvector matrix: V' = V R.
fn apply_rotation_to_vectors(v: &mut Matrix, p: usize, q: usize, c: f64, s: f64) {
    for k in 0..v.rows() {
        let v_kp = v.get(k, p);
        let v_kq = v.get(k, q);
        v.set(k, p, c * v_kp - s * v_kq);
        v.set(k, q, s * v_kp + c * v_kq);
    }
}

/// Sort eigenvalues in descending order and reorder corresponding eigenvectors.
fn sort_eigen(eigenvalues: &mut [f64], eigenvectors: &mut Matrix) {
    let n = eigenvalues.len();
    // Selection sort, fine for the handful of components CCA produces
    for i in 0..n {
        let mut max_idx = i;
        for j in (i + 1)..n {
            if eigenvalues[j] > eigenvalues[max_idx] {
                max_idx = j;
            }
        }

        if max_idx != i {
            eigenvalues.swap(i, max_idx);
            for k in 0..eigenvectors.rows() {
                let tmp = eigenvectors.get(k, i);
                eigenvectors.set(k, i, eigenvectors.get(k, max_idx));
                eigenvectors.set(k, max_idx, tmp);
            }
        }
    }
}
