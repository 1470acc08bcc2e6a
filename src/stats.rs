//! Running statistics and correlation helpers.

/// Welford accumulator for per-channel mean and variance.
///
/// # Example
///
/// ```
/// use ssvepcore::stats::OnlineStats;
///
/// let mut stats = OnlineStats::new(2);
/// stats.update(&[1.0, 10.0]);
/// stats.update(&[3.0, 20.0]);
/// assert_eq!(stats.mean(), &[2.0, 15.0]);
/// ```
#[derive(Debug, Clone)]
pub struct OnlineStats {
    count: u64,
    mean: Vec<f64>,
    m2: Vec<f64>,
}

impl OnlineStats {
    pub fn new(channels: usize) -> Self {
        Self {
            count: 0,
            mean: vec![0.0; channels],
            m2: vec![0.0; channels],
        }
    }

    /// Fold one multi-channel sample into the running statistics.
    ///
    /// # Panics
    ///
    /// Panics if `sample.len()` differs from the channel count.
    pub fn update(&mut self, sample: &[f64]) {
        assert_eq!(sample.len(), self.mean.len(), "channel count mismatch");
        self.count += 1;
        let n = self.count as f64;

        for ((x, mean), m2) in sample.iter().zip(self.mean.iter_mut()).zip(self.m2.iter_mut()) {
            let delta = x - *mean;
            *mean += delta / n;
            let delta2 = x - *mean;
            *m2 += delta * delta2;
        }
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    /// Sample variance (n - 1 denominator).
    pub fn variance(&self) -> Vec<f64> {
        if self.count < 2 {
            return vec![0.0; self.mean.len()];
        }
        let denom = (self.count - 1) as f64;
        self.m2.iter().map(|m| m / denom).collect()
    }

    /// Population variance (n denominator), as `numpy.std` uses by default.
    pub fn population_variance(&self) -> Vec<f64> {
        if self.count == 0 {
            return vec![0.0; self.mean.len()];
        }
        let denom = self.count as f64;
        self.m2.iter().map(|m| m / denom).collect()
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn reset(&mut self) {
        self.count = 0;
        self.mean.iter_mut().for_each(|m| *m = 0.0);
        self.m2.iter_mut().for_each(|m| *m = 0.0);
    }
}

/// Pearson correlation coefficient of two equal-length series.
///
/// Returns `NaN` when either series has zero variance or the lengths differ,
/// matching `numpy.corrcoef`.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.is_empty() {
        return f64::NAN;
    }
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (&a, &b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    let denom = libm::sqrt(sxx * syy);
    if denom == 0.0 {
        return f64::NAN;
    }
    (sxy / denom).clamp(-1.0, 1.0)
}
