//! Student's-t confidence bounds.
//!
//! Given `n` i.i.d. samples with mean `x̄` and sample standard deviation `s`,
//! the one-sided `(1 − δ)` lower confidence bound on the expectation is
//!
//! ```text
//!   x̄ − k · (s / √n) · t⁻¹(1 − δ, n − 1)
//! ```
//!
//! with margin multiplier `k = 1` for a bound on the sample at hand. The search
//! objective uses `k = 2` with `n` set to the size of the *held-out* sample, to
//! predict conservatively what a later test on fresh data would conclude.

use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::{Error, Estimate, Result};

/// Confidence configuration `(δ, c)`: the bound must hold with probability
/// at least `1 − δ` and clear the minimum return `c`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConfidenceConfig {
    /// Confidence level parameter, in `(0, 1)`.
    pub delta: f64,
    /// Minimum acceptable expected return.
    pub threshold: f64,
}

impl ConfidenceConfig {
    pub fn new(delta: f64, threshold: f64) -> Result<Self> {
        let cfg = Self { delta, threshold };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.delta.is_finite() && self.delta > 0.0 && self.delta < 1.0) {
            return Err(Error::InvalidConfig(format!(
                "delta must lie in (0, 1), got {}",
                self.delta
            )));
        }
        if !self.threshold.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "threshold must be finite, got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            delta: 0.05,
            threshold: 0.0,
        }
    }
}

/// Quantile function of Student's t distribution with `dof` degrees of freedom.
pub fn t_inverse(p: f64, dof: usize) -> Result<f64> {
    if dof == 0 {
        return Err(Error::InsufficientData { needed: 2, got: 1 });
    }
    if !(p.is_finite() && p > 0.0 && p < 1.0) {
        return Err(Error::InvalidConfig(format!(
            "t quantile probability must lie in (0, 1), got {p}"
        )));
    }
    let dist = StudentsT::new(0.0, 1.0, dof as f64)
        .map_err(|e| Error::InvalidConfig(format!("Student's t with {dof} dof: {e}")))?;
    Ok(dist.inverse_cdf(p))
}

/// One-sided `(1 − δ)` lower bound on the expectation behind `estimate`.
///
/// `sample_size` is the `n` used for the standard error and the degrees of
/// freedom; it need not equal `estimate.n` (the search objective predicts the
/// bound for a differently sized held-out sample).
pub fn t_lower_bound(
    estimate: &Estimate,
    sample_size: usize,
    delta: f64,
    margin_scale: f64,
) -> Result<f64> {
    if sample_size < 2 {
        return Err(Error::InsufficientData {
            needed: 2,
            got: sample_size,
        });
    }
    let n = sample_size as f64;
    let t = t_inverse(1.0 - delta, sample_size - 1)?;
    Ok(estimate.mean - margin_scale * (estimate.std_dev / n.sqrt()) * t)
}
