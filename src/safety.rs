//! The safety test: the only step that certifies anything.
//!
//! It runs once per trial, on the safety partition, which the search never saw.
//! PDIS on that partition gives `(x̄, s)` over `n = |D_s|` episodes, and the
//! one-sided Student's-t bound
//!
//! ```text
//!   x̄ − (s / √n) · t⁻¹(1 − δ, n − 1)
//! ```
//!
//! must reach the threshold `c` (inclusive). The margin multiplier is `1`; the
//! doubled margin belongs to the search objective only.

use crate::bound::t_lower_bound;
use crate::{pdis, ConfidenceConfig, Estimate, History, Policy, Result};

/// Outcome of one safety test.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SafetyVerdict {
    pub estimate: Estimate,
    pub lower_bound: f64,
    /// `lower_bound >= threshold`.
    pub passed: bool,
}

/// Evaluate `theta` on the safety partition.
pub fn safety_test<P: Policy + Clone + Sync>(
    theta: &[f64],
    safety: &[History],
    confidence: ConfidenceConfig,
    policy: &P,
) -> Result<SafetyVerdict> {
    confidence.validate()?;
    let estimate = pdis(safety, theta, policy)?;
    let lower_bound = t_lower_bound(&estimate, safety.len(), confidence.delta, 1.0)?;
    Ok(SafetyVerdict {
        estimate,
        lower_bound,
        passed: lower_bound >= confidence.threshold,
    })
}

/// Whether `theta` passes the safety test.
pub fn certify<P: Policy + Clone + Sync>(
    theta: &[f64],
    safety: &[History],
    confidence: ConfidenceConfig,
    policy: &P,
) -> Result<bool> {
    safety_test(theta, safety, confidence, policy).map(|v| v.passed)
}
