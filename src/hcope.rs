//! High-confidence off-policy evaluation (HCOPE) as a search objective.
//!
//! The objective folds the safety constraint into the landscape the optimizer
//! sees, using only the candidate partition:
//!
//! 1. PDIS on the candidate partition gives `(x̄, s)`.
//! 2. A pessimistic lower bound is predicted for the held-out sample size `n_s`
//!    with a doubled margin: `x̄ − 2 · (s / √n_s) · t⁻¹(1 − δ, n_s − 1)`.
//! 3. Below the threshold `c`, the value is `penalty + bound`: the penalty
//!    dominates any plausible return, and the bound still orders infeasible
//!    points so the search is pulled toward feasibility.
//! 4. Otherwise the value is the raw mean `x̄`; once provisionally safe, the
//!    search chases expected return rather than the bound.
//!
//! The penalty path is an expected, recoverable signal, not an error.

use crate::bound::t_lower_bound;
use crate::{pdis, ConfidenceConfig, Error, Estimate, History, Policy, Result};

/// Shape of the HCOPE objective.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HcopeConfig {
    /// Margin multiplier on the predicted bound (the safety test uses `1.0`).
    pub margin_scale: f64,
    /// Added to the bound for infeasible candidates. Must dominate the return
    /// scale of the problem.
    pub infeasible_penalty: f64,
}

impl Default for HcopeConfig {
    fn default() -> Self {
        Self {
            margin_scale: 2.0,
            infeasible_penalty: -100_000.0,
        }
    }
}

impl HcopeConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.margin_scale.is_finite() && self.margin_scale >= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "HCOPE margin scale must be finite and >= 1, got {}",
                self.margin_scale
            )));
        }
        if !(self.infeasible_penalty.is_finite() && self.infeasible_penalty < 0.0) {
            return Err(Error::InvalidConfig(format!(
                "HCOPE infeasible penalty must be finite and negative, got {}",
                self.infeasible_penalty
            )));
        }
        Ok(())
    }
}

/// Full evaluation of one candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HcopeEvaluation {
    pub estimate: Estimate,
    /// Predicted lower bound for the held-out sample.
    pub lower_bound: f64,
    pub feasible: bool,
    /// Scalar handed to the maximizer.
    pub value: f64,
}

/// HCOPE objective bound to a candidate partition, confidence configuration,
/// and policy template.
#[derive(Debug, Clone)]
pub struct HcopeObjective<'a, P> {
    candidate: &'a [History],
    sample_size: usize,
    confidence: ConfidenceConfig,
    cfg: HcopeConfig,
    policy: &'a P,
}

impl<'a, P: Policy + Clone + Sync> HcopeObjective<'a, P> {
    /// `sample_size` is the size of the held-out partition the bound predicts for.
    pub fn new(
        candidate: &'a [History],
        sample_size: usize,
        confidence: ConfidenceConfig,
        cfg: HcopeConfig,
        policy: &'a P,
    ) -> Result<Self> {
        confidence.validate()?;
        cfg.validate()?;
        if candidate.len() < 2 {
            return Err(Error::InsufficientData {
                needed: 2,
                got: candidate.len(),
            });
        }
        if sample_size < 2 {
            return Err(Error::InsufficientData {
                needed: 2,
                got: sample_size,
            });
        }
        Ok(Self {
            candidate,
            sample_size,
            confidence,
            cfg,
            policy,
        })
    }

    pub fn confidence(&self) -> ConfidenceConfig {
        self.confidence
    }

    pub fn evaluate(&self, theta: &[f64]) -> Result<HcopeEvaluation> {
        let estimate = pdis(self.candidate, theta, self.policy)?;
        let lower_bound = t_lower_bound(
            &estimate,
            self.sample_size,
            self.confidence.delta,
            self.cfg.margin_scale,
        )?;
        let feasible = lower_bound >= self.confidence.threshold;
        let value = if feasible {
            estimate.mean
        } else {
            self.cfg.infeasible_penalty + lower_bound
        };
        Ok(HcopeEvaluation {
            estimate,
            lower_bound,
            feasible,
            value,
        })
    }

    /// Objective value for `theta` (larger is better).
    pub fn value(&self, theta: &[f64]) -> Result<f64> {
        self.evaluate(theta).map(|e| e.value)
    }
}

/// One-shot HCOPE value with the default [`HcopeConfig`].
pub fn hcope<P: Policy + Clone + Sync>(
    theta: &[f64],
    candidate: &[History],
    sample_size: usize,
    confidence: ConfidenceConfig,
    policy: &P,
) -> Result<f64> {
    HcopeObjective::new(candidate, sample_size, confidence, HcopeConfig::default(), policy)?
        .value(theta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Step, TabularSoftmax};

    fn one_step(action: usize, reward: f64) -> History {
        History {
            steps: vec![Step {
                state: vec![0.0],
                action,
                reward,
                behavior_prob: 0.5,
            }],
        }
    }

    fn data() -> Vec<History> {
        (0..14)
            .map(|i| if i % 7 == 3 { one_step(1, 0.0) } else { one_step(0, 1.0) })
            .collect()
    }

    #[test]
    fn feasible_candidates_score_their_mean() {
        let pi = TabularSoftmax::new(1, 2, &[0.0, 0.0]).unwrap();
        let hs = data();
        let conf = ConfidenceConfig::new(0.05, 0.0).unwrap();
        let obj = HcopeObjective::new(&hs, 6, conf, HcopeConfig::default(), &pi).unwrap();
        let e = obj.evaluate(&[2.0, 0.0]).unwrap();
        assert!(e.feasible);
        assert_eq!(e.value, e.estimate.mean);
        assert!(e.lower_bound < e.estimate.mean);
    }

    #[test]
    fn infeasible_candidates_are_penalized_but_ordered() {
        let pi = TabularSoftmax::new(1, 2, &[0.0, 0.0]).unwrap();
        let hs = data();
        let conf = ConfidenceConfig::new(0.05, 10.0).unwrap();
        let obj = HcopeObjective::new(&hs, 6, conf, HcopeConfig::default(), &pi).unwrap();
        let worse = obj.evaluate(&[0.0, 0.0]).unwrap();
        let better = obj.evaluate(&[3.0, 0.0]).unwrap();
        assert!(!worse.feasible && !better.feasible);
        assert!(worse.value < -99_000.0);
        assert!(better.value > worse.value);
        assert!((better.value - (-100_000.0 + better.lower_bound)).abs() < 1e-9);
    }

    #[test]
    fn penalty_is_configurable() {
        let pi = TabularSoftmax::new(1, 2, &[0.0, 0.0]).unwrap();
        let hs = data();
        let conf = ConfidenceConfig::new(0.05, 10.0).unwrap();
        let cfg = HcopeConfig {
            infeasible_penalty: -50.0,
            ..HcopeConfig::default()
        };
        let obj = HcopeObjective::new(&hs, 6, conf, cfg, &pi).unwrap();
        let e = obj.evaluate(&[0.0, 0.0]).unwrap();
        assert!((e.value - (-50.0 + e.lower_bound)).abs() < 1e-12);
        assert!(HcopeConfig { infeasible_penalty: 1.0, ..cfg }.validate().is_err());
    }

    #[test]
    fn construction_needs_enough_data() {
        let pi = TabularSoftmax::new(1, 2, &[0.0, 0.0]).unwrap();
        let hs = data();
        let conf = ConfidenceConfig::default();
        assert!(HcopeObjective::new(&hs[..1], 6, conf, HcopeConfig::default(), &pi).is_err());
        assert!(HcopeObjective::new(&hs, 1, conf, HcopeConfig::default(), &pi).is_err());
    }

    #[test]
    fn one_shot_matches_objective() {
        let pi = TabularSoftmax::new(1, 2, &[0.0, 0.0]).unwrap();
        let hs = data();
        let conf = ConfidenceConfig::new(0.05, 0.0).unwrap();
        let a = hcope(&[1.0, -1.0], &hs, 6, conf, &pi).unwrap();
        let b = HcopeObjective::new(&hs, 6, conf, HcopeConfig::default(), &pi)
            .unwrap()
            .value(&[1.0, -1.0])
            .unwrap();
        assert_eq!(a, b);
    }
}
