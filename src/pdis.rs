//! Per-decision importance sampling (PDIS).
//!
//! For an episode `(s_t, a_t, r_t, β_t)` logged under a behavior policy that
//! chose `a_t` with probability `β_t`, the PDIS return of an evaluation policy
//! `π` is
//!
//! ```text
//!   Σ_t ( Π_{j ≤ t} π(a_j | s_j) / β_j ) · r_t
//! ```
//!
//! The weight compounds across the episode and is never reset per step; that
//! is what separates PDIS from per-step reweighting. With correctly recorded
//! `β_t`, the per-episode value is an unbiased estimate of `π`'s expected
//! (undiscounted) return.
//!
//! Episodes are independent, so the per-episode loop runs on the rayon pool;
//! the reduction (mean, Bessel-corrected standard deviation) is done afterwards
//! in episode order, so results do not depend on scheduling.

use rayon::prelude::*;

use crate::{Error, History, Policy, Result};

/// Cross-episode summary of per-episode return estimates.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Estimate {
    pub mean: f64,
    /// Sample standard deviation (divides by `n − 1`).
    pub std_dev: f64,
    /// Number of episodes behind the estimate.
    pub n: usize,
}

/// Sample mean and Bessel-corrected sample standard deviation.
///
/// Needs at least two samples.
pub fn sample_statistics(values: &[f64]) -> Result<Estimate> {
    let n = values.len();
    if n < 2 {
        return Err(Error::InsufficientData { needed: 2, got: n });
    }
    let nf = n as f64;
    let mean = values.iter().sum::<f64>() / nf;
    let ss: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    Ok(Estimate {
        mean,
        std_dev: (ss / (nf - 1.0)).sqrt(),
        n,
    })
}

/// PDIS return of one episode under `policy` (whose parameters are already set).
pub fn episode_return<P: Policy + ?Sized>(
    episode: usize,
    history: &History,
    policy: &P,
) -> Result<f64> {
    let mut weight = 1.0;
    let mut total = 0.0;
    for (t, step) in history.steps.iter().enumerate() {
        let b = step.behavior_prob;
        if !(b.is_finite() && b > 0.0) {
            return Err(Error::DegenerateWeight {
                episode,
                step: t,
                detail: format!("behavior probability {b} cannot be an importance-weight denominator"),
            });
        }
        weight *= policy.probability(&step.state, step.action)? / b;
        total += weight * step.reward;
    }
    if !total.is_finite() {
        return Err(Error::DegenerateWeight {
            episode,
            step: history.steps.len().saturating_sub(1),
            detail: format!("importance-weighted return is {total}"),
        });
    }
    Ok(total)
}

/// Per-episode PDIS returns of `policy` as currently parameterized.
pub fn pdis_returns<P: Policy + Sync + ?Sized>(histories: &[History], policy: &P) -> Result<Vec<f64>> {
    histories
        .par_iter()
        .enumerate()
        .map(|(i, h)| episode_return(i, h, policy))
        .collect()
}

/// PDIS estimate of the policy `policy` would be with `params`.
///
/// `policy` is used as a template: it is cloned, the clone receives `params`,
/// and the caller's instance is left untouched, so one template can be shared
/// by concurrent evaluations.
pub fn pdis<P: Policy + Clone + Sync>(histories: &[History], params: &[f64], policy: &P) -> Result<Estimate> {
    if histories.len() < 2 {
        return Err(Error::InsufficientData {
            needed: 2,
            got: histories.len(),
        });
    }
    let mut eval = policy.clone();
    eval.set_parameters(params)?;
    let returns = pdis_returns(histories, &eval)?;
    sample_statistics(&returns)
}
