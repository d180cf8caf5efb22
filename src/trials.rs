//! Independent HCOPI trials over one shared partition.
//!
//! Trials run on the rayon pool. The partitions and the policy template are
//! shared read-only; each trial owns its optimizer state and a `StdRng` seeded
//! from `(master seed, trial index)`, so a batch is reproducible regardless of
//! how trials are scheduled.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::stable_hash::derive_trial_seed;
use crate::{hcopi, ConfidenceConfig, HcopiConfig, HcopiOutcome, Partitions, Policy, Result};

/// What one trial should certify against.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrialSpec {
    pub index: usize,
    pub confidence: ConfidenceConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TrialStatus {
    Certified,
    Rejected,
    /// The run could not complete; distinct from a completed run that was rejected.
    Errored,
}

#[derive(Debug)]
pub struct TrialReport {
    pub index: usize,
    pub seed: u64,
    pub confidence: ConfidenceConfig,
    pub result: Result<HcopiOutcome>,
}

impl TrialReport {
    pub fn status(&self) -> TrialStatus {
        match &self.result {
            Ok(HcopiOutcome::Certified(_)) => TrialStatus::Certified,
            Ok(HcopiOutcome::Rejected(_)) => TrialStatus::Rejected,
            Err(_) => TrialStatus::Errored,
        }
    }

    pub fn certified_parameters(&self) -> Option<&[f64]> {
        self.result.as_ref().ok().and_then(HcopiOutcome::certified_parameters)
    }
}

/// Counts per status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrialSummary {
    pub certified: usize,
    pub rejected: usize,
    pub errored: usize,
}

impl TrialSummary {
    pub fn from_reports(reports: &[TrialReport]) -> Self {
        let mut s = Self::default();
        for r in reports {
            match r.status() {
                TrialStatus::Certified => s.certified += 1,
                TrialStatus::Rejected => s.rejected += 1,
                TrialStatus::Errored => s.errored += 1,
            }
        }
        s
    }

    pub fn total(&self) -> usize {
        self.certified + self.rejected + self.errored
    }
}

/// Run every spec; reports come back in `specs` order.
pub fn run_trials<P: Policy + Clone + Sync>(
    partitions: &Partitions,
    specs: &[TrialSpec],
    cfg: HcopiConfig,
    policy: &P,
    master_seed: u64,
) -> Vec<TrialReport> {
    specs
        .par_iter()
        .map(|spec| {
            let seed = derive_trial_seed(master_seed, spec.index);
            let mut rng = StdRng::seed_from_u64(seed);
            let result = hcopi(
                &partitions.candidate,
                &partitions.safety,
                spec.confidence,
                cfg,
                policy,
                &mut rng,
            );
            match &result {
                Ok(HcopiOutcome::Certified(c)) => log::info!(
                    "trial {}: certified (safety bound {:.4} >= {})",
                    spec.index + 1,
                    c.safety.lower_bound,
                    spec.confidence.threshold
                ),
                Ok(HcopiOutcome::Rejected(c)) => log::info!(
                    "trial {}: rejected (safety bound {:.4} < {})",
                    spec.index + 1,
                    c.safety.lower_bound,
                    spec.confidence.threshold
                ),
                Err(e) => log::info!("trial {}: errored: {e}", spec.index + 1),
            }
            TrialReport {
                index: spec.index,
                seed,
                confidence: spec.confidence,
                result,
            }
        })
        .collect()
}
