//! The whole batch: read, augment, check, split, run trials, write results.

use std::path::PathBuf;

use crate::{
    run_trials, split, write_certified, Dataset, Result, RunConfig, TrialReport, TrialSummary,
};

#[derive(Debug)]
pub struct RunReport {
    pub behavior_return: f64,
    /// Max deviation from the stored policy-test vector; `None` if the check
    /// could not be performed.
    pub parameterization_deviation: Option<f64>,
    pub candidate_episodes: usize,
    pub safety_episodes: usize,
    pub trials: Vec<TrialReport>,
    pub summary: TrialSummary,
    pub written: Vec<PathBuf>,
}

/// Run a batch as described by `cfg`.
///
/// The evaluation policy template is the behavior policy itself, so every
/// search starts from the behavior parameters.
pub fn run(cfg: &RunConfig) -> Result<RunReport> {
    cfg.validate()?;
    let data = Dataset::from_path(&cfg.data_path)?;
    let behavior = data.behavior_policy(cfg.independent_order)?;

    let parameterization_deviation = match data.check_policy_parameterization(&behavior) {
        Ok(dev) => Some(dev),
        Err(e) if e.is_data_error() => {
            log::warn!("policy parameterization check skipped: {e}");
            None
        }
        Err(e) => return Err(e),
    };

    let augmented = data.augment(&behavior)?;
    let partitions = split(&augmented.histories, cfg.split_ratio)?;
    log::info!(
        "split {} episodes: {} candidate, {} safety",
        augmented.histories.len(),
        partitions.candidate.len(),
        partitions.safety.len()
    );

    let specs = cfg.trial_specs()?;
    let trials = run_trials(&partitions, &specs, cfg.hcopi, &behavior, cfg.master_seed);
    let summary = TrialSummary::from_reports(&trials);
    let written = write_certified(&cfg.output_dir, &trials)?;

    Ok(RunReport {
        behavior_return: augmented.behavior_return,
        parameterization_deviation,
        candidate_episodes: partitions.candidate.len(),
        safety_episodes: partitions.safety.len(),
        trials,
        summary,
        written,
    })
}
