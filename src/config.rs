//! Process-level configuration for a batch of trials over one dataset file.

use std::path::PathBuf;

use crate::{ConfidenceConfig, Error, HcopiConfig, Result, TrialSpec};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunConfig {
    pub data_path: PathBuf,
    /// Certified parameter files go here.
    pub output_dir: PathBuf,
    pub trials: usize,
    pub delta: f64,
    pub threshold: f64,
    /// Fraction of episodes in the candidate partition.
    pub split_ratio: f64,
    pub master_seed: u64,
    pub hcopi: HcopiConfig,
    /// Independent Fourier order of the behavior/evaluation policy.
    pub independent_order: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/data.csv"),
            output_dir: PathBuf::from("output"),
            trials: 100,
            delta: 0.05,
            threshold: 8.0,
            split_ratio: 0.7,
            master_seed: 0,
            hcopi: HcopiConfig::default(),
            independent_order: 1,
        }
    }
}

impl RunConfig {
    pub fn confidence(&self) -> Result<ConfidenceConfig> {
        ConfidenceConfig::new(self.delta, self.threshold)
    }

    pub fn validate(&self) -> Result<()> {
        if self.trials == 0 {
            return Err(Error::InvalidConfig("at least one trial is required".to_string()));
        }
        if !(self.split_ratio.is_finite() && self.split_ratio > 0.0 && self.split_ratio < 1.0) {
            return Err(Error::InvalidConfig(format!(
                "split ratio must lie in (0, 1), got {}",
                self.split_ratio
            )));
        }
        self.confidence()?;
        self.hcopi.validate()
    }

    /// Homogeneous specs: every trial uses the same `(δ, c)`.
    pub fn trial_specs(&self) -> Result<Vec<TrialSpec>> {
        let confidence = self.confidence()?;
        Ok((0..self.trials)
            .map(|index| TrialSpec { index, confidence })
            .collect())
    }
}
