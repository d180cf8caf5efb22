//! High-confidence off-policy improvement (HCOPI).
//!
//! One run, given a policy template, a candidate partition, and a safety
//! partition:
//!
//! 1. Start the search at the template's current parameters `θ₀`, with step
//!    size `step_scale · (θ₀·θ₀ + 1)`.
//! 2. Maximize the HCOPE objective on the candidate partition with CMA-ES.
//! 3. Run the safety test on the best point found, using the safety partition.
//! 4. Report `Certified` or `Rejected`. Rejection is a normal outcome; an
//!    `Err` means the run could not be completed at all.
//!
//! The search never touches the safety partition.

use rand::Rng;

use crate::{
    optimize, safety_test, CmaEsConfig, ConfidenceConfig, Error, HcopeConfig, HcopeObjective, History,
    Policy, Result, SafetyVerdict,
};

/// Lifecycle of a run. `Certified` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HcopiPhase {
    Initialized,
    Searching,
    Certifying,
    Certified,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HcopiConfig {
    /// CMA-ES generation budget.
    pub generations: usize,
    /// Initial step size is `step_scale · (θ₀·θ₀ + 1)`.
    pub step_scale: f64,
    /// CMA-ES population size; `None` uses the dimension-based default.
    pub population_size: Option<usize>,
    pub hcope: HcopeConfig,
}

impl Default for HcopiConfig {
    fn default() -> Self {
        Self {
            generations: 100,
            step_scale: 2.0,
            population_size: None,
            hcope: HcopeConfig::default(),
        }
    }
}

impl HcopiConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.step_scale.is_finite() && self.step_scale > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "step scale must be finite and > 0, got {}",
                self.step_scale
            )));
        }
        self.hcope.validate()
    }
}

/// The searched parameters together with what the safety test concluded.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Candidate {
    pub parameters: Vec<f64>,
    /// HCOPE objective value of `parameters` on the candidate partition.
    pub objective_value: f64,
    pub safety: SafetyVerdict,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HcopiOutcome {
    Certified(Candidate),
    Rejected(Candidate),
}

impl HcopiOutcome {
    pub fn is_certified(&self) -> bool {
        matches!(self, HcopiOutcome::Certified(_))
    }

    pub fn candidate(&self) -> &Candidate {
        match self {
            HcopiOutcome::Certified(c) | HcopiOutcome::Rejected(c) => c,
        }
    }

    /// Parameters that may be deployed: `Some` only when certified.
    pub fn certified_parameters(&self) -> Option<&[f64]> {
        match self {
            HcopiOutcome::Certified(c) => Some(&c.parameters),
            HcopiOutcome::Rejected(_) => None,
        }
    }
}

/// One HCOPI run over a fixed partition of the data.
#[derive(Debug)]
pub struct Hcopi<'a, P> {
    candidate: &'a [History],
    safety: &'a [History],
    confidence: ConfidenceConfig,
    cfg: HcopiConfig,
    policy: &'a P,
    phase: HcopiPhase,
}

impl<'a, P: Policy + Clone + Sync> Hcopi<'a, P> {
    pub fn new(
        candidate: &'a [History],
        safety: &'a [History],
        confidence: ConfidenceConfig,
        cfg: HcopiConfig,
        policy: &'a P,
    ) -> Result<Self> {
        confidence.validate()?;
        cfg.validate()?;
        for part in [candidate, safety] {
            if part.len() < 2 {
                return Err(Error::InsufficientData {
                    needed: 2,
                    got: part.len(),
                });
            }
        }
        Ok(Self {
            candidate,
            safety,
            confidence,
            cfg,
            policy,
            phase: HcopiPhase::Initialized,
        })
    }

    pub fn phase(&self) -> HcopiPhase {
        self.phase
    }

    fn enter(&mut self, phase: HcopiPhase) {
        log::debug!("hcopi: {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    /// Search, then certify.
    pub fn run<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<HcopiOutcome> {
        let theta0 = self.policy.parameters();
        let norm2: f64 = theta0.iter().map(|v| v * v).sum();
        let search = CmaEsConfig {
            initial_step: self.cfg.step_scale * (norm2 + 1.0),
            generations: self.cfg.generations,
            population_size: self.cfg.population_size,
            minimize: false,
        };

        self.enter(HcopiPhase::Searching);
        let objective = HcopeObjective::new(
            self.candidate,
            self.safety.len(),
            self.confidence,
            self.cfg.hcope,
            self.policy,
        )?;
        let found = optimize(&theta0, &search, |theta| objective.value(theta), rng)?;
        log::debug!(
            "hcopi: search done after {} evaluations, objective {}",
            found.evaluations,
            found.best_value
        );

        self.enter(HcopiPhase::Certifying);
        let safety = safety_test(&found.best, self.safety, self.confidence, self.policy)?;
        let candidate = Candidate {
            parameters: found.best,
            objective_value: found.best_value,
            safety,
        };

        if safety.passed {
            self.enter(HcopiPhase::Certified);
            Ok(HcopiOutcome::Certified(candidate))
        } else {
            self.enter(HcopiPhase::Rejected);
            Ok(HcopiOutcome::Rejected(candidate))
        }
    }
}

/// Convenience wrapper: build an [`Hcopi`] and run it.
pub fn hcopi<P, R>(
    candidate: &[History],
    safety: &[History],
    confidence: ConfidenceConfig,
    cfg: HcopiConfig,
    policy: &P,
    rng: &mut R,
) -> Result<HcopiOutcome>
where
    P: Policy + Clone + Sync,
    R: Rng + ?Sized,
{
    Hcopi::new(candidate, safety, confidence, cfg, policy)?.run(rng)
}
