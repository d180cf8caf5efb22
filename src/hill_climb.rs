//! First-choice hill climbing.
//!
//! Perturbs every coordinate of the incumbent with independent Gaussian noise
//! and accepts the proposal only if it scores strictly better. A cheap
//! baseline against [`crate::cmaes`]; it shares the same objective signature.

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::{Error, Result};

/// Hill-climbing search state (maximizes).
#[derive(Debug, Clone)]
pub struct HillClimber {
    best: Vec<f64>,
    best_value: f64,
    noise: Normal<f64>,
}

impl HillClimber {
    /// Start from `initial`, scoring it with `objective`.
    pub fn new<F>(initial: &[f64], sigma: f64, objective: F) -> Result<Self>
    where
        F: Fn(&[f64]) -> Result<f64>,
    {
        if initial.is_empty() {
            return Err(Error::InvalidConfig(
                "hill climbing needs a non-empty starting point".to_string(),
            ));
        }
        if !(sigma.is_finite() && sigma > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "hill-climbing sigma must be finite and > 0, got {sigma}"
            )));
        }
        let noise = Normal::new(0.0, sigma)
            .map_err(|e| Error::InvalidConfig(format!("hill-climbing noise: {e}")))?;
        let best_value = objective(initial)?;
        Ok(Self {
            best: initial.to_vec(),
            best_value,
            noise,
        })
    }

    pub fn best(&self) -> &[f64] {
        &self.best
    }

    pub fn best_value(&self) -> f64 {
        self.best_value
    }

    /// One proposal. Returns whether it was accepted.
    pub fn step<F, R>(&mut self, objective: F, rng: &mut R) -> Result<bool>
    where
        F: Fn(&[f64]) -> Result<f64>,
        R: Rng + ?Sized,
    {
        let proposal: Vec<f64> = self
            .best
            .iter()
            .map(|x| x + self.noise.sample(&mut *rng))
            .collect();
        let value = objective(&proposal)?;
        // NaN compares false, so it is never accepted; a NaN incumbent is always replaced.
        if value > self.best_value || (self.best_value.is_nan() && !value.is_nan()) {
            self.best = proposal;
            self.best_value = value;
            return Ok(true);
        }
        Ok(false)
    }

    /// Run `iterations` proposals; returns the number accepted.
    pub fn run<F, R>(&mut self, iterations: usize, objective: F, rng: &mut R) -> Result<usize>
    where
        F: Fn(&[f64]) -> Result<f64>,
        R: Rng + ?Sized,
    {
        let mut accepted = 0;
        for _ in 0..iterations {
            if self.step(&objective, rng)? {
                accepted += 1;
            }
        }
        log::debug!(
            "hill climbing: {accepted}/{iterations} proposals accepted, best {}",
            self.best_value
        );
        Ok(accepted)
    }
}
