//! Parametric softmax policies behind a common `Policy` trait.
//!
//! [`TabularSoftmax`] and [`FourierSoftmax`] share the same capability set:
//! get/set a flat parameter vector, and query action probabilities for a state.
//! Both compute a per-action linear score, multiply it by the temperature, and
//! take a numerically stable softmax. They differ only in the state features:
//!
//! - tabular: one weight row per discrete state (`state[0]` is the index);
//! - Fourier: one weight row per action, dotted with [`FourierBasis`] features.
//!
//! The estimators in this crate are generic over `P: Policy`, so either variant
//! (or a caller-supplied one) can be evaluated, searched, and certified.

use rand::Rng;

use crate::alloc::{sample_index, softmax};
use crate::{Error, FourierBasis, Result};

/// Common interface for parametric stochastic policies over a finite action set.
///
/// # Example
///
/// ```rust
/// use hcopi::{Policy, TabularSoftmax};
///
/// let mut pi = TabularSoftmax::new(1, 2, &[0.0, 0.0]).unwrap();
/// assert!((pi.probability(&[0.0], 0).unwrap() - 0.5).abs() < 1e-12);
///
/// pi.set_parameters(&[2.0, 0.0]).unwrap();
/// assert!(pi.probability(&[0.0], 0).unwrap() > 0.5);
/// ```
pub trait Policy {
    fn num_actions(&self) -> usize;

    /// Length of the flat parameter vector.
    fn num_parameters(&self) -> usize;

    /// Current weights in the flat layout [`Policy::set_parameters`] expects.
    fn parameters(&self) -> Vec<f64>;

    /// Replace the weights.
    ///
    /// Fails with [`Error::Shape`] on a length mismatch; never truncates or pads
    /// (a variant may document a default fill for the empty vector).
    fn set_parameters(&mut self, params: &[f64]) -> Result<()>;

    /// Action distribution for `state`; length `num_actions`, sums to 1.
    fn action_probabilities(&self, state: &[f64]) -> Result<Vec<f64>>;

    fn probability(&self, state: &[f64], action: usize) -> Result<f64> {
        let probs = self.action_probabilities(state)?;
        probs
            .get(action)
            .copied()
            .ok_or(Error::ActionOutOfRange {
                action,
                num_actions: probs.len(),
            })
    }

    /// Draw an action by inverse-CDF sampling against one uniform variate.
    fn sample_action<R: Rng + ?Sized>(&self, state: &[f64], rng: &mut R) -> Result<usize>
    where
        Self: Sized,
    {
        let probs = self.action_probabilities(state)?;
        let u: f64 = rng.gen();
        sample_index(&probs, u)
            .map(|d| d.index)
            .ok_or(Error::ActionOutOfRange {
                action: 0,
                num_actions: 0,
            })
    }
}

fn check_temperature(temperature: f64) -> Result<f64> {
    if temperature.is_finite() && temperature > 0.0 {
        Ok(temperature)
    } else {
        Err(Error::InvalidConfig(format!(
            "softmax temperature must be finite and > 0, got {temperature}"
        )))
    }
}

// ============================================================================
// Tabular
// ============================================================================

/// Tabular softmax policy.
///
/// Parameter layout: state-major, `params[s * num_actions + a]` is the logit of
/// action `a` in state `s`. The state vector's first component is the state
/// index (floored).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TabularSoftmax {
    num_states: usize,
    num_actions: usize,
    weights: Vec<f64>,
    temperature: f64,
}

impl TabularSoftmax {
    pub fn new(num_states: usize, num_actions: usize, params: &[f64]) -> Result<Self> {
        if num_states == 0 || num_actions == 0 {
            return Err(Error::InvalidConfig(
                "tabular policy needs at least one state and one action".to_string(),
            ));
        }
        let mut pi = Self {
            num_states,
            num_actions,
            weights: vec![0.0; num_states * num_actions],
            temperature: 1.0,
        };
        pi.set_parameters(params)?;
        Ok(pi)
    }

    /// Builder: set the logit multiplier (default `1.0`).
    pub fn with_temperature(mut self, temperature: f64) -> Result<Self> {
        self.temperature = check_temperature(temperature)?;
        Ok(self)
    }

    pub fn num_states(&self) -> usize {
        self.num_states
    }

    fn state_index(&self, state: &[f64]) -> Result<usize> {
        let Some(&raw) = state.first() else {
            return Err(Error::StateDimension {
                expected: 1,
                got: 0,
            });
        };
        if !raw.is_finite() || raw < 0.0 || raw >= self.num_states as f64 {
            return Err(Error::StateOutOfRange {
                index: raw,
                num_states: self.num_states,
            });
        }
        Ok(raw.floor() as usize)
    }
}

impl Policy for TabularSoftmax {
    fn num_actions(&self) -> usize {
        self.num_actions
    }

    fn num_parameters(&self) -> usize {
        self.num_states * self.num_actions
    }

    fn parameters(&self) -> Vec<f64> {
        self.weights.clone()
    }

    fn set_parameters(&mut self, params: &[f64]) -> Result<()> {
        if params.len() != self.num_parameters() {
            return Err(Error::Shape {
                expected: self.num_parameters(),
                got: params.len(),
            });
        }
        self.weights.copy_from_slice(params);
        Ok(())
    }

    fn action_probabilities(&self, state: &[f64]) -> Result<Vec<f64>> {
        let s = self.state_index(state)?;
        let row = &self.weights[s * self.num_actions..(s + 1) * self.num_actions];
        Ok(softmax(row, self.temperature))
    }
}

// ============================================================================
// Fourier-linear
// ============================================================================

/// Weight used for every parameter when [`FourierSoftmax::set_parameters`]
/// receives an empty vector.
pub const DEFAULT_FOURIER_WEIGHT: f64 = 0.1;

/// Linear softmax policy over Fourier features.
///
/// Parameter layout: action-major, `params[a * num_features + j]` weights
/// feature `j` for action `a`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FourierSoftmax {
    basis: FourierBasis,
    num_actions: usize,
    weights: Vec<f64>,
    temperature: f64,
}

impl FourierSoftmax {
    pub fn new(basis: FourierBasis, num_actions: usize, params: &[f64]) -> Result<Self> {
        if num_actions == 0 {
            return Err(Error::InvalidConfig(
                "Fourier policy needs at least one action".to_string(),
            ));
        }
        let mut pi = Self {
            weights: vec![0.0; basis.num_outputs() * num_actions],
            basis,
            num_actions,
            temperature: 1.0,
        };
        pi.set_parameters(params)?;
        Ok(pi)
    }

    /// Builder: set the logit multiplier (default `1.0`).
    pub fn with_temperature(mut self, temperature: f64) -> Result<Self> {
        self.temperature = check_temperature(temperature)?;
        Ok(self)
    }

    pub fn basis(&self) -> &FourierBasis {
        &self.basis
    }

    pub fn num_features(&self) -> usize {
        self.basis.num_outputs()
    }
}

impl Policy for FourierSoftmax {
    fn num_actions(&self) -> usize {
        self.num_actions
    }

    fn num_parameters(&self) -> usize {
        self.num_actions * self.num_features()
    }

    fn parameters(&self) -> Vec<f64> {
        self.weights.clone()
    }

    /// An empty vector resets every weight to [`DEFAULT_FOURIER_WEIGHT`].
    fn set_parameters(&mut self, params: &[f64]) -> Result<()> {
        if params.is_empty() {
            self.weights.fill(DEFAULT_FOURIER_WEIGHT);
            return Ok(());
        }
        if params.len() != self.num_parameters() {
            return Err(Error::Shape {
                expected: self.num_parameters(),
                got: params.len(),
            });
        }
        self.weights.copy_from_slice(params);
        Ok(())
    }

    fn action_probabilities(&self, state: &[f64]) -> Result<Vec<f64>> {
        let phi = self.basis.features(state)?;
        let scores: Vec<f64> = self
            .weights
            .chunks_exact(phi.len())
            .map(|row| row.iter().zip(&phi).map(|(w, f)| w * f).sum())
            .collect();
        Ok(softmax(&scores, self.temperature))
    }
}
