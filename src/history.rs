//! Episode histories.
//!
//! On disk a history is a flat row of scalars. Before augmentation each step
//! is `(state…, action, reward)`, a stride of `state_dim + 2`; augmentation
//! appends the behavior policy's probability of the logged action, giving a
//! stride of `state_dim + 3` (3 and 4 for the usual one-dimensional state).
//! In memory both forms are typed step lists.

use crate::{Error, Result};

/// One logged step before augmentation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawStep {
    pub state: Vec<f64>,
    pub action: usize,
    pub reward: f64,
}

/// One logged step with the behavior policy's action probability attached.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Step {
    pub state: Vec<f64>,
    pub action: usize,
    pub reward: f64,
    /// Probability the behavior policy assigned to `action`; the denominator
    /// of every importance weight at this step.
    pub behavior_prob: f64,
}

/// An unaugmented episode.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawHistory {
    pub steps: Vec<RawStep>,
}

/// An augmented episode, the unit of data every estimator consumes.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct History {
    pub steps: Vec<Step>,
}

fn parse_action(v: f64) -> Result<usize> {
    if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 {
        Ok(v as usize)
    } else {
        Err(Error::Malformed(format!("action {v} is not a non-negative integer")))
    }
}

fn check_stride(len: usize, stride: usize) -> Result<()> {
    if len % stride != 0 {
        return Err(Error::Malformed(format!(
            "history of {len} values is not a whole number of {stride}-value steps"
        )));
    }
    Ok(())
}

impl RawHistory {
    /// Parse a flat `(state…, action, reward)` row.
    pub fn from_flat(values: &[f64], state_dim: usize) -> Result<Self> {
        let stride = state_dim + 2;
        check_stride(values.len(), stride)?;
        let steps = values
            .chunks_exact(stride)
            .map(|c| {
                Ok(RawStep {
                    state: c[..state_dim].to_vec(),
                    action: parse_action(c[state_dim])?,
                    reward: c[state_dim + 1],
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { steps })
    }

    pub fn to_flat(&self) -> Vec<f64> {
        let mut out = Vec::new();
        for s in &self.steps {
            out.extend_from_slice(&s.state);
            out.push(s.action as f64);
            out.push(s.reward);
        }
        out
    }

    pub fn undiscounted_return(&self) -> f64 {
        self.steps.iter().map(|s| s.reward).sum()
    }
}

impl History {
    /// Parse a flat `(state…, action, reward, behavior_prob)` row.
    pub fn from_flat(values: &[f64], state_dim: usize) -> Result<Self> {
        let stride = state_dim + 3;
        check_stride(values.len(), stride)?;
        let steps = values
            .chunks_exact(stride)
            .map(|c| {
                Ok(Step {
                    state: c[..state_dim].to_vec(),
                    action: parse_action(c[state_dim])?,
                    reward: c[state_dim + 1],
                    behavior_prob: c[state_dim + 2],
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { steps })
    }

    pub fn to_flat(&self) -> Vec<f64> {
        let mut out = Vec::new();
        for s in &self.steps {
            out.extend_from_slice(&s.state);
            out.push(s.action as f64);
            out.push(s.reward);
            out.push(s.behavior_prob);
        }
        out
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn undiscounted_return(&self) -> f64 {
        self.steps.iter().map(|s| s.reward).sum()
    }
}
