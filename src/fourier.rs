//! Fourier basis feature map.
//!
//! Maps a state `x ∈ R^m` to `φ_i(x) = cos(π · c_i · x)` for a fixed set of
//! integer coefficient vectors `c_i`. Coefficients come from two families:
//!
//! - **dependent** terms: every `c ∈ {0, …, dependent_order}^m` (couples state
//!   dimensions; includes the constant term `c = 0`);
//! - **independent** terms: `c = j · e_d` for each dimension `d` and each
//!   order `j` in `dependent_order + 1 ..= independent_order` (single-dimension
//!   terms not already produced by the dependent family).
//!
//! So `num_outputs = independent_order·m + (dependent_order + 1)^m
//! − min(independent_order, dependent_order)·m`.
//!
//! The basis is most meaningful for state components normalized to `[0, 1]`,
//! but any finite input is accepted.

use std::f64::consts::PI;

use crate::{Error, Result};

/// Immutable Fourier basis.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FourierBasis {
    state_dim: usize,
    independent_order: usize,
    dependent_order: usize,
    coefficients: Vec<Vec<f64>>,
}

impl FourierBasis {
    pub fn new(state_dim: usize, independent_order: usize, dependent_order: usize) -> Result<Self> {
        if state_dim == 0 {
            return Err(Error::InvalidConfig(
                "Fourier basis needs at least one state dimension".to_string(),
            ));
        }
        let dependent_terms = (dependent_order + 1)
            .checked_pow(state_dim as u32)
            .ok_or_else(|| {
                Error::InvalidConfig(format!(
                    "Fourier basis of order {dependent_order} over {state_dim} dimensions is too large"
                ))
            })?;

        let mut coefficients = Vec::with_capacity(Self::output_count(
            state_dim,
            independent_order,
            dependent_order,
        ));

        // Odometer over {0..=dependent_order}^m, first dimension fastest.
        let mut cur = vec![0usize; state_dim];
        for _ in 0..dependent_terms {
            coefficients.push(cur.iter().map(|&c| c as f64).collect());
            for digit in cur.iter_mut() {
                *digit += 1;
                if *digit <= dependent_order {
                    break;
                }
                *digit = 0;
            }
        }

        for order in (dependent_order + 1)..=independent_order {
            for d in 0..state_dim {
                let mut c = vec![0.0; state_dim];
                c[d] = order as f64;
                coefficients.push(c);
            }
        }

        Ok(Self {
            state_dim,
            independent_order,
            dependent_order,
            coefficients,
        })
    }

    /// Output count for a basis with the given construction parameters.
    pub fn output_count(state_dim: usize, independent_order: usize, dependent_order: usize) -> usize {
        let dependent = (dependent_order + 1).saturating_pow(state_dim as u32);
        let independent = independent_order * state_dim;
        let overlap = independent_order.min(dependent_order) * state_dim;
        independent + dependent - overlap
    }

    pub fn num_outputs(&self) -> usize {
        self.coefficients.len()
    }

    pub fn state_dim(&self) -> usize {
        self.state_dim
    }

    pub fn independent_order(&self) -> usize {
        self.independent_order
    }

    pub fn dependent_order(&self) -> usize {
        self.dependent_order
    }

    /// Feature vector for `state`.
    pub fn features(&self, state: &[f64]) -> Result<Vec<f64>> {
        if state.len() != self.state_dim {
            return Err(Error::StateDimension {
                expected: self.state_dim,
                got: state.len(),
            });
        }
        Ok(self
            .coefficients
            .iter()
            .map(|c| {
                let dot: f64 = c.iter().zip(state).map(|(a, b)| a * b).sum();
                (PI * dot).cos()
            })
            .collect())
    }
}
