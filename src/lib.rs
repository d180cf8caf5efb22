//! `hcopi`: high-confidence off-policy policy improvement.
//!
//! Given episodes logged under a known behavior policy, search for new policy
//! parameters whose expected return is at least `c` with probability at least
//! `1 − δ`, and refuse to return anything that cannot be certified.
//!
//! **Pipeline:**
//! 1. Split the episodes once into a *candidate* partition and a *safety*
//!    partition ([`split`]). The two never mix.
//! 2. Estimate returns of any parameter vector off-policy with per-decision
//!    importance sampling ([`pdis()`]).
//! 3. Maximize the HCOPE objective ([`HcopeObjective`]) on the candidate
//!    partition with CMA-ES ([`optimize`]). The objective is the PDIS mean when
//!    a pessimistic, doubled-margin Student's-t bound predicted for the safety
//!    sample clears `c`, and a large penalty plus that bound otherwise.
//! 4. Evaluate the winner once on the safety partition ([`safety_test`]). Only
//!    if its one-sided `(1 − δ)` lower bound is `≥ c` is the result
//!    [`HcopiOutcome::Certified`].
//!
//! [`hcopi()`] / [`Hcopi`] run steps 3–4; [`run_trials`] runs many independent
//! trials in parallel over one partition; [`run()`] does the whole batch from a
//! dataset file ([`Dataset`]) to certified-parameter files ([`write_certified`]).
//!
//! **Policies:** anything implementing [`Policy`]. Two are provided:
//! [`TabularSoftmax`] (one logit row per discrete state) and [`FourierSoftmax`]
//! (linear in [`FourierBasis`] features).
//!
//! **Determinism:** every random draw comes from a caller-supplied RNG, and
//! parallel work (PDIS over episodes, CMA-ES over a population, trials over a
//! batch) is reduced in a fixed order. A fixed seed gives a fixed result.
//!
//! **Guarantee, and its limits:**
//! - The bound is valid only because the safety partition is never seen by the
//!   search; the types keep the two slices separate all the way through.
//! - The Student's-t interval assumes the per-episode PDIS values are roughly
//!   normal. Heavy-tailed importance weights make it optimistic.
//! - Each trial is certified at level `δ` on its own. Running `N` trials on the
//!   same safety partition and deploying any certified one is not corrected for
//!   multiple comparisons.
//!
//! **Not provided:** environment simulators, policy gradients, discounting,
//! control variates or weighted importance sampling, and concentration bounds
//! other than Student's t.
//!
//! # Example
//!
//! ```rust
//! use hcopi::{ConfidenceConfig, History, HcopiConfig, Step, TabularSoftmax};
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! // One state, two actions, uniform behavior: action 0 pays 1, action 1 pays 0.
//! let episode = |action: usize| History {
//!     steps: vec![Step {
//!         state: vec![0.0],
//!         action,
//!         reward: if action == 0 { 1.0 } else { 0.0 },
//!         behavior_prob: 0.5,
//!     }],
//! };
//! let data: Vec<History> = (0..20)
//!     .map(|i| episode(if matches!(i, 3 | 10 | 15 | 18) { 1 } else { 0 }))
//!     .collect();
//! let parts = hcopi::split(&data, 0.7).unwrap();
//!
//! let pi = TabularSoftmax::new(1, 2, &[0.0, 0.0]).unwrap();
//! let confidence = ConfidenceConfig::new(0.05, 0.0).unwrap();
//! let cfg = HcopiConfig { generations: 20, ..HcopiConfig::default() };
//! let mut rng = StdRng::seed_from_u64(0);
//!
//! let out = hcopi::hcopi(&parts.candidate, &parts.safety, confidence, cfg, &pi, &mut rng).unwrap();
//! assert!(out.is_certified());
//! ```
//!
//! ## Related work
//!
//! **High-confidence off-policy evaluation and improvement.**
//! Thomas, Theocharous & Ghavamzadeh (2015, AAAI "High Confidence Off-Policy
//! Evaluation"; ICML "High Confidence Policy Improvement") introduced the
//! candidate/safety split and the inflated-margin search objective used here.
//! This crate uses the Student's-t variant of the bound rather than the
//! concentration-inequality one.
//!
//! **Per-decision importance sampling.**
//! Precup, Sutton & Singh (2000, ICML "Eligibility Traces for Off-Policy Policy
//! Evaluation"): weighting each reward by the likelihood ratio of the actions
//! that preceded it keeps PDIS unbiased with lower variance than whole-episode
//! importance sampling.
//!
//! **CMA-ES.**
//! Hansen (2016, arXiv:1604.00772, "The CMA Evolution Strategy: A Tutorial"):
//! weights, learning rates, and the `h_σ` stall follow the tutorial's defaults.

#![forbid(unsafe_code)]

mod error;
pub use error::{Error, Result};

mod alloc;
pub use alloc::*;

mod fourier;
pub use fourier::*;

mod policy;
pub use policy::*;

mod history;
pub use history::*;

mod dataset;
pub use dataset::*;

pub mod bound;
pub use bound::ConfidenceConfig;

mod pdis;
pub use pdis::*;

mod hcope;
pub use hcope::*;

mod cmaes;
pub use cmaes::*;

mod hill_climb;
pub use hill_climb::*;

mod safety;
pub use safety::*;

mod hcopi;
pub use hcopi::*;

pub mod stable_hash;

mod trials;
pub use trials::*;

mod output;
pub use output::*;

mod config;
pub use config::*;

mod run;
pub use run::*;
