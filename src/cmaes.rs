//! CMA-ES (Covariance Matrix Adaptation Evolution Strategy).
//!
//! A derivative-free optimizer over `R^n` for any scalar black-box objective.
//! Nothing here knows about policies or confidence bounds.
//!
//! Each generation samples `λ` points from `N(m, σ² C)`, ranks them, moves `m`
//! to a weighted recombination of the best `μ`, and adapts `σ` (cumulative
//! step-size adaptation) and `C` (rank-one + rank-μ updates) from the
//! evolution paths. Constants follow Hansen's tutorial (arXiv:1604.00772).
//!
//! The run length is a fixed generation budget. The returned point is the best
//! one *evaluated* during the run (including the initial mean), not the final
//! distribution mean.

use nalgebra::{DMatrix, DVector, SymmetricEigen};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use rayon::prelude::*;

use crate::{Error, Result};

/// Eigenvalues of `C` are floored here to keep the factorization PSD.
const EIGEN_FLOOR: f64 = 1e-20;

/// Smallest step size the adaptation may shrink to.
const MIN_STEP: f64 = 1e-30;

/// Configuration for one optimization run.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CmaEsConfig {
    /// Initial global step size `σ₀` (must be finite and > 0).
    pub initial_step: f64,
    /// Number of generations to run; there is no early stop.
    pub generations: usize,
    /// Population size `λ`; `None` uses `4 + ⌊3 ln n⌋`.
    pub population_size: Option<usize>,
    /// Minimize instead of maximize.
    pub minimize: bool,
}

impl Default for CmaEsConfig {
    fn default() -> Self {
        Self {
            initial_step: 1.0,
            generations: 100,
            population_size: None,
            minimize: false,
        }
    }
}

/// Result of [`optimize`].
#[derive(Debug, Clone, PartialEq)]
pub struct CmaEsOutcome {
    /// Best point evaluated during the run.
    pub best: Vec<f64>,
    /// Objective value at `best`.
    pub best_value: f64,
    /// Final distribution mean.
    pub mean: Vec<f64>,
    /// Final step size.
    pub step_size: f64,
    pub generations: usize,
    pub evaluations: usize,
}

/// Search state of one CMA-ES run.
///
/// Use [`CmaEs::ask`] / [`CmaEs::tell`] for manual control, or [`optimize`]
/// for the full loop. Fitness passed to `tell` is always *maximized*.
#[derive(Debug, Clone)]
pub struct CmaEs {
    dimension: usize,
    population_size: usize,
    mu: usize,
    initial_step: f64,
    mean: DVector<f64>,
    sigma: f64,
    covariance: DMatrix<f64>,
    /// Eigenvectors of `covariance`.
    basis: DMatrix<f64>,
    /// Square roots of the (floored) eigenvalues of `covariance`.
    scales: DVector<f64>,
    p_c: DVector<f64>,
    p_sigma: DVector<f64>,
    weights: DVector<f64>,
    mu_eff: f64,
    c_c: f64,
    c_sigma: f64,
    c_1: f64,
    c_mu: f64,
    d_sigma: f64,
    expected_norm: f64,
    generation: u64,
}

impl CmaEs {
    pub fn new(initial_mean: &[f64], initial_step: f64, population_size: Option<usize>) -> Result<Self> {
        let dimension = initial_mean.len();
        if dimension == 0 {
            return Err(Error::InvalidConfig(
                "CMA-ES needs a non-empty initial mean".to_string(),
            ));
        }
        if initial_mean.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidConfig(
                "CMA-ES initial mean must be finite".to_string(),
            ));
        }
        if !(initial_step.is_finite() && initial_step > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "CMA-ES initial step must be finite and > 0, got {initial_step}"
            )));
        }
        let n = dimension as f64;

        // Population sizing from Hansen's tutorial
        let population_size = match population_size {
            Some(l) if l >= 2 => l,
            Some(l) => {
                return Err(Error::InvalidConfig(format!(
                    "CMA-ES population size must be >= 2, got {l}"
                )))
            }
            None => 4 + (3.0 * n.ln()).floor() as usize,
        };
        let mu = population_size / 2;

        // w_i = ln(mu + 0.5) - ln(i + 1), normalized
        let raw_weights: Vec<f64> = (0..mu)
            .map(|i| (mu as f64 + 0.5).ln() - ((i + 1) as f64).ln())
            .collect();
        let w_sum: f64 = raw_weights.iter().sum();
        let weights = DVector::from_iterator(mu, raw_weights.iter().map(|w| w / w_sum));
        let mu_eff = 1.0 / weights.iter().map(|w| w * w).sum::<f64>();

        let c_sigma = (mu_eff + 2.0) / (n + mu_eff + 5.0);
        let d_sigma = 1.0 + 2.0 * (((mu_eff - 1.0) / (n + 1.0)).sqrt() - 1.0).max(0.0) + c_sigma;
        let c_c = (4.0 + mu_eff / n) / (n + 4.0 + 2.0 * mu_eff / n);
        let c_1 = 2.0 / ((n + 1.3).powi(2) + mu_eff);
        let c_mu =
            (2.0 * (mu_eff - 2.0 + 1.0 / mu_eff) / ((n + 2.0).powi(2) + mu_eff)).min(1.0 - c_1);
        let expected_norm = n.sqrt() * (1.0 - 1.0 / (4.0 * n) + 1.0 / (21.0 * n.powi(2)));

        Ok(Self {
            dimension,
            population_size,
            mu,
            initial_step,
            mean: DVector::from_column_slice(initial_mean),
            sigma: initial_step,
            covariance: DMatrix::identity(dimension, dimension),
            basis: DMatrix::identity(dimension, dimension),
            scales: DVector::from_element(dimension, 1.0),
            p_c: DVector::zeros(dimension),
            p_sigma: DVector::zeros(dimension),
            weights,
            mu_eff,
            c_c,
            c_sigma,
            c_1,
            c_mu,
            d_sigma,
            expected_norm,
            generation: 0,
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn population_size(&self) -> usize {
        self.population_size
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn step_size(&self) -> f64 {
        self.sigma
    }

    pub fn mean(&self) -> Vec<f64> {
        self.mean.iter().copied().collect()
    }

    pub fn covariance(&self) -> &DMatrix<f64> {
        &self.covariance
    }

    /// Sample one generation: `x_k = m + σ · B · D · z_k`, `z_k ~ N(0, I)`.
    pub fn ask<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<DVector<f64>> {
        let bd = &self.basis * DMatrix::from_diagonal(&self.scales);
        (0..self.population_size)
            .map(|_| {
                let z = DVector::from_iterator(
                    self.dimension,
                    (0..self.dimension).map(|_| StandardNormal.sample(&mut *rng)),
                );
                &self.mean + self.sigma * &bd * z
            })
            .collect()
    }

    /// Update the distribution from one evaluated generation.
    ///
    /// `fitness[i]` belongs to `population[i]`; higher is better, NaN ranks last.
    pub fn tell(&mut self, population: &[DVector<f64>], fitness: &[f64]) -> Result<()> {
        if population.len() != self.population_size || fitness.len() != self.population_size {
            return Err(Error::InvalidConfig(format!(
                "CMA-ES generation needs {} candidates and fitness values, got {} and {}",
                self.population_size,
                population.len(),
                fitness.len()
            )));
        }
        if let Some(x) = population.iter().find(|x| x.len() != self.dimension) {
            return Err(Error::Shape {
                expected: self.dimension,
                got: x.len(),
            });
        }

        // 1. Rank by fitness, best first.
        let key = |v: f64| if v.is_nan() { f64::NEG_INFINITY } else { v };
        let mut order: Vec<usize> = (0..self.population_size).collect();
        order.sort_by(|&a, &b| key(fitness[b]).total_cmp(&key(fitness[a])));

        // 2. Recombination in the normalized step space.
        let old_mean = self.mean.clone();
        let steps: Vec<DVector<f64>> = order
            .iter()
            .take(self.mu)
            .map(|&i| (&population[i] - &old_mean) / self.sigma)
            .collect();
        let mut y_w: DVector<f64> = DVector::zeros(self.dimension);
        for (w, y) in self.weights.iter().zip(&steps) {
            y_w += *w * y;
        }
        let new_mean = &old_mean + self.sigma * &y_w;

        // 3. C^{-1/2} y_w = B D^{-1} B^T y_w
        let inv_scales = self.scales.map(|d| 1.0 / d);
        let c_inv_sqrt_y = &self.basis * inv_scales.component_mul(&(self.basis.transpose() * &y_w));

        // 4. Step-size path.
        self.p_sigma = (1.0 - self.c_sigma) * &self.p_sigma
            + (self.c_sigma * (2.0 - self.c_sigma) * self.mu_eff).sqrt() * c_inv_sqrt_y;

        // 5. h_sigma stalls the covariance path while the step size is growing fast.
        let gen_factor = 1.0 - (1.0 - self.c_sigma).powi(2 * (self.generation as i32 + 1));
        let p_sigma_norm = self.p_sigma.norm();
        let h_threshold =
            (1.4 + 2.0 / (self.dimension as f64 + 1.0)) * self.expected_norm * gen_factor.sqrt();
        let h_sigma = if p_sigma_norm < h_threshold { 1.0 } else { 0.0 };

        // 6. Covariance path.
        self.p_c = (1.0 - self.c_c) * &self.p_c
            + h_sigma * (self.c_c * (2.0 - self.c_c) * self.mu_eff).sqrt() * &y_w;

        // 7. Rank-mu: weighted outer products of the selected steps.
        let mut rank_mu: DMatrix<f64> = DMatrix::zeros(self.dimension, self.dimension);
        for (w, y) in self.weights.iter().zip(&steps) {
            rank_mu += *w * y * y.transpose();
        }

        // 8. C = (1 - c_1 - c_mu + c_1 δ(h)) C + c_1 p_c p_c^T + c_mu rank_mu
        let delta_h = (1.0 - h_sigma) * self.c_c * (2.0 - self.c_c);
        let base = 1.0 - self.c_1 - self.c_mu + self.c_1 * delta_h;
        self.covariance = base * &self.covariance
            + self.c_1 * &self.p_c * self.p_c.transpose()
            + self.c_mu * rank_mu;
        self.covariance = (&self.covariance + self.covariance.transpose()) * 0.5;

        // 9. Step size.
        self.sigma *= ((self.c_sigma / self.d_sigma) * (p_sigma_norm / self.expected_norm - 1.0)).exp();

        self.mean = new_mean;
        self.generation += 1;

        if self.mean.iter().any(|v| !v.is_finite()) || !self.sigma.is_finite() {
            log::warn!(
                "CMA-ES generation {}: non-finite mean or step size, restarting around the previous mean",
                self.generation
            );
            self.restart_around(old_mean);
            return Ok(());
        }
        self.sigma = self.sigma.max(MIN_STEP);

        self.decompose();
        Ok(())
    }

    /// Refresh `B` and `D` from `C`, flooring eigenvalues so `C` stays PSD.
    fn decompose(&mut self) {
        let eig = SymmetricEigen::new(self.covariance.clone());
        if eig.eigenvalues.iter().any(|v| !v.is_finite())
            || eig.eigenvectors.iter().any(|v| !v.is_finite())
        {
            log::warn!(
                "CMA-ES generation {}: covariance eigendecomposition is not finite, resetting C = I",
                self.generation
            );
            self.covariance = DMatrix::identity(self.dimension, self.dimension);
            self.basis = DMatrix::identity(self.dimension, self.dimension);
            self.scales = DVector::from_element(self.dimension, 1.0);
            self.p_c = DVector::zeros(self.dimension);
            return;
        }

        let floored = eig.eigenvalues.iter().any(|&v| v < EIGEN_FLOOR);
        let eigenvalues = eig.eigenvalues.map(|v| v.max(EIGEN_FLOOR));
        if floored {
            self.covariance =
                &eig.eigenvectors * DMatrix::from_diagonal(&eigenvalues) * eig.eigenvectors.transpose();
        }
        self.scales = eigenvalues.map(f64::sqrt);
        self.basis = eig.eigenvectors;
    }

    fn restart_around(&mut self, center: DVector<f64>) {
        self.mean = center;
        self.sigma = self.initial_step;
        self.covariance = DMatrix::identity(self.dimension, self.dimension);
        self.basis = DMatrix::identity(self.dimension, self.dimension);
        self.scales = DVector::from_element(self.dimension, 1.0);
        self.p_c = DVector::zeros(self.dimension);
        self.p_sigma = DVector::zeros(self.dimension);
    }
}

fn improves(candidate: f64, incumbent: f64, minimize: bool) -> bool {
    if candidate.is_nan() {
        return false;
    }
    if incumbent.is_nan() {
        return true;
    }
    if minimize {
        candidate < incumbent
    } else {
        candidate > incumbent
    }
}

/// Run CMA-ES from `initial_mean` for `cfg.generations` generations.
///
/// Candidates within a generation are evaluated in parallel; sampling uses
/// only `rng`, so a fixed seed gives a reproducible run. The first objective
/// error aborts the run.
pub fn optimize<F, R>(
    initial_mean: &[f64],
    cfg: &CmaEsConfig,
    objective: F,
    rng: &mut R,
) -> Result<CmaEsOutcome>
where
    F: Fn(&[f64]) -> Result<f64> + Sync,
    R: Rng + ?Sized,
{
    let mut es = CmaEs::new(initial_mean, cfg.initial_step, cfg.population_size)?;
    let sign = if cfg.minimize { -1.0 } else { 1.0 };

    let mut best = initial_mean.to_vec();
    let mut best_value = objective(initial_mean)?;
    let mut evaluations = 1;

    for _ in 0..cfg.generations {
        let population = es.ask(rng);
        let values = population
            .par_iter()
            .map(|x| objective(x.as_slice()))
            .collect::<Result<Vec<f64>>>()?;
        evaluations += values.len();

        for (x, &v) in population.iter().zip(&values) {
            if improves(v, best_value, cfg.minimize) {
                best_value = v;
                best = x.iter().copied().collect();
            }
        }

        let fitness: Vec<f64> = values.iter().map(|v| sign * v).collect();
        es.tell(&population, &fitness)?;
        log::trace!(
            "CMA-ES generation {}: best so far {best_value}, step {}",
            es.generation(),
            es.step_size()
        );
    }

    log::debug!(
        "CMA-ES finished: {} generations, {evaluations} evaluations, best {best_value}",
        es.generation()
    );

    Ok(CmaEsOutcome {
        best,
        best_value,
        mean: es.mean(),
        step_size: es.step_size(),
        generations: cfg.generations,
        evaluations,
    })
}
