//! Dataset files: parsing, augmentation, and the candidate/safety split.
//!
//! File layout (line-oriented, comma-separated rows, blank lines ignored):
//!
//! ```text
//! m                       state dimension
//! a                       number of actions
//! k                       Fourier order of the behavior policy
//! θ_b,0,θ_b,1,…           behavior policy parameters
//! n                       number of episodes
//! s…,a,r,s…,a,r,…         one raw episode per line (stride m + 2)
//! …
//! p_0,p_1,…               behavior probabilities of the first episode's actions
//! ```
//!
//! The last line is a check vector, not an episode. It is removed at parse time
//! and used by [`Dataset::check_policy_parameterization`] to confirm that the
//! behavior policy rebuilt here matches the one that logged the data.

use std::fs;
use std::path::Path;

use crate::{Error, FourierBasis, FourierSoftmax, History, Policy, RawHistory, Result, Step};

/// The five header lines.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DatasetHeader {
    pub state_dim: usize,
    pub num_actions: usize,
    /// Fourier order `k` of the behavior policy.
    pub order: usize,
    pub behavior_parameters: Vec<f64>,
    /// Episode count as written in the file.
    pub declared_episodes: usize,
}

/// A parsed, not yet augmented dataset.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dataset {
    pub header: DatasetHeader,
    pub episodes: Vec<RawHistory>,
    pub policy_test: Vec<f64>,
}

/// Output of [`Dataset::augment`].
#[derive(Debug, Clone, PartialEq)]
pub struct Augmented {
    pub histories: Vec<History>,
    /// Mean undiscounted return of the logged episodes.
    pub behavior_return: f64,
}

fn parse_count(line: usize, text: &str, what: &str) -> Result<usize> {
    text.trim().parse::<usize>().map_err(|e| Error::Parse {
        line,
        detail: format!("{what}: expected a non-negative integer, got {text:?} ({e})"),
    })
}

fn parse_row(line: usize, text: &str) -> Result<Vec<f64>> {
    text.split(',')
        .map(|field| {
            let field = field.trim();
            field.parse::<f64>().map_err(|e| Error::Parse {
                line,
                detail: format!("{field:?} is not a number ({e})"),
            })
        })
        .collect()
}

impl Dataset {
    pub fn parse(text: &str) -> Result<Self> {
        let lines: Vec<(usize, &str)> = text
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.trim()))
            .filter(|(_, l)| !l.is_empty())
            .collect();

        if lines.len() < 6 {
            return Err(Error::Parse {
                line: lines.last().map_or(0, |(n, _)| *n),
                detail: format!(
                    "expected 5 header lines and a policy-test line, found {} non-empty lines",
                    lines.len()
                ),
            });
        }

        let (l, t) = lines[0];
        let state_dim = parse_count(l, t, "state dimension")?;
        if state_dim == 0 {
            return Err(Error::Parse {
                line: l,
                detail: "state dimension must be at least 1".to_string(),
            });
        }
        let (l, t) = lines[1];
        let num_actions = parse_count(l, t, "action count")?;
        let (l, t) = lines[2];
        let order = parse_count(l, t, "Fourier order")?;
        let (l, t) = lines[3];
        let behavior_parameters = parse_row(l, t)?;
        let (l, t) = lines[4];
        let declared_episodes = parse_count(l, t, "episode count")?;

        let (&(test_line, test_text), body) = match lines[5..].split_last() {
            Some(parts) => parts,
            None => {
                return Err(Error::Parse {
                    line: l,
                    detail: "missing policy-test line".to_string(),
                })
            }
        };
        let policy_test = parse_row(test_line, test_text)?;

        let episodes = body
            .iter()
            .map(|&(line, text)| {
                let values = parse_row(line, text)?;
                RawHistory::from_flat(&values, state_dim).map_err(|e| Error::Parse {
                    line,
                    detail: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        if episodes.len() != declared_episodes {
            log::warn!(
                "dataset header declares {declared_episodes} episodes, found {}",
                episodes.len()
            );
        }
        log::info!(
            "dataset: m={state_dim} a={num_actions} k={order}, {} behavior parameters, {} episodes",
            behavior_parameters.len(),
            episodes.len()
        );

        Ok(Self {
            header: DatasetHeader {
                state_dim,
                num_actions,
                order,
                behavior_parameters,
                declared_episodes,
            },
            episodes,
            policy_test,
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::parse(&text)
    }

    /// Fourier softmax behavior policy with the header's parameters: the header
    /// order is the dependent order, `independent_order` the independent one.
    pub fn behavior_policy(&self, independent_order: usize) -> Result<FourierSoftmax> {
        let basis = FourierBasis::new(self.header.state_dim, independent_order, self.header.order)?;
        FourierSoftmax::new(basis, self.header.num_actions, &self.header.behavior_parameters)
    }

    /// Attach `behavior`'s probability of each logged action.
    pub fn augment<P: Policy + ?Sized>(&self, behavior: &P) -> Result<Augmented> {
        if self.episodes.is_empty() {
            return Err(Error::InsufficientData { needed: 1, got: 0 });
        }
        let histories = self
            .episodes
            .iter()
            .map(|raw| {
                let steps = raw
                    .steps
                    .iter()
                    .map(|s| {
                        Ok(Step {
                            state: s.state.clone(),
                            action: s.action,
                            reward: s.reward,
                            behavior_prob: behavior.probability(&s.state, s.action)?,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(History { steps })
            })
            .collect::<Result<Vec<_>>>()?;

        let behavior_return = self
            .episodes
            .iter()
            .map(RawHistory::undiscounted_return)
            .sum::<f64>()
            / self.episodes.len() as f64;
        log::info!("behavior policy mean return: {behavior_return}");

        Ok(Augmented {
            histories,
            behavior_return,
        })
    }

    /// Largest absolute difference between `behavior`'s probabilities for the
    /// first episode's actions and the stored policy-test vector.
    pub fn check_policy_parameterization<P: Policy + ?Sized>(&self, behavior: &P) -> Result<f64> {
        let Some(first) = self.episodes.first() else {
            return Err(Error::InsufficientData { needed: 1, got: 0 });
        };
        if first.steps.len() != self.policy_test.len() {
            return Err(Error::Malformed(format!(
                "policy-test vector has {} entries, first episode has {} steps",
                self.policy_test.len(),
                first.steps.len()
            )));
        }
        let mut max_dev = 0.0f64;
        for (s, &expected) in first.steps.iter().zip(&self.policy_test) {
            let p = behavior.probability(&s.state, s.action)?;
            max_dev = max_dev.max((p - expected).abs());
        }
        if max_dev > 1e-6 {
            log::warn!("behavior policy does not reproduce the logged probabilities (max deviation {max_dev})");
        } else {
            log::info!("policy parameterization check: max deviation {max_dev}");
        }
        Ok(max_dev)
    }
}

/// Candidate and safety partitions of one dataset.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Partitions {
    /// Seen only by the search objective.
    pub candidate: Vec<History>,
    /// Seen only by the safety test.
    pub safety: Vec<History>,
}

/// First `⌊n · ratio⌋` histories to the candidate partition, the rest to safety.
pub fn split(histories: &[History], ratio: f64) -> Result<Partitions> {
    if !(ratio.is_finite() && ratio > 0.0 && ratio < 1.0) {
        return Err(Error::InvalidConfig(format!(
            "split ratio must lie in (0, 1), got {ratio}"
        )));
    }
    let cut = ((histories.len() as f64) * ratio).floor() as usize;
    let (candidate, safety) = histories.split_at(cut.min(histories.len()));
    Ok(Partitions {
        candidate: candidate.to_vec(),
        safety: safety.to_vec(),
    })
}
