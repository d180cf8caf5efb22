//! Property tests for policies, estimators, bounds, and the partition.

use hcopi::{
    safety_test, ConfidenceConfig, CmaEsConfig, FourierBasis, FourierSoftmax, HcopeConfig,
    HcopeObjective, History, Policy, Step, TabularSoftmax,
};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn one_step_episodes(actions_rewards: &[(usize, f64)]) -> Vec<History> {
    actions_rewards
        .iter()
        .map(|&(action, reward)| History {
            steps: vec![Step {
                state: vec![0.0],
                action,
                reward,
                behavior_prob: 0.5,
            }],
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

proptest! {
    /// Fourier softmax probabilities form a distribution for any weights and state.
    #[test]
    fn fourier_probabilities_are_a_distribution(
        params in prop::collection::vec(-20.0f64..20.0, 18),
        x in prop::collection::vec(0.0f64..1.0, 2),
    ) {
        // m=2, i=2, d=1: 4 dependent + 2 independent features, 3 actions.
        let basis = FourierBasis::new(2, 2, 1).unwrap();
        prop_assert_eq!(basis.num_outputs(), 2 * 2 + 4 - 2);
        let pi = FourierSoftmax::new(basis, 3, &params).unwrap();
        let p = pi.action_probabilities(&x).unwrap();
        prop_assert_eq!(p.len(), 3);
        prop_assert!(p.iter().all(|v| v.is_finite() && *v >= 0.0));
        prop_assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    /// Setting the parameters a policy reports leaves its behavior unchanged.
    #[test]
    fn tabular_get_set_is_idempotent(
        params in prop::collection::vec(-50.0f64..50.0, 6),
        s in 0usize..3,
    ) {
        let mut pi = TabularSoftmax::new(3, 2, &params).unwrap();
        let before = pi.action_probabilities(&[s as f64]).unwrap();
        let got = pi.parameters();
        pi.set_parameters(&got).unwrap();
        prop_assert_eq!(pi.parameters(), params);
        prop_assert_eq!(pi.action_probabilities(&[s as f64]).unwrap(), before);
    }
}

// ---------------------------------------------------------------------------
// Estimators and bounds
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// When the behavior probabilities are the policy's own, every weight is 1
    /// and PDIS reduces to the Monte Carlo mean of the returns.
    #[test]
    fn on_policy_pdis_is_the_monte_carlo_mean(
        theta in prop::collection::vec(-3.0f64..3.0, 4),
        episodes in prop::collection::vec(
            prop::collection::vec((0usize..2, 0usize..2, -5.0f64..5.0), 1..5),
            2..12,
        ),
    ) {
        let pi = TabularSoftmax::new(2, 2, &theta).unwrap();
        let hs: Vec<History> = episodes
            .iter()
            .map(|steps| History {
                steps: steps
                    .iter()
                    .map(|&(s, a, r)| Step {
                        state: vec![s as f64],
                        action: a,
                        reward: r,
                        behavior_prob: pi.probability(&[s as f64], a).unwrap(),
                    })
                    .collect(),
            })
            .collect();
        let est = hcopi::pdis(&hs, &theta, &pi).unwrap();
        let mc = hs.iter().map(History::undiscounted_return).sum::<f64>() / hs.len() as f64;
        prop_assert!((est.mean - mc).abs() < 1e-9, "pdis={} mc={}", est.mean, mc);
    }

    /// On the same data, the search objective's doubled-margin bound never
    /// exceeds the safety test's bound (for δ < 0.5, where t⁻¹(1 − δ) > 0).
    #[test]
    fn hcope_bound_is_at_most_the_safety_bound(
        theta in prop::collection::vec(-4.0f64..4.0, 2),
        data in prop::collection::vec((0usize..2, -2.0f64..3.0), 3..30),
        delta in 0.01f64..0.49,
    ) {
        let hs = one_step_episodes(&data);
        let pi = TabularSoftmax::new(1, 2, &[0.0, 0.0]).unwrap();
        let conf = ConfidenceConfig::new(delta, 0.0).unwrap();
        let obj = HcopeObjective::new(&hs, hs.len(), conf, HcopeConfig::default(), &pi).unwrap();
        let search = obj.evaluate(&theta).unwrap();
        let safety = safety_test(&theta, &hs, conf, &pi).unwrap();
        prop_assert!(search.lower_bound <= safety.lower_bound + 1e-9);
        prop_assert!((search.estimate.mean - safety.estimate.mean).abs() < 1e-12);
        // Feasible in search implies passing on the same data.
        if search.feasible {
            prop_assert!(safety.passed);
        }
    }

    /// CMA-ES never reports a point worse than where it started.
    #[test]
    fn cmaes_never_loses_the_start(
        start in prop::collection::vec(-5.0f64..5.0, 1..4),
        target in -5.0f64..5.0,
        seed in any::<u64>(),
    ) {
        let f = |x: &[f64]| -> hcopi::Result<f64> {
            Ok(-x.iter().map(|v| (v - target).abs()).sum::<f64>())
        };
        let cfg = CmaEsConfig { generations: 5, ..CmaEsConfig::default() };
        let out = hcopi::optimize(&start, &cfg, f, &mut StdRng::seed_from_u64(seed)).unwrap();
        prop_assert!(out.best_value >= f(&start).unwrap());
        prop_assert_eq!(out.best.len(), start.len());
    }
}

// ---------------------------------------------------------------------------
// Partition
// ---------------------------------------------------------------------------

proptest! {
    /// The split is a prefix/suffix cut: disjoint, covering, and order-preserving.
    #[test]
    fn split_is_disjoint_and_covering(n in 0usize..60, ratio in 0.01f64..0.99) {
        let hs: Vec<History> = (0..n)
            .map(|i| History {
                steps: vec![Step {
                    state: vec![i as f64],
                    action: 0,
                    reward: 0.0,
                    behavior_prob: 1.0,
                }],
            })
            .collect();
        let p = hcopi::split(&hs, ratio).unwrap();
        prop_assert_eq!(p.candidate.len() + p.safety.len(), n);
        prop_assert_eq!(p.candidate.len(), (n as f64 * ratio).floor() as usize);
        let tag = |h: &History| h.steps[0].state[0] as usize;
        let c: Vec<usize> = p.candidate.iter().map(tag).collect();
        let s: Vec<usize> = p.safety.iter().map(tag).collect();
        prop_assert!(c.iter().all(|i| !s.contains(i)));
        let joined: Vec<usize> = c.into_iter().chain(s).collect();
        prop_assert_eq!(joined, (0..n).collect::<Vec<_>>());
    }
}
