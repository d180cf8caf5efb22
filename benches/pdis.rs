use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use hcopi::{FourierBasis, FourierSoftmax, History, Policy, Step};
use std::hint::black_box;

/// Deterministic 10-step episodes over a 2-d state in [0, 1]^2.
fn episodes(n: usize, behavior: &FourierSoftmax) -> Vec<History> {
    (0..n)
        .map(|e| History {
            steps: (0..10)
                .map(|t| {
                    let state = vec![((e * 7 + t) % 13) as f64 / 13.0, ((e + 3 * t) % 11) as f64 / 11.0];
                    let action = (e + t) % behavior.num_actions();
                    let behavior_prob = behavior.probability(&state, action).unwrap();
                    Step {
                        state,
                        action,
                        reward: if action == 0 { 1.0 } else { -0.5 },
                        behavior_prob,
                    }
                })
                .collect(),
        })
        .collect()
}

fn bench_pdis(c: &mut Criterion) {
    let basis = FourierBasis::new(2, 3, 2).unwrap();
    let behavior = FourierSoftmax::new(basis, 3, &[]).unwrap();
    let theta: Vec<f64> = (0..behavior.num_parameters())
        .map(|i| ((i % 5) as f64 - 2.0) * 0.05)
        .collect();

    let mut group = c.benchmark_group("pdis");
    for n in [100usize, 1000] {
        let hs = episodes(n, &behavior);
        group.bench_with_input(BenchmarkId::new("fourier/episodes", n), &hs, |b, hs| {
            b.iter(|| black_box(hcopi::pdis(hs, &theta, &behavior).unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_pdis);
criterion_main!(benches);
