use criterion::{criterion_group, criterion_main, Criterion};
use hcopi::{ConfidenceConfig, CmaEsConfig, HcopiConfig, History, Step, TabularSoftmax};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::hint::black_box;

fn bench_cmaes(c: &mut Criterion) {
    let mut group = c.benchmark_group("cmaes");

    // Rosenbrock in 4-d: pure optimizer cost, cheap objective.
    group.bench_function("rosenbrock/100gen", |b| {
        let f = |x: &[f64]| -> hcopi::Result<f64> {
            Ok(-x
                .windows(2)
                .map(|w| 100.0 * (w[1] - w[0] * w[0]).powi(2) + (1.0 - w[0]).powi(2))
                .sum::<f64>())
        };
        let cfg = CmaEsConfig::default();
        b.iter(|| {
            let mut rng = StdRng::seed_from_u64(0);
            black_box(hcopi::optimize(&[0.0; 4], &cfg, f, &mut rng).unwrap())
        })
    });

    // One full HCOPI run on a small tabular problem.
    let data: Vec<History> = (0..200)
        .map(|i| {
            let (state, action) = (i % 4, (i / 4) % 2);
            History {
                steps: vec![Step {
                    state: vec![state as f64],
                    action,
                    reward: if action == state % 2 { 1.0 } else { 0.0 },
                    behavior_prob: 0.5,
                }],
            }
        })
        .collect();
    let parts = hcopi::split(&data, 0.7).unwrap();
    let pi = TabularSoftmax::new(4, 2, &[0.0; 8]).unwrap();
    let conf = ConfidenceConfig::new(0.05, 0.0).unwrap();
    group.sample_size(10);
    group.bench_function("hcopi/tabular-4x2", |b| {
        b.iter(|| {
            let mut rng = StdRng::seed_from_u64(1);
            black_box(
                hcopi::hcopi(&parts.candidate, &parts.safety, conf, HcopiConfig::default(), &pi, &mut rng)
                    .unwrap(),
            )
        })
    });
    group.finish();
}

criterion_group!(benches, bench_cmaes);
criterion_main!(benches);
