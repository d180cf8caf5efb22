use std::fmt::Write as _;
use std::fs;

use hcopi::{Dataset, HcopiConfig, Policy, RunConfig, TrialStatus};

/// m=1, a=2, k=1 Fourier behavior policy with all-zero weights (uniform), and
/// 20 single-step episodes in state 0 where action 0 pays 1 and action 1 pays 0.
fn dataset_text() -> String {
    let mut s = String::new();
    writeln!(s, "1\n2\n1\n0,0,0,0\n20").unwrap();
    for i in 0..20 {
        if matches!(i, 3 | 10 | 15 | 18) {
            writeln!(s, "0,1,0").unwrap();
        } else {
            writeln!(s, "0,0,1").unwrap();
        }
    }
    writeln!(s, "0.5").unwrap();
    s
}

#[test]
fn parse_augment_split_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.csv");
    fs::write(&path, dataset_text()).unwrap();

    let data = Dataset::from_path(&path).unwrap();
    assert_eq!(data.header.declared_episodes, 20);
    assert_eq!(data.episodes.len(), 20);
    assert_eq!(data.policy_test, vec![0.5]);

    let behavior = data.behavior_policy(1).unwrap();
    assert_eq!(behavior.num_parameters(), 4);
    assert!(data.check_policy_parameterization(&behavior).unwrap() < 1e-12);

    let aug = data.augment(&behavior).unwrap();
    assert!((aug.behavior_return - 16.0 / 20.0).abs() < 1e-12);
    assert!(aug.histories.iter().all(|h| h.steps[0].behavior_prob == 0.5));
    for (raw, h) in data.episodes.iter().zip(&aug.histories) {
        assert_eq!(raw.steps[0].action, h.steps[0].action);
        assert_eq!(raw.steps[0].reward, h.steps[0].reward);
    }

    let parts = hcopi::split(&aug.histories, 0.7).unwrap();
    assert_eq!(parts.candidate.len(), 14);
    assert_eq!(parts.safety.len(), 6);
    assert_eq!(parts.candidate[..], aug.histories[..14]);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Dataset::from_path(dir.path().join("nope.csv")).unwrap_err();
    assert!(matches!(err, hcopi::Error::Io(_)));
}

#[test]
fn batch_writes_one_file_per_certified_trial() {
    let dir = tempfile::tempdir().unwrap();
    let data_path = dir.path().join("data.csv");
    fs::write(&data_path, dataset_text()).unwrap();
    let out_dir = dir.path().join("output");

    let cfg = RunConfig {
        data_path,
        output_dir: out_dir.clone(),
        trials: 3,
        threshold: 0.0,
        master_seed: 11,
        hcopi: HcopiConfig {
            generations: 15,
            ..HcopiConfig::default()
        },
        ..RunConfig::default()
    };
    let report = hcopi::run(&cfg).unwrap();
    assert_eq!(report.summary.certified, 3);
    assert_eq!((report.candidate_episodes, report.safety_episodes), (14, 6));
    assert!(report.parameterization_deviation.unwrap() < 1e-12);
    assert_eq!(report.written.len(), 3);

    for i in 1..=3 {
        let text = fs::read_to_string(out_dir.join(format!("{i}.csv"))).unwrap();
        assert!(text.ends_with('\n'));
        let params: Vec<f64> = text
            .trim()
            .split(',')
            .map(|v| v.parse().unwrap())
            .collect();
        assert_eq!(params.len(), 4);
        let report_params = report.trials[i - 1].certified_parameters().unwrap();
        assert_eq!(params, report_params);
    }
}

#[test]
fn rejected_batches_write_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let data_path = dir.path().join("data.csv");
    fs::write(&data_path, dataset_text()).unwrap();
    let out_dir = dir.path().join("output");

    let cfg = RunConfig {
        data_path,
        output_dir: out_dir.clone(),
        trials: 2,
        threshold: 10.0,
        hcopi: HcopiConfig {
            generations: 10,
            ..HcopiConfig::default()
        },
        ..RunConfig::default()
    };
    let report = hcopi::run(&cfg).unwrap();
    assert!(report
        .trials
        .iter()
        .all(|t| t.status() == TrialStatus::Rejected));
    assert!(report.written.is_empty());
    assert_eq!(fs::read_dir(&out_dir).unwrap().count(), 0);
}
