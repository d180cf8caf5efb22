//! Command-line driver: certified policy improvement from a logged dataset.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use hcopi::{HcopiConfig, RunConfig};

#[derive(Parser)]
#[command(name = "hcopi")]
#[command(about = "High-confidence off-policy policy improvement", long_about = None)]
struct Cli {
    /// Dataset file
    #[arg(short, long, default_value = "data/data.csv")]
    data: PathBuf,

    /// Directory for certified parameter files
    #[arg(short, long, default_value = "output")]
    out: PathBuf,

    /// Number of independent trials
    #[arg(short = 'n', long, default_value_t = 100)]
    trials: usize,

    /// Confidence parameter: bounds hold with probability 1 - delta
    #[arg(long, default_value_t = 0.05)]
    delta: f64,

    /// Minimum acceptable expected return
    #[arg(short = 'c', long, default_value_t = 8.0)]
    threshold: f64,

    /// Fraction of episodes used for the search
    #[arg(long, default_value_t = 0.7)]
    split: f64,

    /// Master seed for per-trial random streams
    #[arg(short, long, default_value_t = 0)]
    seed: u64,

    /// CMA-ES generations per trial
    #[arg(short, long, default_value_t = 100)]
    generations: usize,
}

impl Cli {
    fn into_config(self) -> RunConfig {
        RunConfig {
            data_path: self.data,
            output_dir: self.out,
            trials: self.trials,
            delta: self.delta,
            threshold: self.threshold,
            split_ratio: self.split,
            master_seed: self.seed,
            hcopi: HcopiConfig {
                generations: self.generations,
                ..HcopiConfig::default()
            },
            ..RunConfig::default()
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = Cli::parse().into_config();
    match hcopi::run(&cfg) {
        Ok(report) => {
            println!(
                "behavior return {:.4}; {} candidate / {} safety episodes",
                report.behavior_return, report.candidate_episodes, report.safety_episodes
            );
            println!(
                "{} certified, {} rejected, {} errored; {} file(s) written to {}",
                report.summary.certified,
                report.summary.rejected,
                report.summary.errored,
                report.written.len(),
                cfg.output_dir.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
