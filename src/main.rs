//! # iforest
//!
//! Generates synthetic data with injected outliers and scores CSV files with
//! an isolation forest.

use clap::{Parser, Subcommand};
use iforest::{
    utils::{
        io::{read_csv, write_csv, write_scores},
        synthetic::SyntheticConfig,
    },
    ForestConfig, OutlierForest, RandomGenerator, ScoreConvention, ScoringDriver,
};
use rand::SeedableRng;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "iforest")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write Gaussian inliers plus uniform outliers to a CSV file
    Generate {
        #[arg(short, long, default_value = "test_data.csv")]
        out: PathBuf,
        #[arg(long, default_value_t = 1000)]
        rows: usize,
        #[arg(long, default_value_t = 1)]
        features: usize,
        #[arg(long, default_value_t = 0.01)]
        outlier_fraction: f64,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Fit a forest on a CSV file and print one score per row
    Score {
        #[arg(short, long, default_value = "test_data.csv")]
        input: PathBuf,
        /// The input has no header line
        #[arg(long)]
        no_header: bool,
        #[arg(long, default_value_t = 100)]
        trees: usize,
        #[arg(long, default_value_t = 256)]
        samples: usize,
        #[arg(long)]
        max_depth: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        threads: Option<usize>,
        #[arg(long)]
        contamination: Option<f64>,
        /// Report 0.5 - score (negative is anomalous) instead of the anomaly score
        #[arg(long)]
        decision: bool,
        /// Write `index,score` rows here
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Save the fitted forest as MessagePack
        #[arg(long)]
        save_model: Option<PathBuf>,
    },
}

fn execute(command: Commands) -> iforest::Result<()> {
    match command {
        Commands::Generate {
            out,
            rows,
            features,
            outlier_fraction,
            seed,
        } => {
            let config = SyntheticConfig {
                n_inliers: rows,
                n_features: features,
                outlier_fraction,
                ..SyntheticConfig::default()
            };
            let data = config.generate(&mut RandomGenerator::seed_from_u64(seed))?;
            write_csv(&out, &data.store)?;
            println!(
                "Wrote {} rows ({} outliers) to {}",
                data.store.n_rows(),
                config.n_outliers(),
                out.display()
            );
        }
        Commands::Score {
            input,
            no_header,
            trees,
            samples,
            max_depth,
            seed,
            threads,
            contamination,
            decision,
            out,
            save_model,
        } => {
            let store = read_csv(&input, b',', !no_header)?;
            println!(
                "Loaded {} samples with {} features",
                store.n_rows(),
                store.n_features()
            );
            let config = ForestConfig {
                n_trees: trees,
                max_samples: samples,
                max_depth,
                random_state: seed,
                n_threads: threads,
                contamination,
            };
            let convention = if decision {
                ScoreConvention::DecisionValue
            } else {
                ScoreConvention::AnomalyScore
            };
            let scored = ScoringDriver::new(config)
                .with_convention(convention)
                .run_lazy(&store)?;
            let scores = scored.iter().collect::<Vec<_>>();
            for (i, score) in &scores {
                println!("Score {}: {:.6}", i, score);
            }
            if contamination.is_some() {
                let labels = scored.forest().predict(&store)?;
                println!(
                    "Flagged {} of {} rows (threshold {:.6})",
                    labels.iter().filter(|&&l| l == 1).count(),
                    labels.len(),
                    scored.forest().threshold()
                );
            }
            if let Some(out) = out {
                write_scores(out, &scores)?;
            }
            if let Some(path) = save_model {
                scored.forest().save(path)?;
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match execute(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
