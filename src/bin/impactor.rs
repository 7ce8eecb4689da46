//! Command-line front end of the impact-probability engine.
//!
//! ```text
//! impactor simulate --miss-km 31600 --velocity-km-s 7.4 --uncertainty 4 --seed 42
//! impactor convergence --miss-km 5000 --velocity-km-s 10 --uncertainty 9 --parallel
//! impactor batch --csv neo_records.csv --trials 20000
//! ```
//!
//! Logs go to stderr (`RUST_LOG` overrides the default `info` level), results to stdout.
use std::{io, path::PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use impactor::{
    constants::{DEFAULT_N_TRIALS, DEFAULT_TRIAL_SIZES},
    estimator::ConfidenceInterval,
    neo_feed::{read_neo_records_csv, score_records, NeoRecord},
    summary::{RiskLevel, SimulationSummary},
    Impactor, SimulationInput,
};

#[derive(Parser, Debug)]
#[command(
    name = "impactor",
    version,
    about = "Monte Carlo impact probability of near-Earth object close approaches"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Estimate the impact probability of one close approach
    Simulate {
        #[command(flatten)]
        approach: ApproachArgs,

        #[arg(long, env = "IMPACTOR_TRIALS", default_value_t = DEFAULT_N_TRIALS)]
        trials: usize,

        #[arg(long, env = "IMPACTOR_SEED")]
        seed: Option<u64>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Study how the estimate stabilizes with the number of trials
    Convergence {
        #[command(flatten)]
        approach: ApproachArgs,

        /// Comma separated trial sizes
        #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_TRIAL_SIZES.to_vec())]
        sizes: Vec<usize>,

        #[arg(long, env = "IMPACTOR_SEED")]
        seed: Option<u64>,

        /// Run the trial sizes on the thread pool
        #[arg(long)]
        parallel: bool,

        /// Deviation (%) below which the estimate counts as stable
        #[arg(long, default_value_t = 5.0)]
        threshold: f64,
    },
    /// Score every object of a CSV export
    Batch {
        #[arg(long)]
        csv: PathBuf,

        #[arg(long, env = "IMPACTOR_TRIALS", default_value_t = DEFAULT_N_TRIALS)]
        trials: usize,

        #[arg(long, env = "IMPACTOR_SEED")]
        seed: Option<u64>,

        /// Print one JSON document instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Download the close approaches of the last 24 hours from NeoWs as CSV
    #[cfg(feature = "neows-download")]
    Fetch {
        /// Output file, stdout when absent
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct ApproachArgs {
    /// Nominal miss distance (km)
    #[arg(long)]
    miss_km: f64,

    /// Relative velocity at close approach (km/s)
    #[arg(long)]
    velocity_km_s: f64,

    /// Orbit uncertainty class (0-9); other values fall back to the default
    #[arg(long)]
    uncertainty: String,
}

impl ApproachArgs {
    fn to_input(&self, trials: usize, seed: Option<u64>) -> anyhow::Result<SimulationInput> {
        let input = SimulationInput::builder()
            .miss_distance_km(self.miss_km)
            .velocity_km_s(self.velocity_km_s)
            .orbit_uncertainty(self.uncertainty.as_str())
            .n_trials(trials)
            .build()?;
        Ok(input.with_seed(seed))
    }
}

#[derive(Serialize)]
struct BatchRow<'a> {
    neo_id: &'a str,
    name: Option<&'a str>,
    probability: f64,
    confidence_interval_95: ConfidenceInterval,
    r_critical_km: f64,
    risk_level: RiskLevel,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let impactor = Impactor::new();

    match cli.command {
        Command::Simulate {
            approach,
            trials,
            seed,
            json,
        } => {
            let input = approach.to_input(trials, seed)?;
            let result = impactor.simulate(&input)?;
            let summary = SimulationSummary::from_result(&result)
                .context("simulation produced no usable distance samples")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("{summary:#}");
            }
        }
        Command::Convergence {
            approach,
            sizes,
            seed,
            parallel,
            threshold,
        } => {
            let input = approach.to_input(DEFAULT_N_TRIALS, seed)?;
            let report = if parallel {
                impactor.analyze_convergence_parallel(&input, &sizes)?
            } else {
                impactor.analyze_convergence(&input, &sizes)?
            };
            println!("{report}");
            match report.stabilized_at(threshold) {
                Some(n) => println!("stable within {threshold}% from {n} trials"),
                None => println!("no stable estimate within {threshold}%"),
            }
        }
        Command::Batch {
            csv,
            trials,
            seed,
            json,
        } => {
            let records = read_neo_records_csv(&csv)
                .with_context(|| format!("reading {}", csv.display()))?;
            info!(records = records.len(), path = %csv.display(), "scoring records");
            run_batch(&impactor, &records, trials, seed, json)?;
        }
        #[cfg(feature = "neows-download")]
        Command::Fetch { out } => {
            use impactor::neo_feed::{
                neows_client::{fetch_last_day_blocking, NeoWsClient},
                write_neo_records,
            };

            let records = fetch_last_day_blocking(&NeoWsClient::from_env())?;
            match out {
                Some(path) => {
                    let file = std::fs::File::create(&path)
                        .with_context(|| format!("creating {}", path.display()))?;
                    write_neo_records(file, &records)?;
                    info!(records = records.len(), path = %path.display(), "records written");
                }
                None => write_neo_records(io::stdout().lock(), &records)?,
            }
        }
    }
    Ok(())
}

fn run_batch(
    impactor: &Impactor,
    records: &[NeoRecord],
    trials: usize,
    seed: Option<u64>,
    json: bool,
) -> anyhow::Result<()> {
    let scored = score_records(impactor, records, trials, seed);
    if scored.len() < records.len() {
        warn!(skipped = records.len() - scored.len(), "some records were not scored");
    }

    let rows: Vec<BatchRow> = scored
        .iter()
        .map(|(record, result)| BatchRow {
            neo_id: &record.neo_id,
            name: record.name.as_deref(),
            probability: result.probability,
            confidence_interval_95: result.confidence_interval_95,
            r_critical_km: result.r_critical,
            risk_level: RiskLevel::from_probability(result.probability),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!(
        "{:<28}  {:>12}  {:>28}  {:>10}  {:>6}",
        "object", "probability", "95% CI", "r_crit km", "risk"
    );
    for row in &rows {
        println!(
            "{:<28}  {:>12.4e}  {:>28}  {:>10.0}  {:>6}",
            row.name.unwrap_or(row.neo_id),
            row.probability,
            row.confidence_interval_95.to_string(),
            row.r_critical_km,
            row.risk_level.to_string()
        );
    }
    Ok(())
}
