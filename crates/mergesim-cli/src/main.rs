//! mergesim command-line driver.
//!
//! Runs one or more seeded simulations of an integration pipeline and
//! prints a throughput report for each.
//!
//! # Example
//!
//! ```bash
//! # Five days under the merge queue, seed 0
//! mergesim
//!
//! # Compare direct merging without rebases over 100 seeds
//! mergesim --policy direct --runs 100
//!
//! # One run as JSON, with dispatch logging
//! RUST_LOG=mergesim_engine=info mergesim --seed 7 --json
//! ```

use anyhow::Context;
use clap::Parser;
use mergesim::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// mergesim
///
/// Discrete-event Monte Carlo simulator of a source-control integration
/// pipeline. Estimates merges per day and builds per merge under different
/// integration policies.
#[derive(Parser, Debug)]
#[command(name = "mergesim")]
#[command(version, about, long_about = None)]
struct Args {
    /// Integration policy: direct, direct+rebase, or merge-queue
    #[arg(short = 'p', long, default_value = "merge-queue")]
    policy: IntegrationPolicy,

    /// Seed of the first run
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Simulated days per run
    #[arg(short = 'd', long, default_value = "5")]
    days: u64,

    /// Open branches the generator maintains
    #[arg(short = 'b', long, default_value = "3")]
    branch_cap: usize,

    /// Success probability of regular builds (0.0-1.0)
    #[arg(long)]
    success_probability: Option<f64>,

    /// Never rebase under direct+rebase (equivalent to --policy direct)
    #[arg(long)]
    no_rebase: bool,

    /// Number of runs, with seeds seed..seed+runs
    #[arg(short = 'n', long, default_value = "1")]
    runs: u64,

    /// Print reports as JSON
    #[arg(long)]
    json: bool,
}

impl Args {
    fn config(&self, seed: u64) -> SimConfig {
        let policy = if self.no_rebase {
            self.policy.without_rebase()
        } else {
            self.policy
        };
        let mut config = SimConfig::default()
            .with_policy(policy)
            .with_seed(seed)
            .with_days(self.days)
            .with_branch_cap(self.branch_cap);
        if let Some(p) = self.success_probability {
            config = config.with_normal_build(BuildProfile::normal().with_success_probability(p));
        }
        config
    }
}

fn run_once(config: SimConfig) -> anyhow::Result<RunReport> {
    let seed = config.seed;
    let mut sim = Simulation::new(config).context("invalid configuration")?;
    let outcome = sim
        .run()
        .with_context(|| format!("run with seed {seed} aborted"))?;
    Ok(sim.report(outcome))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    anyhow::ensure!(args.runs > 0, "--runs must be at least 1");

    info!(
        policy = %args.policy,
        seed = args.seed,
        days = args.days,
        branch_cap = args.branch_cap,
        runs = args.runs,
        "starting"
    );

    let mut total_merges_per_day = 0.0;
    for run in 0..args.runs {
        let report = run_once(args.config(args.seed.wrapping_add(run)))?;
        if args.json {
            println!("{}", report.to_json()?);
        } else {
            println!("{report}");
            println!();
        }
        total_merges_per_day += report.merges_per_day;
    }

    if args.runs > 1 && !args.json {
        println!(
            "Mean over {} runs: {:.3} merges per day.",
            args.runs,
            total_merges_per_day / args.runs as f64
        );
    }
    Ok(())
}
