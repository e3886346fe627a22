use std::path::PathBuf;
use clap::{Parser, Subcommand};
use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use contextcore::bench::{BenchmarkHarness, BenchmarkReport, WorkloadSpec};
use contextcore::{Arbiter, ContextCoreConfig, DistanceMetric};
use contextcore_cli::{resolve_config, Overrides};

#[derive(Parser)]
#[command(name = "contextcore")]
#[command(about = "Drift-aware inference cache benchmarks", long_about = None)]
struct Cli {
    /// YAML configuration file (defaults to CONTEXTCORE_* environment variables)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Drift threshold override
    #[arg(short, long, global = true)]
    threshold: Option<f32>,

    /// Distance metric override (cosine, euclidean)
    #[arg(short, long, global = true)]
    metric: Option<DistanceMetric>,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cyclic workload over a fixed set of segments
    Bench {
        #[arg(short, long, default_value_t = 100)]
        requests: usize,

        #[arg(short, long, default_value_t = 10)]
        segments: usize,

        #[arg(short, long, default_value_t = 128)]
        dimension: usize,

        /// Flip a segment's vector on every n-th request
        #[arg(long)]
        drift_every: Option<usize>,

        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Context tokens per request (defaults to the dimension)
        #[arg(long)]
        tokens: Option<usize>,
    },

    /// Streaming workload where contexts grow and occasionally restart
    Simulate {
        #[arg(short, long, default_value_t = 500)]
        iterations: usize,

        #[arg(long, default_value_t = 5)]
        new_context_every: usize,

        #[arg(long, default_value_t = 0.01)]
        noise: f32,

        #[arg(short, long, default_value_t = 128)]
        dimension: usize,

        #[arg(long, default_value_t = 42)]
        seed: u64,

        #[arg(long)]
        tokens: Option<usize>,
    },

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "contextcore=info".into())
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let overrides = Overrides {
        threshold: cli.threshold,
        metric: cli.metric,
    };
    let config = resolve_config(cli.config.as_deref(), &overrides)?;

    match cli.command {
        Commands::Bench { requests, segments, dimension, drift_every, seed, tokens } => {
            let mut spec = WorkloadSpec::cyclic(requests, segments)
                .with_dimension(dimension)
                .with_seed(seed);
            if let Some(n) = drift_every {
                spec = spec.with_drift_every(n);
            }
            if let Some(tokens) = tokens {
                spec = spec.with_tokens(tokens);
            }

            let report = run(config, &spec).await?;
            print_report(&report, cli.json)?;
        }

        Commands::Simulate { iterations, new_context_every, noise, dimension, seed, tokens } => {
            let mut spec = WorkloadSpec::streaming(iterations)
                .with_streaming(new_context_every, noise)
                .with_dimension(dimension)
                .with_seed(seed);
            if let Some(tokens) = tokens {
                spec = spec.with_tokens(tokens);
            }

            let report = run(config, &spec).await?;
            print_report(&report, cli.json)?;
        }

        Commands::Config => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                print!("{}", serde_yaml::to_string(&config)?);
            }
        }
    }

    Ok(())
}

async fn run(config: ContextCoreConfig, spec: &WorkloadSpec) -> Result<BenchmarkReport> {
    info!(
        "Arbiter: threshold {}, metric {}, strategy {}",
        config.drift_threshold, config.distance_metric, config.conflict_strategy
    );

    let arbiter = Arbiter::new(config).context("Failed to create arbiter")?;
    let harness = BenchmarkHarness::new(arbiter);

    harness
        .run_workload(spec)
        .await
        .context("Benchmark run failed")
}

fn print_report(report: &BenchmarkReport, json: bool) -> Result<()> {
    if json {
        println!("{}", report.to_json()?);
    } else {
        println!("Benchmark Results:");
        println!("{}", "=".repeat(60));
        println!("{}", report);
    }
    Ok(())
}
