//! # Benchmark Harness
//!
//! Replays a request stream twice: once through an always-recompute
//! baseline and once through the [`Arbiter`], then compares estimated and
//! measured latency.
//!
//! ```rust
//! use contextcore::bench::{BenchmarkHarness, WorkloadSpec};
//! use contextcore::{Arbiter, ContextCoreConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let arbiter = Arbiter::new(ContextCoreConfig::default())?;
//! let harness = BenchmarkHarness::new(arbiter);
//!
//! let report = harness.run_workload(&WorkloadSpec::streaming(500)).await?;
//! println!("{}", report);
//! # Ok(())
//! # }
//! ```

pub mod report;
pub mod workload;

pub use report::{BenchmarkReport, LatencySummary, OutcomeCounts};
pub use workload::{WorkloadKind, WorkloadSpec};

use crate::arbiter::{Arbiter, Request};
use crate::error::Result;
use crate::recompute::{FullContextRecompute, Recompute};
use report::improvement;
use std::time::{Duration, Instant};
use tracing::info;

/// Drives workloads through an arbiter and a baseline
pub struct BenchmarkHarness {
    arbiter: Arbiter,
    baseline: Box<dyn Recompute>,
}

impl BenchmarkHarness {
    /// Harness whose baseline recomputes with the arbiter's configured passes
    pub fn new(arbiter: Arbiter) -> Self {
        let baseline = Box::new(FullContextRecompute::new(arbiter.config().recompute_passes));
        Self { arbiter, baseline }
    }

    /// Replace the baseline recompute
    pub fn with_baseline(mut self, baseline: Box<dyn Recompute>) -> Self {
        self.baseline = baseline;
        self
    }

    pub fn arbiter(&self) -> &Arbiter {
        &self.arbiter
    }

    /// Generate and run a synthetic workload
    pub async fn run_workload(&self, spec: &WorkloadSpec) -> Result<BenchmarkReport> {
        let requests = spec.generate()?;
        info!(
            "Running {:?} workload: {} requests, dimension {}",
            spec.kind, spec.requests, spec.dimension
        );
        self.run(requests).await
    }

    /// Run the given requests in order
    pub async fn run(&self, requests: Vec<Request>) -> Result<BenchmarkReport> {
        let cost_model = self.arbiter.config().cost_model;

        let mut baseline_estimated = Duration::ZERO;
        let mut baseline_elapsed = Duration::ZERO;
        let mut arbiter_estimated = Duration::ZERO;
        let mut arbiter_elapsed = Duration::ZERO;
        let mut outcomes = OutcomeCounts::default();
        let mut last_status = None;
        let count = requests.len() as u64;

        for request in requests {
            let tokens = request.tokens();

            let start = Instant::now();
            self.baseline.recompute(&request.vector, tokens)?;
            baseline_elapsed += start.elapsed();
            baseline_estimated += cost_model.baseline(tokens);

            let resolution = self.arbiter.resolve_request(request).await?;
            arbiter_estimated += resolution.estimated_latency;
            arbiter_elapsed += resolution.elapsed;
            outcomes.add(resolution.outcome);
            last_status = Some(resolution.status().to_string());
        }

        let report = BenchmarkReport {
            requests: count,
            outcomes,
            baseline: LatencySummary::from_totals(baseline_estimated, baseline_elapsed, count),
            arbiter: LatencySummary::from_totals(arbiter_estimated, arbiter_elapsed, count),
            estimated_improvement_pct: improvement(baseline_estimated, arbiter_estimated),
            measured_improvement_pct: improvement(baseline_elapsed, arbiter_elapsed),
            last_status,
            metrics: self.arbiter.metrics().await,
        };

        info!(
            "Benchmark complete: {} requests, {:.2}% estimated gain, {:.2}% hit rate",
            report.requests,
            report.estimated_improvement_pct,
            report.hit_rate()
        );

        Ok(report)
    }
}
