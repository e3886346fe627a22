//! Benchmark report

use crate::arbiter::metrics::{average, percentage};
use crate::arbiter::{ArbiterMetrics, ResolutionOutcome};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Totals and averages for one side of the comparison
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencySummary {
    #[serde(with = "crate::config::duration_ms")]
    pub total_estimated: Duration,

    #[serde(with = "crate::config::duration_ms")]
    pub average_estimated: Duration,

    #[serde(with = "crate::config::duration_ms")]
    pub total_elapsed: Duration,

    #[serde(with = "crate::config::duration_ms")]
    pub average_elapsed: Duration,
}

impl LatencySummary {
    pub(crate) fn from_totals(estimated: Duration, elapsed: Duration, requests: u64) -> Self {
        Self {
            total_estimated: estimated,
            average_estimated: average(estimated, requests),
            total_elapsed: elapsed,
            average_elapsed: average(elapsed, requests),
        }
    }
}

/// Outcome counts of the arbiter run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub recomputed: u64,
    pub hits: u64,
    pub conflicts: u64,
}

impl OutcomeCounts {
    pub(crate) fn add(&mut self, outcome: ResolutionOutcome) {
        match outcome {
            ResolutionOutcome::Recomputed => self.recomputed += 1,
            ResolutionOutcome::Hit => self.hits += 1,
            ResolutionOutcome::ConflictResolved => self.conflicts += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.recomputed + self.hits + self.conflicts
    }
}

/// Always-recompute baseline versus the arbiter path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub requests: u64,

    pub outcomes: OutcomeCounts,

    /// Every request recomputed
    pub baseline: LatencySummary,

    /// Requests routed through the arbiter
    pub arbiter: LatencySummary,

    /// Improvement of estimated latency, in percent
    pub estimated_improvement_pct: f64,

    /// Improvement of measured latency, in percent
    pub measured_improvement_pct: f64,

    /// Status label of the last resolution
    pub last_status: Option<String>,

    /// Arbiter counters at the end of the run
    pub metrics: ArbiterMetrics,
}

impl BenchmarkReport {
    /// Fast-path hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        percentage(self.outcomes.hits, self.requests)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub(crate) fn improvement(baseline: Duration, candidate: Duration) -> f64 {
    let base = baseline.as_secs_f64();
    if base == 0.0 {
        0.0
    } else {
        (base - candidate.as_secs_f64()) / base * 100.0
    }
}

impl fmt::Display for BenchmarkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Requests:            {}", self.requests)?;
        writeln!(
            f,
            "Outcomes:            {} recomputed, {} hit, {} conflict_resolved",
            self.outcomes.recomputed, self.outcomes.hits, self.outcomes.conflicts
        )?;
        writeln!(f, "Hit rate:            {:.2}%", self.hit_rate())?;
        writeln!(
            f,
            "Baseline (estimate): total {:?}, avg {:?}",
            self.baseline.total_estimated, self.baseline.average_estimated
        )?;
        writeln!(
            f,
            "Arbiter (estimate):  total {:?}, avg {:?}",
            self.arbiter.total_estimated, self.arbiter.average_estimated
        )?;
        writeln!(
            f,
            "Baseline (measured): total {:?}, avg {:?}",
            self.baseline.total_elapsed, self.baseline.average_elapsed
        )?;
        writeln!(
            f,
            "Arbiter (measured):  total {:?}, avg {:?}",
            self.arbiter.total_elapsed, self.arbiter.average_elapsed
        )?;
        writeln!(
            f,
            "Average latency gain (estimate): {:.2}%",
            self.estimated_improvement_pct
        )?;
        write!(
            f,
            "Average latency gain (measured): {:.2}%",
            self.measured_improvement_pct
        )?;
        if let Some(status) = &self.last_status {
            write!(f, "\nLast status:         {}", status)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_improvement() {
        let gain = improvement(Duration::from_millis(100), Duration::from_millis(30));
        assert!((gain - 70.0).abs() < 1e-9);
        assert_eq!(improvement(Duration::ZERO, Duration::from_millis(5)), 0.0);
        assert!(improvement(Duration::from_millis(10), Duration::from_millis(20)) < 0.0);
    }

    #[test]
    fn test_outcome_counts() {
        let mut counts = OutcomeCounts::default();
        counts.add(ResolutionOutcome::Hit);
        counts.add(ResolutionOutcome::Hit);
        counts.add(ResolutionOutcome::Recomputed);
        assert_eq!(counts.hits, 2);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn test_latency_summary_averages() {
        let summary =
            LatencySummary::from_totals(Duration::from_millis(100), Duration::from_millis(10), 4);
        assert_eq!(summary.average_estimated, Duration::from_millis(25));
        assert_eq!(summary.average_elapsed, Duration::from_micros(2500));
    }
}
