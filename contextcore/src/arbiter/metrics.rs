//! Arbiter counters and their export

use crate::arbiter::outcome::{Resolution, ResolutionOutcome};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Hit/miss/conflict counts and accumulated latency
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArbiterMetrics {
    /// Successfully resolved requests
    pub requests: u64,

    /// Ledger misses routed to the full recompute
    pub recomputed: u64,

    /// Fast-path hits
    pub hits: u64,

    /// Drifted segments reconciled
    pub conflicts: u64,

    /// Detector errors (failed open or propagated)
    pub detector_failures: u64,

    /// Requests that ended in an error
    pub errors: u64,

    /// Vector components processed by full recomputes
    pub recompute_work_units: u64,

    #[serde(with = "crate::config::duration_ms")]
    pub total_estimated: Duration,

    #[serde(with = "crate::config::duration_ms")]
    pub total_elapsed: Duration,
}

impl ArbiterMetrics {
    pub(crate) fn record(&mut self, resolution: &Resolution) {
        self.requests += 1;
        match resolution.outcome {
            ResolutionOutcome::Recomputed => self.recomputed += 1,
            ResolutionOutcome::Hit => self.hits += 1,
            ResolutionOutcome::ConflictResolved => self.conflicts += 1,
        }
        self.total_estimated = self.total_estimated.saturating_add(resolution.estimated_latency);
        self.total_elapsed = self.total_elapsed.saturating_add(resolution.elapsed);
    }

    /// Count for one outcome
    pub fn count(&self, outcome: ResolutionOutcome) -> u64 {
        match outcome {
            ResolutionOutcome::Recomputed => self.recomputed,
            ResolutionOutcome::Hit => self.hits,
            ResolutionOutcome::ConflictResolved => self.conflicts,
        }
    }

    /// Fast-path hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        percentage(self.hits, self.requests)
    }

    /// Conflict rate as a percentage
    pub fn conflict_rate(&self) -> f64 {
        percentage(self.conflicts, self.requests)
    }

    /// Average estimated latency per request
    pub fn average_estimated(&self) -> Duration {
        average(self.total_estimated, self.requests)
    }

    /// Average measured latency per request
    pub fn average_elapsed(&self) -> Duration {
        average(self.total_elapsed, self.requests)
    }

    /// Export as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub(crate) fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}

pub(crate) fn average(total: Duration, count: u64) -> Duration {
    if count == 0 {
        Duration::ZERO
    } else {
        Duration::from_nanos((total.as_nanos() / count as u128) as u64)
    }
}

impl fmt::Display for ArbiterMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ArbiterMetrics {{ requests: {}, recomputed: {}, hits: {}, conflicts: {}, hit_rate: {:.2}%, detector_failures: {}, errors: {} }}",
            self.requests,
            self.recomputed,
            self.hits,
            self.conflicts,
            self.hit_rate(),
            self.detector_failures,
            self.errors
        )
    }
}
