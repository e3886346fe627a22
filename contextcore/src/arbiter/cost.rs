//! Latency estimates per resolution outcome

use crate::arbiter::outcome::ResolutionOutcome;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configurable cost model
///
/// Defaults: a full pass costs 50ms per 1000 tokens, a fast-path hit 1.5ms
/// and a conflict 8ms plus a small per-token merge cost. These are
/// estimates for reporting, not measurements.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostModel {
    /// Full recompute cost per context token
    #[serde(with = "crate::config::duration_ms")]
    pub recompute_per_token: Duration,

    /// Fast-path cost, independent of workload
    #[serde(with = "crate::config::duration_ms")]
    pub hit_latency: Duration,

    /// Fixed conflict-resolution penalty
    #[serde(with = "crate::config::duration_ms")]
    pub conflict_latency: Duration,

    /// Conflict-resolution cost per context token
    #[serde(with = "crate::config::duration_ms")]
    pub conflict_per_token: Duration,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            recompute_per_token: Duration::from_micros(50),
            hit_latency: Duration::from_micros(1500),
            conflict_latency: Duration::from_millis(8),
            conflict_per_token: Duration::from_nanos(1500),
        }
    }
}

impl CostModel {
    /// Estimated latency of `outcome` for a workload of `tokens`
    pub fn estimate(&self, outcome: ResolutionOutcome, tokens: usize) -> Duration {
        match outcome {
            ResolutionOutcome::Recomputed => scale(self.recompute_per_token, tokens),
            ResolutionOutcome::Hit => self.hit_latency,
            ResolutionOutcome::ConflictResolved => self
                .conflict_latency
                .saturating_add(scale(self.conflict_per_token, tokens)),
        }
    }

    /// Cost of the always-recompute baseline
    pub fn baseline(&self, tokens: usize) -> Duration {
        self.estimate(ResolutionOutcome::Recomputed, tokens)
    }
}

fn scale(per_unit: Duration, units: usize) -> Duration {
    let nanos = per_unit.as_nanos().saturating_mul(units as u128);
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}
