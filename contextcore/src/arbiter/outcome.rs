//! Requests and their resolutions

use crate::vector::{SegmentId, SemanticVector};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Which path the arbiter took for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionOutcome {
    /// Ledger miss, full recompute (L1)
    Recomputed,
    /// Ledger hit without drift, fast path (L2)
    Hit,
    /// Ledger hit with drift, reconciled and committed
    ConflictResolved,
}

impl ResolutionOutcome {
    /// Status label used in reports
    pub fn label(&self) -> &'static str {
        match self {
            ResolutionOutcome::Recomputed => "recomputed",
            ResolutionOutcome::Hit => "hit",
            ResolutionOutcome::ConflictResolved => "conflict_resolved",
        }
    }
}

impl fmt::Display for ResolutionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A segment lookup carrying the segment's current vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub segment_id: SegmentId,

    pub vector: SemanticVector,

    /// Context tokens behind the segment; defaults to the vector dimension
    pub tokens: Option<usize>,
}

impl Request {
    pub fn new(segment_id: impl Into<SegmentId>, vector: SemanticVector) -> Self {
        Self {
            segment_id: segment_id.into(),
            vector,
            tokens: None,
        }
    }

    pub fn with_tokens(mut self, tokens: usize) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Workload size used for cost estimates and recompute work
    pub fn tokens(&self) -> usize {
        self.tokens.unwrap_or_else(|| self.vector.dimension())
    }
}

/// Result of resolving one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub segment_id: SegmentId,

    pub outcome: ResolutionOutcome,

    /// Cost-model latency for the path taken
    #[serde(with = "crate::config::duration_ms")]
    pub estimated_latency: Duration,

    /// Measured wall-clock time inside the arbiter
    #[serde(with = "crate::config::duration_ms")]
    pub elapsed: Duration,

    /// Drift distance, when a comparison took place
    pub distance: Option<f32>,

    /// The detector failed and drift was assumed
    pub failed_open: bool,
}

impl Resolution {
    pub fn is_hit(&self) -> bool {
        self.outcome == ResolutionOutcome::Hit
    }

    /// Status label of the outcome
    pub fn status(&self) -> &'static str {
        self.outcome.label()
    }
}
