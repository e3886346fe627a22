//! Fallback recompute (L1 tier)
//!
//! Invoked on a ledger miss to fully reprocess a segment's context. The
//! cost grows with the workload: the provided implementation runs
//! `tokens * passes` reduction passes over the vector.

use crate::error::{ContextCoreError, Result};
use crate::vector::SemanticVector;
use std::hint::black_box;
use std::time::{Duration, Instant};
use tracing::debug;

/// Result of a full recompute
#[derive(Debug, Clone)]
pub struct Recomputation {
    /// Resolved vector to commit to the ledger
    pub vector: SemanticVector,

    /// Vector components processed
    pub work_units: u64,

    /// Wall-clock time spent
    pub elapsed: Duration,
}

/// Pluggable full-context recompute path
pub trait Recompute: Send + Sync {
    /// Reprocess a segment of `tokens` context tokens
    fn recompute(&self, vector: &SemanticVector, tokens: usize) -> Result<Recomputation>;
}

/// Reference recompute that performs real work proportional to
/// `tokens * passes * dimension` and resolves to the incoming vector
#[derive(Debug, Clone, Copy)]
pub struct FullContextRecompute {
    passes: usize,
}

impl FullContextRecompute {
    pub fn new(passes: usize) -> Self {
        Self {
            passes: passes.max(1),
        }
    }

    pub fn passes(&self) -> usize {
        self.passes
    }
}

impl Default for FullContextRecompute {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Recompute for FullContextRecompute {
    fn recompute(&self, vector: &SemanticVector, tokens: usize) -> Result<Recomputation> {
        let start = Instant::now();
        let rounds = tokens.max(1).checked_mul(self.passes).ok_or_else(|| {
            ContextCoreError::Recompute(format!("workload too large: {} tokens", tokens))
        })?;

        let values = vector.as_slice();
        let mut accumulator = 0.0f32;
        for round in 0..rounds {
            let phase = (round % 7) as f32 + 1.0;
            for &v in values {
                accumulator = black_box(accumulator * 0.5 + v * phase);
            }
        }
        black_box(accumulator);

        let work_units = (rounds as u64).saturating_mul(values.len() as u64);
        let elapsed = start.elapsed();
        debug!(
            "Full recompute: {} tokens, {} passes, {} work units in {:?}",
            tokens, self.passes, work_units, elapsed
        );

        Ok(Recomputation {
            vector: vector.clone(),
            work_units,
            elapsed,
        })
    }
}
