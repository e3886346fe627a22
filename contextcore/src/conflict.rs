//! Reconciling a drifted segment vector with its committed predecessor

use crate::error::{ContextCoreError, Result};
use crate::vector::SemanticVector;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the arbiter resolves a drifted segment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ConflictStrategy {
    /// The incoming vector replaces the stored one
    AdoptIncoming,

    /// Move the stored vector toward the incoming one by `weight` in (0, 1]
    Blend { weight: f32 },
}

impl ConflictStrategy {
    /// Produce the vector to commit for a drifted segment
    pub fn resolve(&self, stored: &SemanticVector, incoming: &SemanticVector) -> Result<SemanticVector> {
        match self {
            ConflictStrategy::AdoptIncoming => {
                incoming.ensure_dimension(stored.dimension())?;
                Ok(incoming.clone())
            }
            ConflictStrategy::Blend { weight } => stored.lerp(incoming, *weight),
        }
    }
}

impl Default for ConflictStrategy {
    fn default() -> Self {
        ConflictStrategy::AdoptIncoming
    }
}

impl fmt::Display for ConflictStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictStrategy::AdoptIncoming => write!(f, "adopt_incoming"),
            ConflictStrategy::Blend { weight } => write!(f, "blend({})", weight),
        }
    }
}

impl FromStr for ConflictStrategy {
    type Err = ContextCoreError;

    /// Accepts `adopt_incoming`, `blend` (weight 0.5), `blend:<weight>`
    /// and the Display form `blend(<weight>)`
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_ascii_lowercase();
        let weight = match s.as_str() {
            "adopt_incoming" | "adopt" => return Ok(ConflictStrategy::AdoptIncoming),
            "blend" => "0.5",
            other => other
                .strip_prefix("blend:")
                .or_else(|| other.strip_prefix("blend(").and_then(|w| w.strip_suffix(')')))
                .ok_or_else(|| {
                    ContextCoreError::ConfigError(format!("unknown conflict strategy: {}", other))
                })?,
        };

        let weight: f32 = weight.trim().parse().map_err(|_| {
            ContextCoreError::ConfigError(format!("invalid blend weight: {:?}", weight))
        })?;
        Ok(ConflictStrategy::Blend { weight })
    }
}
