//! # ContextCore
//!
//! A two-tier inference-result cache with drift-aware invalidation.
//!
//! Each request names a context segment and carries the segment's current
//! semantic vector. The [`Arbiter`] consults the [`Ledger`](ledger::Ledger)
//! of last-resolved vectors and takes one of three paths:
//!
//! - **Miss** - full recompute (L1), result committed to the ledger
//! - **Hit, no drift** - fast path (L2), stored result reused
//! - **Hit, drift** - conflict resolution, ledger updated
//!
//! ## Features
//!
//! - Deterministic drift detection (cosine or Euclidean distance against a
//!   configurable threshold), pluggable via [`DriftDetector`]
//! - Injected, async ledger with LRU bound and optional TTL
//! - Fail-open handling of detector errors
//! - Configurable cost model and measured latency per request
//! - Benchmark harness comparing against an always-recompute baseline
//!
//! ## Resolving Requests
//!
//! ```rust
//! use contextcore::{Arbiter, ContextCoreConfig, ResolutionOutcome, SemanticVector};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ContextCoreConfig::builder()
//!         .drift_threshold(0.05)
//!         .max_entries(10_000)
//!         .build();
//!     let arbiter = Arbiter::new(config)?;
//!
//!     let vector = SemanticVector::new(vec![0.1, 0.7, 0.2])?;
//!
//!     let first = arbiter.resolve("seg_0", vector.clone()).await?;
//!     assert_eq!(first.outcome, ResolutionOutcome::Recomputed);
//!
//!     let second = arbiter.resolve("seg_0", vector).await?;
//!     assert_eq!(second.outcome, ResolutionOutcome::Hit);
//!
//!     println!("{}", arbiter.metrics().await);
//!     Ok(())
//! }
//! ```
//!
//! ## Sharing a Ledger
//!
//! ```rust
//! use std::sync::Arc;
//! use contextcore::ledger::{InMemoryLedger, Ledger};
//! use contextcore::{Arbiter, ContextCoreConfig};
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = ContextCoreConfig::small();
//! let ledger: Arc<dyn Ledger> = Arc::new(InMemoryLedger::new(config.clone()));
//!
//! let arbiter = Arbiter::with_ledger(config, ledger.clone())?;
//! # Ok(())
//! # }
//! ```

pub mod arbiter;
pub mod bench;
pub mod config;
pub mod conflict;
pub mod drift;
pub mod error;
pub mod ledger;
pub mod recompute;
pub mod vector;

// Re-export main types for convenience
pub use arbiter::{
    Arbiter, ArbiterBuilder, ArbiterMetrics, CostModel, Request, Resolution, ResolutionOutcome,
};
pub use bench::{BenchmarkHarness, BenchmarkReport, WorkloadKind, WorkloadSpec};
pub use config::{ContextCoreConfig, ContextCoreConfigBuilder};
pub use conflict::ConflictStrategy;
pub use drift::{DistanceDetector, DistanceMetric, DriftCheck, DriftDetector, DriftVerdict};
pub use error::{ContextCoreError, Result};
pub use ledger::{InMemoryLedger, Ledger, LedgerEntry, LedgerStats};
pub use recompute::{FullContextRecompute, Recompute, Recomputation};
pub use vector::{SegmentId, SemanticVector};
