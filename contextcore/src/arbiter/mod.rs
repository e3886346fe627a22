//! # Arbiter (L2 tier)
//!
//! Routes each request to one of three paths:
//!
//! | Ledger state | Drift check | Path | Outcome |
//! |--------------|-------------|------|---------|
//! | miss | - | full recompute, insert | `Recomputed` |
//! | hit | match | fast path | `Hit` |
//! | hit | drift | conflict resolution, update | `ConflictResolved` |
//!
//! When the detector fails and `fail_open` is set, drift is assumed and the
//! segment is recomputed from the incoming vector, so a broken detector can
//! only cost latency, never serve a stale result.
//!
//! Full recomputes run on tokio's blocking pool.

pub mod cost;
pub mod metrics;
pub mod outcome;

use crate::config::ContextCoreConfig;
use crate::drift::{DistanceDetector, DriftDetector};
use crate::error::{ContextCoreError, Result};
use crate::ledger::{InMemoryLedger, Ledger};
use crate::recompute::{FullContextRecompute, Recompute, Recomputation};
use crate::vector::{SegmentId, SemanticVector};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

pub use cost::CostModel;
pub use metrics::ArbiterMetrics;
pub use outcome::{Request, Resolution, ResolutionOutcome};

/// Drift-aware routing over an injected ledger
pub struct Arbiter {
    config: ContextCoreConfig,

    ledger: Arc<dyn Ledger>,

    detector: Box<dyn DriftDetector>,

    recompute: Arc<dyn Recompute>,

    metrics: RwLock<ArbiterMetrics>,
}

impl Arbiter {
    /// Arbiter with an in-memory ledger and the default detector and recompute
    pub fn new(config: ContextCoreConfig) -> Result<Self> {
        ArbiterBuilder::new(config).build()
    }

    /// Arbiter over a caller-owned ledger
    pub fn with_ledger(config: ContextCoreConfig, ledger: Arc<dyn Ledger>) -> Result<Self> {
        ArbiterBuilder::new(config).ledger(ledger).build()
    }

    pub fn builder(config: ContextCoreConfig) -> ArbiterBuilder {
        ArbiterBuilder::new(config)
    }

    pub fn config(&self) -> &ContextCoreConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Arc<dyn Ledger> {
        &self.ledger
    }

    /// Resolve a segment whose workload size equals its vector dimension
    pub async fn resolve(
        &self,
        segment_id: impl Into<SegmentId>,
        vector: SemanticVector,
    ) -> Result<Resolution> {
        self.resolve_request(Request::new(segment_id, vector)).await
    }

    /// Resolve one request
    pub async fn resolve_request(&self, request: Request) -> Result<Resolution> {
        match self.route(request).await {
            Ok(resolution) => {
                if self.config.enable_metrics {
                    self.metrics.write().await.record(&resolution);
                }
                Ok(resolution)
            }
            Err(e) => {
                if self.config.enable_metrics {
                    let mut metrics = self.metrics.write().await;
                    metrics.errors += 1;
                    if matches!(e, ContextCoreError::DetectorUnavailable(_)) {
                        metrics.detector_failures += 1;
                    }
                }
                Err(e)
            }
        }
    }

    /// Commit a vector for a segment without counting a request
    pub async fn warm(&self, segment_id: &str, vector: SemanticVector) -> Result<()> {
        self.validate(segment_id, &vector)?;
        self.ledger.put(segment_id, vector).await?;
        debug!("Warmed segment: {}", segment_id);
        Ok(())
    }

    /// Drop a segment so its next request recomputes; true if it was present
    pub async fn invalidate(&self, segment_id: &str) -> Result<bool> {
        let removed = self.ledger.remove(segment_id).await?.is_some();
        if removed {
            info!("Invalidated segment: {}", segment_id);
        }
        Ok(removed)
    }

    /// Snapshot of the counters
    pub async fn metrics(&self) -> ArbiterMetrics {
        self.metrics.read().await.clone()
    }

    pub async fn reset_metrics(&self) {
        *self.metrics.write().await = ArbiterMetrics::default();
    }

    fn validate(&self, segment_id: &str, vector: &SemanticVector) -> Result<()> {
        if segment_id.trim().is_empty() {
            return Err(ContextCoreError::InvalidSegment(
                "segment id must not be empty".to_string(),
            ));
        }
        if let Some(dimension) = self.config.dimension {
            vector.ensure_dimension(dimension)?;
        }
        Ok(())
    }

    async fn route(&self, request: Request) -> Result<Resolution> {
        self.validate(&request.segment_id, &request.vector)?;

        let start = Instant::now();
        let tokens = request.tokens();
        let Request {
            segment_id, vector, ..
        } = request;

        let stored = self.ledger.get(&segment_id).await?;

        let (outcome, distance, failed_open) = match stored {
            None => {
                let result = self.run_recompute(&vector, tokens).await?;
                self.ledger.put(&segment_id, result.vector).await?;
                self.add_work(result.work_units).await;
                (ResolutionOutcome::Recomputed, None, false)
            }
            Some(stored) => {
                match self
                    .detector
                    .check(&stored, &vector, self.config.drift_threshold)
                {
                    Ok(check) if check.verdict.is_drift() => {
                        let resolved = self.config.conflict_strategy.resolve(&stored, &vector)?;
                        self.ledger.put(&segment_id, resolved).await?;
                        (ResolutionOutcome::ConflictResolved, Some(check.distance), false)
                    }
                    Ok(check) => (ResolutionOutcome::Hit, Some(check.distance), false),
                    Err(e) if self.config.fail_open => {
                        warn!(
                            "Drift detector {} failed for {}, assuming drift: {}",
                            self.detector.name(),
                            segment_id,
                            e
                        );
                        if self.config.enable_metrics {
                            self.metrics.write().await.detector_failures += 1;
                        }
                        let result = self.run_recompute(&vector, tokens).await?;
                        self.ledger.put(&segment_id, result.vector).await?;
                        self.add_work(result.work_units).await;
                        (ResolutionOutcome::ConflictResolved, None, true)
                    }
                    Err(e) => return Err(e),
                }
            }
        };

        let estimated_latency = if failed_open {
            self.config.cost_model.baseline(tokens)
        } else {
            self.config.cost_model.estimate(outcome, tokens)
        };
        let elapsed = start.elapsed();

        debug!(
            "Resolved {} -> {} (distance: {:?}, estimated: {:?}, elapsed: {:?})",
            segment_id, outcome, distance, estimated_latency, elapsed
        );

        Ok(Resolution {
            segment_id,
            outcome,
            estimated_latency,
            elapsed,
            distance,
            failed_open,
        })
    }

    /// Full recompute on the blocking pool, off the async workers
    async fn run_recompute(&self, vector: &SemanticVector, tokens: usize) -> Result<Recomputation> {
        let recompute = Arc::clone(&self.recompute);
        let vector = vector.clone();
        tokio::task::spawn_blocking(move || recompute.recompute(&vector, tokens))
            .await
            .map_err(|e| ContextCoreError::Recompute(format!("recompute task failed: {}", e)))?
    }

    async fn add_work(&self, work_units: u64) {
        if self.config.enable_metrics {
            let mut metrics = self.metrics.write().await;
            metrics.recompute_work_units = metrics.recompute_work_units.saturating_add(work_units);
        }
    }
}

/// Builder for an [`Arbiter`] with injected components
pub struct ArbiterBuilder {
    config: ContextCoreConfig,
    ledger: Option<Arc<dyn Ledger>>,
    detector: Option<Box<dyn DriftDetector>>,
    recompute: Option<Box<dyn Recompute>>,
}

impl ArbiterBuilder {
    pub fn new(config: ContextCoreConfig) -> Self {
        Self {
            config,
            ledger: None,
            detector: None,
            recompute: None,
        }
    }

    /// Use a caller-owned ledger instead of a fresh in-memory one
    pub fn ledger(mut self, ledger: Arc<dyn Ledger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Replace the distance detector
    pub fn detector(mut self, detector: Box<dyn DriftDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    /// Replace the fallback recompute
    pub fn recompute(mut self, recompute: Box<dyn Recompute>) -> Self {
        self.recompute = Some(recompute);
        self
    }

    /// Validate the configuration and assemble the arbiter
    pub fn build(self) -> Result<Arbiter> {
        self.config.validate()?;

        let config = self.config;
        let ledger = self
            .ledger
            .unwrap_or_else(|| Arc::new(InMemoryLedger::new(config.clone())));
        let detector = self
            .detector
            .unwrap_or_else(|| Box::new(DistanceDetector::new(config.distance_metric)));
        let recompute: Arc<dyn Recompute> = match self.recompute {
            Some(recompute) => Arc::from(recompute),
            None => Arc::new(FullContextRecompute::new(config.recompute_passes)),
        };

        info!(
            "Initializing arbiter (detector: {}, threshold: {}, strategy: {}, fail_open: {})",
            detector.name(),
            config.drift_threshold,
            config.conflict_strategy,
            config.fail_open
        );

        Ok(Arbiter {
            config,
            ledger,
            detector,
            recompute,
            metrics: RwLock::new(ArbiterMetrics::default()),
        })
    }
}
