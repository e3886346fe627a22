//! End-to-end routing scenarios
//!
//! These tests drive full request streams through the arbiter and check:
//! - First sight of a segment always recomputes
//! - Unchanged vectors take the fast path
//! - Drifted vectors are reconciled without disturbing other segments
//! - Detector outages fail open

use contextcore::bench::{BenchmarkHarness, WorkloadSpec};
use contextcore::ledger::Ledger;
use contextcore::{
    Arbiter, ContextCoreConfig, ContextCoreError, DistanceMetric, DriftCheck, DriftDetector,
    Request, ResolutionOutcome, SemanticVector,
};
use std::collections::HashMap;

fn segment_vector(index: usize, dimension: usize) -> SemanticVector {
    let values = (0..dimension)
        .map(|d| ((index * 31 + d * 7) % 17) as f32 / 17.0 + 0.1)
        .collect();
    SemanticVector::new(values).unwrap()
}

fn flipped(vector: &SemanticVector) -> SemanticVector {
    SemanticVector::new(vector.as_slice().iter().map(|v| -v).collect()).unwrap()
}

#[tokio::test]
async fn test_unseen_segments_always_recompute() {
    let arbiter = Arbiter::new(ContextCoreConfig::default()).unwrap();

    for i in 0..50 {
        let resolution = arbiter
            .resolve(format!("fresh_{}", i), segment_vector(i, 16))
            .await
            .unwrap();
        assert_eq!(resolution.outcome, ResolutionOutcome::Recomputed);
    }

    assert_eq!(arbiter.metrics().await.recomputed, 50);
}

#[tokio::test]
async fn test_cyclic_identical_vectors() {
    let arbiter = Arbiter::new(ContextCoreConfig::default()).unwrap();
    let vectors: Vec<SemanticVector> = (0..10).map(|i| segment_vector(i, 32)).collect();

    let mut counts: HashMap<ResolutionOutcome, usize> = HashMap::new();
    for i in 0..100 {
        let segment = i % 10;
        let resolution = arbiter
            .resolve(format!("seg_{}", segment), vectors[segment].clone())
            .await
            .unwrap();
        *counts.entry(resolution.outcome).or_default() += 1;

        if i < 10 {
            assert_eq!(resolution.outcome, ResolutionOutcome::Recomputed);
        } else {
            assert_eq!(resolution.outcome, ResolutionOutcome::Hit);
        }
    }

    assert_eq!(counts[&ResolutionOutcome::Recomputed], 10);
    assert_eq!(counts[&ResolutionOutcome::Hit], 90);
    assert!(!counts.contains_key(&ResolutionOutcome::ConflictResolved));
}

#[tokio::test]
async fn test_every_twentieth_request_drifts() {
    let arbiter = Arbiter::new(ContextCoreConfig::default()).unwrap();
    let mut vectors: Vec<SemanticVector> = (0..10).map(|i| segment_vector(i, 32)).collect();

    let mut conflicts = Vec::new();
    let mut hits = 0;
    let mut recomputed = 0;

    for i in 0..100 {
        let segment = i % 10;
        let perturbed = (i + 1) % 20 == 0;
        if perturbed {
            vectors[segment] = flipped(&vectors[segment]);
        }

        let resolution = arbiter
            .resolve(format!("seg_{}", segment), vectors[segment].clone())
            .await
            .unwrap();

        match resolution.outcome {
            ResolutionOutcome::ConflictResolved => {
                assert!(perturbed, "request {} drifted unexpectedly", i);
                conflicts.push(i);
            }
            ResolutionOutcome::Hit => {
                assert!(!perturbed, "perturbed request {} was served from cache", i);
                hits += 1;
            }
            ResolutionOutcome::Recomputed => {
                assert!(i < 10);
                recomputed += 1;
            }
        }
    }

    assert_eq!(conflicts, vec![19, 39, 59, 79, 99]);
    assert_eq!(recomputed, 10);
    assert_eq!(hits, 85);
}

#[tokio::test]
async fn test_harness_matches_manual_drift_scenario() {
    let harness = BenchmarkHarness::new(Arbiter::new(ContextCoreConfig::default()).unwrap());
    let spec = WorkloadSpec::cyclic(100, 10)
        .with_dimension(64)
        .with_drift_every(20);

    let report = harness.run_workload(&spec).await.unwrap();

    assert_eq!(report.outcomes.recomputed, 10);
    assert_eq!(report.outcomes.conflicts, 5);
    assert_eq!(report.outcomes.hits, 85);
    assert_eq!(report.metrics.conflicts, 5);
}

#[tokio::test]
async fn test_streaming_workload_mostly_hits() {
    let harness = BenchmarkHarness::new(Arbiter::new(ContextCoreConfig::default()).unwrap());
    let report = harness
        .run_workload(&WorkloadSpec::streaming(500))
        .await
        .unwrap();

    assert_eq!(report.requests, 500);
    assert_eq!(report.outcomes.recomputed, 100);
    assert_eq!(report.outcomes.hits, 400);
    assert!(report.estimated_improvement_pct > 0.0);
}

#[tokio::test]
async fn test_strict_threshold_catches_streaming_noise() {
    let config = ContextCoreConfig::builder()
        .distance_metric(DistanceMetric::Euclidean)
        .drift_threshold(0.0)
        .build();
    let harness = BenchmarkHarness::new(Arbiter::new(config).unwrap());

    let report = harness
        .run_workload(&WorkloadSpec::streaming(50))
        .await
        .unwrap();

    assert_eq!(report.outcomes.recomputed, 10);
    assert_eq!(report.outcomes.conflicts, 40);
}

#[tokio::test]
async fn test_check_is_repeatable_through_arbiter() {
    let arbiter = Arbiter::new(ContextCoreConfig::default()).unwrap();
    let base = segment_vector(3, 24);

    arbiter.resolve("seg", base.clone()).await.unwrap();
    let first = arbiter.resolve("seg", base.clone()).await.unwrap();
    let second = arbiter.resolve("seg", base).await.unwrap();

    assert_eq!(first.outcome, second.outcome);
    assert_eq!(first.distance, second.distance);
}

struct OfflineDetector;

impl DriftDetector for OfflineDetector {
    fn check(
        &self,
        _stored: &SemanticVector,
        _incoming: &SemanticVector,
        _threshold: f32,
    ) -> contextcore::Result<DriftCheck> {
        Err(ContextCoreError::DetectorUnavailable("service offline".to_string()))
    }

    fn name(&self) -> &str {
        "offline"
    }
}

#[tokio::test]
async fn test_offline_detector_never_serves_cached_result() {
    let arbiter = Arbiter::builder(ContextCoreConfig::default())
        .detector(Box::new(OfflineDetector))
        .build()
        .unwrap();
    let v = segment_vector(1, 8);

    let first = arbiter.resolve("seg", v.clone()).await.unwrap();
    assert_eq!(first.outcome, ResolutionOutcome::Recomputed);

    for _ in 0..5 {
        let resolution = arbiter.resolve("seg", v.clone()).await.unwrap();
        assert_eq!(resolution.outcome, ResolutionOutcome::ConflictResolved);
        assert!(resolution.failed_open);
    }

    let metrics = arbiter.metrics().await;
    assert_eq!(metrics.detector_failures, 5);
    assert_eq!(metrics.hits, 0);
}

#[tokio::test]
async fn test_malformed_vector_rejected_before_ledger() {
    assert!(SemanticVector::new(vec![f32::NAN, 1.0]).is_err());
    assert!(SemanticVector::new(Vec::new()).is_err());

    let config = ContextCoreConfig::builder().dimension(8).build();
    let arbiter = Arbiter::new(config).unwrap();

    let err = arbiter
        .resolve_request(Request::new("seg", segment_vector(0, 4)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ContextCoreError::DimensionMismatch {
            expected: 8,
            actual: 4
        }
    ));
    assert!(arbiter.ledger().is_empty().await);
}
