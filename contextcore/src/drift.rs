//! Drift detection between a stored and an incoming segment vector

use crate::error::{ContextCoreError, Result};
use crate::vector::SemanticVector;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Distance metric used to compare two vectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// `1 - cos(a, b)`, in [0, 2]
    Cosine,
    /// L2 distance
    Euclidean,
}

impl DistanceMetric {
    /// Distance between two vectors of equal dimension
    pub fn distance(&self, a: &SemanticVector, b: &SemanticVector) -> Result<f32> {
        a.ensure_dimension(b.dimension())?;

        let distance = match self {
            DistanceMetric::Cosine => {
                let (na, nb) = (a.norm(), b.norm());
                match (na == 0.0, nb == 0.0) {
                    (true, true) => 0.0,
                    (true, false) | (false, true) => 1.0,
                    (false, false) => {
                        let cos = (a.dot(b) / (na * nb)).clamp(-1.0, 1.0);
                        1.0 - cos
                    }
                }
            }
            DistanceMetric::Euclidean => a
                .as_slice()
                .iter()
                .zip(b.as_slice())
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f32>()
                .sqrt(),
        };

        Ok(distance)
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceMetric::Cosine => write!(f, "cosine"),
            DistanceMetric::Euclidean => write!(f, "euclidean"),
        }
    }
}

impl FromStr for DistanceMetric {
    type Err = ContextCoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cosine" => Ok(DistanceMetric::Cosine),
            "euclidean" | "l2" => Ok(DistanceMetric::Euclidean),
            other => Err(ContextCoreError::ConfigError(format!(
                "unknown distance metric: {}",
                other
            ))),
        }
    }
}

/// Outcome of a drift check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftVerdict {
    /// Within tolerance; the stored result can be reused
    Match,
    /// Beyond tolerance
    Drift,
}

impl DriftVerdict {
    pub fn is_drift(&self) -> bool {
        matches!(self, DriftVerdict::Drift)
    }
}

/// Verdict plus the measured distance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriftCheck {
    pub verdict: DriftVerdict,
    pub distance: f32,
}

/// Pluggable drift detector
///
/// Implementations must be deterministic: the same vectors and threshold
/// always produce the same verdict.
pub trait DriftDetector: Send + Sync {
    /// Compare `incoming` against `stored`; drift iff the distance exceeds `threshold`
    fn check(
        &self,
        stored: &SemanticVector,
        incoming: &SemanticVector,
        threshold: f32,
    ) -> Result<DriftCheck>;

    /// Name used in logs
    fn name(&self) -> &str;
}

/// Threshold detector over a [`DistanceMetric`]
#[derive(Debug, Clone, Copy)]
pub struct DistanceDetector {
    metric: DistanceMetric,
}

impl DistanceDetector {
    pub fn new(metric: DistanceMetric) -> Self {
        Self { metric }
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }
}

impl Default for DistanceDetector {
    fn default() -> Self {
        Self::new(DistanceMetric::Cosine)
    }
}

impl DriftDetector for DistanceDetector {
    fn check(
        &self,
        stored: &SemanticVector,
        incoming: &SemanticVector,
        threshold: f32,
    ) -> Result<DriftCheck> {
        let distance = self.metric.distance(stored, incoming).map_err(|e| {
            ContextCoreError::DetectorUnavailable(format!("{} distance failed: {}", self.metric, e))
        })?;

        let verdict = if distance > threshold {
            DriftVerdict::Drift
        } else {
            DriftVerdict::Match
        };

        Ok(DriftCheck { verdict, distance })
    }

    fn name(&self) -> &str {
        match self.metric {
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::Euclidean => "euclidean",
        }
    }
}
