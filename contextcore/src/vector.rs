//! Semantic vectors and segment identifiers

use crate::error::{ContextCoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Segment identifier - opaque string key
pub type SegmentId = String;

/// Fixed-dimension semantic vector attached to a segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SemanticVector(Vec<f32>);

impl SemanticVector {
    /// Build a vector, rejecting empty or non-finite input
    pub fn new(values: Vec<f32>) -> Result<Self> {
        if values.is_empty() {
            return Err(ContextCoreError::InvalidVector(
                "vector must have at least one component".to_string(),
            ));
        }

        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(ContextCoreError::InvalidVector(format!(
                "component {} is not finite ({})",
                index, values[index]
            )));
        }

        Ok(Self(values))
    }

    /// Build a vector and check it against an expected dimension
    pub fn with_dimension(values: Vec<f32>, dimension: usize) -> Result<Self> {
        let vector = Self::new(values)?;
        vector.ensure_dimension(dimension)?;
        Ok(vector)
    }

    /// Zero vector of the given dimension
    pub fn zeros(dimension: usize) -> Result<Self> {
        Self::new(vec![0.0; dimension])
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }

    /// Fail with `DimensionMismatch` unless the vector has `expected` components
    pub fn ensure_dimension(&self, expected: usize) -> Result<()> {
        if self.0.len() != expected {
            return Err(ContextCoreError::DimensionMismatch {
                expected,
                actual: self.0.len(),
            });
        }
        Ok(())
    }

    pub fn dot(&self, other: &SemanticVector) -> f32 {
        self.0.iter().zip(other.0.iter()).map(|(a, b)| a * b).sum()
    }

    /// Euclidean (L2) norm
    pub fn norm(&self) -> f32 {
        self.0.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    /// Unit-length copy; the zero vector is returned unchanged
    pub fn normalized(&self) -> SemanticVector {
        let norm = self.norm();
        if norm == 0.0 {
            return self.clone();
        }
        SemanticVector(self.0.iter().map(|v| v / norm).collect())
    }

    /// Linear interpolation toward `other`: `self + weight * (other - self)`
    pub fn lerp(&self, other: &SemanticVector, weight: f32) -> Result<SemanticVector> {
        other.ensure_dimension(self.dimension())?;
        SemanticVector::new(
            self.0
                .iter()
                .zip(other.0.iter())
                .map(|(a, b)| a + weight * (b - a))
                .collect(),
        )
    }

    /// Approximate heap footprint in bytes
    pub fn size_bytes(&self) -> usize {
        self.0.len() * std::mem::size_of::<f32>()
    }
}

impl TryFrom<Vec<f32>> for SemanticVector {
    type Error = ContextCoreError;

    fn try_from(values: Vec<f32>) -> Result<Self> {
        SemanticVector::new(values)
    }
}

impl AsRef<[f32]> for SemanticVector {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}

impl fmt::Display for SemanticVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SemanticVector(dim={}, norm={:.4})", self.dimension(), self.norm())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_vector() {
        let err = SemanticVector::new(Vec::new()).unwrap_err();
        assert!(matches!(err, ContextCoreError::InvalidVector(_)));
    }

    #[test]
    fn test_rejects_non_finite_components() {
        let err = SemanticVector::new(vec![1.0, f32::NAN, 0.0]).unwrap_err();
        assert!(err.to_string().contains("component 1"));

        assert!(SemanticVector::new(vec![f32::INFINITY]).is_err());
    }

    #[test]
    fn test_dimension_check() {
        let err = SemanticVector::with_dimension(vec![1.0, 2.0], 3).unwrap_err();
        assert!(matches!(
            err,
            ContextCoreError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));

        assert!(SemanticVector::with_dimension(vec![1.0, 2.0, 3.0], 3).is_ok());
    }

    #[test]
    fn test_norm_and_normalized() {
        let v = SemanticVector::new(vec![3.0, 4.0]).unwrap();
        assert_eq!(v.norm(), 5.0);

        let unit = v.normalized();
        assert!((unit.norm() - 1.0).abs() < 1e-6);

        let zero = SemanticVector::zeros(4).unwrap();
        assert_eq!(zero.normalized(), zero);
    }

    #[test]
    fn test_lerp() {
        let a = SemanticVector::new(vec![0.0, 0.0]).unwrap();
        let b = SemanticVector::new(vec![2.0, 4.0]).unwrap();

        assert_eq!(a.lerp(&b, 0.5).unwrap().as_slice(), &[1.0, 2.0]);
        assert_eq!(a.lerp(&b, 1.0).unwrap(), b);

        let c = SemanticVector::new(vec![1.0]).unwrap();
        assert!(a.lerp(&c, 0.5).is_err());
    }

    #[test]
    fn test_serde_is_transparent() {
        let v = SemanticVector::new(vec![0.5, -1.0]).unwrap();
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, "[0.5,-1.0]");
    }
}
