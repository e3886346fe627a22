//! Reproducible synthetic request streams

use crate::arbiter::Request;
use crate::error::{ContextCoreError, Result};
use crate::vector::SemanticVector;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Shape of the generated request stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkloadKind {
    /// Visit `seg_0..seg_{segments-1}` in order with a fixed vector per
    /// segment. With `drift_every = Some(n)`, every n-th request (1-based)
    /// flips its segment's vector, and later requests for that segment
    /// carry the flipped vector.
    Cyclic {
        segments: usize,
        drift_every: Option<usize>,
    },

    /// Every `new_context_every`-th request opens a new segment with a fresh
    /// vector; the others continue the current segment with additive
    /// Gaussian noise of standard deviation `noise`.
    Streaming { new_context_every: usize, noise: f32 },
}

/// Parameters of a synthetic workload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadSpec {
    pub requests: usize,
    pub dimension: usize,
    pub seed: u64,
    /// Context tokens per request; `None` uses the dimension
    pub tokens: Option<usize>,
    pub kind: WorkloadKind,
}

impl WorkloadSpec {
    /// Cyclic workload over `segments` identifiers, 128-dimensional
    pub fn cyclic(requests: usize, segments: usize) -> Self {
        Self {
            requests,
            dimension: 128,
            seed: 42,
            tokens: None,
            kind: WorkloadKind::Cyclic {
                segments,
                drift_every: None,
            },
        }
    }

    /// Streaming workload: new context every 5 requests, noise 0.01
    pub fn streaming(requests: usize) -> Self {
        Self {
            requests,
            dimension: 128,
            seed: 42,
            tokens: None,
            kind: WorkloadKind::Streaming {
                new_context_every: 5,
                noise: 0.01,
            },
        }
    }

    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_tokens(mut self, tokens: usize) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Cyclic only: flip a segment's vector on every n-th request
    pub fn with_drift_every(mut self, n: usize) -> Self {
        if let WorkloadKind::Cyclic { drift_every, .. } = &mut self.kind {
            *drift_every = Some(n);
        }
        self
    }

    /// Streaming only: override how often a new context starts and the noise
    pub fn with_streaming(mut self, every: usize, amplitude: f32) -> Self {
        if let WorkloadKind::Streaming {
            new_context_every,
            noise,
        } = &mut self.kind
        {
            *new_context_every = every;
            *noise = amplitude;
        }
        self
    }

    fn validate(&self) -> Result<()> {
        if self.dimension == 0 {
            return Err(ContextCoreError::ConfigError(
                "workload dimension must be greater than 0".to_string(),
            ));
        }
        match &self.kind {
            WorkloadKind::Cyclic { segments, drift_every } => {
                if *segments == 0 {
                    return Err(ContextCoreError::ConfigError(
                        "cyclic workload needs at least one segment".to_string(),
                    ));
                }
                if *drift_every == Some(0) {
                    return Err(ContextCoreError::ConfigError(
                        "drift_every must be greater than 0".to_string(),
                    ));
                }
            }
            WorkloadKind::Streaming {
                new_context_every,
                noise,
            } => {
                if *new_context_every == 0 {
                    return Err(ContextCoreError::ConfigError(
                        "new_context_every must be greater than 0".to_string(),
                    ));
                }
                if !noise.is_finite() || *noise < 0.0 {
                    return Err(ContextCoreError::ConfigError(
                        "noise must be a non-negative finite number".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Generate the request stream; same spec, same requests
    pub fn generate(&self) -> Result<Vec<Request>> {
        self.validate()?;
        let mut rng = StdRng::seed_from_u64(self.seed);

        let requests = match &self.kind {
            WorkloadKind::Cyclic {
                segments,
                drift_every,
            } => {
                let mut vectors: Vec<Vec<f32>> = (0..*segments)
                    .map(|_| random_vector(&mut rng, self.dimension))
                    .collect();

                let mut out = Vec::with_capacity(self.requests);
                for i in 0..self.requests {
                    let segment = i % segments;
                    if drift_every.map_or(false, |n| (i + 1) % n == 0) {
                        for v in vectors[segment].iter_mut() {
                            *v = -*v;
                        }
                    }
                    out.push(self.request(format!("seg_{}", segment), vectors[segment].clone())?);
                }
                out
            }
            WorkloadKind::Streaming {
                new_context_every,
                noise,
            } => {
                let normal = Normal::new(0.0f32, *noise)
                    .map_err(|e| ContextCoreError::ConfigError(format!("invalid noise: {}", e)))?;
                let mut current = random_vector(&mut rng, self.dimension);
                let mut context = 0usize;

                let mut out = Vec::with_capacity(self.requests);
                for i in 0..self.requests {
                    if i % new_context_every == 0 {
                        if i > 0 {
                            current = random_vector(&mut rng, self.dimension);
                            context += 1;
                        }
                    } else if *noise > 0.0 {
                        for v in current.iter_mut() {
                            *v += normal.sample(&mut rng);
                        }
                    }
                    out.push(self.request(format!("ctx_{}", context), current.clone())?);
                }
                out
            }
        };

        Ok(requests)
    }

    fn request(&self, segment_id: String, values: Vec<f32>) -> Result<Request> {
        let request = Request::new(segment_id, SemanticVector::new(values)?);
        Ok(match self.tokens {
            Some(tokens) => request.with_tokens(tokens),
            None => request,
        })
    }
}

fn random_vector(rng: &mut StdRng, dimension: usize) -> Vec<f32> {
    (0..dimension).map(|_| rng.gen_range(-1.0f32..1.0)).collect()
}
