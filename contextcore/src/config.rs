//! Configuration for the arbiter, ledger and cost model

use crate::arbiter::cost::CostModel;
use crate::conflict::ConflictStrategy;
use crate::drift::DistanceMetric;
use crate::error::{ContextCoreError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Configuration for a ContextCore arbiter and its ledger
///
/// Defaults:
/// - Cosine distance with a 0.05 drift threshold
/// - Fail open on detector errors (assume drift, force the conflict path)
/// - 10,000 ledger entries with LRU eviction, no TTL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextCoreConfig {
    /// Pin every vector to this dimension; `None` accepts any dimension
    /// but still requires stored and incoming vectors to agree
    pub dimension: Option<usize>,

    /// Distance above which a stored vector counts as drifted
    pub drift_threshold: f32,

    /// Distance metric used by the default drift detector
    pub distance_metric: DistanceMetric,

    /// How a drifted vector is reconciled with the stored one
    pub conflict_strategy: ConflictStrategy,

    /// Treat detector failures as drift instead of propagating the error
    pub fail_open: bool,

    /// Maximum number of ledger entries
    pub max_entries: usize,

    /// Time-to-live of ledger entries; `None` keeps entries until evicted
    #[serde(with = "duration_ms::option")]
    pub entry_ttl: Option<Duration>,

    /// TTL jitter factor (0.0 - 1.0)
    /// Spreads expirations of entries written together
    pub ttl_jitter: f64,

    /// Evict least recently used entries when the ledger is full.
    /// When false, writes of new segments fail once the ledger is full
    pub enable_lru_eviction: bool,

    /// Enable metrics collection
    pub enable_metrics: bool,

    /// Accumulation rounds per token performed by the fallback recompute
    pub recompute_passes: usize,

    /// Latency estimates per outcome
    pub cost_model: CostModel,
}

impl Default for ContextCoreConfig {
    fn default() -> Self {
        Self {
            dimension: None,
            drift_threshold: 0.05,
            distance_metric: DistanceMetric::Cosine,
            conflict_strategy: ConflictStrategy::AdoptIncoming,
            fail_open: true,
            max_entries: 10_000,
            entry_ttl: None,
            ttl_jitter: 0.0,
            enable_lru_eviction: true,
            enable_metrics: true,
            recompute_passes: 1,
            cost_model: CostModel::default(),
        }
    }
}

impl ContextCoreConfig {
    /// Create a new builder for the configuration
    pub fn builder() -> ContextCoreConfigBuilder {
        ContextCoreConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.dimension == Some(0) {
            return Err(ContextCoreError::ConfigError(
                "dimension must be greater than 0".to_string(),
            ));
        }

        if !self.drift_threshold.is_finite() || self.drift_threshold < 0.0 {
            return Err(ContextCoreError::ConfigError(
                "drift_threshold must be a non-negative finite number".to_string(),
            ));
        }

        if self.max_entries == 0 {
            return Err(ContextCoreError::ConfigError(
                "max_entries must be greater than 0".to_string(),
            ));
        }

        if self.ttl_jitter < 0.0 || self.ttl_jitter > 1.0 {
            return Err(ContextCoreError::ConfigError(
                "ttl_jitter must be between 0.0 and 1.0".to_string(),
            ));
        }

        if let ConflictStrategy::Blend { weight } = self.conflict_strategy {
            if !(weight > 0.0 && weight <= 1.0) {
                return Err(ContextCoreError::ConfigError(
                    "blend weight must be in (0.0, 1.0]".to_string(),
                ));
            }
        }

        if self.recompute_passes == 0 {
            return Err(ContextCoreError::ConfigError(
                "recompute_passes must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Calculate actual entry TTL with jitter applied
    pub fn ttl_with_jitter(&self) -> Option<Duration> {
        let ttl = self.entry_ttl?;
        if self.ttl_jitter == 0.0 {
            return Some(ttl);
        }

        let base_secs = ttl.as_secs_f64();
        let jitter_range = base_secs * self.ttl_jitter;
        let jitter = (rand::random::<f64>() * 2.0 - 1.0) * jitter_range;
        let final_secs = (base_secs + jitter).max(0.001);

        Some(Duration::from_secs_f64(final_secs))
    }

    /// Load configuration from `CONTEXTCORE_*` environment variables.
    ///
    /// A `.env` file in the working directory is read first. Unset
    /// variables keep their default value.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `CONTEXTCORE_DIMENSION` | `dimension` |
    /// | `CONTEXTCORE_DRIFT_THRESHOLD` | `drift_threshold` |
    /// | `CONTEXTCORE_DISTANCE_METRIC` | `distance_metric` (`cosine`, `euclidean`) |
    /// | `CONTEXTCORE_CONFLICT_STRATEGY` | `conflict_strategy` (`adopt_incoming`, `blend`, `blend:<weight>`) |
    /// | `CONTEXTCORE_FAIL_OPEN` | `fail_open` |
    /// | `CONTEXTCORE_MAX_ENTRIES` | `max_entries` |
    /// | `CONTEXTCORE_ENTRY_TTL_MS` | `entry_ttl` |
    /// | `CONTEXTCORE_TTL_JITTER` | `ttl_jitter` |
    /// | `CONTEXTCORE_LRU_EVICTION` | `enable_lru_eviction` |
    /// | `CONTEXTCORE_ENABLE_METRICS` | `enable_metrics` |
    /// | `CONTEXTCORE_RECOMPUTE_PASSES` | `recompute_passes` |
    ///
    /// The cost model is only configurable through a config file.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup("CONTEXTCORE_DIMENSION") {
            config.dimension = Some(parse_var("CONTEXTCORE_DIMENSION", &v)?);
        }
        if let Some(v) = lookup("CONTEXTCORE_DRIFT_THRESHOLD") {
            config.drift_threshold = parse_var("CONTEXTCORE_DRIFT_THRESHOLD", &v)?;
        }
        if let Some(v) = lookup("CONTEXTCORE_DISTANCE_METRIC") {
            config.distance_metric = v.parse()?;
        }
        if let Some(v) = lookup("CONTEXTCORE_CONFLICT_STRATEGY") {
            config.conflict_strategy = v.parse()?;
        }
        if let Some(v) = lookup("CONTEXTCORE_FAIL_OPEN") {
            config.fail_open = parse_var("CONTEXTCORE_FAIL_OPEN", &v)?;
        }
        if let Some(v) = lookup("CONTEXTCORE_MAX_ENTRIES") {
            config.max_entries = parse_var("CONTEXTCORE_MAX_ENTRIES", &v)?;
        }
        if let Some(v) = lookup("CONTEXTCORE_ENTRY_TTL_MS") {
            let ms: u64 = parse_var("CONTEXTCORE_ENTRY_TTL_MS", &v)?;
            config.entry_ttl = Some(Duration::from_millis(ms));
        }
        if let Some(v) = lookup("CONTEXTCORE_TTL_JITTER") {
            config.ttl_jitter = parse_var("CONTEXTCORE_TTL_JITTER", &v)?;
        }
        if let Some(v) = lookup("CONTEXTCORE_LRU_EVICTION") {
            config.enable_lru_eviction = parse_var("CONTEXTCORE_LRU_EVICTION", &v)?;
        }
        if let Some(v) = lookup("CONTEXTCORE_ENABLE_METRICS") {
            config.enable_metrics = parse_var("CONTEXTCORE_ENABLE_METRICS", &v)?;
        }
        if let Some(v) = lookup("CONTEXTCORE_RECOMPUTE_PASSES") {
            config.recompute_passes = parse_var("CONTEXTCORE_RECOMPUTE_PASSES", &v)?;
        }

        config.validate()?;
        debug!("Loaded configuration from environment: {:?}", config);
        Ok(config)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ContextCoreError::ConfigError(format!("invalid value for {}: {:?}", key, value)))
}

/// Builder for the configuration
#[derive(Debug, Default)]
pub struct ContextCoreConfigBuilder {
    dimension: Option<usize>,
    drift_threshold: Option<f32>,
    distance_metric: Option<DistanceMetric>,
    conflict_strategy: Option<ConflictStrategy>,
    fail_open: Option<bool>,
    max_entries: Option<usize>,
    entry_ttl: Option<Duration>,
    ttl_jitter: Option<f64>,
    enable_lru_eviction: Option<bool>,
    enable_metrics: Option<bool>,
    recompute_passes: Option<usize>,
    cost_model: Option<CostModel>,
}

impl ContextCoreConfigBuilder {
    /// Pin the vector dimension
    pub fn dimension(mut self, dimension: usize) -> Self {
        self.dimension = Some(dimension);
        self
    }

    /// Set the drift threshold
    pub fn drift_threshold(mut self, threshold: f32) -> Self {
        self.drift_threshold = Some(threshold);
        self
    }

    /// Set the distance metric
    pub fn distance_metric(mut self, metric: DistanceMetric) -> Self {
        self.distance_metric = Some(metric);
        self
    }

    /// Set the conflict resolution strategy
    pub fn conflict_strategy(mut self, strategy: ConflictStrategy) -> Self {
        self.conflict_strategy = Some(strategy);
        self
    }

    /// Fail open (assume drift) on detector errors
    pub fn fail_open(mut self, fail_open: bool) -> Self {
        self.fail_open = Some(fail_open);
        self
    }

    /// Set maximum number of ledger entries
    pub fn max_entries(mut self, max: usize) -> Self {
        self.max_entries = Some(max);
        self
    }

    /// Set the ledger entry TTL
    pub fn entry_ttl(mut self, ttl: Duration) -> Self {
        self.entry_ttl = Some(ttl);
        self
    }

    /// Set TTL jitter factor (0.0 - 1.0)
    pub fn ttl_jitter(mut self, jitter: f64) -> Self {
        self.ttl_jitter = Some(jitter);
        self
    }

    /// Enable or disable LRU eviction
    pub fn enable_lru_eviction(mut self, enable: bool) -> Self {
        self.enable_lru_eviction = Some(enable);
        self
    }

    /// Enable or disable metrics collection
    pub fn enable_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = Some(enable);
        self
    }

    /// Set accumulation rounds per token for the fallback recompute
    pub fn recompute_passes(mut self, passes: usize) -> Self {
        self.recompute_passes = Some(passes);
        self
    }

    /// Set the cost model
    pub fn cost_model(mut self, cost_model: CostModel) -> Self {
        self.cost_model = Some(cost_model);
        self
    }

    /// Build the configuration
    pub fn build(self) -> ContextCoreConfig {
        let defaults = ContextCoreConfig::default();

        ContextCoreConfig {
            dimension: self.dimension.or(defaults.dimension),
            drift_threshold: self.drift_threshold.unwrap_or(defaults.drift_threshold),
            distance_metric: self.distance_metric.unwrap_or(defaults.distance_metric),
            conflict_strategy: self.conflict_strategy.unwrap_or(defaults.conflict_strategy),
            fail_open: self.fail_open.unwrap_or(defaults.fail_open),
            max_entries: self.max_entries.unwrap_or(defaults.max_entries),
            entry_ttl: self.entry_ttl.or(defaults.entry_ttl),
            ttl_jitter: self.ttl_jitter.unwrap_or(defaults.ttl_jitter),
            enable_lru_eviction: self
                .enable_lru_eviction
                .unwrap_or(defaults.enable_lru_eviction),
            enable_metrics: self.enable_metrics.unwrap_or(defaults.enable_metrics),
            recompute_passes: self.recompute_passes.unwrap_or(defaults.recompute_passes),
            cost_model: self.cost_model.unwrap_or(defaults.cost_model),
        }
    }
}

/// Preset configurations for common use cases
impl ContextCoreConfig {
    /// Tight threshold: small changes already count as drift
    pub fn strict() -> Self {
        Self {
            drift_threshold: 0.01,
            fail_open: true,
            ..Default::default()
        }
    }

    /// Loose threshold: only large semantic shifts count as drift
    pub fn lenient() -> Self {
        Self {
            drift_threshold: 0.20,
            conflict_strategy: ConflictStrategy::Blend { weight: 0.5 },
            ..Default::default()
        }
    }

    /// Configuration for memory-constrained environments
    pub fn small() -> Self {
        Self {
            max_entries: 1_000,
            entry_ttl: Some(Duration::from_secs(1800)), // 30 minutes
            ttl_jitter: 0.15,
            ..Default::default()
        }
    }

    /// Configuration for large-scale deployments
    pub fn large() -> Self {
        Self {
            max_entries: 1_000_000,
            entry_ttl: Some(Duration::from_secs(7200)), // 2 hours
            ttl_jitter: 0.10,
            ..Default::default()
        }
    }
}

/// Serialize durations as fractional milliseconds
pub(crate) mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(to_ms(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let ms = f64::deserialize(deserializer)?;
        if !ms.is_finite() || ms < 0.0 {
            return Err(serde::de::Error::custom("duration must be a non-negative number of ms"));
        }
        Ok(from_ms(ms))
    }

    pub(super) fn to_ms(value: &Duration) -> f64 {
        value.as_nanos() as f64 / 1_000_000.0
    }

    pub(super) fn from_ms(ms: f64) -> Duration {
        Duration::from_nanos((ms * 1_000_000.0).round() as u64)
    }

    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};
        use std::time::Duration;

        pub fn serialize<S: Serializer>(
            value: &Option<Duration>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(d) => serializer.serialize_some(&super::to_ms(d)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Duration>, D::Error> {
            match Option::<f64>::deserialize(deserializer)? {
                Some(ms) if ms.is_finite() && ms >= 0.0 => Ok(Some(super::from_ms(ms))),
                Some(_) => Err(serde::de::Error::custom(
                    "duration must be a non-negative number of ms",
                )),
                None => Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = ContextCoreConfig::default();
        assert_eq!(config.drift_threshold, 0.05);
        assert_eq!(config.max_entries, 10_000);
        assert!(config.fail_open);
        assert!(config.entry_ttl.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut invalid = ContextCoreConfig::default();
        invalid.max_entries = 0;
        assert!(invalid.validate().is_err());

        let mut invalid = ContextCoreConfig::default();
        invalid.ttl_jitter = 1.5;
        assert!(invalid.validate().is_err());

        let mut invalid = ContextCoreConfig::default();
        invalid.drift_threshold = -0.1;
        assert!(invalid.validate().is_err());

        let mut invalid = ContextCoreConfig::default();
        invalid.dimension = Some(0);
        assert!(invalid.validate().is_err());

        let mut invalid = ContextCoreConfig::default();
        invalid.conflict_strategy = ConflictStrategy::Blend { weight: 0.0 };
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = ContextCoreConfig::builder()
            .dimension(128)
            .drift_threshold(0.1)
            .distance_metric(DistanceMetric::Euclidean)
            .max_entries(500)
            .entry_ttl(Duration::from_secs(60))
            .build();

        assert_eq!(config.dimension, Some(128));
        assert_eq!(config.drift_threshold, 0.1);
        assert_eq!(config.distance_metric, DistanceMetric::Euclidean);
        assert_eq!(config.max_entries, 500);
        assert_eq!(config.entry_ttl, Some(Duration::from_secs(60)));
        assert!(config.fail_open);
    }

    #[test]
    fn test_ttl_with_jitter() {
        let config = ContextCoreConfig {
            entry_ttl: Some(Duration::from_secs(3600)),
            ttl_jitter: 0.1,
            ..Default::default()
        };

        let ttl = config.ttl_with_jitter().unwrap();
        assert!(ttl.as_secs_f64() >= 3600.0 - 360.0);
        assert!(ttl.as_secs_f64() <= 3600.0 + 360.0);

        assert!(ContextCoreConfig::default().ttl_with_jitter().is_none());
    }

    #[test]
    fn test_preset_configs() {
        assert_eq!(ContextCoreConfig::strict().drift_threshold, 0.01);
        assert_eq!(ContextCoreConfig::lenient().drift_threshold, 0.20);
        assert_eq!(ContextCoreConfig::small().max_entries, 1_000);
        assert_eq!(ContextCoreConfig::large().max_entries, 1_000_000);

        for preset in [
            ContextCoreConfig::strict(),
            ContextCoreConfig::lenient(),
            ContextCoreConfig::small(),
            ContextCoreConfig::large(),
        ] {
            assert!(preset.validate().is_ok());
        }
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("CONTEXTCORE_DIMENSION", "64"),
            ("CONTEXTCORE_DRIFT_THRESHOLD", "0.2"),
            ("CONTEXTCORE_DISTANCE_METRIC", "euclidean"),
            ("CONTEXTCORE_CONFLICT_STRATEGY", "blend:0.25"),
            ("CONTEXTCORE_ENTRY_TTL_MS", "1500"),
            ("CONTEXTCORE_TTL_JITTER", "0.3"),
            ("CONTEXTCORE_LRU_EVICTION", "false"),
            ("CONTEXTCORE_ENABLE_METRICS", "false"),
            ("CONTEXTCORE_RECOMPUTE_PASSES", "4"),
        ]);

        let config =
            ContextCoreConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(config.dimension, Some(64));
        assert_eq!(config.drift_threshold, 0.2);
        assert_eq!(config.distance_metric, DistanceMetric::Euclidean);
        assert_eq!(config.entry_ttl, Some(Duration::from_millis(1500)));
        assert!(!config.enable_lru_eviction);
        assert_eq!(config.conflict_strategy, ConflictStrategy::Blend { weight: 0.25 });
        assert_eq!(config.ttl_jitter, 0.3);
        assert!(!config.enable_metrics);
        assert_eq!(config.recompute_passes, 4);
        assert_eq!(config.max_entries, 10_000);
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        let err = ContextCoreConfig::from_lookup(|key| {
            (key == "CONTEXTCORE_MAX_ENTRIES").then(|| "many".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ContextCoreError::ConfigError(_)));

        let err = ContextCoreConfig::from_lookup(|key| {
            (key == "CONTEXTCORE_MAX_ENTRIES").then(|| "0".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains("max_entries"));

        let err = ContextCoreConfig::from_lookup(|key| {
            (key == "CONTEXTCORE_CONFLICT_STRATEGY").then(|| "blend:2.0".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains("blend weight"));

        let err = ContextCoreConfig::from_lookup(|key| {
            (key == "CONTEXTCORE_RECOMPUTE_PASSES").then(|| "0".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains("recompute_passes"));
    }

    #[test]
    fn test_serde_durations_in_ms() {
        let config = ContextCoreConfig {
            entry_ttl: Some(Duration::from_millis(2500)),
            ..Default::default()
        };

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["entry_ttl"], serde_json::json!(2500.0));
        assert_eq!(json["cost_model"]["hit_latency"], serde_json::json!(1.5));

        let back: ContextCoreConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_serde_partial_document_uses_defaults() {
        let config: ContextCoreConfig =
            serde_json::from_str(r#"{"drift_threshold": 0.3, "distance_metric": "euclidean"}"#)
                .unwrap();
        assert_eq!(config.drift_threshold, 0.3);
        assert_eq!(config.distance_metric, DistanceMetric::Euclidean);
        assert_eq!(config.max_entries, 10_000);
    }
}
