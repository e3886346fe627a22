//! Effective configuration for a CLI run

use anyhow::{Context, Result};
use contextcore::{ContextCoreConfig, DistanceMetric};
use std::path::Path;
use tracing::debug;

/// Values given on the command line, applied over the loaded config
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub threshold: Option<f32>,
    pub metric: Option<DistanceMetric>,
}

/// Load the YAML file when given, the environment otherwise
pub fn load_config(path: Option<&Path>) -> Result<ContextCoreConfig> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {:?}", path))?;
            let config: ContextCoreConfig = serde_yaml::from_str(&raw)
                .with_context(|| format!("Failed to parse config file {:?}", path))?;
            debug!("Loaded configuration from {:?}", path);
            Ok(config)
        }
        None => ContextCoreConfig::from_env().context("Failed to load configuration from environment"),
    }
}

/// Apply command-line overrides and validate the result
pub fn resolve_config(path: Option<&Path>, overrides: &Overrides) -> Result<ContextCoreConfig> {
    let mut config = load_config(path)?;

    if let Some(threshold) = overrides.threshold {
        config.drift_threshold = threshold;
    }
    if let Some(metric) = overrides.metric {
        config.distance_metric = metric;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_yaml_file_with_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "drift_threshold: 0.2").unwrap();
        writeln!(file, "max_entries: 64").unwrap();
        writeln!(file, "entry_ttl: 1500.0").unwrap();

        let overrides = Overrides {
            threshold: Some(0.1),
            metric: Some(DistanceMetric::Euclidean),
        };
        let config = resolve_config(Some(file.path()), &overrides).unwrap();

        assert_eq!(config.drift_threshold, 0.1);
        assert_eq!(config.distance_metric, DistanceMetric::Euclidean);
        assert_eq!(config.max_entries, 64);
        assert_eq!(config.entry_ttl, Some(std::time::Duration::from_millis(1500)));
    }

    #[test]
    fn test_invalid_override_rejected() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "fail_open: false\n").unwrap();

        let overrides = Overrides {
            threshold: Some(-1.0),
            metric: None,
        };
        assert!(resolve_config(Some(file.path()), &overrides).is_err());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.yaml");
        let err = load_config(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_malformed_yaml() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "max_entries: [not, a, number]\n").unwrap();
        assert!(load_config(Some(file.path())).is_err());
    }
}
