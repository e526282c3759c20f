use std::{collections::HashSet, path::Path, sync::Arc, time::Duration};

use serde::Deserialize;
use thiserror::Error;

use crate::metrics::{
    history::DEFAULT_HISTORY_CAPACITY,
    sampler::{default_metrics, MetricSpec},
};

/// Intervals longer than a day make no sense for a live dashboard.
pub const MAX_INTERVAL_MS: u64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("can't read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything the dashboard needs to know before it starts. Every field has a default, so an empty
/// file is a valid config.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    pub history_capacity: usize,
    pub recent_sessions: usize,
    pub tick_interval_ms: u64,
    pub sample_interval_ms: u64,
    pub default_project: Arc<str>,
    pub projects: Vec<Arc<str>>,
    pub metrics: Vec<MetricSpec>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            recent_sessions: 10,
            tick_interval_ms: 1000,
            sample_interval_ms: 2000,
            default_project: "General Work".into(),
            projects: [
                "Web Development",
                "Documentation",
                "Code Review",
                "Planning",
                "General Work",
            ]
            .into_iter()
            .map(Arc::from)
            .collect(),
            metrics: default_metrics(),
        }
    }
}

impl DashboardConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: DashboardConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_capacity == 0 {
            return Err(ConfigError::Invalid(
                "history_capacity must be at least 1".into(),
            ));
        }
        for (name, interval) in [
            ("tick_interval_ms", self.tick_interval_ms),
            ("sample_interval_ms", self.sample_interval_ms),
        ] {
            if interval == 0 || interval > MAX_INTERVAL_MS {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be between 1 and {MAX_INTERVAL_MS}, got {interval}"
                )));
            }
        }
        let mut names = HashSet::new();
        for metric in &self.metrics {
            if metric.min.is_nan() || metric.max.is_nan() || metric.min > metric.max {
                return Err(ConfigError::Invalid(format!(
                    "metric {} has min {} above max {}",
                    metric.name, metric.min, metric.max
                )));
            }
            if metric.step < 0. || !metric.step.is_finite() {
                return Err(ConfigError::Invalid(format!(
                    "metric {} has invalid step {}",
                    metric.name, metric.step
                )));
            }
            if !names.insert(metric.name.clone()) {
                return Err(ConfigError::Invalid(format!(
                    "metric {} is defined twice",
                    metric.name
                )));
            }
        }
        Ok(())
    }
}
