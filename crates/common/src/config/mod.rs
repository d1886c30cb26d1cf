//! Configuration management for CredRank
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with CREDRANK__)
//! - Configuration files (config/default.toml, config/{env}.toml, config/local.toml)
//! - Default values

use crate::errors::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Main configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RankConfig {
    /// Ranking options
    #[serde(default)]
    pub pagerank: PagerankConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct PagerankConfig {
    /// Inbound weight of the synthetic self-loop added to every node
    #[serde(default = "default_self_loop_weight")]
    #[validate(range(min = 0.0))]
    pub self_loop_weight: f64,

    /// Stop iterating once the max per-component delta is at most this
    #[serde(default = "default_convergence_threshold")]
    #[validate(range(min = 0.0))]
    pub convergence_threshold: f64,

    /// Hard cap on power iterations
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Target sum of scores over the normalization subset
    #[serde(default = "default_total_score")]
    #[validate(range(exclusive_min = 0.0))]
    pub total_score: f64,

    /// Address parts selecting the normalization subset (empty matches all)
    #[serde(default)]
    pub total_score_node_prefix: Vec<String>,

    /// Emit convergence diagnostics at info level
    #[serde(default)]
    pub verbose: bool,

    /// Wall-clock budget between cooperative yields, 0 disables yielding
    #[serde(default = "default_yield_after_ms")]
    pub yield_after_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logging: bool,

    /// Service name attached to log lines
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Record run metrics through the `metrics` facade
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
}

// Default value functions
fn default_self_loop_weight() -> f64 { 1e-3 }
fn default_convergence_threshold() -> f64 { 1e-7 }
fn default_max_iterations() -> usize { 255 }
fn default_total_score() -> f64 { 1000.0 }
fn default_yield_after_ms() -> u64 { 30 }
fn default_log_level() -> String { "info".to_string() }
fn default_service_name() -> String { "credrank".to_string() }
fn default_metrics_enabled() -> bool { true }

impl Default for PagerankConfig {
    fn default() -> Self {
        Self {
            self_loop_weight: default_self_loop_weight(),
            convergence_threshold: default_convergence_threshold(),
            max_iterations: default_max_iterations(),
            total_score: default_total_score(),
            total_score_node_prefix: Vec::new(),
            verbose: false,
            yield_after_ms: default_yield_after_ms(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: false,
            service_name: default_service_name(),
            metrics_enabled: default_metrics_enabled(),
        }
    }
}

impl PagerankConfig {
    /// Yield budget as Duration, `None` when yielding is disabled
    pub fn yield_after(&self) -> Option<Duration> {
        match self.yield_after_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}

impl RankConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let env = std::env::var("CREDRANK_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // e.g., CREDRANK__PAGERANK__MAX_ITERATIONS=100
            .add_source(environment())

            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Load from a specific config file
    pub fn from_file(path: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

/// `CREDRANK__`-prefixed environment source. List options take
/// comma-separated values, e.g.
/// `CREDRANK__PAGERANK__TOTAL_SCORE_NODE_PREFIX=github,user`.
fn environment() -> Environment {
    Environment::with_prefix("CREDRANK")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("pagerank.total_score_node_prefix")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RankConfig::default();
        assert_eq!(config.pagerank.max_iterations, 255);
        assert_eq!(config.pagerank.self_loop_weight, 1e-3);
        assert_eq!(config.pagerank.convergence_threshold, 1e-7);
        assert_eq!(config.pagerank.total_score, 1000.0);
        assert!(config.pagerank.total_score_node_prefix.is_empty());
        assert!(!config.pagerank.verbose);
        assert!(config.pagerank.validate().is_ok());
    }

    #[test]
    fn test_yield_after() {
        let mut config = PagerankConfig::default();
        assert_eq!(config.yield_after(), Some(Duration::from_millis(30)));
        config.yield_after_ms = 0;
        assert_eq!(config.yield_after(), None);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = PagerankConfig::default();
        config.total_score = 0.0;
        assert!(config.validate().is_err());

        let mut config = PagerankConfig::default();
        config.self_loop_weight = -0.5;
        assert!(config.validate().is_err());

        let mut config = PagerankConfig::default();
        config.convergence_threshold = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_environment_overrides() {
        let source = environment().source(Some(
            [
                ("CREDRANK__PAGERANK__MAX_ITERATIONS", "40"),
                ("CREDRANK__PAGERANK__TOTAL_SCORE_NODE_PREFIX", "github,user"),
                ("CREDRANK__OBSERVABILITY__METRICS_ENABLED", "false"),
            ]
            .into_iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect(),
        ));
        let config: RankConfig = Config::builder()
            .add_source(source)
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.pagerank.max_iterations, 40);
        assert_eq!(config.pagerank.total_score_node_prefix, vec!["github", "user"]);
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn test_missing_file_is_config_load_error() {
        let err = RankConfig::from_file("config/does-not-exist").unwrap_err();
        assert!(matches!(err, crate::errors::RankError::Config(_)));
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: RankConfig = serde_json::from_str(
            r#"{"pagerank": {"max_iterations": 10, "total_score_node_prefix": ["github", "user"]}}"#,
        )
        .unwrap();
        assert_eq!(config.pagerank.max_iterations, 10);
        assert_eq!(config.pagerank.total_score, 1000.0);
        assert_eq!(config.pagerank.total_score_node_prefix, vec!["github", "user"]);
        assert_eq!(config.observability.log_level, "info");
    }
}
