//! Configuration management for citesurf
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config.toml, config.yaml)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use validator::ValidationError;

pub use validator::Validate;

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct AppConfig {
    /// Walk engine configuration
    #[validate(nested)]
    pub walk: WalkConfig,

    /// Lookup provider configuration
    #[validate(nested)]
    pub lookup: LookupConfig,

    /// Input table locations
    pub inputs: InputConfig,

    /// Report destinations
    pub output: OutputConfig,

    /// Observability configuration
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(default)]
#[validate(schema(function = "finite_walk_weight"))]
pub struct WalkConfig {
    /// Number of walk steps per run
    pub iterations: usize,

    /// Initial probability of jumping back to a seed on each step
    #[validate(range(min = 0.0, max = 1.0))]
    pub back_to_start_weight: f64,

    /// Random references tried per step before falling back to a jump
    #[validate(range(min = 1))]
    pub max_reference_attempts: usize,

    /// Seed for the random source (random when absent)
    pub seed: Option<u64>,

    /// Back-to-start weights adopted after discovering a document of each tier
    #[validate(nested)]
    pub tiers: TierWeights,
}

/// Back-to-start weight per relevance tier
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize, Validate)]
#[serde(default)]
#[validate(schema(function = "finite_tier_weights"))]
pub struct TierWeights {
    #[validate(range(min = 0.0, max = 1.0))]
    pub low: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub moderate: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub good: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub excellent: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct LookupConfig {
    /// Lookup provider: crossref, static
    #[validate(length(min = 1))]
    pub provider: String,

    /// Provider consulted to fill gaps left by the primary one: pubmed
    pub secondary: Option<String>,

    /// Take the publication year from the secondary provider when it has one
    pub prefer_secondary_year: bool,

    /// JSON array of documents served by the static provider
    pub static_path: Option<PathBuf>,

    /// API base URL
    pub base_url: String,

    /// Contact address sent to Crossref's polite pool
    pub mailto: Option<String>,

    /// NCBI E-utilities base URL
    pub pubmed_base_url: String,

    /// NCBI API key (raises the E-utilities rate limit)
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[validate(range(min = 1))]
    pub timeout_secs: u64,

    /// Maximum retries for transient failures
    pub max_retries: u32,

    /// Outbound request budget
    #[validate(range(min = 1))]
    pub requests_per_second: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InputConfig {
    /// Seed corpus (column `DOI`)
    pub corpus_path: PathBuf,

    /// Keyword weights (columns `keyterms,value`)
    pub keywords_path: Option<PathBuf>,

    /// Important authors (column `Last`)
    pub authors_path: Option<PathBuf>,

    /// Keyword colors (columns `abx,colour`)
    pub colors_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Node report (`identifier,title,author,score,times_seen`)
    pub nodes_csv: PathBuf,

    /// Edge report (`citing,cited`)
    pub edges_csv: Option<PathBuf>,

    /// Graphviz DOT export
    pub dot: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    pub log_level: String,

    /// Enable JSON logging
    pub json_logging: bool,

    /// Prometheus text snapshot written at the end of a run
    pub metrics_path: Option<PathBuf>,
}

// Default value functions
fn default_iterations() -> usize { 100 }
fn default_max_reference_attempts() -> usize { 10 }
fn default_provider() -> String { "crossref".to_string() }
fn default_lookup_timeout() -> u64 { 30 }
fn default_lookup_retries() -> u32 { 3 }
fn default_requests_per_second() -> u32 { 5 }
fn default_corpus_path() -> PathBuf { PathBuf::from("corpus.csv") }
fn default_nodes_csv() -> PathBuf { PathBuf::from("output.csv") }
fn default_log_level() -> String { "info".to_string() }

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            back_to_start_weight: crate::DEFAULT_BACK_TO_START_WEIGHT,
            max_reference_attempts: default_max_reference_attempts(),
            seed: None,
            tiers: TierWeights::default(),
        }
    }
}

impl Default for TierWeights {
    fn default() -> Self {
        Self {
            low: 0.9,
            moderate: 0.8,
            good: crate::DEFAULT_BACK_TO_START_WEIGHT,
            excellent: 0.05,
        }
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            secondary: None,
            prefer_secondary_year: true,
            static_path: None,
            base_url: crate::DEFAULT_CROSSREF_URL.to_string(),
            mailto: None,
            pubmed_base_url: crate::DEFAULT_PUBMED_URL.to_string(),
            api_key: None,
            timeout_secs: default_lookup_timeout(),
            max_retries: default_lookup_retries(),
            requests_per_second: default_requests_per_second(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            corpus_path: default_corpus_path(),
            keywords_path: None,
            authors_path: None,
            colors_path: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            nodes_csv: default_nodes_csv(),
            edges_csv: None,
            dot: None,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: false,
            metrics_path: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__WALK__ITERATIONS=500
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )

            .build()?;

        let loaded: Self = config.try_deserialize()?;
        loaded
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))?;
        Ok(loaded)
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        let loaded: Self = config.try_deserialize()?;
        loaded
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))?;
        Ok(loaded)
    }
}

impl LookupConfig {
    /// Get lookup request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// NaN passes range checks
fn finite_walk_weight(walk: &WalkConfig) -> Result<(), ValidationError> {
    if walk.back_to_start_weight.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::new("back_to_start_weight_not_finite"))
    }
}

fn finite_tier_weights(tiers: &TierWeights) -> Result<(), ValidationError> {
    let weights = [tiers.low, tiers.moderate, tiers.good, tiers.excellent];
    if weights.iter().all(|w| w.is_finite()) {
        Ok(())
    } else {
        Err(ValidationError::new("tier_weight_not_finite"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.walk.iterations, 100);
        assert_eq!(config.walk.max_reference_attempts, 10);
        assert_eq!(config.walk.back_to_start_weight, 0.15);
        assert_eq!(config.lookup.base_url, "https://api.crossref.org");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_tier_weights_order() {
        let tiers = TierWeights::default();
        assert!(tiers.low > tiers.good);
        assert!(tiers.moderate > tiers.good);
        assert!(tiers.excellent < tiers.good);
    }

    #[test]
    fn test_validate_rejects_bad_probability() {
        let mut config = AppConfig::default();
        config.walk.back_to_start_weight = 1.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("back_to_start_weight"));

        let mut config = AppConfig::default();
        config.walk.back_to_start_weight = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.walk.max_reference_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_checks_nested_sections() {
        let mut config = AppConfig::default();
        config.walk.tiers.excellent = -0.1;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.walk.tiers.low = f64::INFINITY;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.lookup.requests_per_second = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.lookup.provider = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_lookup_defaults() {
        let lookup = LookupConfig::default();
        assert_eq!(lookup.timeout(), Duration::from_secs(30));
        assert!(lookup.secondary.is_none());
        assert!(lookup.prefer_secondary_year);
        assert_eq!(lookup.pubmed_base_url, "https://eutils.ncbi.nlm.nih.gov/entrez/eutils");
    }
}
