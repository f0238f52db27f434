use std::env;
use std::fs;

use log::info;
use serde::{Deserialize, Serialize};

use crate::core::component::ComponentError;
use crate::core::metrics::MetricsConfig;

/// Environment variable naming an optional JSON config file
pub const CONFIG_PATH_ENV: &str = "RISK_ASSESS_CONFIG";
/// Environment variable overriding the listen address (`host:port`)
pub const BIND_ENV: &str = "RISK_ASSESS_BIND";

/// Top-level service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server settings
    pub server: ServerConfig,
    /// Synthetic account generation settings
    pub generator: GeneratorConfig,
    /// Assessment storage settings
    pub storage: StorageConfig,
    /// Component metrics collection settings
    pub metrics: MetricsConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// Port to bind
    pub port: u16,
    /// Directory served under `/static`
    pub static_dir: String,
    /// Worker thread count (actix default when unset)
    pub workers: Option<usize>,
}

/// Synthetic account generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Batch size used when a request does not specify one
    pub default_batch_size: usize,
    /// Smallest accepted batch
    pub min_batch_size: usize,
    /// Largest accepted batch
    pub max_batch_size: usize,
    /// Proportions of each account archetype
    pub mix: AccountMix,
    /// Fixed RNG seed for reproducible batches
    pub seed: Option<u64>,
}

/// Relative weights of generated account archetypes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AccountMix {
    pub normal: f64,
    pub business: f64,
    pub bot: f64,
    pub scammer: f64,
}

/// Assessment storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite file for assessment history; in-memory when unset
    pub history_path: Option<String>,
    /// Number of analysed batches kept for browsing
    pub batch_cache_capacity: usize,
    /// Number of bins in the score histogram
    pub histogram_bins: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            static_dir: "./src/web/static".to_string(),
            workers: None,
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            default_batch_size: 50,
            min_batch_size: 10,
            max_batch_size: 100,
            mix: AccountMix::default(),
            seed: None,
        }
    }
}

impl Default for AccountMix {
    fn default() -> Self {
        Self {
            normal: 0.40,
            business: 0.15,
            bot: 0.25,
            scammer: 0.20,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            history_path: None,
            batch_cache_capacity: 16,
            histogram_bins: 20,
        }
    }
}

impl AppConfig {
    /// Load configuration from the file named by `RISK_ASSESS_CONFIG` (if any),
    /// then apply the `RISK_ASSESS_BIND` override.
    pub fn load() -> Result<Self, ComponentError> {
        let mut config = match env::var(CONFIG_PATH_ENV) {
            Ok(path) => {
                info!("Loading configuration from {}", path);
                let raw = fs::read_to_string(&path).map_err(|e| {
                    ComponentError::ConfigError(format!("Failed to read {}: {}", path, e))
                })?;
                Self::from_json(&raw)?
            }
            Err(_) => Self::default(),
        };

        if let Ok(bind) = env::var(BIND_ENV) {
            config.apply_bind_override(&bind)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from JSON; missing fields take their defaults
    pub fn from_json(raw: &str) -> Result<Self, ComponentError> {
        serde_json::from_str(raw)
            .map_err(|e| ComponentError::ConfigError(format!("Invalid configuration: {}", e)))
    }

    /// Override host and port from a `host:port` string
    pub fn apply_bind_override(&mut self, bind: &str) -> Result<(), ComponentError> {
        let (host, port) = bind.rsplit_once(':').ok_or_else(|| {
            ComponentError::ConfigError(format!("{} must be host:port, got '{}'", BIND_ENV, bind))
        })?;
        self.server.port = port.parse().map_err(|_| {
            ComponentError::ConfigError(format!("Invalid port in {}: '{}'", BIND_ENV, port))
        })?;
        self.server.host = host.to_string();
        Ok(())
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ComponentError> {
        let generator = &self.generator;
        if generator.min_batch_size == 0 || generator.min_batch_size > generator.max_batch_size {
            return Err(ComponentError::ConfigError(format!(
                "Batch size bounds {}..={} are invalid",
                generator.min_batch_size, generator.max_batch_size
            )));
        }
        if generator.default_batch_size < generator.min_batch_size
            || generator.default_batch_size > generator.max_batch_size
        {
            return Err(ComponentError::ConfigError(format!(
                "Default batch size {} is outside {}..={}",
                generator.default_batch_size, generator.min_batch_size, generator.max_batch_size
            )));
        }

        let mix = &generator.mix;
        let weights = [mix.normal, mix.business, mix.bot, mix.scammer];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) || weights.iter().sum::<f64>() <= 0.0 {
            return Err(ComponentError::ConfigError(
                "Account mix weights must be non-negative with a positive sum".to_string(),
            ));
        }

        if self.storage.batch_cache_capacity == 0 {
            return Err(ComponentError::ConfigError(
                "batch_cache_capacity must be at least 1".to_string(),
            ));
        }
        if self.storage.histogram_bins == 0 || self.storage.histogram_bins > 100 {
            return Err(ComponentError::ConfigError(
                "histogram_bins must be within 1..=100".to_string(),
            ));
        }

        Ok(())
    }

    /// Address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.generator.default_batch_size, 50);
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = AppConfig::from_json(r#"{"server": {"port": 9000}, "generator": {"seed": 7}}"#).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.generator.seed, Some(7));
        assert_eq!(config.generator.max_batch_size, 100);
        assert_eq!(config.storage.histogram_bins, 20);
    }

    #[test]
    fn test_bind_override() {
        let mut config = AppConfig::default();
        config.apply_bind_override("0.0.0.0:3000").unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:3000");

        assert!(config.apply_bind_override("no-port").is_err());
        assert!(config.apply_bind_override("host:http").is_err());
    }

    #[test]
    fn test_rejects_bad_bounds_and_mix() {
        let mut config = AppConfig::default();
        config.generator.default_batch_size = 500;
        assert!(matches!(config.validate(), Err(ComponentError::ConfigError(_))));

        let mut config = AppConfig::default();
        config.generator.mix = AccountMix { normal: 0.0, business: 0.0, bot: 0.0, scammer: 0.0 };
        assert!(config.validate().is_err());
    }
}
