//! Configuration management for the `TripSmith` application
//!
//! Handles loading configuration from an optional TOML file and environment
//! variables, and validates all settings once at startup. The resulting
//! `AppConfig` is constructed once and injected into the orchestrator and
//! provider clients; nothing reads configuration ambiently after that.

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// A setting that failed startup validation
#[derive(Error, Debug)]
#[error("Configuration error: {0}")]
pub struct ConfigError(String);

/// Root configuration structure for the `TripSmith` application
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Provider endpoints and credentials
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Call timeout and retry policy
    #[serde(default)]
    pub policy: PolicyConfig,
    /// Response cache settings
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Endpoint and credential settings, one section per provider
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub flights: FlightsConfig,
    #[serde(default)]
    pub hotels: SearchEngineConfig,
    #[serde(default)]
    pub attractions: SearchEngineConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub synthesizer: SynthesizerConfig,
}

/// Flight search (Amadeus-style) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightsConfig {
    #[serde(default = "default_flights_base_url")]
    pub base_url: String,
    /// OAuth2 client-credentials token endpoint
    #[serde(default = "default_flights_auth_url")]
    pub auth_url: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

/// Settings shared by the SerpAPI-style hotel and attraction searches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchEngineConfig {
    #[serde(default = "default_serp_base_url")]
    pub base_url: String,
    pub api_key: Option<String>,
}

/// Weather forecast provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    pub api_key: Option<String>,
}

/// AI synthesizer (OpenAI-compatible chat completions) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesizerConfig {
    #[serde(default = "default_synthesizer_base_url")]
    pub base_url: String,
    pub api_key: Option<String>,
    #[serde(default = "default_synthesizer_model")]
    pub model: String,
}

/// Per-attempt timeout and retry policy applied to every provider call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Per-attempt deadline in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Retries after a transient fault (the policy is at most one)
    #[serde(default = "default_retries")]
    pub transient_retries: u32,
}

/// Response cache settings: per-provider TTLs and a total entry cap
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Flight results go stale quickly
    #[serde(default = "default_volatile_ttl")]
    pub flights_ttl_seconds: u64,
    #[serde(default = "default_volatile_ttl")]
    pub hotels_ttl_seconds: u64,
    /// Attraction listings are stable for hours
    #[serde(default = "default_stable_ttl")]
    pub attractions_ttl_seconds: u64,
    #[serde(default = "default_weather_ttl")]
    pub weather_ttl_seconds: u64,
    /// Maximum entries before LRU eviction kicks in
    #[serde(default = "default_cache_capacity")]
    pub max_entries: usize,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_flights_base_url() -> String {
    "https://test.api.amadeus.com/v2".to_string()
}

fn default_flights_auth_url() -> String {
    "https://test.api.amadeus.com/v1/security/oauth2/token".to_string()
}

fn default_serp_base_url() -> String {
    "https://serpapi.com/search".to_string()
}

fn default_weather_base_url() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

fn default_synthesizer_base_url() -> String {
    "https://api.deepseek.com/v1".to_string()
}

fn default_synthesizer_model() -> String {
    "deepseek-chat".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_retries() -> u32 {
    1
}

fn default_volatile_ttl() -> u64 {
    120
}

fn default_stable_ttl() -> u64 {
    3600
}

fn default_weather_ttl() -> u64 {
    1800
}

fn default_cache_capacity() -> usize {
    256
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for FlightsConfig {
    fn default() -> Self {
        Self {
            base_url: default_flights_base_url(),
            auth_url: default_flights_auth_url(),
            client_id: None,
            client_secret: None,
        }
    }
}

impl Default for SearchEngineConfig {
    fn default() -> Self {
        Self {
            base_url: default_serp_base_url(),
            api_key: None,
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_base_url(),
            api_key: None,
        }
    }
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        Self {
            base_url: default_synthesizer_base_url(),
            api_key: None,
            model: default_synthesizer_model(),
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            transient_retries: default_retries(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            flights_ttl_seconds: default_volatile_ttl(),
            hotels_ttl_seconds: default_volatile_ttl(),
            attractions_ttl_seconds: default_stable_ttl(),
            weather_ttl_seconds: default_weather_ttl(),
            max_entries: default_cache_capacity(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl PolicyConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl AppConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::default_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides: TRIPSMITH_PROVIDERS__HOTELS__API_KEY etc.
        builder = builder.add_source(
            Environment::with_prefix("TRIPSMITH")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let config: AppConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tripsmith").join("config.toml"))
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_urls()?;
        self.validate_log_level()?;
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.policy.timeout_seconds == 0 || self.policy.timeout_seconds > 120 {
            return Err(ConfigError(
                "provider timeout must be between 1 and 120 seconds".to_string(),
            )
            .into());
        }

        if self.policy.transient_retries > 1 {
            return Err(ConfigError("transient retries cannot exceed 1".to_string()).into());
        }

        if self.cache.max_entries == 0 {
            return Err(ConfigError("cache capacity must be at least 1".to_string()).into());
        }

        let ttls = [
            self.cache.flights_ttl_seconds,
            self.cache.hotels_ttl_seconds,
            self.cache.attractions_ttl_seconds,
            self.cache.weather_ttl_seconds,
        ];
        if ttls.iter().any(|&ttl| ttl == 0 || ttl > 24 * 60 * 60) {
            return Err(ConfigError(
                "cache TTLs must be between 1 second and 24 hours".to_string(),
            )
            .into());
        }

        Ok(())
    }

    fn validate_urls(&self) -> Result<()> {
        let urls = [
            &self.providers.flights.base_url,
            &self.providers.flights.auth_url,
            &self.providers.hotels.base_url,
            &self.providers.attractions.base_url,
            &self.providers.weather.base_url,
            &self.providers.synthesizer.base_url,
        ];

        for url in urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError(format!(
                    "provider base URL must be a valid HTTP or HTTPS URL, got '{url}'"
                ))
                .into());
            }
        }

        Ok(())
    }

    fn validate_log_level(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError(format!(
                "invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.policy.timeout_seconds, 10);
        assert_eq!(config.policy.transient_retries, 1);
        assert_eq!(config.cache.flights_ttl_seconds, 120);
        assert_eq!(config.cache.attractions_ttl_seconds, 3600);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = AppConfig::default();
        config.policy.timeout_seconds = 0;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("timeout"));
    }

    #[test]
    fn test_excess_retries_rejected() {
        let mut config = AppConfig::default();
        config.policy.transient_retries = 3;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_url_rejected() {
        let mut config = AppConfig::default();
        config.providers.hotels.base_url = "serpapi.com/search".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("HTTP"));
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let mut config = AppConfig::default();
        config.logging.level = "loud".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("log level"));
    }
}
