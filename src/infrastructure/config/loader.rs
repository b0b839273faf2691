//! Layered configuration loading and validation.

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    /// `pool_size` is zero.
    #[error("Invalid pool_size: {0}. Must be at least 1")]
    InvalidPoolSize(usize),

    /// `n_shot` is zero or odd.
    #[error("Invalid n_shot: {0}. Must be a positive even number")]
    InvalidNShot(usize),

    /// `max_crossovers` is below 3.
    #[error("Invalid max_crossovers: {0}. Must be at least 3")]
    InvalidMaxCrossovers(usize),

    /// Pool cannot supply the largest parent draw.
    #[error(
        "pool_size ({pool_size}) is too small for max_crossovers ({max_crossovers}): must be at least max_crossovers - 1"
    )]
    PoolTooSmallForCrossover {
        /// Configured pool size.
        pool_size: usize,
        /// Configured crossover bound.
        max_crossovers: usize,
    },

    /// Named concurrency limit is zero.
    #[error("Invalid {0}: must be at least 1")]
    InvalidConcurrency(&'static str),

    /// Temperature outside `[0, 2]`.
    #[error("Invalid temperature: {0}. Must be between 0.0 and 2.0")]
    InvalidTemperature(f64),

    /// Non-positive request rate.
    #[error("Invalid rate limit: {0}. Must be positive")]
    InvalidRateLimit(f64),

    /// Unknown log level.
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    /// Unknown log format.
    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    /// Unknown rotation policy.
    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),

    /// Zero burst size.
    #[error("Invalid burst_size: {0}. Must be at least 1")]
    InvalidBurstSize(u32),

    /// Zero retries.
    #[error("Invalid max_retries: {0}. Cannot be 0")]
    InvalidMaxRetries(u32),

    /// Initial backoff not below maximum backoff.
    #[error(
        "Invalid backoff configuration: initial_backoff_ms ({0}) must be less than max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    /// Blank model identifier.
    #[error("Model name cannot be empty")]
    EmptyModel,
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .exevo/config.yaml (project config)
    /// 3. .exevo/local.yaml (local overrides, optional)
    /// 4. `extra`, when given (must exist)
    /// 5. Environment variables (EXEVO_* prefix, `__` for nesting)
    pub fn load_with(extra: Option<&Path>) -> Result<Config> {
        let mut figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".exevo/config.yaml"))
            .merge(Yaml::file(".exevo/local.yaml"));

        if let Some(path) = extra {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            figment = figment.merge(Yaml::file(path));
        }

        let config: Config = figment
            .merge(Env::prefixed("EXEVO_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let algorithm = &config.algorithm;

        if algorithm.pool_size == 0 {
            return Err(ConfigError::InvalidPoolSize(algorithm.pool_size));
        }

        // Half the shots go in the system prompt, half are replayed as turns.
        if algorithm.n_shot == 0 || algorithm.n_shot % 2 != 0 {
            return Err(ConfigError::InvalidNShot(algorithm.n_shot));
        }

        if algorithm.max_crossovers < 3 {
            return Err(ConfigError::InvalidMaxCrossovers(algorithm.max_crossovers));
        }

        if algorithm.generations > 0 && algorithm.pool_size < algorithm.max_crossovers - 1 {
            return Err(ConfigError::PoolTooSmallForCrossover {
                pool_size: algorithm.pool_size,
                max_crossovers: algorithm.max_crossovers,
            });
        }

        if algorithm.inner_concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency("inner_concurrency"));
        }

        if config.run.outer_concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency("outer_concurrency"));
        }

        if !(0.0..=2.0).contains(&algorithm.temperature) {
            return Err(ConfigError::InvalidTemperature(algorithm.temperature));
        }

        if config.provider.model.trim().is_empty() {
            return Err(ConfigError::EmptyModel);
        }

        // Validate logging config
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(config.logging.rotation.clone()));
        }

        // Validate rate_limit
        if config.rate_limit.requests_per_second <= 0.0 {
            return Err(ConfigError::InvalidRateLimit(
                config.rate_limit.requests_per_second,
            ));
        }

        if config.rate_limit.burst_size == 0 {
            return Err(ConfigError::InvalidBurstSize(config.rate_limit.burst_size));
        }

        // Validate retry config
        if config.retry.max_retries == 0 {
            return Err(ConfigError::InvalidMaxRetries(config.retry.max_retries));
        }

        if config.retry.initial_backoff_ms >= config.retry.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                config.retry.initial_backoff_ms,
                config.retry.max_backoff_ms,
            ));
        }

        Ok(())
    }
}
