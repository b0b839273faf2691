//! Configuration model with serde defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::completion::Provider;

/// Main configuration structure for Exevo
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Evolutionary algorithm parameters
    #[serde(default)]
    pub algorithm: AlgorithmConfig,

    /// Multi-test run settings
    #[serde(default)]
    pub run: RunConfig,

    /// Model provider settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Retry policy configuration
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Parameters of the explanation-evolution algorithm
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AlgorithmConfig {
    /// Few-shot examples per initialization prompt (half in system, half as turns)
    #[serde(default = "default_n_shot")]
    pub n_shot: usize,

    /// Candidates per pool
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Sampling temperature for every completion
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Sequential judge rounds per generation
    #[serde(default = "default_judgements_depth")]
    pub judgements_depth: usize,

    /// Number of judge/crossover generations
    #[serde(default = "default_generations")]
    pub generations: usize,

    /// Exclusive upper bound on parents per crossover
    #[serde(default = "default_max_crossovers")]
    pub max_crossovers: usize,

    /// Concurrency ceiling for each init/judge/crossover batch
    #[serde(default = "default_inner_concurrency")]
    pub inner_concurrency: usize,

    /// Token budget for a single critique
    #[serde(default = "default_judgement_max_tokens")]
    pub judgement_max_tokens: u32,

    /// Tag prefixed to every crossover sampler seed
    #[serde(default = "default_seed_tag")]
    pub seed_tag: String,
}

const fn default_n_shot() -> usize {
    8
}

const fn default_pool_size() -> usize {
    8
}

const fn default_temperature() -> f64 {
    0.7
}

const fn default_judgements_depth() -> usize {
    3
}

const fn default_generations() -> usize {
    8
}

const fn default_max_crossovers() -> usize {
    4
}

const fn default_inner_concurrency() -> usize {
    4
}

const fn default_judgement_max_tokens() -> u32 {
    1024
}

fn default_seed_tag() -> String {
    "EE-CROSSOVER".to_string()
}

impl Default for AlgorithmConfig {
    fn default() -> Self {
        Self {
            n_shot: default_n_shot(),
            pool_size: default_pool_size(),
            temperature: default_temperature(),
            judgements_depth: default_judgements_depth(),
            generations: default_generations(),
            max_crossovers: default_max_crossovers(),
            inner_concurrency: default_inner_concurrency(),
            judgement_max_tokens: default_judgement_max_tokens(),
            seed_tag: default_seed_tag(),
        }
    }
}

/// Settings for a run over many tests
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RunConfig {
    /// Tests processed concurrently
    #[serde(default = "default_outer_concurrency")]
    pub outer_concurrency: usize,

    /// Optional JSONL file receiving every raw completion
    #[serde(default)]
    pub completions_path: Option<PathBuf>,
}

const fn default_outer_concurrency() -> usize {
    4
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            outer_concurrency: default_outer_concurrency(),
            completions_path: None,
        }
    }
}

/// Model provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProviderConfig {
    /// Provider kind
    #[serde(default = "default_provider")]
    pub kind: Provider,

    /// Model identifier passed to the provider
    #[serde(default = "default_model")]
    pub model: String,

    /// API key (falls back to the provider's conventional env var)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL override (proxies, tests)
    #[serde(default)]
    pub base_url: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_provider() -> Provider {
    Provider::Anthropic
}

fn default_model() -> String {
    "claude-sonnet-4-5-20250929".to_string()
}

const fn default_timeout_secs() -> u64 {
    300
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: default_provider(),
            model: default_model(),
            api_key: None,
            base_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rotated log files (stderr only when unset)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Rotation policy for file logs: daily, hourly, never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RateLimitConfig {
    /// Requests per second allowed
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: f64,

    /// Burst size for token bucket
    #[serde(default = "default_burst_size")]
    pub burst_size: u32,
}

const fn default_requests_per_second() -> f64 {
    10.0
}

const fn default_burst_size() -> u32 {
    20
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_requests_per_second(),
            burst_size: default_burst_size(),
        }
    }
}

/// Retry policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff delay in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Maximum backoff delay in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_initial_backoff_ms() -> u64 {
    1_000
}

const fn default_max_backoff_ms() -> u64 {
    60_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}
