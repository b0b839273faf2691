//! Model provider clients
//!
//! Each provider implements [`ChatTransport`] for a single HTTP exchange;
//! [`RetryingClient`] adds rate limiting and retry and exposes the
//! [`CompletionClient`] port.

pub mod anthropic;
pub mod errors;
pub mod openai;
pub mod retrying;

pub use anthropic::AnthropicTransport;
pub use errors::LlmApiError;
pub use openai::OpenAiTransport;
pub use retrying::{ChatTransport, RetryingClient};

use std::sync::Arc;

use crate::domain::models::config::Config;
use crate::domain::models::Provider;
use crate::domain::ports::{CompletionClient, CompletionError};

/// Environment variable consulted when no API key is configured.
pub const fn api_key_env(provider: Provider) -> Option<&'static str> {
    match provider {
        Provider::Anthropic => Some("ANTHROPIC_API_KEY"),
        Provider::OpenAi => Some("OPENAI_API_KEY"),
        Provider::Mock => None,
    }
}

fn resolve_api_key(config: &Config) -> Result<String, CompletionError> {
    if let Some(key) = config.provider.api_key.as_ref().filter(|k| !k.is_empty()) {
        return Ok(key.clone());
    }

    let var = api_key_env(config.provider.kind).ok_or_else(|| {
        CompletionError::NotConfigured(format!("{} takes no API key", config.provider.kind))
    })?;
    std::env::var(var)
        .ok()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| {
            CompletionError::NotConfigured(format!(
                "No API key for {}: set provider.api_key or {var}",
                config.provider.kind
            ))
        })
}

/// Build the configured provider's client.
pub fn build_client(config: &Config) -> Result<Arc<dyn CompletionClient>, CompletionError> {
    let provider = &config.provider;

    match provider.kind {
        Provider::Anthropic => {
            let transport = AnthropicTransport::new(
                resolve_api_key(config)?,
                provider.base_url.clone(),
                provider.timeout_secs,
            )?;
            Ok(Arc::new(RetryingClient::new(
                transport,
                &config.rate_limit,
                config.retry.clone(),
            )))
        }
        Provider::OpenAi => {
            let transport = OpenAiTransport::new(
                resolve_api_key(config)?,
                provider.base_url.clone(),
                provider.timeout_secs,
            )?;
            Ok(Arc::new(RetryingClient::new(
                transport,
                &config.rate_limit,
                config.retry.clone(),
            )))
        }
        Provider::Mock => Err(CompletionError::NotConfigured(
            "the mock provider is only available to tests".to_string(),
        )),
    }
}
