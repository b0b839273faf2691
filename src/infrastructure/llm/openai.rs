//! OpenAI-compatible chat completions transport.

use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::errors::LlmApiError;
use super::retrying::ChatTransport;
use crate::domain::models::{ChatQuery, Completion, TokenUsage};

/// Endpoint used when no base URL is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

/// HTTP client for `/chat/completions` endpoints
pub struct OpenAiTransport {
    http_client: ReqwestClient,
    api_key: String,
    base_url: String,
    timeout_secs: u64,
}

impl OpenAiTransport {
    /// Transport for `api_key`, optionally against another host.
    pub fn new(
        api_key: impl Into<String>,
        base_url: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, LlmApiError> {
        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| LlmApiError::Unknown(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            api_key: api_key.into(),
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            timeout_secs,
        })
    }
}

#[async_trait]
impl ChatTransport for OpenAiTransport {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn send(&self, query: &ChatQuery) -> Result<Completion, LlmApiError> {
        let request = ChatRequest {
            model: &query.model,
            messages: query
                .messages
                .iter()
                .map(|m| Message {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            max_tokens: query.max_tokens,
            temperature: query.temperature,
        };

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmApiError::from_reqwest(&e, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            return Err(LlmApiError::from_status(status, body));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmApiError::MalformedResponse(e.to_string()))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmApiError::MalformedResponse("response had no choices".to_string()))?;

        let completion = Completion::new(content);
        Ok(match body.usage {
            Some(usage) => completion.with_usage(TokenUsage {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
            }),
            None => completion,
        })
    }
}
