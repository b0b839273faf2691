//! Anthropic Messages API transport.

use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::errors::LlmApiError;
use super::retrying::ChatTransport;
use crate::domain::models::{ChatQuery, Completion, Role, TokenUsage};

/// Endpoint used when no base URL is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessageRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}

/// HTTP client for the Anthropic Messages API
///
/// System messages are folded into the top-level `system` field; the
/// remaining turns are sent in order.
pub struct AnthropicTransport {
    http_client: ReqwestClient,
    api_key: String,
    base_url: String,
    timeout_secs: u64,
}

impl AnthropicTransport {
    /// Transport for `api_key`, optionally against another host.
    pub fn new(
        api_key: impl Into<String>,
        base_url: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, LlmApiError> {
        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .pool_max_idle_per_host(10)
            .tcp_nodelay(true)
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

    fn request<'a>(query: &'a ChatQuery) -> MessageRequest<'a> {
        let system: Vec<&str> = query
            .messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();

        MessageRequest {
            model: &query.model,
            messages: query
                .messages
                .iter()
                .filter(|m| m.role != Role::System)
                .map(|m| Message {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            max_tokens: query.max_tokens,
            system: (!system.is_empty()).then(|| system.join("\n\n")),
            temperature: query.temperature,
        }
    }
}

#[async_trait]
impl ChatTransport for AnthropicTransport {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn send(&self, query: &ChatQuery) -> Result<Completion, LlmApiError> {
        let response = self
            .http_client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&Self::request(query))
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

        let body: MessageResponse = response
            .json()
            .await
            .map_err(|e| LlmApiError::MalformedResponse(e.to_string()))?;

        let content: String = body
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .collect();
        if content.is_empty() {
            return Err(LlmApiError::MalformedResponse(
                "response contained no text content".to_string(),
            ));
        }

        let completion = Completion::new(content);
        Ok(match body.usage {
            Some(usage) => completion.with_usage(TokenUsage {
                input_tokens: usage.input_tokens,
                output_tokens: usage.output_tokens,
            }),
            None => completion,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{ChatMessage, Provider};
    use mockito::Matcher;

    fn query() -> ChatQuery {
        ChatQuery {
            provider: Provider::Anthropic,
            model: "claude-test".to_string(),
            messages: vec![
                ChatMessage::system("be terse"),
                ChatMessage::user("QUESTION: 1+1"),
                ChatMessage::assistant("REASONING:\n1+1=2\nANSWER: 2"),
                ChatMessage::user("QUESTION: 2+2"),
            ],
            temperature: 0.7,
            max_tokens: 128,
        }
    }

    #[test]
    fn test_system_messages_are_hoisted() {
        let query = query();
        let request = AnthropicTransport::request(&query);
        assert_eq!(request.system.as_deref(), Some("be terse"));
        assert_eq!(request.messages.len(), 3);
        assert_eq!(request.messages[0].role, "user");
        assert_eq!(request.messages[1].role, "assistant");
    }

    #[tokio::test]
    async fn test_successful_completion() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "test-key")
            .match_header("anthropic-version", API_VERSION)
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "claude-test",
                "max_tokens": 128,
                "system": "be terse",
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"content":[{"type":"text","text":"REASONING:\n2+2=4\nANSWER: 4"}],
                   "usage":{"input_tokens":42,"output_tokens":7}}"#,
            )
            .create_async()
            .await;

        let transport = AnthropicTransport::new("test-key", Some(server.url()), 5).unwrap();
        let completion = transport.send(&query()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(completion.content, "REASONING:\n2+2=4\nANSWER: 4");
        assert_eq!(
            completion.usage,
            Some(TokenUsage {
                input_tokens: 42,
                output_tokens: 7
            })
        );
    }

    #[tokio::test]
    async fn test_error_status_is_classified() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/messages")
            .with_status(401)
            .with_body(r#"{"error":{"message":"invalid x-api-key"}}"#)
            .create_async()
            .await;

        let transport = AnthropicTransport::new("bad", Some(server.url()), 5).unwrap();
        let err = transport.send(&query()).await.unwrap_err();
        assert!(matches!(err, LlmApiError::AuthenticationFailed(body) if body.contains("invalid")));
    }

    #[tokio::test]
    async fn test_empty_content_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/messages")
            .with_status(200)
            .with_body(r#"{"content":[]}"#)
            .create_async()
            .await;

        let transport = AnthropicTransport::new("k", Some(server.url()), 5).unwrap();
        let err = transport.send(&query()).await.unwrap_err();
        assert!(matches!(err, LlmApiError::MalformedResponse(_)));
    }
}
