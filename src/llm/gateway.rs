//! LLM gateway client
//!
//! Uses a long-lived reqwest::Client for connection pooling. Provider
//! authentication, retry and rate-limit taxonomy live in the provider
//! abstraction layer; here any transport problem surfaces as
//! `InvestigationError::Llm`.

use crate::error::InvestigationError;
use crate::models::{LlmMessage, MessageRole, ToolCall};
use crate::tools::ToolSpec;
use crate::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{error, info};

/// What one model round-trip produced: a plain-text segment and zero or
/// more tool-use requests.
#[derive(Debug, Clone, Default)]
pub struct RawModelOutput {
    pub text: String,
    pub tool_calls: Vec<ToolCall>,
}

/// Contract for the model transport.
#[async_trait::async_trait]
pub trait LlmGateway: Send + Sync {
    async fn complete_chat(
        &self,
        messages: &[LlmMessage],
        tools: Option<&[ToolSpec]>,
    ) -> Result<RawModelOutput>;
}

/// HTTP gateway against the provider-abstraction chat endpoint.
pub struct HttpLlmGateway {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpLlmGateway {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn from_env() -> Option<Self> {
        let base_url = env::var("LLM_GATEWAY_URL").ok()?;
        let api_key = env::var("LLM_API_KEY").unwrap_or_default();
        Some(Self::new(base_url, api_key))
    }
}

#[async_trait::async_trait]
impl LlmGateway for HttpLlmGateway {
    async fn complete_chat(
        &self,
        messages: &[LlmMessage],
        tools: Option<&[ToolSpec]>,
    ) -> Result<RawModelOutput> {
        if self.api_key.is_empty() {
            return Err(InvestigationError::Llm(
                "LLM_API_KEY not configured".to_string(),
            ));
        }

        let url = format!("{}/v1/chat/completions", self.base_url);

        let request = ChatRequest {
            messages: messages.iter().map(WireMessage::from).collect(),
            tools: tools.map(|specs| specs.to_vec()),
            generation_config: GenerationConfig {
                temperature: 0.2,
                top_p: 0.9,
                max_output_tokens: 2048,
            },
        };

        info!(message_count = messages.len(), "Calling LLM gateway");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("LLM gateway request failed: {}", e);
                InvestigationError::Llm(format!("gateway request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, "LLM gateway error response: {}", body);
            return Err(InvestigationError::Llm(format!(
                "gateway returned {}: {}",
                status, body
            )));
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            error!("Failed to parse LLM gateway response: {}", e);
            InvestigationError::Llm(format!("gateway parse error: {}", e))
        })?;

        let tool_calls = chat_response
            .tool_calls
            .into_iter()
            .map(|call| ToolCall {
                call_id: call.call_id,
                tool_name: call.tool_name,
                arguments: call.arguments,
            })
            .collect();

        Ok(RawModelOutput {
            text: chat_response.text,
            tool_calls,
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolSpec>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

impl From<&LlmMessage> for WireMessage {
    fn from(message: &LlmMessage) -> Self {
        let role = match message.role {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        };
        Self {
            role,
            content: message.content.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    max_output_tokens: i32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    text: String,
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    call_id: String,
    tool_name: String,
    arguments: serde_json::Value,
}

/// Gateway that replays a queue of scripted outputs. Used by the demo
/// binary and by tests driving the agentic loop without a live model.
pub struct ScriptedGateway {
    outputs: Mutex<Vec<RawModelOutput>>,
}

impl ScriptedGateway {
    pub fn new(mut outputs: Vec<RawModelOutput>) -> Self {
        outputs.reverse();
        Self {
            outputs: Mutex::new(outputs),
        }
    }

    pub fn text_only(text: impl Into<String>) -> Self {
        Self::new(vec![RawModelOutput {
            text: text.into(),
            tool_calls: Vec::new(),
        }])
    }
}

#[async_trait::async_trait]
impl LlmGateway for ScriptedGateway {
    async fn complete_chat(
        &self,
        _messages: &[LlmMessage],
        _tools: Option<&[ToolSpec]>,
    ) -> Result<RawModelOutput> {
        let mut outputs = self
            .outputs
            .lock()
            .map_err(|_| InvestigationError::Llm("scripted gateway poisoned".to_string()))?;

        outputs
            .pop()
            .ok_or_else(|| InvestigationError::Llm("scripted gateway exhausted".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serialization() {
        let request = ChatRequest {
            messages: vec![WireMessage {
                role: "user",
                content: "Why was this alert raised?".to_string(),
            }],
            tools: Some(vec![ToolSpec {
                name: "AccountLookup".to_string(),
                description: "Look up a customer".to_string(),
                input_schema: json!({ "type": "object" }),
            }]),
            generation_config: GenerationConfig {
                temperature: 0.2,
                top_p: 0.9,
                max_output_tokens: 2048,
            },
        };

        let serialized = serde_json::to_string(&request).unwrap();
        assert!(serialized.contains("Why was this alert raised?"));
        assert!(serialized.contains("AccountLookup"));
    }

    #[test]
    fn test_response_deserialization_defaults() {
        let response: ChatResponse = serde_json::from_str(r#"{"text": "hello"}"#).unwrap();
        assert_eq!(response.text, "hello");
        assert!(response.tool_calls.is_empty());
    }

    #[tokio::test]
    async fn test_scripted_gateway_replays_in_order() {
        let gateway = ScriptedGateway::new(vec![
            RawModelOutput {
                text: "first".to_string(),
                tool_calls: Vec::new(),
            },
            RawModelOutput {
                text: "second".to_string(),
                tool_calls: Vec::new(),
            },
        ]);

        let a = gateway.complete_chat(&[], None).await.unwrap();
        let b = gateway.complete_chat(&[], None).await.unwrap();
        assert_eq!(a.text, "first");
        assert_eq!(b.text, "second");
        assert!(gateway.complete_chat(&[], None).await.is_err());
    }
}
