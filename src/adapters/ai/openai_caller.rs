//! OpenAI-compatible chat-completions model caller.
//!
//! Works against any endpoint speaking the chat-completions wire format.
//! Transient failures (429, 5xx, network, timeout) are retried with
//! exponential backoff; everything else surfaces immediately.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::AiConfig;
use crate::domain::agent::{Message, MessageOrigin};
use crate::domain::foundation::ToolCallId;
use crate::domain::tools::{ToolCall, ToolDefinition};
use crate::ports::{ModelCaller, ModelError};

/// Model caller backed by an OpenAI-compatible HTTP endpoint.
pub struct OpenAiModelCaller {
    client: reqwest::Client,
    api_key: Secret<String>,
    model: String,
    base_url: String,
    timeout_secs: u64,
    max_retries: u32,
}

impl OpenAiModelCaller {
    /// Creates a caller from configuration.
    pub fn new(config: &AiConfig) -> Result<Self, ModelError> {
        let timeout_secs = config.request_timeout_secs();
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ModelError::Network(e.to_string()))?;

        Ok(Self {
            client,
            api_key: config.api_key().clone(),
            model: config.model().to_string(),
            base_url: config.base_url().trim_end_matches('/').to_string(),
            timeout_secs,
            max_retries: config.max_retries(),
        })
    }

    async fn call_once(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<Message, ModelError> {
        let request = WireRequest {
            model: &self.model,
            messages: messages.iter().map(WireMessage::from_domain).collect(),
            tools: tools.map(|defs| defs.iter().map(|d| d.to_openai_format()).collect()),
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ModelError::Timeout(self.timeout_secs)
                } else {
                    ModelError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => ModelError::AuthenticationFailed,
                429 => ModelError::RateLimited,
                400 if body.contains("context_length") => ModelError::ContextTooLong,
                400 => ModelError::InvalidRequest(body),
                _ => ModelError::Unavailable(format!("{}: {}", status, body)),
            });
        }

        let body: WireResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Parse(e.to_string()))?;

        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::Parse("response contained no choices".into()))?;

        choice.message.into_domain()
    }
}

#[async_trait]
impl ModelCaller for OpenAiModelCaller {
    async fn invoke(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<Message, ModelError> {
        let mut attempt = 0u32;
        loop {
            match self.call_once(messages, tools).await {
                Ok(reply) => {
                    debug!(attempt, "model call succeeded");
                    return Ok(reply);
                }
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    let backoff = Duration::from_millis(500 * 2u64.pow(attempt));
                    warn!(attempt, error = %err, "retrying model call");
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<serde_json::Value>>,
}

#[derive(Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    function: WireFunction,
}

#[derive(Serialize, Deserialize)]
struct WireFunction {
    name: String,
    // The wire format carries arguments as a JSON-encoded string.
    arguments: String,
}

#[derive(Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireMessage,
}

impl WireMessage {
    fn from_domain(message: &Message) -> Self {
        let tool_calls = if message.has_tool_calls() {
            Some(
                message
                    .tool_calls()
                    .iter()
                    .map(|call| WireToolCall {
                        id: call.id().to_string(),
                        kind: "function".to_string(),
                        function: WireFunction {
                            name: call.name().to_string(),
                            arguments: call.arguments().to_string(),
                        },
                    })
                    .collect(),
            )
        } else {
            None
        };

        Self {
            role: message.origin().label().to_string(),
            content: Some(message.content().to_string()),
            tool_calls,
            tool_call_id: message.tool_call_id().map(|id| id.to_string()),
        }
    }

    fn into_domain(self) -> Result<Message, ModelError> {
        if self.role != MessageOrigin::Assistant.label() {
            return Err(ModelError::Parse(format!(
                "unexpected reply role: {}",
                self.role
            )));
        }
        let content = self.content.unwrap_or_default();

        match self.tool_calls {
            Some(wire_calls) if !wire_calls.is_empty() => {
                let mut calls = Vec::with_capacity(wire_calls.len());
                for wire in wire_calls {
                    let id = ToolCallId::new(wire.id)
                        .map_err(|e| ModelError::Parse(e.to_string()))?;
                    // Malformed argument JSON degrades to an empty object:
                    // the executor rejects the call with error text and the
                    // turn continues, instead of aborting on a provider
                    // glitch.
                    let arguments: serde_json::Value =
                        serde_json::from_str(&wire.function.arguments).unwrap_or_else(|e| {
                            warn!(
                                tool = %wire.function.name,
                                error = %e,
                                "unparseable tool arguments, substituting empty object"
                            );
                            serde_json::json!({})
                        });
                    calls.push(ToolCall::new(id, wire.function.name, arguments));
                }
                Ok(Message::assistant_with_tool_calls(content, calls))
            }
            _ => Ok(Message::assistant(content)),
        }
    }
}
