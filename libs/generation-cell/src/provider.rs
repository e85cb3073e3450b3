use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::client::TextGenerator;
use crate::error::GenerationError;
use crate::models::{ChatMessage, GenerationOutcome, ToolCallRequest, ToolSchema};

const MAX_ATTEMPTS: u32 = 3;
const RETRYABLE_STATUS: [u16; 5] = [429, 500, 502, 503, 504];

/// One OpenAI-compatible chat-completions endpoint.
pub struct OpenAiCompatProvider {
    name: String,
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiCompatProvider {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// POST with up to three attempts, sleeping longer before each retry.
    /// Only transient statuses are retried; anything else fails at once.
    async fn post_chat(&self, body: Value) -> Result<Value, GenerationError> {
        let url = format!("{}/chat/completions", self.base_url);
        let mut last_error = String::new();
        for attempt in 1..=MAX_ATTEMPTS {
            if attempt > 1 {
                tokio::time::sleep(Duration::from_millis(500 * u64::from(attempt - 1))).await;
            }
            let sent = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await;
            match sent {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.json::<Value>().await.map_err(|e| {
                            GenerationError::Protocol(format!("invalid json body: {e}"))
                        });
                    }
                    last_error = format!("HTTP {status}");
                    if !RETRYABLE_STATUS.contains(&status.as_u16()) {
                        return Err(GenerationError::Upstream(last_error));
                    }
                    warn!(provider = %self.name, attempt, %status, "transient provider error");
                }
                Err(e) => {
                    last_error = e.to_string();
                    warn!(provider = %self.name, attempt, "provider request failed: {}", e);
                }
            }
        }
        Err(GenerationError::Upstream(last_error))
    }

    fn parse_message(payload: &Value) -> Result<GenerationOutcome, GenerationError> {
        let message = payload
            .pointer("/choices/0/message")
            .ok_or_else(|| GenerationError::Protocol("missing choices[0].message".to_string()))?;
        if let Some(raw_calls) = message.get("tool_calls").and_then(Value::as_array) {
            let mut calls = Vec::new();
            for raw in raw_calls {
                let id = raw
                    .get("id")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let name = raw
                    .pointer("/function/name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        GenerationError::Protocol("tool call without a name".to_string())
                    })?
                    .to_string();
                let arguments = match raw.pointer("/function/arguments") {
                    Some(Value::String(s)) => {
                        serde_json::from_str(s).unwrap_or(Value::Object(Default::default()))
                    }
                    Some(v) => v.clone(),
                    None => Value::Object(Default::default()),
                };
                calls.push(ToolCallRequest { id, name, arguments });
            }
            if !calls.is_empty() {
                return Ok(GenerationOutcome::ToolCalls(calls));
            }
        }
        let content = message
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default();
        Ok(GenerationOutcome::Text(content.to_string()))
    }
}

#[async_trait]
impl TextGenerator for OpenAiCompatProvider {
    async fn complete(
        &self,
        system_prompt: &str,
        user_message: &str,
        temperature: f32,
    ) -> Result<String, GenerationError> {
        let body = json!({
            "model": self.model,
            "temperature": temperature,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_message },
            ],
        });
        let payload = self.post_chat(body).await?;
        debug!(provider = %self.name, "completion received");
        match Self::parse_message(&payload)? {
            GenerationOutcome::Text(text) => Ok(text),
            GenerationOutcome::ToolCalls(_) => Err(GenerationError::Protocol(
                "unexpected tool calls on a plain completion".to_string(),
            )),
        }
    }

    async fn complete_with_tools(
        &self,
        messages: Vec<ChatMessage>,
        tools: &[ToolSchema],
    ) -> Result<GenerationOutcome, GenerationError> {
        let tool_specs: Vec<Value> = tools
            .iter()
            .map(|t| {
                json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters,
                    }
                })
            })
            .collect();
        let mut body = json!({
            "model": self.model,
            "temperature": 0.2,
            "messages": messages,
        });
        if !tool_specs.is_empty() {
            body["tools"] = Value::Array(tool_specs);
        }
        let payload = self.post_chat(body).await?;
        Self::parse_message(&payload)
    }
}
