use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One inbound user turn as received from the transport layer.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: String,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    #[serde(default)]
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceRef {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TablePayload {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ButtonPayload {
    pub text: String,
    pub action: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub sources: Vec<SourceRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<TablePayload>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub buttons: Vec<ButtonPayload>,
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub reschedule_mode: bool,
    pub request_id: String,
}

impl ChatResponse {
    pub fn text(reply: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            sources: Vec::new(),
            table: None,
            buttons: Vec::new(),
            reschedule_mode: false,
            request_id: request_id.into(),
        }
    }
}
