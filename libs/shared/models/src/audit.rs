use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Append-only record of one tool invocation. Written exactly once per
/// `execute` call, success or failure, with PII already masked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolAuditLogEntry {
    pub request_id: String,
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub tool_name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    pub latency_ms: u64,
    pub args_masked: Value,
    pub created_at: DateTime<Utc>,
}
