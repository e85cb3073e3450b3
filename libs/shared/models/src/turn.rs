use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::chat::SourceRef;

/// One persisted user message + bot reply. The only unit of multi-turn
/// memory: later turns recover conversational state by scanning these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub user_text: String,
    pub bot_text: String,
    #[serde(default)]
    pub sources: Vec<SourceRef>,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}
