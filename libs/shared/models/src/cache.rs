use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chat::SourceRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheScope {
    /// Keyed by the query alone; the cheap pre-retrieval gate.
    QueryOnly,
    /// Additionally keyed by a fingerprint of the retrieved passages.
    RagContext,
}

impl CacheScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheScope::QueryOnly => "query_only",
            CacheScope::RagContext => "rag_context",
        }
    }
}

/// One stored answer. At most one live row per `query_hash`; rows past
/// `expires_at` are treated as absent. `expires_at == None` never expires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub query_hash: String,
    pub normalized_query: String,
    pub intent: String,
    pub cache_scope: CacheScope,
    pub index_version: String,
    pub top_k: u32,
    pub prompt_version: String,
    pub response_text: String,
    #[serde(default)]
    pub sources: Vec<SourceRef>,
    pub expires_at: Option<DateTime<Utc>>,
    pub hit_count: u64,
}
