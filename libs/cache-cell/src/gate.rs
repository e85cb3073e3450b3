use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, warn};

use shared_models::{CacheEntry, CacheScope, SourceRef};
use shared_store::CacheStore;

use crate::key::{compute_key, normalize_query, sources_fingerprint, KeyVersions};

/// Queries about the current moment go stale fast; anything containing
/// one of these gets the short TTL class.
const DYNAMIC_KEYWORDS: [&str; 7] = ["오늘", "지금", "현재", "대기", "예약 현황", "몇 명", "몇명"];

/// Intents whose answers never change between deployments.
const STATIC_INTENTS: [&str; 3] = ["static_info", "safety", "smalltalk"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlClass {
    /// Never cached. Tool-backed answers reflect per-user state.
    None,
    Short,
    Long,
    Default,
}

pub fn classify_ttl(intent: &str, query: &str) -> TtlClass {
    if intent == "tool" {
        return TtlClass::None;
    }
    if STATIC_INTENTS.contains(&intent) {
        return TtlClass::Long;
    }
    if DYNAMIC_KEYWORDS.iter().any(|kw| query.contains(kw)) {
        return TtlClass::Short;
    }
    TtlClass::Default
}

#[derive(Debug, Clone)]
pub struct CachedAnswer {
    pub response_text: String,
    pub sources: Vec<SourceRef>,
}

#[derive(Debug, Clone)]
pub struct TtlSettings {
    pub default_secs: u64,
    pub dynamic_secs: u64,
    pub static_secs: u64,
}

/// Read/write front for the response cache. Expired rows read as misses
/// and are deleted on the spot; hits bump `hit_count` without extending
/// the lifetime.
pub struct ResponseCacheGate {
    store: Arc<dyn CacheStore>,
    versions: KeyVersions,
    ttls: TtlSettings,
}

impl ResponseCacheGate {
    pub fn new(store: Arc<dyn CacheStore>, versions: KeyVersions, ttls: TtlSettings) -> Self {
        Self { store, versions, ttls }
    }

    pub async fn lookup(
        &self,
        intent: &str,
        query: &str,
        scope: CacheScope,
        sources: &[SourceRef],
    ) -> Option<CachedAnswer> {
        let normalized = normalize_query(query);
        let sources_hash = (scope == CacheScope::RagContext)
            .then(|| sources_fingerprint(sources));
        let key = compute_key(
            intent,
            &normalized,
            scope,
            &self.versions,
            sources_hash.as_deref(),
        );

        let entry = match self.store.get(&key).await {
            Ok(hit) => hit?,
            Err(err) => {
                warn!("cache lookup failed: {err}");
                return None;
            }
        };
        if let Some(expires_at) = entry.expires_at {
            if expires_at <= Utc::now() {
                debug!(scope = scope.as_str(), "expired cache row dropped");
                if let Err(err) = self.store.delete(&key).await {
                    warn!("cache delete failed: {err}");
                }
                return None;
            }
        }
        if let Err(err) = self.store.record_hit(&key).await {
            warn!("cache hit count failed: {err}");
        }
        debug!(scope = scope.as_str(), hits = entry.hit_count + 1, "cache hit");
        Some(CachedAnswer {
            response_text: entry.response_text,
            sources: entry.sources,
        })
    }

    pub async fn store(
        &self,
        intent: &str,
        query: &str,
        scope: CacheScope,
        sources: &[SourceRef],
        response_text: &str,
    ) {
        let ttl_secs = match classify_ttl(intent, query) {
            TtlClass::None => return,
            TtlClass::Short => self.ttls.dynamic_secs,
            TtlClass::Long => self.ttls.static_secs,
            TtlClass::Default => self.ttls.default_secs,
        };
        let normalized = normalize_query(query);
        let sources_hash = (scope == CacheScope::RagContext)
            .then(|| sources_fingerprint(sources));
        let key = compute_key(
            intent,
            &normalized,
            scope,
            &self.versions,
            sources_hash.as_deref(),
        );
        let entry = CacheEntry {
            query_hash: key,
            normalized_query: normalized,
            intent: intent.to_string(),
            cache_scope: scope,
            index_version: self.versions.index_version.clone(),
            top_k: self.versions.top_k,
            prompt_version: self.versions.prompt_version.clone(),
            response_text: response_text.to_string(),
            sources: sources.to_vec(),
            expires_at: Some(Utc::now() + Duration::seconds(ttl_secs as i64)),
            hit_count: 0,
        };
        if let Err(err) = self.store.upsert(entry).await {
            warn!("cache write failed: {err}");
        }
    }
}
