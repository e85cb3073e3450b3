use sha2::{Digest, Sha256};

use shared_models::{CacheScope, SourceRef};

/// Deployment-level key components. Bumping any of these invalidates
/// every cached answer at once.
#[derive(Debug, Clone)]
pub struct KeyVersions {
    pub index_version: String,
    pub top_k: u32,
    pub prompt_version: String,
}

/// Whitespace-collapsed, lowercased form used both for keying and for
/// the stored `normalized_query` column.
pub fn normalize_query(query: &str) -> String {
    query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Fingerprint of the retrieved passages, so a rag_context entry only
/// matches while retrieval returns the same documents.
pub fn sources_fingerprint(sources: &[SourceRef]) -> String {
    let mut hasher = Sha256::new();
    for source in sources {
        hasher.update(source.id.as_deref().unwrap_or("").as_bytes());
        hasher.update([0u8]);
    }
    hex_digest(hasher)
}

pub fn compute_key(
    intent: &str,
    normalized_query: &str,
    scope: CacheScope,
    versions: &KeyVersions,
    sources_hash: Option<&str>,
) -> String {
    let mut hasher = Sha256::new();
    let material = format!(
        "{intent}|{normalized_query}|{}|{}|{}|{}|{}",
        versions.index_version,
        versions.top_k,
        versions.prompt_version,
        scope.as_str(),
        sources_hash.unwrap_or(""),
    );
    hasher.update(material.as_bytes());
    hex_digest(hasher)
}

fn hex_digest(hasher: Sha256) -> String {
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
