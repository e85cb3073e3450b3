use async_trait::async_trait;

use crate::client::DocumentRetriever;
use crate::error::GenerationError;
use crate::models::RetrievedPassage;

#[derive(Debug, Clone)]
pub struct CorpusDocument {
    pub id: String,
    pub title: String,
    pub text: String,
}

/// Token-overlap retriever standing in for the vector index. Good enough
/// for routing tests and offline runs; ranking quality is not the point.
pub struct KeywordRetriever {
    documents: Vec<CorpusDocument>,
}

impl KeywordRetriever {
    pub fn new(documents: Vec<CorpusDocument>) -> Self {
        Self { documents }
    }
}

fn tokenize(text: &str) -> Vec<&str> {
    text.split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
        .filter(|t| !t.is_empty())
        .collect()
}

#[async_trait]
impl DocumentRetriever for KeywordRetriever {
    async fn search(
        &self,
        query: &str,
        top_k: u32,
    ) -> Result<Vec<RetrievedPassage>, GenerationError> {
        let query_tokens = tokenize(query);
        if query_tokens.is_empty() {
            return Ok(Vec::new());
        }
        let mut scored: Vec<RetrievedPassage> = self
            .documents
            .iter()
            .filter_map(|doc| {
                let hits = query_tokens
                    .iter()
                    .filter(|t| doc.text.contains(**t) || doc.title.contains(**t))
                    .count();
                if hits == 0 {
                    return None;
                }
                Some(RetrievedPassage {
                    id: doc.id.clone(),
                    title: Some(doc.title.clone()),
                    snippet: doc.text.chars().take(200).collect(),
                    score: hits as f64 / query_tokens.len() as f64,
                })
            })
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k as usize);
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn best_overlap_ranks_first() {
        let retriever = KeywordRetriever::new(vec![
            CorpusDocument {
                id: "doc-1".to_string(),
                title: "주차 안내".to_string(),
                text: "주차장은 본관 지하에 있습니다".to_string(),
            },
            CorpusDocument {
                id: "doc-2".to_string(),
                title: "진료 안내".to_string(),
                text: "진료 시간은 평일 오전 8시 30분부터입니다".to_string(),
            },
        ]);
        let found = retriever.search("진료 시간 알려줘", 2).await.unwrap();
        assert_eq!(found[0].id, "doc-2");
    }

    #[tokio::test]
    async fn no_overlap_returns_empty() {
        let retriever = KeywordRetriever::new(vec![]);
        assert!(retriever.search("아무거나", 3).await.unwrap().is_empty());
    }
}
