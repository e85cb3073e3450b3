use async_trait::async_trait;

use crate::error::GenerationError;
use crate::models::{ChatMessage, GenerationOutcome, RetrievedPassage, ToolSchema};

/// The one seam between dialogue logic and any LLM. Implementations decide
/// transport, retry and failover; callers only see this contract.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &str,
        user_message: &str,
        temperature: f32,
    ) -> Result<String, GenerationError>;

    async fn complete_with_tools(
        &self,
        messages: Vec<ChatMessage>,
        tools: &[ToolSchema],
    ) -> Result<GenerationOutcome, GenerationError>;
}

/// Black-box passage search. The real system backs this with a vector
/// index; tests and the default app wiring use a keyword scorer.
#[async_trait]
pub trait DocumentRetriever: Send + Sync {
    async fn search(
        &self,
        query: &str,
        top_k: u32,
    ) -> Result<Vec<RetrievedPassage>, GenerationError>;
}
