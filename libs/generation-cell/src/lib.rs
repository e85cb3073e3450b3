//! Text-generation and passage-retrieval seams: provider-agnostic traits,
//! OpenAI-compatible HTTP providers with bounded retry, ordered failover.

pub mod client;
pub mod error;
pub mod failover;
pub mod models;
pub mod provider;
pub mod retriever;

pub use client::{DocumentRetriever, TextGenerator};
pub use error::GenerationError;
pub use failover::FailoverGenerator;
pub use models::{
    ChatMessage, GenerationOutcome, RetrievedPassage, ToolCallRequest, ToolSchema,
};
pub use provider::OpenAiCompatProvider;
pub use retriever::{CorpusDocument, KeywordRetriever};
