use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::client::TextGenerator;
use crate::error::GenerationError;
use crate::models::{ChatMessage, GenerationOutcome, ToolSchema};

/// Ordered provider list behind the plain [`TextGenerator`] contract.
/// Each provider already retries its own transient failures; this layer
/// only moves on when a provider gives up entirely.
pub struct FailoverGenerator {
    providers: Vec<(String, Arc<dyn TextGenerator>)>,
}

impl FailoverGenerator {
    pub fn new(providers: Vec<(String, Arc<dyn TextGenerator>)>) -> Self {
        Self { providers }
    }
}

#[async_trait]
impl TextGenerator for FailoverGenerator {
    async fn complete(
        &self,
        system_prompt: &str,
        user_message: &str,
        temperature: f32,
    ) -> Result<String, GenerationError> {
        for (name, provider) in &self.providers {
            match provider.complete(system_prompt, user_message, temperature).await {
                Ok(text) => return Ok(text),
                Err(e) => warn!(provider = %name, "provider exhausted, trying next: {}", e),
            }
        }
        Err(GenerationError::AllProvidersFailed)
    }

    async fn complete_with_tools(
        &self,
        messages: Vec<ChatMessage>,
        tools: &[ToolSchema],
    ) -> Result<GenerationOutcome, GenerationError> {
        for (name, provider) in &self.providers {
            match provider.complete_with_tools(messages.clone(), tools).await {
                Ok(outcome) => return Ok(outcome),
                Err(e) => warn!(provider = %name, "provider exhausted, trying next: {}", e),
            }
        }
        Err(GenerationError::AllProvidersFailed)
    }
}
