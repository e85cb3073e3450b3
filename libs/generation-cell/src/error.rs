use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Upstream provider error: {0}")]
    Upstream(String),

    #[error("Malformed provider response: {0}")]
    Protocol(String),

    #[error("All configured providers failed")]
    AllProvidersFailed,
}
