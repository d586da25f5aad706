//! Abstractions for generating abstractive summaries via hosted or local providers.
//!
//! The processing layer sends one request per text chunk. Two backends are available: the
//! Hugging Face inference API (the default, serving `facebook/bart-large-cnn`) and a local
//! Ollama runtime. Both are plain HTTP adapters built on `reqwest`.

mod huggingface;
mod ollama;

pub use huggingface::HuggingFaceSummarizationClient;
pub use ollama::OllamaSummarizationClient;

use crate::config::{Config, SummarizationProvider};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced while attempting abstractive summarization.
#[derive(Debug, Error)]
pub enum SummarizationClientError {
    /// Provider was explicitly disabled or unreachable.
    #[error("Summarization provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Provider returned an error response.
    #[error("Failed to generate summary: {0}")]
    GenerationFailed(String),
    /// Provider response could not be parsed.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

/// Request payload passed to the summarization provider for a single chunk.
#[derive(Debug, Clone)]
pub struct SummarizationRequest {
    /// Chunk of source text to compress.
    pub text: String,
    /// Maximum summary length requested by the caller.
    pub max_length: usize,
    /// Minimum summary length requested by the caller.
    pub min_length: usize,
}

/// Interface implemented by abstractive summarization providers.
#[async_trait]
pub trait SummarizationClient: Send + Sync {
    /// Summarize one chunk of text within the requested length bounds.
    async fn summarize(
        &self,
        request: SummarizationRequest,
    ) -> Result<String, SummarizationClientError>;
}

/// Shared handle to a summarization backend.
pub type SharedSummarizationClient = Arc<dyn SummarizationClient>;

/// Build a summarization client based on configuration.
///
/// Returns `Ok(None)` when summarization is disabled.
pub fn build_summarization_client(
    config: &Config,
) -> Result<Option<SharedSummarizationClient>, SummarizationClientError> {
    match config.summarization_provider {
        SummarizationProvider::None => Ok(None),
        SummarizationProvider::HuggingFace => {
            let client = HuggingFaceSummarizationClient::new(
                config.huggingface_api_url.clone(),
                config.summarization_model.clone(),
                config.huggingface_api_token.clone(),
            )?;
            Ok(Some(Arc::new(client)))
        }
        SummarizationProvider::Ollama => {
            let client = OllamaSummarizationClient::new(
                config.ollama_url.clone(),
                config.summarization_model.clone(),
            )?;
            Ok(Some(Arc::new(client)))
        }
    }
}

fn http_client(user_agent: &str) -> Result<reqwest::Client, SummarizationClientError> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .build()
        .map_err(|error| {
            SummarizationClientError::ProviderUnavailable(format!(
                "failed to construct HTTP client: {error}"
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_provider_builds_no_client() {
        let config = Config {
            summarization_provider: SummarizationProvider::None,
            ..Config::default()
        };
        assert!(build_summarization_client(&config).unwrap().is_none());
    }

    #[test]
    fn configured_providers_build_clients() {
        for provider in [SummarizationProvider::HuggingFace, SummarizationProvider::Ollama] {
            let config = Config {
                summarization_provider: provider,
                ..Config::default()
            };
            assert!(build_summarization_client(&config).unwrap().is_some());
        }
    }
}
