//! Question answering through the hosted Gemini generative-language API.
//!
//! Each question is sent as the only text part of a single-turn `generateContent` request with
//! the API key in the `key` query parameter. The answer is the first part of the first
//! candidate; transport errors, non-2xx statuses and responses missing that path are all
//! reported as [`RemoteAnswerError`] so callers never mistake a failure for an answer.

use crate::config::Config;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while retrieving an answer from the remote capability.
#[derive(Debug, Error)]
pub enum RemoteAnswerError {
    /// Request did not include a question.
    #[error("Question is required")]
    MissingQuestion,
    /// No API key was configured, or the HTTP client could not be built.
    #[error("Answer service unavailable: {0}")]
    Unavailable(String),
    /// The service could not be reached.
    #[error("Failed to reach answer service: {0}")]
    Transport(String),
    /// The service answered with a non-success status.
    #[error("Answer service returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },
    /// The response did not contain `candidates[0].content.parts[0].text`.
    #[error("Malformed answer response: {0}")]
    MalformedResponse(String),
}

/// Interface implemented by remote answer backends.
#[async_trait]
pub trait AnswerClient: Send + Sync {
    /// Return the raw answer text for `question`.
    async fn ask(&self, question: &str) -> Result<String, RemoteAnswerError>;
}

/// Shared handle to an answer backend.
pub type SharedAnswerClient = Arc<dyn AnswerClient>;

/// Build the Gemini client described by `config`.
///
/// Returns `Ok(None)` when no API key is configured.
pub fn build_answer_client(
    config: &Config,
) -> Result<Option<SharedAnswerClient>, RemoteAnswerError> {
    let Some(api_key) = config.gemini_api_key.clone() else {
        return Ok(None);
    };
    let client = GeminiClient::new(
        config.gemini_base_url.clone(),
        config.gemini_model.clone(),
        api_key,
    )?;
    Ok(Some(Arc::new(client)))
}

/// Client for the `models/{model}:generateContent` endpoint.
pub struct GeminiClient {
    http: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    /// Create a client for `model` under `base_url`, authenticating with `api_key`.
    pub fn new(base_url: String, model: String, api_key: String) -> Result<Self, RemoteAnswerError> {
        let http = Client::builder()
            .user_agent("edassist/answer")
            .build()
            .map_err(|error| RemoteAnswerError::Unavailable(error.to_string()))?;
        Ok(Self {
            http,
            base_url,
            model,
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    fn into_answer(self) -> Result<String, RemoteAnswerError> {
        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| RemoteAnswerError::MalformedResponse("no candidates".into()))?;
        let part = candidate
            .content
            .and_then(|content| content.parts.into_iter().next())
            .ok_or_else(|| RemoteAnswerError::MalformedResponse("no content parts".into()))?;
        part.text
            .ok_or_else(|| RemoteAnswerError::MalformedResponse("part has no text".into()))
    }
}

#[async_trait]
impl AnswerClient for GeminiClient {
    async fn ask(&self, question: &str) -> Result<String, RemoteAnswerError> {
        let payload = json!({
            "contents": [
                { "parts": [ { "text": question } ] }
            ]
        });

        let response = self
            .http
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .send()
            .await
            .map_err(|error| RemoteAnswerError::Transport(error.to_string()))?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), model = %self.model, "Answer service responded");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteAnswerError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|error| RemoteAnswerError::MalformedResponse(error.to_string()))?;
        body.into_answer()
    }
}
