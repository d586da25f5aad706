use super::{SummarizationClient, SummarizationClientError, SummarizationRequest, http_client};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

/// Summarization backed by the Hugging Face inference API.
///
/// Sends the chunk as `inputs` with greedy decoding (`do_sample: false`) and the caller's length
/// bounds, mirroring a local `transformers` summarization pipeline.
pub struct HuggingFaceSummarizationClient {
    http: Client,
    base_url: String,
    model: String,
    api_token: Option<String>,
}

impl HuggingFaceSummarizationClient {
    /// Create a client for `model` served under `base_url`.
    pub fn new(
        base_url: String,
        model: String,
        api_token: Option<String>,
    ) -> Result<Self, SummarizationClientError> {
        Ok(Self {
            http: http_client("edassist/summary")?,
            base_url,
            model,
            api_token,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}", self.base_url.trim_end_matches('/'), self.model)
    }
}

#[derive(Debug, Deserialize)]
struct SummaryCandidate {
    summary_text: String,
}

#[async_trait]
impl SummarizationClient for HuggingFaceSummarizationClient {
    async fn summarize(
        &self,
        request: SummarizationRequest,
    ) -> Result<String, SummarizationClientError> {
        let payload = json!({
            "inputs": request.text,
            "parameters": {
                "max_length": request.max_length,
                "min_length": request.min_length,
                "do_sample": false,
            },
            "options": {
                "wait_for_model": true,
            }
        });

        let mut builder = self.http.post(self.endpoint()).json(&payload);
        if let Some(token) = &self.api_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|error| {
            SummarizationClientError::ProviderUnavailable(format!(
                "failed to reach Hugging Face at {}: {error}",
                self.base_url
            ))
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::SERVICE_UNAVAILABLE {
            return Err(SummarizationClientError::ProviderUnavailable(format!(
                "model {} returned {status}",
                self.model
            )));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizationClientError::GenerationFailed(format!(
                "Hugging Face returned {status}: {body}"
            )));
        }

        let candidates: Vec<SummaryCandidate> = response.json().await.map_err(|error| {
            SummarizationClientError::InvalidResponse(format!(
                "failed to decode Hugging Face response: {error}"
            ))
        })?;

        candidates
            .into_iter()
            .next()
            .map(|candidate| candidate.summary_text.trim().to_string())
            .ok_or_else(|| {
                SummarizationClientError::InvalidResponse("response contained no summaries".into())
            })
    }
}
