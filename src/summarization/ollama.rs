use super::{SummarizationClient, SummarizationClientError, SummarizationRequest, http_client};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

const TEMPERATURE: f32 = 0.1;

/// Summarization backed by a local Ollama runtime.
///
/// The chunk is sent as the prompt with the summarizing instruction in `system`. The length
/// bounds go into the instruction and `max_length` also caps generation via `num_predict`, the
/// same token budget a seq2seq summarizer applies.
pub struct OllamaSummarizationClient {
    http: Client,
    base_url: String,
    model: String,
}

impl OllamaSummarizationClient {
    /// Create a client for `model` served by the Ollama instance at `base_url`.
    pub fn new(base_url: String, model: String) -> Result<Self, SummarizationClientError> {
        Ok(Self {
            http: http_client("edassist/summary")?,
            base_url,
            model,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }

    fn generate_request<'a>(&'a self, request: &'a SummarizationRequest) -> GenerateRequest<'a> {
        GenerateRequest {
            model: &self.model,
            system: system_prompt(request),
            prompt: &request.text,
            stream: false,
            options: GenerateOptions {
                temperature: TEMPERATURE,
                num_predict: request.max_length,
            },
        }
    }
}

fn system_prompt(request: &SummarizationRequest) -> String {
    format!(
        "Summarize the user's text in {} to {} words. Reply with the summary only, as a single paragraph.",
        request.min_length, request.max_length
    )
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    system: String,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: usize,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
    done: bool,
    #[serde(default)]
    done_reason: Option<String>,
}

#[async_trait]
impl SummarizationClient for OllamaSummarizationClient {
    async fn summarize(
        &self,
        request: SummarizationRequest,
    ) -> Result<String, SummarizationClientError> {
        let response = self
            .http
            .post(self.endpoint())
            .json(&self.generate_request(&request))
            .send()
            .await
            .map_err(|error| {
                SummarizationClientError::ProviderUnavailable(format!(
                    "Ollama at {} is unreachable: {error}",
                    self.base_url
                ))
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                return Err(SummarizationClientError::ProviderUnavailable(format!(
                    "model {} is not available on {}",
                    self.model, self.base_url
                )));
            }
            status if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                return Err(SummarizationClientError::GenerationFailed(format!(
                    "Ollama returned {status}: {body}"
                )));
            }
            _ => {}
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|error| SummarizationClientError::InvalidResponse(error.to_string()))?;
        if !generated.done {
            return Err(SummarizationClientError::InvalidResponse(
                "generation did not finish".into(),
            ));
        }
        if generated.done_reason.as_deref() == Some("length") {
            tracing::debug!(
                num_predict = request.max_length,
                "Ollama summary hit the token budget"
            );
        }

        let summary = generated.response.trim();
        if summary.is_empty() {
            return Err(SummarizationClientError::InvalidResponse(
                "empty summary".into(),
            ));
        }
        Ok(summary.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};
    use serde_json::json;

    fn request() -> SummarizationRequest {
        SummarizationRequest {
            text: "Chunk body".into(),
            max_length: 120,
            min_length: 30,
        }
    }

    #[test]
    fn system_prompt_carries_bounds() {
        assert!(system_prompt(&request()).contains("30 to 120 words"));
    }

    #[tokio::test]
    async fn ollama_client_handles_successful_response() {
        let server = MockServer::start_async().await;
        let client = OllamaSummarizationClient::new(server.base_url(), "llama3".into())
            .expect("client");

        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/generate")
                    .json_body_partial(
                        r#"{"model":"llama3","prompt":"Chunk body","stream":false,"options":{"num_predict":120}}"#,
                    );
                then.status(200).json_body(json!({
                    "response": "Summary text\n",
                    "done": true
                }));
            })
            .await;

        let summary = client.summarize(request()).await.expect("summary");

        mock.assert_async().await;
        assert_eq!(summary, "Summary text");
    }

    #[tokio::test]
    async fn ollama_client_handles_error_status() {
        let server = MockServer::start_async().await;
        let client = OllamaSummarizationClient::new(server.base_url(), "llama3".into())
            .expect("client");

        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(500).body("boom");
            })
            .await;

        let error = client.summarize(request()).await.expect_err("error response");

        assert!(
            matches!(&error, SummarizationClientError::GenerationFailed(message) if message.contains("500"))
        );
    }

    #[tokio::test]
    async fn incomplete_response_is_rejected() {
        let server = MockServer::start_async().await;
        let client = OllamaSummarizationClient::new(server.base_url(), "llama3".into())
            .expect("client");

        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(200)
                    .json_body(json!({ "response": "partial", "done": false }));
            })
            .await;

        let error = client.summarize(request()).await.expect_err("incomplete");
        assert!(matches!(error, SummarizationClientError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn blank_summary_is_rejected() {
        let server = MockServer::start_async().await;
        let client = OllamaSummarizationClient::new(server.base_url(), "llama3".into())
            .expect("client");

        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(200).json_body(
                    json!({ "response": "  \n", "done": true, "done_reason": "stop" }),
                );
            })
            .await;

        let error = client.summarize(request()).await.expect_err("blank");
        assert!(matches!(error, SummarizationClientError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn missing_model_is_unavailable() {
        let server = MockServer::start_async().await;
        let client = OllamaSummarizationClient::new(server.base_url(), "llama3".into())
            .expect("client");

        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(404).json_body(json!({ "error": "model 'llama3' not found" }));
            })
            .await;

        let error = client.summarize(request()).await.expect_err("missing model");
        assert!(matches!(error, SummarizationClientError::ProviderUnavailable(_)));
    }
}
