//! Chunked summarization of extracted text.

use crate::summarization::{SharedSummarizationClient, SummarizationRequest};

use super::chunking::chunks;
use super::types::SummarizationError;

/// Summary produced by [`Summarizer::summarize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedSummary {
    /// Per-chunk summaries joined with a single space, in chunk order.
    pub text: String,
    /// Chunks sent to the backend; zero when the input was short enough to return as-is.
    pub chunk_count: usize,
}

/// Wraps text into chunks and summarizes each one with the configured backend.
///
/// The backend handle is built once at startup and shared; when it could not be built the
/// summarizer is still constructed but every call fails with
/// [`SummarizationError::ServiceUnavailable`].
#[derive(Clone)]
pub struct Summarizer {
    client: Option<SharedSummarizationClient>,
    chunk_size: usize,
}

impl Summarizer {
    /// Create a summarizer that wraps text at `chunk_size` characters.
    pub fn new(client: Option<SharedSummarizationClient>, chunk_size: usize) -> Self {
        Self { client, chunk_size }
    }

    /// Whether a summarization backend is available.
    pub fn is_available(&self) -> bool {
        self.client.is_some()
    }

    /// Summarize `text`, bounding each per-chunk summary by `max_length`/`min_length`.
    ///
    /// Text whose trimmed length is below `min_length` is returned trimmed without calling the
    /// backend. Any chunk failure aborts the whole call.
    pub async fn summarize(
        &self,
        text: &str,
        max_length: usize,
        min_length: usize,
    ) -> Result<ChunkedSummary, SummarizationError> {
        if text.is_empty() {
            return Err(SummarizationError::InvalidInput);
        }
        let client = self
            .client
            .as_ref()
            .ok_or(SummarizationError::ServiceUnavailable)?;

        let text = text.trim();
        if text.chars().count() < min_length {
            tracing::debug!(
                chars = text.chars().count(),
                min_length,
                "Text shorter than minimum summary length; returning unchanged"
            );
            return Ok(ChunkedSummary {
                text: text.to_string(),
                chunk_count: 0,
            });
        }

        let mut summaries = Vec::new();
        for (index, chunk) in chunks(text, self.chunk_size)?.enumerate() {
            if chunk.trim().is_empty() {
                continue;
            }
            tracing::debug!(index, chars = chunk.chars().count(), "Summarizing chunk");
            let summary = client
                .summarize(SummarizationRequest {
                    text: chunk.to_string(),
                    max_length,
                    min_length,
                })
                .await
                .map_err(|source| {
                    tracing::warn!(index, error = %source, "Chunk summarization failed");
                    SummarizationError::Chunk { index, source }
                })?;
            summaries.push(summary);
        }

        Ok(ChunkedSummary {
            chunk_count: summaries.len(),
            text: summaries.join(" "),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::chunking::chunk_text;
    use crate::summarization::{SummarizationClient, SummarizationClientError};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    /// Echoes a tagged copy of each chunk and records what it saw.
    #[derive(Default)]
    struct RecordingClient {
        seen: Mutex<Vec<SummarizationRequest>>,
        fail_on: Option<usize>,
    }

    #[async_trait]
    impl SummarizationClient for RecordingClient {
        async fn summarize(
            &self,
            request: SummarizationRequest,
        ) -> Result<String, SummarizationClientError> {
            let mut seen = self.seen.lock().unwrap();
            let position = seen.len();
            let tagged = format!("[{}]", request.text.split_whitespace().next().unwrap_or(""));
            seen.push(request);
            if self.fail_on == Some(position) {
                return Err(SummarizationClientError::GenerationFailed("boom".into()));
            }
            Ok(tagged)
        }
    }

    fn summarizer(client: Arc<RecordingClient>, chunk_size: usize) -> Summarizer {
        Summarizer::new(Some(client), chunk_size)
    }

    #[tokio::test]
    async fn empty_text_is_invalid_input() {
        let client = Arc::new(RecordingClient::default());
        let error = summarizer(client, 16)
            .summarize("", 150, 50)
            .await
            .unwrap_err();
        assert!(matches!(error, SummarizationError::InvalidInput));
    }

    #[tokio::test]
    async fn missing_backend_fails_fast() {
        let error = Summarizer::new(None, 16)
            .summarize("some text", 150, 1)
            .await
            .unwrap_err();
        assert!(matches!(error, SummarizationError::ServiceUnavailable));
    }

    #[tokio::test]
    async fn short_text_is_returned_trimmed_without_backend_calls() {
        let client = Arc::new(RecordingClient::default());
        let result = summarizer(client.clone(), 16)
            .summarize("  brief note \n", 150, 50)
            .await
            .unwrap();

        assert_eq!(result.text, "brief note");
        assert_eq!(result.chunk_count, 0);
        assert!(client.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn summaries_follow_chunk_order() {
        let client = Arc::new(RecordingClient::default());
        let text = "alpha one two three beta four five six gamma seven eight";
        let result = summarizer(client.clone(), 20)
            .summarize(text, 40, 5)
            .await
            .unwrap();

        let expected_chunks = chunk_text(text, 20).unwrap();
        let seen: Vec<String> = client
            .seen
            .lock()
            .unwrap()
            .iter()
            .map(|request| request.text.clone())
            .collect();
        assert_eq!(seen, expected_chunks);
        assert_eq!(result.chunk_count, expected_chunks.len());
        assert_eq!(result.text, "[alpha] [beta] [gamma]");

        for request in client.seen.lock().unwrap().iter() {
            assert_eq!(request.max_length, 40);
            assert_eq!(request.min_length, 5);
        }
    }

    #[tokio::test]
    async fn chunk_failure_discards_partial_summary() {
        let client = Arc::new(RecordingClient {
            fail_on: Some(1),
            ..RecordingClient::default()
        });
        let error = summarizer(client.clone(), 10)
            .summarize("first chunk second chunk third chunk", 40, 5)
            .await
            .unwrap_err();

        assert!(matches!(error, SummarizationError::Chunk { index: 1, .. }));
        assert_eq!(client.seen.lock().unwrap().len(), 2);
    }
}
