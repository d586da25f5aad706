//! Core data types and error definitions for the processing pipeline.

use crate::{
    answer::RemoteAnswerError, extraction::ExtractionError, speech::AudioSynthesisError,
    summarization::SummarizationClientError,
};
use serde::Serialize;
use thiserror::Error;

/// Errors produced while splitting text into chunks.
#[derive(Debug, Error)]
pub enum ChunkingError {
    /// A zero-width wrap was requested.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
}

/// Errors raised by the summarization stage.
#[derive(Debug, Error)]
pub enum SummarizationError {
    /// Input text was empty.
    #[error("Input text must be a non-empty string")]
    InvalidInput,
    /// No summarization backend was initialized at startup.
    #[error("Summarization model failed to initialize")]
    ServiceUnavailable,
    /// Chunking configuration was invalid.
    #[error("Summarization failed: {0}")]
    Chunking(#[from] ChunkingError),
    /// The backend failed on one chunk; no partial summary is kept.
    #[error("Summarization failed on chunk {index}: {source}")]
    Chunk {
        /// Zero-based position of the failing chunk.
        index: usize,
        /// Underlying backend failure.
        #[source]
        source: SummarizationClientError,
    },
}

/// Errors emitted by the assistant pipeline, one variant per failing stage.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Upload request carried no file.
    #[error("No file selected")]
    NoFileSelected,
    /// OCR or page rendering failed, or produced no text.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    /// Summarizing the extracted text failed.
    #[error("Error during summarization: {0}")]
    Summarization(#[from] SummarizationError),
    /// The hosted answer capability did not produce an answer.
    #[error(transparent)]
    RemoteAnswer(#[from] RemoteAnswerError),
    /// Speech synthesis failed or had nothing to say.
    #[error(transparent)]
    AudioSynthesis(#[from] AudioSynthesisError),
}

/// Result of running an uploaded document through extraction and summarization.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    /// Combined per-chunk summaries.
    pub summary: String,
    /// Text recovered by OCR.
    pub original_text: String,
    /// Number of chunks sent to the summarization backend.
    pub chunk_count: usize,
    /// Pages (or images) that were OCR'd.
    pub page_count: usize,
}

/// Layout applied to an answer before it is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnswerFormat {
    /// One `- ` prefixed sentence per line.
    Points,
    /// One sentence per line.
    #[default]
    Paragraph,
}

impl AnswerFormat {
    /// Map a caller-supplied format name; anything other than `points` lays out as a paragraph.
    pub fn from_request(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(name) if name.eq_ignore_ascii_case("points") => Self::Points,
            _ => Self::Paragraph,
        }
    }
}
