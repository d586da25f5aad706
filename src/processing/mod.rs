//! Document pipeline: chunking, chunked summarization, answer formatting and orchestration.

pub mod chunking;
pub mod format;
mod service;
pub mod summarize;
pub mod types;

pub use service::{AssistantApi, AssistantService, Capabilities, SummaryBounds};
pub use summarize::{ChunkedSummary, Summarizer};
pub use types::{
    AnswerFormat, ChunkingError, DocumentSummary, PipelineError, SummarizationError,
};
