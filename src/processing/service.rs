//! Assistant service coordinating extraction, summarization, answers and speech.

use crate::{
    answer::{RemoteAnswerError, SharedAnswerClient, build_answer_client},
    config::Config,
    extraction::{Document, ExtractionError, TextExtractor},
    metrics::{AssistantMetrics, MetricsSnapshot},
    processing::{
        format::format_answer,
        summarize::Summarizer,
        types::{AnswerFormat, DocumentSummary, PipelineError},
    },
    speech::{
        AudioStore, AudioSynthesisError, GoogleTranslateTts, SharedSpeechSynthesizer,
        SynthesizedAudio,
    },
    summarization::build_summarization_client,
};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

/// Length bounds applied to every per-chunk summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryBounds {
    /// Maximum summary length.
    pub max_length: usize,
    /// Minimum summary length; shorter documents are returned unsummarized.
    pub min_length: usize,
}

/// Which external capabilities were initialized at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    /// A summarization backend is available.
    pub summarization: bool,
    /// The remote answer capability is configured.
    pub answers: bool,
    /// A speech backend is available.
    pub speech: bool,
}

/// Coordinates the two request flows: upload → extract → summarize, and question → answer →
/// format. Speech synthesis hangs off the same service.
///
/// Backend handles are built once in [`AssistantService::from_config`] and shared read-only
/// across requests; a backend that failed to build stays unavailable for the process lifetime
/// and dependent calls fail fast. Construct once near process start and share through an `Arc`.
pub struct AssistantService {
    extractor: TextExtractor,
    summarizer: Summarizer,
    answer_client: Option<SharedAnswerClient>,
    speech: Option<SharedSpeechSynthesizer>,
    audio_store: AudioStore,
    bounds: SummaryBounds,
    metrics: Arc<AssistantMetrics>,
}

/// Abstraction over the assistant pipeline used by external surfaces (HTTP, CLI).
#[async_trait]
pub trait AssistantApi: Send + Sync {
    /// OCR a document and summarize its text.
    async fn summarize_document(
        &self,
        document: Document,
    ) -> Result<DocumentSummary, PipelineError>;

    /// Ask the remote capability a question and lay the answer out as requested.
    async fn answer_question(
        &self,
        question: Option<String>,
        format: AnswerFormat,
    ) -> Result<String, PipelineError>;

    /// Speak `text` into an audio file; `filename` only sets the download name.
    async fn synthesize_audio(
        &self,
        text: Option<String>,
        filename: Option<String>,
    ) -> Result<SynthesizedAudio, PipelineError>;

    /// Report which capabilities initialized.
    fn capabilities(&self) -> Capabilities;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl AssistantService {
    /// Assemble a service from already-built components.
    pub fn new(
        extractor: TextExtractor,
        summarizer: Summarizer,
        answer_client: Option<SharedAnswerClient>,
        speech: Option<SharedSpeechSynthesizer>,
        audio_store: AudioStore,
        bounds: SummaryBounds,
    ) -> Self {
        Self {
            extractor,
            summarizer,
            answer_client,
            speech,
            audio_store,
            bounds,
            metrics: Arc::new(AssistantMetrics::new()),
        }
    }

    /// Build every capability described by `config`.
    ///
    /// Initialization failures are logged and leave the capability unavailable rather than
    /// aborting startup.
    pub fn from_config(config: &Config) -> Self {
        tracing::info!(
            provider = ?config.summarization_provider,
            model = %config.summarization_model,
            "Initializing summarization client"
        );
        let summarization_client = match build_summarization_client(config) {
            Ok(Some(client)) => Some(client),
            Ok(None) => {
                tracing::warn!("Summarization disabled; uploads will fail");
                None
            }
            Err(error) => {
                tracing::error!(error = %error, "Error initializing summarizer");
                None
            }
        };

        let answer_client = match build_answer_client(config) {
            Ok(Some(client)) => Some(client),
            Ok(None) => {
                tracing::warn!("GEMINI_API_KEY is not set; question answering disabled");
                None
            }
            Err(error) => {
                tracing::error!(error = %error, "Error initializing answer client");
                None
            }
        };

        let speech: Option<SharedSpeechSynthesizer> = match GoogleTranslateTts::from_config(config)
        {
            Ok(tts) => Some(Arc::new(tts)),
            Err(error) => {
                tracing::error!(error = %error, "Error initializing speech synthesizer");
                None
            }
        };

        let service = Self::new(
            TextExtractor::from_config(config),
            Summarizer::new(summarization_client, config.text_chunk_size),
            answer_client,
            speech,
            AudioStore::new(config.audio_dir.clone()),
            SummaryBounds {
                max_length: config.summary_max_length,
                min_length: config.summary_min_length,
            },
        );
        tracing::info!(capabilities = ?service.capabilities(), "Assistant service ready");
        service
    }

    /// OCR a document and summarize its text.
    pub async fn summarize_document(
        &self,
        document: Document,
    ) -> Result<DocumentSummary, PipelineError> {
        let result = self.run_document(document).await;
        match &result {
            Ok(summary) => self.metrics.record_document(summary.chunk_count as u64),
            Err(error) => self.record_failure("upload", error),
        }
        result
    }

    async fn run_document(&self, document: Document) -> Result<DocumentSummary, PipelineError> {
        tracing::info!(
            filename = %document.filename,
            kind = ?document.kind,
            bytes = document.bytes.len(),
            "Processing upload"
        );
        let extractor = self.extractor.clone();
        let extracted = tokio::task::spawn_blocking(move || extractor.extract(&document))
            .await
            .map_err(|error| {
                ExtractionError::OcrFailed(format!("extraction task failed: {error}"))
            })??;

        let summary = self
            .summarizer
            .summarize(
                &extracted.text,
                self.bounds.max_length,
                self.bounds.min_length,
            )
            .await?;

        tracing::info!(
            pages = extracted.page_count,
            chunks = summary.chunk_count,
            summary_chars = summary.text.chars().count(),
            "Document summarized"
        );
        Ok(DocumentSummary {
            summary: summary.text,
            original_text: extracted.text,
            chunk_count: summary.chunk_count,
            page_count: extracted.page_count,
        })
    }

    /// Ask the remote capability a question and lay the answer out as requested.
    pub async fn answer_question(
        &self,
        question: Option<String>,
        format: AnswerFormat,
    ) -> Result<String, PipelineError> {
        let result = self.run_question(question, format).await;
        match &result {
            Ok(_) => self.metrics.record_answer(),
            Err(error) => self.record_failure("answer", error),
        }
        result
    }

    async fn run_question(
        &self,
        question: Option<String>,
        format: AnswerFormat,
    ) -> Result<String, PipelineError> {
        let question = question
            .filter(|question| !question.trim().is_empty())
            .ok_or(RemoteAnswerError::MissingQuestion)?;
        let client = self.answer_client.as_ref().ok_or_else(|| {
            RemoteAnswerError::Unavailable("GEMINI_API_KEY is not set".into())
        })?;

        let raw = client.ask(&question).await?;
        let formatted = format_answer(&raw, format);
        if formatted.is_empty() {
            return Err(RemoteAnswerError::MalformedResponse("answer was empty".into()).into());
        }
        tracing::info!(?format, chars = formatted.chars().count(), "Question answered");
        Ok(formatted)
    }

    /// Speak `text` into a uniquely named audio file.
    pub async fn synthesize_audio(
        &self,
        text: Option<String>,
        filename: Option<String>,
    ) -> Result<SynthesizedAudio, PipelineError> {
        let result = self.run_speech(text, filename).await;
        match &result {
            Ok(_) => self.metrics.record_audio(),
            Err(error) => self.record_failure("audio", error),
        }
        result
    }

    async fn run_speech(
        &self,
        text: Option<String>,
        filename: Option<String>,
    ) -> Result<SynthesizedAudio, PipelineError> {
        let text = text
            .filter(|text| !text.trim().is_empty())
            .ok_or(AudioSynthesisError::MissingText)?;
        let speech = self.speech.as_ref().ok_or_else(|| {
            AudioSynthesisError::Unavailable("speech synthesizer failed to initialize".into())
        })?;

        let audio = speech.synthesize(&text).await?;
        let stored = self.audio_store.save(&audio, filename.as_deref()).await?;
        tracing::info!(
            path = %stored.path.display(),
            download_name = %stored.download_name,
            bytes = audio.len(),
            "Audio synthesized"
        );
        Ok(stored)
    }

    /// Report which capabilities initialized.
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            summarization: self.summarizer.is_available(),
            answers: self.answer_client.is_some(),
            speech: self.speech.is_some(),
        }
    }

    /// Return the current metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    fn record_failure(&self, stage: &'static str, error: &PipelineError) {
        self.metrics.record_failure();
        tracing::warn!(stage, error = %error, "Request failed");
    }
}

#[async_trait]
impl AssistantApi for AssistantService {
    async fn summarize_document(
        &self,
        document: Document,
    ) -> Result<DocumentSummary, PipelineError> {
        AssistantService::summarize_document(self, document).await
    }

    async fn answer_question(
        &self,
        question: Option<String>,
        format: AnswerFormat,
    ) -> Result<String, PipelineError> {
        AssistantService::answer_question(self, question, format).await
    }

    async fn synthesize_audio(
        &self,
        text: Option<String>,
        filename: Option<String>,
    ) -> Result<SynthesizedAudio, PipelineError> {
        AssistantService::synthesize_audio(self, text, filename).await
    }

    fn capabilities(&self) -> Capabilities {
        AssistantService::capabilities(self)
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        AssistantService::metrics_snapshot(self)
    }
}
