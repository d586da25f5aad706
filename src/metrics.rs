use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing pipeline activity since startup.
#[derive(Default)]
pub struct AssistantMetrics {
    documents_summarized: AtomicU64,
    chunks_summarized: AtomicU64,
    questions_answered: AtomicU64,
    audio_synthesized: AtomicU64,
    failures: AtomicU64,
}

impl AssistantMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a summarized document and the number of chunks sent to the backend for it.
    pub fn record_document(&self, chunk_count: u64) {
        self.documents_summarized.fetch_add(1, Ordering::Relaxed);
        self.chunks_summarized
            .fetch_add(chunk_count, Ordering::Relaxed);
    }

    /// Record an answered question.
    pub fn record_answer(&self) {
        self.questions_answered.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a synthesized audio file.
    pub fn record_audio(&self) {
        self.audio_synthesized.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a request that failed in any stage.
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_summarized: self.documents_summarized.load(Ordering::Relaxed),
            chunks_summarized: self.chunks_summarized.load(Ordering::Relaxed),
            questions_answered: self.questions_answered.load(Ordering::Relaxed),
            audio_synthesized: self.audio_synthesized.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of pipeline counters used for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Uploaded documents that produced a summary.
    pub documents_summarized: u64,
    /// Total chunks sent to the summarization backend.
    pub chunks_summarized: u64,
    /// Questions that produced an answer.
    pub questions_answered: u64,
    /// Audio files written.
    pub audio_synthesized: u64,
    /// Requests that failed in any stage.
    pub failures: u64,
}
