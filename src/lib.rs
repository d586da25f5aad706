#![deny(missing_docs)]

//! Core library for EdAssist, a document study assistant.
//!
//! Uploaded PDFs and images are OCR'd and summarized chunk by chunk; questions are answered by a
//! hosted generative model; any text can be spoken into an MP3.

/// HTTP routing and handlers.
pub mod api;
/// Remote question answering.
pub mod answer;
/// Environment-driven configuration management.
pub mod config;
/// OCR-based text extraction from documents.
pub mod extraction;
/// Structured logging and tracing setup.
pub mod logging;
/// Request metrics helpers.
pub mod metrics;
/// Chunking, summarization orchestration and answer formatting.
pub mod processing;
/// Text-to-speech and audio storage.
pub mod speech;
/// Summarization backends.
pub mod summarization;
/// HTML page templates.
pub mod templates;
