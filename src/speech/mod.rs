//! Text-to-speech synthesis and audio file storage.
//!
//! The default synthesizer speaks through the Google Translate TTS endpoint, which accepts at
//! most about 100 characters per request. Text is word-wrapped into segments of that size and the
//! MP3 responses are concatenated in order; MP3 frames are self-delimiting so the result plays as
//! one file.
//!
//! Synthesized audio is written under the configured audio directory with a fresh UUID file
//! name. The caller's requested name only becomes the download name.

use crate::config::Config;
use crate::processing::chunking::chunks;
use async_trait::async_trait;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

const MAX_SEGMENT_CHARS: usize = 100;
const DEFAULT_DOWNLOAD_STEM: &str = "audio";

/// Errors raised while synthesizing or storing speech.
#[derive(Debug, Error)]
pub enum AudioSynthesisError {
    /// Request did not include any text to speak.
    #[error("No text provided")]
    MissingText,
    /// No speech backend could be initialized.
    #[error("Speech service unavailable: {0}")]
    Unavailable(String),
    /// The TTS service could not be reached.
    #[error("Failed to reach speech service: {0}")]
    Transport(String),
    /// The TTS service answered with a non-success status.
    #[error("Speech service returned {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },
    /// Writing the audio file failed.
    #[error("Failed to store audio: {0}")]
    Io(#[from] std::io::Error),
}

/// Interface implemented by speech backends.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Render `text` to MP3 bytes.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, AudioSynthesisError>;
}

/// Shared handle to a speech backend.
pub type SharedSpeechSynthesizer = Arc<dyn SpeechSynthesizer>;

/// Speech synthesis through the Google Translate `translate_tts` endpoint.
pub struct GoogleTranslateTts {
    http: Client,
    base_url: String,
    language: String,
}

impl GoogleTranslateTts {
    /// Create a synthesizer speaking `language` against `base_url`.
    pub fn new(base_url: String, language: String) -> Result<Self, AudioSynthesisError> {
        let http = Client::builder()
            .user_agent("Mozilla/5.0 (edassist)")
            .build()
            .map_err(|error| AudioSynthesisError::Unavailable(error.to_string()))?;
        Ok(Self {
            http,
            base_url,
            language,
        })
    }

    /// Build the synthesizer described by `config`.
    pub fn from_config(config: &Config) -> Result<Self, AudioSynthesisError> {
        Self::new(config.tts_base_url.clone(), config.tts_language.clone())
    }

    fn endpoint(&self) -> String {
        format!("{}/translate_tts", self.base_url.trim_end_matches('/'))
    }

    async fn fetch_segment(
        &self,
        index: usize,
        total: usize,
        segment: &str,
    ) -> Result<Vec<u8>, AudioSynthesisError> {
        let index = index.to_string();
        let total = total.to_string();
        let chars = segment.chars().count().to_string();
        let response = self
            .http
            .get(self.endpoint())
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", self.language.as_str()),
                ("q", segment),
                ("idx", index.as_str()),
                ("total", total.as_str()),
                ("textlen", chars.as_str()),
            ])
            .send()
            .await
            .map_err(|error| AudioSynthesisError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AudioSynthesisError::Status {
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|error| AudioSynthesisError::Transport(error.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTranslateTts {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, AudioSynthesisError> {
        let segments: Vec<&str> = chunks(text, MAX_SEGMENT_CHARS)
            .map_err(|_| AudioSynthesisError::MissingText)?
            .collect();
        if segments.is_empty() {
            return Err(AudioSynthesisError::MissingText);
        }

        let mut audio = Vec::new();
        for (index, segment) in segments.iter().enumerate() {
            let bytes = self.fetch_segment(index, segments.len(), segment).await?;
            audio.extend_from_slice(&bytes);
        }

        tracing::debug!(
            segments = segments.len(),
            bytes = audio.len(),
            language = %self.language,
            "Synthesized speech"
        );
        Ok(audio)
    }
}

/// Audio file written for a synthesis request.
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    /// Unique on-disk location under the audio directory.
    pub path: PathBuf,
    /// Name offered to the client in `Content-Disposition`.
    pub download_name: String,
}

/// Writes synthesized audio under a fixed directory.
#[derive(Debug, Clone)]
pub struct AudioStore {
    dir: PathBuf,
}

impl AudioStore {
    /// Store files under `dir`, which is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory audio files are written to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist `audio` under a unique name; `requested_name` only sets the download name.
    pub async fn save(
        &self,
        audio: &[u8],
        requested_name: Option<&str>,
    ) -> Result<SynthesizedAudio, AudioSynthesisError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(format!("{}.mp3", Uuid::new_v4()));
        tokio::fs::write(&path, audio).await?;
        Ok(SynthesizedAudio {
            path,
            download_name: download_name(requested_name),
        })
    }
}

/// Sanitize a caller-supplied file stem into `<stem>.mp3`.
///
/// Only ASCII alphanumerics, `-` and `_` survive; an empty result falls back to `audio`.
pub fn download_name(requested: Option<&str>) -> String {
    let stem: String = requested
        .unwrap_or(DEFAULT_DOWNLOAD_STEM)
        .trim()
        .trim_end_matches(".mp3")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if stem.is_empty() {
        format!("{DEFAULT_DOWNLOAD_STEM}.mp3")
    } else {
        format!("{stem}.mp3")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::GET, MockServer};
    use regex::Regex;
    use tempfile::TempDir;

    #[test]
    fn download_name_is_sanitized() {
        assert_eq!(download_name(None), "audio.mp3");
        assert_eq!(download_name(Some("lecture_01")), "lecture_01.mp3");
        assert_eq!(download_name(Some("../../etc/passwd")), "etcpasswd.mp3");
        assert_eq!(download_name(Some("notes.mp3")), "notes.mp3");
        assert_eq!(download_name(Some(" ../ ")), "audio.mp3");
    }

    #[tokio::test]
    async fn saved_files_get_unique_names_in_created_directory() {
        let temp = TempDir::new().unwrap();
        let store = AudioStore::new(temp.path().join("static").join("audio"));

        let first = store.save(b"ID3a", Some("summary")).await.unwrap();
        let second = store.save(b"ID3b", Some("summary")).await.unwrap();

        assert_ne!(first.path, second.path);
        assert_eq!(first.download_name, "summary.mp3");
        assert!(first.path.starts_with(store.dir()));
        assert_eq!(std::fs::read(&second.path).unwrap(), b"ID3b");

        let uuid_name = Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[0-9a-f]{4}-[0-9a-f]{12}\.mp3$")
            .unwrap();
        let file_name = first.path.file_name().unwrap().to_string_lossy();
        assert!(uuid_name.is_match(&file_name), "unexpected name {file_name}");
    }

    #[tokio::test]
    async fn long_text_is_spoken_in_ordered_segments() {
        let server = MockServer::start_async().await;
        let first = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/translate_tts")
                    .query_param("tl", "en")
                    .query_param("client", "tw-ob")
                    .query_param("idx", "0");
                then.status(200).body("AAA");
            })
            .await;
        let second = server
            .mock_async(|when, then| {
                when.method(GET).path("/translate_tts").query_param("idx", "1");
                then.status(200).body("BBB");
            })
            .await;

        let tts = GoogleTranslateTts::new(server.base_url(), "en".into()).unwrap();
        let text = format!("{} {}", "word ".repeat(19).trim(), "tail ".repeat(10).trim());
        let audio = tts.synthesize(&text).await.unwrap();

        first.assert_async().await;
        second.assert_async().await;
        assert_eq!(audio, b"AAABBB");
    }

    #[tokio::test]
    async fn blank_text_is_rejected_without_requests() {
        let tts = GoogleTranslateTts::new("http://127.0.0.1:9".into(), "en".into()).unwrap();
        let error = tts.synthesize("   ").await.unwrap_err();
        assert!(matches!(error, AudioSynthesisError::MissingText));
    }

    #[tokio::test]
    async fn error_status_fails_synthesis() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/translate_tts");
                then.status(429);
            })
            .await;

        let tts = GoogleTranslateTts::new(server.base_url(), "en".into()).unwrap();
        let error = tts.synthesize("hello").await.unwrap_err();
        assert!(matches!(error, AudioSynthesisError::Status { status: 429 }));
    }
}
