use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;

const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_SUMMARIZATION_MODEL: &str = "facebook/bart-large-cnn";
const DEFAULT_HUGGINGFACE_API_URL: &str = "https://api-inference.huggingface.co";
const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
const DEFAULT_TTS_BASE_URL: &str = "https://translate.google.com";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the assistant server and CLI.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
    /// API key for the hosted answer capability; `None` disables question answering.
    pub gemini_api_key: Option<String>,
    /// Generative model queried for answers.
    pub gemini_model: String,
    /// Base URL of the generative-language API (without the `/models/...` suffix).
    pub gemini_base_url: String,
    /// Backend used for chunk summarization.
    pub summarization_provider: SummarizationProvider,
    /// Model identifier passed to the summarization backend.
    pub summarization_model: String,
    /// Base URL of the Hugging Face inference API.
    pub huggingface_api_url: String,
    /// Optional bearer token for the Hugging Face inference API.
    pub huggingface_api_token: Option<String>,
    /// Base URL of the local Ollama runtime.
    pub ollama_url: String,
    /// Upper bound on the length of each per-chunk summary.
    pub summary_max_length: usize,
    /// Lower bound on the length of each per-chunk summary; shorter inputs skip summarization.
    pub summary_min_length: usize,
    /// Wrap width, in characters, used when chunking extracted text.
    pub text_chunk_size: usize,
    /// Tesseract executable.
    pub tesseract_bin: String,
    /// Tesseract language pack (`-l`).
    pub ocr_language: String,
    /// Poppler `pdftoppm` executable used to rasterize PDF pages.
    pub pdftoppm_bin: String,
    /// Rendering resolution for PDF pages.
    pub pdf_render_dpi: u32,
    /// Base URL of the text-to-speech endpoint.
    pub tts_base_url: String,
    /// Spoken language passed to the text-to-speech endpoint.
    pub tts_language: String,
    /// Directory where synthesized audio files are written.
    pub audio_dir: PathBuf,
    /// Maximum accepted request body for uploads.
    pub max_upload_bytes: usize,
}

/// Supported summarization backends.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SummarizationProvider {
    /// Hosted Hugging Face inference API (BART-style summarization pipeline).
    HuggingFace,
    /// Local Ollama runtime prompted for a summary.
    Ollama,
    /// Summarization disabled; uploads fail with a service-unavailable error.
    None,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let text_chunk_size = parse_optional("TEXT_CHUNK_SIZE")?.unwrap_or(1024);
        if text_chunk_size == 0 {
            return Err(ConfigError::InvalidValue("TEXT_CHUNK_SIZE".into()));
        }

        Ok(Self {
            server_port: parse_optional("SERVER_PORT")?,
            gemini_api_key: load_env_optional("GEMINI_API_KEY"),
            gemini_model: load_env_or("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
            gemini_base_url: load_env_or("GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL),
            summarization_provider: load_env_optional("SUMMARIZATION_PROVIDER")
                .map(|value| {
                    value.parse().map_err(|()| {
                        ConfigError::InvalidValue("SUMMARIZATION_PROVIDER".to_string())
                    })
                })
                .transpose()?
                .unwrap_or(SummarizationProvider::HuggingFace),
            summarization_model: load_env_or("SUMMARIZATION_MODEL", DEFAULT_SUMMARIZATION_MODEL),
            huggingface_api_url: load_env_or("HUGGINGFACE_API_URL", DEFAULT_HUGGINGFACE_API_URL),
            huggingface_api_token: load_env_optional("HUGGINGFACE_API_TOKEN"),
            ollama_url: load_env_or("OLLAMA_URL", DEFAULT_OLLAMA_URL),
            summary_max_length: parse_optional("SUMMARY_MAX_LENGTH")?.unwrap_or(150),
            summary_min_length: parse_optional("SUMMARY_MIN_LENGTH")?.unwrap_or(50),
            text_chunk_size,
            tesseract_bin: load_env_or("TESSERACT_BIN", "tesseract"),
            ocr_language: load_env_or("OCR_LANGUAGE", "eng"),
            pdftoppm_bin: load_env_or("PDFTOPPM_BIN", "pdftoppm"),
            pdf_render_dpi: parse_optional("PDF_RENDER_DPI")?.unwrap_or(200),
            tts_base_url: load_env_or("TTS_BASE_URL", DEFAULT_TTS_BASE_URL),
            tts_language: load_env_or("TTS_LANGUAGE", "en"),
            audio_dir: PathBuf::from(load_env_or("AUDIO_DIR", "static/audio")),
            max_upload_bytes: parse_optional("MAX_UPLOAD_BYTES")?
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: None,
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.into(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.into(),
            summarization_provider: SummarizationProvider::HuggingFace,
            summarization_model: DEFAULT_SUMMARIZATION_MODEL.into(),
            huggingface_api_url: DEFAULT_HUGGINGFACE_API_URL.into(),
            huggingface_api_token: None,
            ollama_url: DEFAULT_OLLAMA_URL.into(),
            summary_max_length: 150,
            summary_min_length: 50,
            text_chunk_size: 1024,
            tesseract_bin: "tesseract".into(),
            ocr_language: "eng".into(),
            pdftoppm_bin: "pdftoppm".into(),
            pdf_render_dpi: 200,
            tts_base_url: DEFAULT_TTS_BASE_URL.into(),
            tts_language: "en".into(),
            audio_dir: PathBuf::from("static/audio"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn load_env_or(key: &str, default: &str) -> String {
    load_env_optional(key).unwrap_or_else(|| default.to_string())
}

fn parse_optional<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

impl std::str::FromStr for SummarizationProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "huggingface" | "hf" => Ok(Self::HuggingFace),
            "ollama" => Ok(Self::Ollama),
            "none" | "disabled" => Ok(Self::None),
            _ => Err(()),
        }
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        server_port = ?config.server_port,
        summarization_provider = ?config.summarization_provider,
        summarization_model = %config.summarization_model,
        gemini_model = %config.gemini_model,
        answer_enabled = config.gemini_api_key.is_some(),
        chunk_size = config.text_chunk_size,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarization_provider_parses_known_values() {
        assert_eq!(
            "HuggingFace".parse::<SummarizationProvider>(),
            Ok(SummarizationProvider::HuggingFace)
        );
        assert_eq!(
            " ollama ".parse::<SummarizationProvider>(),
            Ok(SummarizationProvider::Ollama)
        );
        assert_eq!(
            "none".parse::<SummarizationProvider>(),
            Ok(SummarizationProvider::None)
        );
        assert!("bart".parse::<SummarizationProvider>().is_err());
    }

    #[test]
    fn defaults_cover_summary_bounds_and_audio_dir() {
        let config = Config::default();
        assert_eq!(config.summary_max_length, 150);
        assert_eq!(config.summary_min_length, 50);
        assert_eq!(config.text_chunk_size, 1024);
        assert_eq!(config.audio_dir, PathBuf::from("static/audio"));
    }
}
