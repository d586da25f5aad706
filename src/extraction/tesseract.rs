//! Tesseract OCR via its command-line interface.

use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;

use super::{ExtractionError, OcrEngine};

/// OCR engine that shells out to `tesseract <image> stdout -l <lang>`.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    binary: String,
    language: String,
}

impl TesseractEngine {
    /// Create an engine invoking `binary` with the given language pack.
    pub fn new(binary: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            language: language.into(),
        }
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&self, image: &Path) -> Result<String, ExtractionError> {
        let output = Command::new(&self.binary)
            .arg(image)
            .arg("stdout")
            .args(["-l", &self.language])
            .output();

        match output {
            Ok(output) if output.status.success() => {
                Ok(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(ExtractionError::OcrFailed(format!(
                    "tesseract exited with {}: {}",
                    output.status,
                    stderr.trim()
                )))
            }
            Err(error) if error.kind() == ErrorKind::NotFound => {
                Err(ExtractionError::BackendUnavailable(format!(
                    "{} not found (install tesseract-ocr)",
                    self.binary
                )))
            }
            Err(error) => Err(ExtractionError::Io(error)),
        }
    }
}
