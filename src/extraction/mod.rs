//! Text extraction from uploaded documents via OCR.
//!
//! Images are passed straight to the OCR engine. PDFs are rasterized one image per page and
//! each page is OCR'd in order; page texts are joined with `\n` so later stages see one
//! continuous document. Both the renderer and the OCR engine are external programs behind the
//! [`PageRenderer`] and [`OcrEngine`] traits.
//!
//! Every extraction works inside its own temporary directory, so concurrent uploads that share
//! a filename never collide on disk.

mod pdf;
mod tesseract;

pub use pdf::PdftoppmRenderer;
pub use tesseract::TesseractEngine;

use crate::config::Config;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while turning a document into text.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// A required external program is not installed.
    #[error("Text extraction backend unavailable: {0}")]
    BackendUnavailable(String),
    /// PDF pages could not be rendered to images.
    #[error("Error converting PDF to images: {0}")]
    RenderFailed(String),
    /// The OCR engine failed on an image.
    #[error("Error extracting text from image: {0}")]
    OcrFailed(String),
    /// OCR ran but produced only whitespace.
    #[error("No text could be extracted from the file")]
    NoText,
    /// Scratch files could not be written.
    #[error("Error processing file: {0}")]
    Io(#[from] std::io::Error),
}

/// How a document's bytes should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// A single raster image (PNG, JPEG, TIFF, ...).
    Image,
    /// A PDF with one or more pages.
    Pdf,
}

impl DocumentKind {
    /// Detect the kind from magic bytes, falling back to the filename extension.
    ///
    /// Unknown content without a `.pdf` extension is treated as an image.
    pub fn detect(filename: &str, bytes: &[u8]) -> Self {
        match infer::get(bytes) {
            Some(kind) if kind.mime_type() == "application/pdf" => Self::Pdf,
            Some(kind) if kind.mime_type().starts_with("image/") => Self::Image,
            _ if filename.to_lowercase().ends_with(".pdf") => Self::Pdf,
            _ => Self::Image,
        }
    }

    fn scratch_name(self) -> &'static str {
        match self {
            Self::Image => "upload.img",
            Self::Pdf => "upload.pdf",
        }
    }
}

/// An uploaded document, alive only for one extraction.
#[derive(Debug, Clone)]
pub struct Document {
    /// Client-supplied file name, used for logging and kind detection only.
    pub filename: String,
    /// Interpretation of `bytes`.
    pub kind: DocumentKind,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

impl Document {
    /// Wrap uploaded bytes, detecting the document kind.
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        let filename = filename.into();
        let kind = DocumentKind::detect(&filename, &bytes);
        Self {
            filename,
            kind,
            bytes,
        }
    }
}

/// Text recovered from a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    /// Page texts joined with `\n`, in page order. Never blank.
    pub text: String,
    /// Number of images that were OCR'd.
    pub page_count: usize,
}

/// Runs OCR over one raster image.
pub trait OcrEngine: Send + Sync {
    /// Return the text recognized in the image at `image`.
    fn recognize(&self, image: &Path) -> Result<String, ExtractionError>;
}

/// Rasterizes PDF pages to images.
pub trait PageRenderer: Send + Sync {
    /// Render every page of `pdf` into `output_dir`, returning image paths in page order.
    fn render_pages(&self, pdf: &Path, output_dir: &Path)
    -> Result<Vec<PathBuf>, ExtractionError>;
}

/// Document-to-text extractor combining a page renderer and an OCR engine.
#[derive(Clone)]
pub struct TextExtractor {
    ocr: Arc<dyn OcrEngine>,
    renderer: Arc<dyn PageRenderer>,
}

impl TextExtractor {
    /// Build an extractor from explicit backends.
    pub fn new(ocr: Arc<dyn OcrEngine>, renderer: Arc<dyn PageRenderer>) -> Self {
        Self { ocr, renderer }
    }

    /// Build the Tesseract + pdftoppm extractor described by `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(TesseractEngine::new(
                config.tesseract_bin.clone(),
                config.ocr_language.clone(),
            )),
            Arc::new(PdftoppmRenderer::new(
                config.pdftoppm_bin.clone(),
                config.pdf_render_dpi,
            )),
        )
    }

    /// Extract text from `document`. Blocking; call from a blocking-capable context.
    ///
    /// Fails with [`ExtractionError::NoText`] when OCR yields only whitespace.
    pub fn extract(&self, document: &Document) -> Result<ExtractedText, ExtractionError> {
        let scratch = tempfile::Builder::new().prefix("edassist-").tempdir()?;
        let source = scratch.path().join(document.kind.scratch_name());
        fs::write(&source, &document.bytes)?;

        let extracted = match document.kind {
            DocumentKind::Image => ExtractedText {
                text: self.extract_image(&source)?,
                page_count: 1,
            },
            DocumentKind::Pdf => self.extract_pdf(&source, scratch.path())?,
        };

        if extracted.text.trim().is_empty() {
            tracing::warn!(
                filename = %document.filename,
                pages = extracted.page_count,
                "OCR produced no text"
            );
            return Err(ExtractionError::NoText);
        }

        tracing::info!(
            filename = %document.filename,
            kind = ?document.kind,
            pages = extracted.page_count,
            chars = extracted.text.chars().count(),
            "Extracted document text"
        );
        Ok(extracted)
    }

    fn extract_image(&self, image: &Path) -> Result<String, ExtractionError> {
        Ok(self.ocr.recognize(image)?.trim().to_string())
    }

    fn extract_pdf(&self, pdf: &Path, work_dir: &Path) -> Result<ExtractedText, ExtractionError> {
        let pages_dir = work_dir.join("pages");
        fs::create_dir_all(&pages_dir)?;
        let pages = self.renderer.render_pages(pdf, &pages_dir)?;
        tracing::debug!(pages = pages.len(), "Rendered PDF pages");

        let texts = pages
            .iter()
            .map(|page| self.extract_image(page))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ExtractedText {
            page_count: texts.len(),
            text: texts.join("\n"),
        })
    }
}
