//! Askama page templates for the web interface.
//!
//! Each struct corresponds to an HTML file under `templates/`. Askama checks the templates at
//! compile time and escapes every interpolated value, so OCR output and error messages are
//! rendered as text.

use askama::Template;
use axum::response::Html;

/// Landing page.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate;

/// Static description of the assistant.
#[derive(Template)]
#[template(path = "about.html")]
pub struct AboutTemplate;

/// Upload form, optionally showing the error from the previous attempt.
#[derive(Template)]
#[template(path = "upload.html")]
pub struct UploadTemplate {
    /// Message describing why the last upload failed.
    pub error: Option<String>,
}

/// Summary page shown after a successful upload.
#[derive(Template)]
#[template(path = "results.html")]
pub struct ResultsTemplate {
    /// Combined chunk summaries.
    pub summary: String,
    /// Text recovered by OCR.
    pub original_text: String,
}

/// Render `template` into an HTML response body.
pub fn render_page<T: Template>(template: &T) -> Html<String> {
    Html(
        template
            .render()
            .unwrap_or_else(|e| format!("Template error: {}", e)),
    )
}
