//! HTTP surface for EdAssist.
//!
//! Pages:
//!
//! - `GET /`, `GET /about` – Static pages.
//! - `GET /upload` – Upload form.
//! - `POST /upload` – Multipart upload (`file` field). OCRs and summarizes the document, then
//!   renders the results page; on failure re-renders the form with the error message.
//!
//! JSON and download endpoints:
//!
//! - `POST /generate-answer` – `{ "question", "format" }` → `{ "answer" }` or `{ "error" }`.
//! - `POST /generate-audio` – Form fields `text` and `type`; responds with an MP3 attachment.
//! - `POST /download-audio` – `{ "text", "filename"? }`; responds with an MP3 attachment.
//! - `GET /metrics` – Request counters.
//! - `GET /health` – Liveness plus which capabilities initialized.
//! - `GET /commands` – Machine-readable command catalog.
//!
//! Pipeline failures are mapped to a status code and a user-facing message here and nowhere
//! else. Messages name the failing stage only; backend output (tool stderr, upstream response
//! bodies) stays in the logs.

use crate::answer::RemoteAnswerError;
use crate::extraction::{Document, ExtractionError};
use crate::processing::{AnswerFormat, AssistantApi, PipelineError, SummarizationError};
use crate::speech::{AudioSynthesisError, SynthesizedAudio};
use crate::templates::{
    AboutTemplate, IndexTemplate, ResultsTemplate, UploadTemplate, render_page,
};
use axum::{
    Form, Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, State,
        multipart::MultipartRejection,
        rejection::{FormRejection, JsonRejection},
    },
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt::Display;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Build the HTTP router serving the assistant pages and API.
///
/// Request bodies larger than `max_upload_bytes` are rejected.
pub fn create_router<S>(service: Arc<S>, max_upload_bytes: usize) -> Router
where
    S: AssistantApi + 'static,
{
    Router::new()
        .route("/", get(index_page))
        .route("/about", get(about_page))
        .route("/upload", get(upload_page).post(upload_document::<S>))
        .route("/generate-answer", post(generate_answer::<S>))
        .route("/generate-audio", post(generate_audio::<S>))
        .route("/download-audio", post(download_audio::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/health", get(get_health::<S>))
        .route("/commands", get(get_commands))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .with_state(service)
}

async fn index_page() -> Html<String> {
    render_page(&IndexTemplate)
}

async fn about_page() -> Html<String> {
    render_page(&AboutTemplate)
}

async fn upload_page() -> Html<String> {
    render_page(&UploadTemplate { error: None })
}

/// OCR and summarize an uploaded document.
///
/// Every failure, including a malformed multipart body, re-renders the upload form with a
/// message instead of surfacing a bare error page.
async fn upload_document<S>(
    State(service): State<Arc<S>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response
where
    S: AssistantApi,
{
    let document = match read_upload(multipart).await {
        Ok(document) => document,
        Err((status, message)) => return upload_failed(status, message),
    };

    match service.summarize_document(document).await {
        Ok(summary) => render_page(&ResultsTemplate {
            summary: summary.summary,
            original_text: summary.original_text,
        })
        .into_response(),
        Err(error) => {
            let error = AppError(error);
            upload_failed(error.status(), error.message())
        }
    }
}

async fn read_upload(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Document, (StatusCode, String)> {
    let mut multipart = multipart.map_err(malformed_upload)?;
    while let Some(field) = multipart.next_field().await.map_err(malformed_upload)? {
        if field.name() != Some("file") {
            continue;
        }
        // Browsers send an empty filename when nothing was chosen.
        let filename = field.file_name().unwrap_or_default().to_string();
        if filename.is_empty() {
            break;
        }
        let bytes = field.bytes().await.map_err(malformed_upload)?;
        return Ok(Document::new(filename, bytes.to_vec()));
    }

    let error = AppError(PipelineError::NoFileSelected);
    Err((error.status(), error.message()))
}

fn malformed_upload(error: impl Display) -> (StatusCode, String) {
    (
        StatusCode::BAD_REQUEST,
        format!("Error processing file: {error}"),
    )
}

fn upload_failed(status: StatusCode, message: String) -> Response {
    (
        status,
        render_page(&UploadTemplate {
            error: Some(message),
        }),
    )
        .into_response()
}

/// Request body for `POST /generate-answer`.
#[derive(Deserialize)]
struct AnswerRequest {
    #[serde(default)]
    question: Option<String>,
    /// `points` or `paragraph`; anything else lays out as a paragraph.
    #[serde(default)]
    format: Option<String>,
}

#[derive(Serialize)]
struct AnswerResponse {
    answer: String,
}

async fn generate_answer<S>(
    State(service): State<Arc<S>>,
    payload: Result<Json<AnswerRequest>, JsonRejection>,
) -> Result<Json<AnswerResponse>, Response>
where
    S: AssistantApi,
{
    let Json(request) = payload.map_err(json_rejection)?;
    let format = AnswerFormat::from_request(request.format.as_deref());
    let answer = service
        .answer_question(request.question, format)
        .await
        .map_err(|error| AppError(error).into_response())?;
    Ok(Json(AnswerResponse { answer }))
}

/// Form body for `POST /generate-audio`.
#[derive(Deserialize)]
struct GenerateAudioForm {
    #[serde(default)]
    text: Option<String>,
    /// Which part of the page the text came from (`summary`, `answer`, ...).
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

/// Speak form-submitted text. Failures are reported as plain text.
async fn generate_audio<S>(
    State(service): State<Arc<S>>,
    form: Result<Form<GenerateAudioForm>, FormRejection>,
) -> Response
where
    S: AssistantApi,
{
    let Form(form) = match form {
        Ok(form) => form,
        Err(rejection) => return (rejection.status(), rejection.body_text()).into_response(),
    };
    tracing::debug!(kind = form.kind.as_deref().unwrap_or("unknown"), "Audio requested");

    let result = match service.synthesize_audio(form.text, None).await {
        Ok(audio) => audio_attachment(audio).await,
        Err(error) => Err(error),
    };
    result.unwrap_or_else(|error| {
        let error = AppError(error);
        (error.status(), error.message()).into_response()
    })
}

/// Request body for `POST /download-audio`.
#[derive(Deserialize)]
struct DownloadAudioRequest {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    filename: Option<String>,
}

async fn download_audio<S>(
    State(service): State<Arc<S>>,
    payload: Result<Json<DownloadAudioRequest>, JsonRejection>,
) -> Result<Response, Response>
where
    S: AssistantApi,
{
    let Json(request) = payload.map_err(json_rejection)?;
    let audio = service
        .synthesize_audio(request.text, request.filename)
        .await
        .map_err(|error| AppError(error).into_response())?;
    audio_attachment(audio)
        .await
        .map_err(|error| AppError(error).into_response())
}

/// Read the synthesized file into the response and delete it; audio only lives for the request.
async fn audio_attachment(audio: SynthesizedAudio) -> Result<Response, PipelineError> {
    let bytes = tokio::fs::read(&audio.path).await;
    if let Err(error) = tokio::fs::remove_file(&audio.path).await {
        tracing::warn!(path = %audio.path.display(), error = %error, "Failed to remove audio file");
    }
    let bytes = bytes.map_err(AudioSynthesisError::from)?;
    Ok((
        [
            (header::CONTENT_TYPE, "audio/mpeg".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", audio.download_name),
            ),
        ],
        bytes,
    )
        .into_response())
}

fn json_rejection(rejection: JsonRejection) -> Response {
    (
        rejection.status(),
        Json(json!({ "error": rejection.body_text() })),
    )
        .into_response()
}

async fn get_metrics<S>(State(service): State<Arc<S>>) -> impl IntoResponse
where
    S: AssistantApi,
{
    Json(service.metrics_snapshot())
}

async fn get_health<S>(State(service): State<Arc<S>>) -> impl IntoResponse
where
    S: AssistantApi,
{
    Json(json!({
        "status": "ok",
        "capabilities": service.capabilities(),
    }))
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery by scripts and tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "index_page",
                method: "GET",
                path: "/",
                description: "HTML landing page.",
                request_example: None,
            },
            CommandDescriptor {
                name: "about_page",
                method: "GET",
                path: "/about",
                description: "HTML page describing the assistant.",
                request_example: None,
            },
            CommandDescriptor {
                name: "upload_page",
                method: "GET",
                path: "/upload",
                description: "HTML upload form.",
                request_example: None,
            },
            CommandDescriptor {
                name: "upload",
                method: "POST",
                path: "/upload",
                description: "Multipart upload of a PDF or image in the `file` field. Renders an HTML page with the summary and the OCR text.",
                request_example: None,
            },
            CommandDescriptor {
                name: "generate_answer",
                method: "POST",
                path: "/generate-answer",
                description: "Answer a question. Response is { \"answer\": string } or { \"error\": string }.",
                request_example: Some(json!({
                    "question": "What is photosynthesis?",
                    "format": "points"
                })),
            },
            CommandDescriptor {
                name: "generate_audio",
                method: "POST",
                path: "/generate-audio",
                description: "Form-encoded `text` and `type`. Responds with an MP3 attachment.",
                request_example: None,
            },
            CommandDescriptor {
                name: "download_audio",
                method: "POST",
                path: "/download-audio",
                description: "Speak text and download it as `<filename>.mp3`.",
                request_example: Some(json!({
                    "text": "Summary to read aloud",
                    "filename": "chapter-1"
                })),
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return request counters.",
                request_example: None,
            },
            CommandDescriptor {
                name: "health",
                method: "GET",
                path: "/health",
                description: "Report liveness and which capabilities initialized.",
                request_example: None,
            },
            CommandDescriptor {
                name: "commands",
                method: "GET",
                path: "/commands",
                description: "Return this catalog.",
                request_example: None,
            },
        ],
    })
}

/// Pipeline failure rendered as `{ "error": message }` with a matching status.
struct AppError(PipelineError);

impl AppError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            PipelineError::NoFileSelected => StatusCode::BAD_REQUEST,
            PipelineError::Extraction(error) => match error {
                ExtractionError::NoText => StatusCode::UNPROCESSABLE_ENTITY,
                ExtractionError::BackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            PipelineError::Summarization(error) => match error {
                SummarizationError::InvalidInput => StatusCode::UNPROCESSABLE_ENTITY,
                SummarizationError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
                SummarizationError::Chunk { .. } => StatusCode::BAD_GATEWAY,
                SummarizationError::Chunking(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            PipelineError::RemoteAnswer(error) => match error {
                RemoteAnswerError::MissingQuestion => StatusCode::BAD_REQUEST,
                RemoteAnswerError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::BAD_GATEWAY,
            },
            PipelineError::AudioSynthesis(error) => match error {
                AudioSynthesisError::MissingText => StatusCode::BAD_REQUEST,
                AudioSynthesisError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                AudioSynthesisError::Transport(_) | AudioSynthesisError::Status { .. } => {
                    StatusCode::BAD_GATEWAY
                }
                AudioSynthesisError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn message(&self) -> String {
        match &self.0 {
            PipelineError::RemoteAnswer(
                RemoteAnswerError::Transport(_)
                | RemoteAnswerError::Status { .. }
                | RemoteAnswerError::MalformedResponse(_),
            ) => "Failed to get a response from Gemini API".to_string(),
            PipelineError::RemoteAnswer(RemoteAnswerError::Unavailable(_)) => {
                "Question answering is not available".to_string()
            }
            PipelineError::Extraction(error) => match error {
                ExtractionError::BackendUnavailable(_) => {
                    "Text extraction is not available".to_string()
                }
                ExtractionError::RenderFailed(_) => "Error converting PDF to images".to_string(),
                ExtractionError::OcrFailed(_) => "Error extracting text from image".to_string(),
                ExtractionError::Io(_) => "Error processing file".to_string(),
                ExtractionError::NoText => error.to_string(),
            },
            PipelineError::Summarization(SummarizationError::Chunk { .. })
            | PipelineError::Summarization(SummarizationError::Chunking(_)) => {
                "Error during summarization".to_string()
            }
            PipelineError::AudioSynthesis(
                AudioSynthesisError::Transport(_) | AudioSynthesisError::Status { .. },
            ) => "Failed to generate audio".to_string(),
            PipelineError::AudioSynthesis(AudioSynthesisError::Unavailable(_)) => {
                "Speech synthesis is not available".to_string()
            }
            PipelineError::AudioSynthesis(AudioSynthesisError::Io(_)) => {
                "Failed to store audio".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::{AppError, create_router, get_commands};
    use crate::answer::RemoteAnswerError;
    use crate::extraction::{Document, ExtractionError};
    use crate::metrics::MetricsSnapshot;
    use crate::processing::{
        AnswerFormat, AssistantApi, Capabilities, DocumentSummary, PipelineError,
        SummarizationError,
    };
    use crate::summarization::SummarizationClientError;
    use crate::speech::{AudioSynthesisError, SynthesizedAudio, download_name};
    use async_trait::async_trait;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode, header},
    };
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;
    use tower::ServiceExt;

    const BOUNDARY: &str = "edassist-test-boundary";

    #[tokio::test]
    async fn commands_catalog_lists_answer_endpoint() {
        let commands = get_commands().await.0.commands;
        let answer = commands
            .iter()
            .find(|cmd| cmd.name == "generate_answer")
            .expect("answer command present");

        assert_eq!(answer.method, "POST");
        assert_eq!(answer.path, "/generate-answer");
        assert!(commands.iter().any(|cmd| cmd.path == "/upload"));
    }

    #[tokio::test]
    async fn commands_catalog_matches_routes() {
        let commands = get_commands().await.0.commands;
        let mut listed: Vec<(&str, &str)> =
            commands.iter().map(|cmd| (cmd.method, cmd.path)).collect();
        listed.sort();
        let mut routed = vec![
            ("GET", "/"),
            ("GET", "/about"),
            ("GET", "/upload"),
            ("POST", "/upload"),
            ("POST", "/generate-answer"),
            ("POST", "/generate-audio"),
            ("POST", "/download-audio"),
            ("GET", "/metrics"),
            ("GET", "/health"),
            ("GET", "/commands"),
        ];
        routed.sort();
        assert_eq!(listed, routed);

        let (app, _) = app();
        for cmd in &commands {
            let method = Method::from_bytes(cmd.method.as_bytes()).unwrap();
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .method(method)
                        .uri(cmd.path)
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_ne!(response.status(), StatusCode::NOT_FOUND, "{}", cmd.path);
            assert_ne!(
                response.status(),
                StatusCode::METHOD_NOT_ALLOWED,
                "{} {}",
                cmd.method,
                cmd.path
            );
        }
    }

    #[tokio::test]
    async fn static_pages_render() {
        let (app, _) = app();
        for path in ["/", "/about", "/upload"] {
            let response = app
                .clone()
                .oneshot(Request::get(path).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{path}");
            let body = body_text(response).await;
            assert!(body.contains("EdAssist"), "{path}");
        }
    }

    #[tokio::test]
    async fn upload_renders_summary_page() {
        let (app, service) = app();

        let response = app
            .oneshot(multipart_upload("notes.png", "Rust has <ownership> rules"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("Summary of notes.png"));
        assert!(body.contains("Rust has &lt;ownership&gt; rules"));
        assert_eq!(*service.uploads.lock().unwrap(), vec!["notes.png".to_string()]);
    }

    #[tokio::test]
    async fn upload_without_file_reports_no_file_selected() {
        let (app, service) = app();

        let response = app.oneshot(multipart_upload("", "")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("No file selected"));
        assert!(service.uploads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn upload_with_unreadable_document_rerenders_form() {
        let (app, _) = app();

        let response = app
            .oneshot(multipart_upload("white.png", "blank"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_text(response).await;
        assert!(body.contains("No text could be extracted from the file"));
        assert!(body.contains("name=\"file\""));
    }

    #[tokio::test]
    async fn upload_with_non_multipart_body_rerenders_form() {
        let (app, _) = app();

        let response = app
            .oneshot(
                Request::post("/upload")
                    .header(header::CONTENT_TYPE, "text/plain")
                    .body(Body::from("hello"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("Error processing file"));
    }

    #[tokio::test]
    async fn generate_answer_passes_requested_format() {
        let (app, service) = app();

        let response = app
            .oneshot(json_post(
                "/generate-answer",
                json!({ "question": "What is OCR?", "format": "points" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["answer"], "- answer to What is OCR?");
        assert_eq!(*service.formats.lock().unwrap(), vec![AnswerFormat::Points]);
    }

    #[tokio::test]
    async fn generate_answer_without_question_is_bad_request() {
        let (app, _) = app();

        let response = app
            .oneshot(json_post("/generate-answer", json!({ "format": "paragraph" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Question is required");
    }

    #[tokio::test]
    async fn generate_answer_upstream_failure_hides_details() {
        let (app, _) = app();

        let response = app
            .oneshot(json_post("/generate-answer", json!({ "question": "fail" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            body_json(response).await["error"],
            "Failed to get a response from Gemini API"
        );
    }

    #[tokio::test]
    async fn generate_answer_with_invalid_json_reports_error() {
        let (app, _) = app();

        let response = app
            .oneshot(
                Request::post("/generate-answer")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.status().is_client_error());
        assert!(body_json(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn download_audio_returns_named_attachment() {
        let (app, _) = app();

        let response = app
            .oneshot(json_post(
                "/download-audio",
                json!({ "text": "Read this aloud", "filename": "chapter 1!" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/mpeg");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"chapter1.mp3\""
        );
        assert_eq!(body_text(response).await, "ID3 Read this aloud");
    }

    #[tokio::test]
    async fn downloaded_audio_files_are_not_kept() {
        let (app, service) = app();

        for _ in 0..5 {
            let response = app
                .clone()
                .oneshot(json_post("/download-audio", json!({ "text": "hi" })))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
        let response = app
            .oneshot(form_post("/generate-audio", "text=hi"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let left = std::fs::read_dir(service.audio_dir.path()).unwrap().count();
        assert_eq!(left, 0);
    }

    #[tokio::test]
    async fn download_audio_without_text_is_json_error() {
        let (app, _) = app();

        let response = app
            .oneshot(json_post("/download-audio", json!({ "filename": "x" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({ "error": "No text provided" }));
    }

    #[tokio::test]
    async fn generate_audio_accepts_form_fields() {
        let (app, _) = app();

        let response = app
            .oneshot(form_post("/generate-audio", "text=Hello+there&type=summary"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"audio.mp3\""
        );
        assert_eq!(body_text(response).await, "ID3 Hello there");
    }

    #[tokio::test]
    async fn generate_audio_without_text_is_plain_error() {
        let (app, _) = app();

        let response = app
            .oneshot(form_post("/generate-audio", "type=answer"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "No text provided");
    }

    #[tokio::test]
    async fn health_reports_capabilities() {
        let (app, _) = app();

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["capabilities"]["answers"], true);
        assert_eq!(body["capabilities"]["summarization"], false);
    }

    #[tokio::test]
    async fn metrics_returns_snapshot() {
        let (app, _) = app();

        let response = app
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(body["documents_summarized"], 3);
        assert_eq!(body["failures"], 1);
    }

    #[test]
    fn error_statuses_follow_failure_kind() {
        let cases = [
            (PipelineError::NoFileSelected, StatusCode::BAD_REQUEST),
            (
                ExtractionError::NoText.into(),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ExtractionError::BackendUnavailable("tesseract".into()).into(),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ExtractionError::RenderFailed("bad pdf".into()).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                RemoteAnswerError::Unavailable("no key".into()).into(),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                RemoteAnswerError::MalformedResponse("no candidates".into()).into(),
                StatusCode::BAD_GATEWAY,
            ),
            (
                AudioSynthesisError::Status { status: 429 }.into(),
                StatusCode::BAD_GATEWAY,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(AppError(error).status(), status);
        }
    }

    #[test]
    fn backend_detail_is_not_shown_to_users() {
        let cases: [(PipelineError, &str); 5] = [
            (
                ExtractionError::OcrFailed("tesseract exited with 1: Leptonica error".into()).into(),
                "Error extracting text from image",
            ),
            (
                ExtractionError::RenderFailed("pdftoppm exited with 99: Syntax Error".into())
                    .into(),
                "Error converting PDF to images",
            ),
            (
                SummarizationError::Chunk {
                    index: 2,
                    source: SummarizationClientError::GenerationFailed(
                        "Hugging Face returned 500: model crashed".into(),
                    ),
                }
                .into(),
                "Error during summarization",
            ),
            (
                RemoteAnswerError::Unavailable("GEMINI_API_KEY is not set".into()).into(),
                "Question answering is not available",
            ),
            (
                AudioSynthesisError::Io(std::io::Error::other("/srv/static/audio: disk full"))
                    .into(),
                "Failed to store audio",
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(AppError(error).message(), expected);
        }
        assert_eq!(
            AppError(ExtractionError::NoText.into()).message(),
            "No text could be extracted from the file"
        );
    }

    struct StubAssistant {
        audio_dir: TempDir,
        uploads: Mutex<Vec<String>>,
        formats: Mutex<Vec<AnswerFormat>>,
    }

    #[async_trait]
    impl AssistantApi for StubAssistant {
        async fn summarize_document(
            &self,
            document: Document,
        ) -> Result<DocumentSummary, PipelineError> {
            if document.bytes == b"blank" {
                return Err(ExtractionError::NoText.into());
            }
            self.uploads.lock().unwrap().push(document.filename.clone());
            Ok(DocumentSummary {
                summary: format!("Summary of {}", document.filename),
                original_text: String::from_utf8_lossy(&document.bytes).into_owned(),
                chunk_count: 1,
                page_count: 1,
            })
        }

        async fn answer_question(
            &self,
            question: Option<String>,
            format: AnswerFormat,
        ) -> Result<String, PipelineError> {
            let question = question.ok_or(RemoteAnswerError::MissingQuestion)?;
            if question == "fail" {
                return Err(RemoteAnswerError::Status {
                    status: 500,
                    body: "internal".into(),
                }
                .into());
            }
            self.formats.lock().unwrap().push(format);
            let prefix = match format {
                AnswerFormat::Points => "- ",
                AnswerFormat::Paragraph => "",
            };
            Ok(format!("{prefix}answer to {question}"))
        }

        async fn synthesize_audio(
            &self,
            text: Option<String>,
            filename: Option<String>,
        ) -> Result<SynthesizedAudio, PipelineError> {
            let text = text.ok_or(AudioSynthesisError::MissingText)?;
            let path = self.audio_dir.path().join(format!("{}.mp3", uuid::Uuid::new_v4()));
            std::fs::write(&path, format!("ID3 {text}")).map_err(AudioSynthesisError::from)?;
            Ok(SynthesizedAudio {
                path,
                download_name: download_name(filename.as_deref()),
            })
        }

        fn capabilities(&self) -> Capabilities {
            Capabilities {
                summarization: false,
                answers: true,
                speech: true,
            }
        }

        fn metrics_snapshot(&self) -> MetricsSnapshot {
            MetricsSnapshot {
                documents_summarized: 3,
                failures: 1,
                ..MetricsSnapshot::default()
            }
        }
    }

    fn app() -> (Router, Arc<StubAssistant>) {
        let service = Arc::new(StubAssistant {
            audio_dir: TempDir::new().expect("tempdir"),
            uploads: Mutex::new(Vec::new()),
            formats: Mutex::new(Vec::new()),
        });
        (create_router(service.clone(), 1024 * 1024), service)
    }

    fn multipart_upload(filename: &str, contents: &str) -> Request<Body> {
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n\
             {contents}\r\n\
             --{BOUNDARY}--\r\n"
        );
        Request::builder()
            .method(Method::POST)
            .uri("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("request")
    }

    fn json_post(uri: &str, payload: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .expect("request")
    }

    fn form_post(uri: &str, body: &'static str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .expect("request")
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        String::from_utf8(bytes.to_vec()).expect("utf-8 body")
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        serde_json::from_str(&body_text(response).await).expect("json body")
    }
}
