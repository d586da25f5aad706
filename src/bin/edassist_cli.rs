use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use edassist::{
    config,
    extraction::Document,
    logging,
    processing::{AnswerFormat, AssistantService},
};
use walkdir::WalkDir;

const DOCUMENT_EXTENSIONS: &[&str] = &[
    "pdf", "png", "jpg", "jpeg", "tif", "tiff", "bmp", "gif", "webp",
];

#[derive(Parser)]
#[command(
    name = "edassist-cli",
    about = "Run the EdAssist pipeline from the command line"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// OCR and summarize a document, or every document under a directory.
    Summarize {
        path: PathBuf,
        /// Emit one JSON object per document instead of plain text.
        #[arg(long)]
        json: bool,
    },
    /// Ask the answer service a question.
    Ask {
        question: String,
        #[arg(long, default_value = "paragraph")]
        format: String,
    },
    /// Speak text into an MP3 file.
    Speak {
        text: String,
        #[arg(long)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    config::init_config();
    logging::init_tracing();
    let service = AssistantService::from_config(config::get_config());

    match cli.command {
        Command::Summarize { path, json } => summarize(&service, &path, json).await,
        Command::Ask { question, format } => {
            let answer = service
                .answer_question(Some(question), AnswerFormat::from_request(Some(&format)))
                .await?;
            println!("{answer}");
            Ok(())
        }
        Command::Speak { text, output } => {
            let audio = service.synthesize_audio(Some(text), None).await?;
            tokio::fs::copy(&audio.path, &output)
                .await
                .with_context(|| format!("failed to write {}", output.display()))?;
            tokio::fs::remove_file(&audio.path)
                .await
                .with_context(|| format!("failed to remove {}", audio.path.display()))?;
            println!("{}", output.display());
            Ok(())
        }
    }
}

async fn summarize(service: &AssistantService, path: &Path, json: bool) -> Result<()> {
    let files = collect_documents(path)?;
    if files.is_empty() {
        bail!("no documents found under {}", path.display());
    }

    let mut failures = 0usize;
    for file in &files {
        let bytes = tokio::fs::read(file)
            .await
            .with_context(|| format!("failed to read {}", file.display()))?;
        let filename = file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        match service.summarize_document(Document::new(filename, bytes)).await {
            Ok(summary) if json => {
                let line = serde_json::json!({
                    "path": file.display().to_string(),
                    "summary": summary,
                });
                println!("{line}");
            }
            Ok(summary) => println!("== {}\n{}\n", file.display(), summary.summary),
            Err(err) => {
                failures += 1;
                eprintln!("{}: {err}", file.display());
            }
        }
    }

    if failures == files.len() {
        bail!("every document failed to summarize");
    }
    Ok(())
}

fn collect_documents(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        bail!("{} does not exist", path.display());
    }

    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file() && is_document(e.path()))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    Ok(files)
}

fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            DOCUMENT_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}
