//! PDF rasterization with poppler's `pdftoppm`.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::{ExtractionError, PageRenderer};

const PAGE_PREFIX: &str = "page";

/// Renders every PDF page to `page-<n>.png` via `pdftoppm -png -r <dpi>`.
#[derive(Debug, Clone)]
pub struct PdftoppmRenderer {
    binary: String,
    dpi: u32,
}

impl PdftoppmRenderer {
    /// Create a renderer invoking `binary` at `dpi` resolution.
    pub fn new(binary: impl Into<String>, dpi: u32) -> Self {
        Self {
            binary: binary.into(),
            dpi,
        }
    }
}

impl PageRenderer for PdftoppmRenderer {
    fn render_pages(
        &self,
        pdf: &Path,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, ExtractionError> {
        let dpi = self.dpi.to_string();
        let output = Command::new(&self.binary)
            .args(["-png", "-r", &dpi])
            .arg(pdf)
            .arg(output_dir.join(PAGE_PREFIX))
            .output();

        match output {
            Ok(output) if output.status.success() => collect_page_images(output_dir),
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(ExtractionError::RenderFailed(format!(
                    "pdftoppm exited with {}: {}",
                    output.status,
                    stderr.trim()
                )))
            }
            Err(error) if error.kind() == ErrorKind::NotFound => {
                Err(ExtractionError::BackendUnavailable(format!(
                    "{} not found (install poppler-utils)",
                    self.binary
                )))
            }
            Err(error) => Err(ExtractionError::Io(error)),
        }
    }
}

/// List rendered page images sorted by page number.
///
/// pdftoppm zero-pads page numbers to the width of the page count (`page-01.png`,
/// `page-001.png`), so ordering is by the parsed number rather than the file name.
fn collect_page_images(dir: &Path) -> Result<Vec<PathBuf>, ExtractionError> {
    let mut pages = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if let Some(number) = page_number(&path) {
            pages.push((number, path));
        }
    }
    pages.sort_by_key(|(number, _)| *number);
    Ok(pages.into_iter().map(|(_, path)| path).collect())
}

fn page_number(path: &Path) -> Option<u32> {
    if path.extension()? != "png" {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    stem.strip_prefix(PAGE_PREFIX)?
        .strip_prefix('-')?
        .parse()
        .ok()
}
