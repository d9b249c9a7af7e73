//! Page renderer backed by poppler's `pdfinfo` and `pdftoppm`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::debug;

use super::{PageRenderer, RenderError, RenderedPage};

pub const POPPLER_NOT_FOUND: &str =
    "pdftoppm/pdfinfo not found. Install poppler-utils to preview PDF pages.";

/// Renders PDF pages by shelling out to poppler.
#[derive(Debug, Clone)]
pub struct PdftoppmRenderer {
    pdftoppm: PathBuf,
    pdfinfo: PathBuf,
}

impl Default for PdftoppmRenderer {
    fn default() -> Self {
        Self {
            pdftoppm: PathBuf::from("pdftoppm"),
            pdfinfo: PathBuf::from("pdfinfo"),
        }
    }
}

impl PdftoppmRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pdftoppm(mut self, path: impl Into<PathBuf>) -> Self {
        self.pdftoppm = path.into();
        self
    }

    pub fn with_pdfinfo(mut self, path: impl Into<PathBuf>) -> Self {
        self.pdfinfo = path.into();
        self
    }

    /// Check that both tools can be found.
    pub fn is_available(&self) -> bool {
        which::which(&self.pdftoppm).is_ok() && which::which(&self.pdfinfo).is_ok()
    }
}

/// DPI for a scale relative to the 72 DPI PDF user space.
pub fn scale_to_dpi(scale: f32) -> u32 {
    (72.0 * scale).round().max(1.0) as u32
}

/// Extract the page count from `pdfinfo` output.
pub fn parse_page_count(pdfinfo_output: &str) -> Option<u32> {
    pdfinfo_output
        .lines()
        .find(|line| line.starts_with("Pages:"))
        .and_then(|line| line.split(':').nth(1))
        .and_then(|count| count.trim().parse().ok())
}

fn spawn_error(e: std::io::Error) -> RenderError {
    if e.kind() == std::io::ErrorKind::NotFound {
        RenderError::ToolNotAvailable(POPPLER_NOT_FOUND.to_string())
    } else {
        RenderError::Io(e)
    }
}

#[async_trait]
impl PageRenderer for PdftoppmRenderer {
    async fn page_count(&self, document: &Path) -> Result<u32, RenderError> {
        let output = Command::new(&self.pdfinfo)
            .arg(document)
            .output()
            .await
            .map_err(spawn_error)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RenderError::InvalidDocument(stderr.trim().to_string()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_page_count(&stdout)
            .ok_or_else(|| RenderError::InvalidDocument("pdfinfo reported no page count".into()))
    }

    async fn render_page(
        &self,
        document: &Path,
        page: u32,
        scale: f32,
    ) -> Result<RenderedPage, RenderError> {
        let temp = TempDir::new()?;
        let prefix = temp.path().join("thumb");
        let page_str = page.to_string();
        let dpi = scale_to_dpi(scale).to_string();

        debug!("Rendering page {} of {} at {} DPI", page, document.display(), dpi);

        let output = Command::new(&self.pdftoppm)
            .args(["-png", "-singlefile", "-r", &dpi, "-f", &page_str, "-l", &page_str])
            .arg(document)
            .arg(&prefix)
            .output()
            .await
            .map_err(spawn_error)?;

        if !output.status.success() {
            return Err(RenderError::PageFailed {
                page,
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let png = tokio::fs::read(prefix.with_extension("png"))
            .await
            .map_err(|e| RenderError::PageFailed {
                page,
                reason: format!("no image generated: {}", e),
            })?;

        RenderedPage::from_png(png).ok_or_else(|| RenderError::PageFailed {
            page,
            reason: "pdftoppm produced an invalid PNG".to_string(),
        })
    }
}
