//! PDF page rendering.
//!
//! Pages are rasterized with poppler's `pdftoppm` into a temp dir, then decoded
//! with `image` in page order.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::{DynamicImage, GrayImage};
use tokio::process::Command;
use tracing::{debug, info};

use crate::content::ContentError;

/// Turns PDF bytes into one image per page, in page order.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, pdf: &[u8]) -> Result<Vec<DynamicImage>, ContentError>;
}

pub struct PdftoppmRenderer {
    binary: PathBuf,
    dpi: u32,
}

impl PdftoppmRenderer {
    pub fn new(binary: impl Into<PathBuf>, dpi: u32) -> Self {
        Self {
            binary: binary.into(),
            dpi,
        }
    }
}

#[async_trait]
impl PageRenderer for PdftoppmRenderer {
    async fn render(&self, pdf: &[u8]) -> Result<Vec<DynamicImage>, ContentError> {
        if !pdf.starts_with(b"%PDF") {
            return Err(ContentError::Render("upload is not a PDF document".to_string()));
        }

        let temp_dir = tempfile::tempdir()?;
        let input = temp_dir.path().join("upload.pdf");
        let prefix = temp_dir.path().join("page");
        tokio::fs::write(&input, pdf).await?;

        let output = Command::new(&self.binary)
            .arg("-png")
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg(&input)
            .arg(&prefix)
            .output()
            .await
            .map_err(|e| {
                ContentError::Render(format!(
                    "failed to run {}: {e}",
                    self.binary.display()
                ))
            })?;

        if !output.status.success() {
            return Err(ContentError::Render(format!(
                "pdftoppm exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        // Directory listing and PNG decoding are blocking and CPU-bound.
        let pages = tokio::task::spawn_blocking(move || decode_pages(temp_dir.path())).await??;

        info!(pages = pages.len(), dpi = self.dpi, "Rendered PDF pages");
        Ok(pages)
    }
}

fn decode_pages(dir: &Path) -> Result<Vec<DynamicImage>, ContentError> {
    let paths = page_images(dir)?;
    if paths.is_empty() {
        return Err(ContentError::Render("pdftoppm produced no pages".to_string()));
    }

    let mut pages = Vec::with_capacity(paths.len());
    for path in &paths {
        debug!("Decoding rendered page {}", path.display());
        let page = image::open(path)
            .map_err(|e| ContentError::Render(format!("unreadable page image: {e}")))?;
        pages.push(page);
    }
    Ok(pages)
}

/// Rendered PNGs in page order. pdftoppm zero-pads page numbers, so a name sort is page order.
fn page_images(dir: &Path) -> Result<Vec<PathBuf>, ContentError> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().map(|ext| ext == "png").unwrap_or(false))
        .collect();
    paths.sort();
    Ok(paths)
}

/// Single-channel 8-bit version of a page, the input tesseract gets.
pub fn to_grayscale(page: &DynamicImage) -> GrayImage {
    page.to_luma8()
}
