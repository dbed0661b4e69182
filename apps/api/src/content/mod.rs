//! Content Extractor: page images to normalized English text.
//!
//! Per page: grayscale → OCR → translate. Pages are processed one at a time in
//! page order, then the concatenated text is normalized. Any OCR or translation
//! failure aborts the whole extraction; untranslated text is never used as a fallback.

use std::sync::Arc;

use image::DynamicImage;
use thiserror::Error;
use tracing::{debug, info};

pub mod normalize;
pub mod ocr;
pub mod pages;
pub mod translate;

pub use normalize::normalize_text;
pub use ocr::{OcrEngine, TesseractCli};
pub use pages::{to_grayscale, PageRenderer, PdftoppmRenderer};
pub use translate::{GoogleTranslator, Translator};

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("could not render document: {0}")]
    Render(String),

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("translation service error: {0}")]
    Translation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("page worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

#[derive(Clone)]
pub struct ContentExtractor {
    renderer: Arc<dyn PageRenderer>,
    ocr: Arc<dyn OcrEngine>,
    translator: Arc<dyn Translator>,
}

impl ContentExtractor {
    pub fn new(
        renderer: Arc<dyn PageRenderer>,
        ocr: Arc<dyn OcrEngine>,
        translator: Arc<dyn Translator>,
    ) -> Self {
        Self {
            renderer,
            ocr,
            translator,
        }
    }

    /// Rasterizes a PDF into page images.
    pub async fn render_pages(&self, pdf: &[u8]) -> Result<Vec<DynamicImage>, ContentError> {
        self.renderer.render(pdf).await
    }

    /// OCRs and translates every page, concatenates in page order, then normalizes.
    /// Grayscale conversion runs on the blocking pool.
    pub async fn extract_text(&self, pages: Vec<DynamicImage>) -> Result<String, ContentError> {
        let page_count = pages.len();
        let mut text = String::new();

        for (index, page) in pages.into_iter().enumerate() {
            let gray = tokio::task::spawn_blocking(move || to_grayscale(&page)).await?;
            let raw = self.ocr.recognize(gray).await?;

            let translated = if raw.trim().is_empty() {
                debug!(page = index + 1, "Page has no text, skipping translation");
                String::new()
            } else {
                self.translator.to_english(&raw).await?
            };

            debug!(
                page = index + 1,
                ocr_chars = raw.len(),
                translated_chars = translated.len(),
                "Page extracted"
            );

            if !text.is_empty() && !translated.is_empty() {
                text.push('\n');
            }
            text.push_str(&translated);
        }

        let normalized = normalize_text(&text);
        info!(
            pages = page_count,
            engine = self.ocr.name(),
            chars = normalized.len(),
            "Document text extracted"
        );
        Ok(normalized)
    }
}
