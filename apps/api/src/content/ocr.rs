//! OCR through the tesseract CLI.

use std::io::Cursor;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use image::{GrayImage, ImageFormat};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::content::ContentError;

/// Reads the text on one grayscale page.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    fn name(&self) -> &'static str;

    async fn recognize(&self, page: GrayImage) -> Result<String, ContentError>;
}

/// Pipes a PNG-encoded page into `tesseract stdin stdout`.
pub struct TesseractCli {
    binary: PathBuf,
    lang: String,
}

impl TesseractCli {
    pub fn new(binary: impl Into<PathBuf>, lang: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            lang: lang.into(),
        }
    }
}

fn encode_png(page: &GrayImage) -> Result<Vec<u8>, ContentError> {
    let mut buf = Cursor::new(Vec::new());
    page.write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| ContentError::Ocr(format!("could not encode page: {e}")))?;
    Ok(buf.into_inner())
}

#[async_trait]
impl OcrEngine for TesseractCli {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    async fn recognize(&self, page: GrayImage) -> Result<String, ContentError> {
        // PNG encoding of a full-resolution page is CPU-bound.
        let png = tokio::task::spawn_blocking(move || encode_png(&page)).await??;

        let mut child = Command::new(&self.binary)
            .arg("stdin")
            .arg("stdout")
            .arg("-l")
            .arg(&self.lang)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                ContentError::Ocr(format!("failed to run {}: {e}", self.binary.display()))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&png)
                .await
                .map_err(|e| ContentError::Ocr(format!("could not feed page to tesseract: {e}")))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ContentError::Ocr(format!("tesseract did not finish: {e}")))?;

        if !output.status.success() {
            return Err(ContentError::Ocr(format!(
                "tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use image::Luma;

    use super::*;

    #[test]
    fn test_encode_png_signature() {
        let page = GrayImage::from_pixel(4, 4, Luma([200]));
        let png = encode_png(&page).unwrap();
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
    }

    #[tokio::test]
    async fn test_missing_binary_is_ocr_error() {
        let ocr = TesseractCli::new("/nonexistent/tesseract", "eng");
        let page = GrayImage::from_pixel(1, 1, Luma([0]));
        let err = ocr.recognize(page).await.unwrap_err();
        assert!(matches!(err, ContentError::Ocr(_)));
    }
}
