//! Resume information pipeline.
//!
//! Flow: render pages → OCR + translate + normalize (timed) → LLM entity inference
//! → TF-IDF cosine similarity → response payload.
//!
//! Stages run strictly in sequence. Nothing is persisted.

use std::time::Instant;

use serde::Serialize;
use tracing::info;

use crate::entities::labels::CategorizedEntities;
use crate::errors::AppError;
use crate::similarity::calculate_cosine_similarity;
use crate::state::AppState;

pub mod handlers;

/// Response body of the upload endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct InformationResponse {
    pub filename: String,
    /// Seconds spent on OCR, translation and normalization.
    pub execution_time: f64,
    pub total_token: u64,
    pub entities: CategorizedEntities,
    pub cosine_similarity: f64,
}

/// Runs the full pipeline over one uploaded PDF.
pub async fn extract_information(
    state: &AppState,
    filename: String,
    pdf: &[u8],
) -> Result<InformationResponse, AppError> {
    let pages = state.extractor.render_pages(pdf).await?;
    let page_count = pages.len();

    let started = Instant::now();
    let text = state.extractor.extract_text(pages).await?;
    let execution_time = started.elapsed().as_secs_f64();
    info!(
        filename = %filename,
        pages = page_count,
        execution_time,
        "Content extraction finished"
    );

    let inference = state.inference.infer(&text).await?;
    let cosine_similarity = calculate_cosine_similarity(&text, &inference.entities);

    info!(
        filename = %filename,
        total_token = inference.total_token,
        cosine_similarity,
        "Information extracted"
    );

    Ok(InformationResponse {
        filename,
        execution_time,
        total_token: inference.total_token,
        entities: inference.entities,
        cosine_similarity,
    })
}
