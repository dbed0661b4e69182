//! Axum route handler for the upload endpoint.

use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;

use crate::errors::AppError;
use crate::pipeline::{extract_information, InformationResponse};
use crate::state::AppState;

/// POST /getInformation/
///
/// Accepts a multipart upload with one PDF file field and returns the extracted
/// entities, token usage and similarity score.
pub async fn handle_get_information(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<InformationResponse>, AppError> {
    while let Some(field) = multipart.next_field().await? {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };

        let bytes: Bytes = field.bytes().await?;
        if bytes.is_empty() {
            return Err(AppError::Validation(format!("uploaded file '{filename}' is empty")));
        }

        let response = extract_information(&state, filename, &bytes).await?;
        return Ok(Json(response));
    }

    Err(AppError::Validation(
        "multipart body must contain a file field".to_string(),
    ))
}
