use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::content::ContentError;
use crate::entities::inference::InferenceError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unprocessable document: {0}")]
    UnprocessableDocument(String),

    #[error("OCR error: {0}")]
    Ocr(String),

    #[error("Translation error: {0}")]
    Translation(String),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ContentError> for AppError {
    fn from(e: ContentError) -> Self {
        match e {
            ContentError::Render(msg) => AppError::UnprocessableDocument(msg),
            ContentError::Ocr(msg) => AppError::Ocr(msg),
            ContentError::Translation(msg) => AppError::Translation(msg),
            ContentError::Io(e) => AppError::Internal(anyhow::Error::new(e)),
            ContentError::Worker(e) => AppError::Internal(anyhow::anyhow!(
                "spawn_blocking failed in content extraction: {e}"
            )),
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        AppError::Validation(format!("invalid multipart upload: {}", e.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::UnprocessableDocument(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNPROCESSABLE_DOCUMENT",
                msg.clone(),
            ),
            AppError::Ocr(msg) => {
                tracing::error!("OCR error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "OCR_ERROR",
                    "Text recognition failed".to_string(),
                )
            }
            AppError::Translation(msg) => {
                tracing::error!("Translation error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "TRANSLATION_ERROR",
                    "The translation service failed".to_string(),
                )
            }
            AppError::Inference(e) => {
                tracing::error!(history = ?e.history, "Inference error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "INFERENCE_FAILED",
                    format!("Entity extraction failed after {} attempts", e.attempts),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::inference::AttemptError;
    use crate::llm_client::LlmError;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_content_errors_map_to_distinct_statuses() {
        assert_eq!(
            status_of(ContentError::Render("bad pdf".into()).into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(ContentError::Ocr("crash".into()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(ContentError::Translation("403".into()).into()),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_inference_failure_is_bad_gateway() {
        let err = InferenceError {
            attempts: 2,
            last_error: AttemptError::Provider(LlmError::EmptyContent),
            history: vec!["a".into(), "b".into()],
        };
        assert_eq!(status_of(err.into()), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_panicked_page_worker_is_internal_error() {
        let join_error = tokio::task::spawn_blocking(|| panic!("decoder crashed"))
            .await
            .unwrap_err();
        let err: AppError = ContentError::from(join_error).into();
        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(status_of(err), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_validation_is_bad_request() {
        assert_eq!(
            status_of(AppError::Validation("no file".into())),
            StatusCode::BAD_REQUEST
        );
    }
}
