pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::pipeline::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/getInformation/", post(handlers::handle_get_information))
        .route("/getInformation", post(handlers::handle_get_information))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::content::tests::{FixedPages, PixelOcr, RecordingTranslator};
    use crate::content::ContentExtractor;
    use crate::entities::inference::tests::{reply, ScriptedProvider};
    use crate::entities::inference::InferenceClient;
    use crate::entities::parser::ReplyFormat;
    use crate::entities::prompts::PromptTemplate;
    use crate::llm_client::ProviderReply;
    use crate::llm_client::LlmError;

    const BOUNDARY: &str = "X-RESUME-BOUNDARY";

    fn state(
        ocr_pages: Vec<&'static str>,
        translator: RecordingTranslator,
        script: Vec<Result<ProviderReply, LlmError>>,
    ) -> AppState {
        let page_count = ocr_pages.len();
        AppState {
            extractor: ContentExtractor::new(
                Arc::new(FixedPages(page_count)),
                Arc::new(PixelOcr(ocr_pages)),
                Arc::new(translator),
            ),
            inference: InferenceClient::new(
                Arc::new(ScriptedProvider::new(script)),
                Arc::new(PromptTemplate::build(ReplyFormat::RepairedJson, vec![])),
            ),
            max_upload_bytes: 1024 * 1024,
        }
    }

    fn upload(filename: Option<&str>, content: &[u8]) -> Request<Body> {
        let disposition = match filename {
            Some(name) => format!("form-data; name=\"file\"; filename=\"{name}\""),
            None => "form-data; name=\"note\"".to_string(),
        };
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(format!("Content-Disposition: {disposition}\r\n").as_bytes());
        body.extend_from_slice(b"Content-Type: application/pdf\r\n\r\n");
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/getInformation/")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = build_router(state(vec![], RecordingTranslator::default(), vec![]));
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_upload_returns_summary() {
        let app = build_router(state(
            vec!["Java developer", "Python"],
            RecordingTranslator::default(),
            vec![
                Err(LlmError::Api {
                    status: 500,
                    message: "flaky".to_string(),
                }),
                reply("Result: {'SKILL': [{'entity': 'java'}, {'entity': 'python'}]}", 777),
            ],
        ));

        let response = app.oneshot(upload(Some("cv.pdf"), b"%PDF-1.7")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["filename"], "cv.pdf");
        assert_eq!(body["total_token"], 777);
        assert_eq!(body["entities"]["skill"], serde_json::json!(["java", "python"]));
        assert_eq!(body["entities"]["degree"], serde_json::json!([]));
        assert!(body["execution_time"].as_f64().unwrap() >= 0.0);
        let similarity = body["cosine_similarity"].as_f64().unwrap();
        assert!(similarity > 0.0 && similarity <= 1.0);
    }

    #[tokio::test]
    async fn test_missing_file_field_is_bad_request() {
        let app = build_router(state(vec![], RecordingTranslator::default(), vec![]));
        let response = app.oneshot(upload(None, b"hello")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_empty_file_is_bad_request() {
        let app = build_router(state(vec![], RecordingTranslator::default(), vec![]));
        let response = app.oneshot(upload(Some("cv.pdf"), b"")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_translation_failure_is_bad_gateway() {
        let translator = RecordingTranslator {
            fail: true,
            ..Default::default()
        };
        let app = build_router(state(vec!["Java"], translator, vec![]));
        let response = app.oneshot(upload(Some("cv.pdf"), b"%PDF-1.7")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(json_body(response).await["error"]["code"], "TRANSLATION_ERROR");
    }

    #[tokio::test]
    async fn test_exhausted_inference_is_bad_gateway() {
        let app = build_router(state(
            vec!["Java"],
            RecordingTranslator::default(),
            vec![reply("not json", 5), reply("still not json", 5)],
        ));
        let response = app.oneshot(upload(Some("cv.pdf"), b"%PDF-1.7")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(json_body(response).await["error"]["code"], "INFERENCE_FAILED");
    }
}
