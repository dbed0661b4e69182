use crate::content::ContentExtractor;
use crate::entities::inference::InferenceClient;

/// Shared application state injected into all route handlers via Axum extractors.
/// Every component is immutable; requests share nothing mutable.
#[derive(Clone)]
pub struct AppState {
    pub extractor: ContentExtractor,
    pub inference: InferenceClient,
    /// Upper bound on the uploaded PDF, enforced by the router's body limit.
    pub max_upload_bytes: usize,
}
