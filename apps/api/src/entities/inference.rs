//! Inference Client: prompt, call, parse, with one retry.
//!
//! A provider failure or an unparseable reply both count as a failed attempt.
//! After the last attempt the caller gets `InferenceError`; no partial result is returned.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::entities::labels::CategorizedEntities;
use crate::entities::parser::ParseError;
use crate::entities::prompts::PromptTemplate;
use crate::llm_client::retry::{RetryExhausted, RetryPolicy};
use crate::llm_client::{ChatProvider, LlmError};

/// Why a single attempt failed.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("provider call failed: {0}")]
    Provider(#[from] LlmError),

    #[error("reply could not be parsed: {0}")]
    Reply(#[from] ParseError),
}

#[derive(Debug, Error)]
#[error("entity inference failed after {attempts} attempt(s): {last_error}")]
pub struct InferenceError {
    pub attempts: usize,
    pub last_error: AttemptError,
    pub history: Vec<String>,
}

impl From<RetryExhausted<AttemptError>> for InferenceError {
    fn from(e: RetryExhausted<AttemptError>) -> Self {
        Self {
            attempts: e.attempts,
            last_error: e.last_error,
            history: e.history,
        }
    }
}

/// Entities plus the provider-reported token count for the call that produced them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InferenceResult {
    pub entities: CategorizedEntities,
    pub total_token: u64,
}

#[derive(Clone)]
pub struct InferenceClient {
    provider: Arc<dyn ChatProvider>,
    template: Arc<PromptTemplate>,
    retry: RetryPolicy,
}

impl InferenceClient {
    pub fn new(provider: Arc<dyn ChatProvider>, template: Arc<PromptTemplate>) -> Self {
        Self {
            provider,
            template,
            retry: RetryPolicy::default(),
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// Extracts entities from normalized document text.
    pub async fn infer(&self, text: &str) -> Result<InferenceResult, InferenceError> {
        let messages = self.template.render(text);
        let messages = messages.as_slice();
        let format = self.template.format();
        let provider = self.provider.as_ref();

        let result = self
            .retry
            .run("entity inference", |_| async move {
                let reply = provider.submit(messages).await?;
                let entities = format.parse_reply(&reply.text)?;
                Ok::<_, AttemptError>(InferenceResult {
                    entities,
                    total_token: reply.total_tokens,
                })
            })
            .await?;

        info!(
            provider = self.provider.name(),
            model = %self.provider.model(),
            entities = result.entities.total(),
            total_token = result.total_token,
            "Entity inference complete"
        );

        Ok(result)
    }
}
