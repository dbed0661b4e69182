/// LLM Client: provider adapters behind a single `ChatProvider` interface.
///
/// Every adapter turns a chat message list into `(reply text, total tokens)`.
/// Providers disagree on where token usage lives in the response, so each adapter
/// owns that mapping. Nothing outside this module talks to a provider API directly.
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod anthropic;
pub mod mistral;
pub mod openai;
pub mod retry;

/// Default temperature for every provider.
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
/// Default HTTP timeout for a single provider round trip.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("LLM response carried no token usage")]
    MissingUsage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// What every provider returns for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderReply {
    pub text: String,
    pub total_tokens: u64,
}

/// One round trip to an LLM provider. No retries happen at this level.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn model(&self) -> &str;

    async fn submit(&self, messages: &[ChatMessage]) -> Result<ProviderReply, LlmError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    Mistral,
}

impl ProviderKind {
    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => openai::DEFAULT_MODEL,
            ProviderKind::Anthropic => anthropic::DEFAULT_MODEL,
            ProviderKind::Mistral => mistral::DEFAULT_MODEL,
        }
    }

    /// Name of the environment variable holding this provider's key.
    pub fn api_key_var(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
            ProviderKind::Mistral => "MISTRAL_API_KEY",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" | "gpt" => Ok(ProviderKind::OpenAi),
            "anthropic" | "claude" => Ok(ProviderKind::Anthropic),
            "mistral" | "mistralai" => Ok(ProviderKind::Mistral),
            other => Err(format!(
                "unknown LLM provider '{other}' (expected openai, anthropic or mistral)"
            )),
        }
    }
}

/// Provider, model and sampling settings for one inference backend.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub timeout: Duration,
    pub base_url: Option<String>,
}

impl ProviderSettings {
    /// Defaults per provider: GPT-4o uncapped, Claude and Mistral capped at 4096 tokens.
    pub fn new(kind: ProviderKind, api_key: impl Into<String>) -> Self {
        let max_tokens = match kind {
            ProviderKind::OpenAi => None,
            ProviderKind::Anthropic | ProviderKind::Mistral => Some(4096),
        };
        Self {
            kind,
            api_key: api_key.into(),
            model: kind.default_model().to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens,
            timeout: DEFAULT_TIMEOUT,
            base_url: None,
        }
    }
}

/// Builds the adapter for the configured provider.
pub fn build_provider(settings: ProviderSettings) -> Result<Arc<dyn ChatProvider>, LlmError> {
    let provider: Arc<dyn ChatProvider> = match settings.kind {
        ProviderKind::OpenAi => Arc::new(openai::OpenAiProvider::new(settings)?),
        ProviderKind::Anthropic => Arc::new(anthropic::AnthropicProvider::new(settings)?),
        ProviderKind::Mistral => Arc::new(mistral::MistralProvider::new(settings)?),
    };
    Ok(provider)
}

pub(crate) fn http_client(timeout: Duration) -> Result<Client, LlmError> {
    Ok(Client::builder().timeout(timeout).build()?)
}

/// Reads a non-success response into `LlmError::Api`, using the provider's
/// `{"error": {"message"}}` body when present.
pub(crate) async fn api_error(response: reqwest::Response) -> LlmError {
    #[derive(Deserialize)]
    struct ErrorEnvelope {
        error: ErrorBody,
    }

    #[derive(Deserialize)]
    struct ErrorBody {
        message: String,
    }

    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);
    LlmError::Api { status, message }
}
