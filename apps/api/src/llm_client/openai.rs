//! OpenAI chat completions adapter.
//!
//! The wire types here are the OpenAI-compatible chat completions shape, which
//! Mistral also speaks; `mistral.rs` reuses them.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::llm_client::{
    api_error, http_client, ChatMessage, ChatProvider, LlmError, ProviderReply, ProviderSettings,
};

pub const DEFAULT_MODEL: &str = "gpt-4o";
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize)]
pub(crate) struct CompletionRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<CompletionMessage<'a>>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CompletionMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompletionResponse {
    pub choices: Vec<Choice>,
    pub usage: Option<CompletionUsage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChoiceMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompletionUsage {
    pub total_tokens: u64,
}

impl CompletionResponse {
    /// Reply text from the first choice, total tokens from `usage.total_tokens`.
    pub(crate) fn into_reply(self) -> Result<ProviderReply, LlmError> {
        let total_tokens = self
            .usage
            .map(|u| u.total_tokens)
            .ok_or(LlmError::MissingUsage)?;
        let text = self
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|t| !t.trim().is_empty())
            .ok_or(LlmError::EmptyContent)?;
        Ok(ProviderReply { text, total_tokens })
    }
}

pub(crate) fn completion_request<'a>(
    settings: &'a ProviderSettings,
    messages: &'a [ChatMessage],
) -> CompletionRequest<'a> {
    CompletionRequest {
        model: &settings.model,
        messages: messages
            .iter()
            .map(|m| CompletionMessage {
                role: m.role.as_str(),
                content: &m.content,
            })
            .collect(),
        temperature: settings.temperature,
        max_tokens: settings.max_tokens,
    }
}

/// Posts a chat completions request and maps the response into a `ProviderReply`.
pub(crate) async fn post_completion(
    client: &Client,
    url: &str,
    api_key: &str,
    body: &CompletionRequest<'_>,
) -> Result<ProviderReply, LlmError> {
    let response = client
        .post(url)
        .bearer_auth(api_key)
        .header("content-type", "application/json")
        .json(body)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(api_error(response).await);
    }

    let completion: CompletionResponse = response.json().await?;
    let reply = completion.into_reply()?;
    debug!(
        model = body.model,
        total_tokens = reply.total_tokens,
        "chat completion succeeded"
    );
    Ok(reply)
}

pub struct OpenAiProvider {
    client: Client,
    settings: ProviderSettings,
    url: String,
}

impl OpenAiProvider {
    pub fn new(settings: ProviderSettings) -> Result<Self, LlmError> {
        let base = settings.base_url.as_deref().unwrap_or(OPENAI_BASE_URL);
        Ok(Self {
            client: http_client(settings.timeout)?,
            url: format!("{}/chat/completions", base.trim_end_matches('/')),
            settings,
        })
    }
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.settings.model
    }

    async fn submit(&self, messages: &[ChatMessage]) -> Result<ProviderReply, LlmError> {
        let body = completion_request(&self.settings, messages);
        post_completion(&self.client, &self.url, &self.settings.api_key, &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::ProviderKind;

    #[test]
    fn test_completion_usage_path() {
        let json = r#"{
            "id": "chatcmpl-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "{\"SKILL\": []}"}}],
            "usage": {"prompt_tokens": 900, "completion_tokens": 34, "total_tokens": 934}
        }"#;
        let response: CompletionResponse = serde_json::from_str(json).unwrap();
        let reply = response.into_reply().unwrap();
        assert_eq!(reply.total_tokens, 934);
        assert_eq!(reply.text, "{\"SKILL\": []}");
    }

    #[test]
    fn test_completion_without_usage_fails() {
        let json = r#"{"choices": [{"message": {"content": "x"}}]}"#;
        let response: CompletionResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(response.into_reply(), Err(LlmError::MissingUsage)));
    }

    #[test]
    fn test_completion_empty_content_fails() {
        let json = r#"{"choices": [{"message": {"content": null}}], "usage": {"total_tokens": 3}}"#;
        let response: CompletionResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(response.into_reply(), Err(LlmError::EmptyContent)));
    }

    #[test]
    fn test_request_omits_unset_max_tokens() {
        let settings = ProviderSettings::new(ProviderKind::OpenAi, "k");
        let messages = vec![ChatMessage::system("sys"), ChatMessage::user("hi")];
        let value = serde_json::to_value(completion_request(&settings, &messages)).unwrap();
        assert_eq!(value["model"], "gpt-4o");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "hi");
        assert!(value.get("max_tokens").is_none());
    }

    #[test]
    fn test_custom_base_url() {
        let mut settings = ProviderSettings::new(ProviderKind::OpenAi, "k");
        settings.base_url = Some("http://localhost:8000/v1/".to_string());
        let provider = OpenAiProvider::new(settings).unwrap();
        assert_eq!(provider.url, "http://localhost:8000/v1/chat/completions");
    }
}
