//! Anthropic Messages API adapter.
//!
//! The system prompt travels outside the message list, and token usage is split
//! into input and output counts which are summed into `total_tokens`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::llm_client::{
    api_error, http_client, ChatMessage, ChatProvider, LlmError, ProviderReply, ProviderSettings,
    Role,
};

pub const DEFAULT_MODEL: &str = "claude-3-sonnet-20240229";
const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The Messages API requires `max_tokens`.
const FALLBACK_MAX_TOKENS: u32 = 4096;

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}

impl AnthropicResponse {
    fn into_reply(self) -> Result<ProviderReply, LlmError> {
        let text = self
            .content
            .into_iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text)
            .filter(|t| !t.trim().is_empty())
            .ok_or(LlmError::EmptyContent)?;
        Ok(ProviderReply {
            text,
            total_tokens: self.usage.input_tokens + self.usage.output_tokens,
        })
    }
}

pub struct AnthropicProvider {
    client: Client,
    settings: ProviderSettings,
    url: String,
}

impl AnthropicProvider {
    pub fn new(settings: ProviderSettings) -> Result<Self, LlmError> {
        let base = settings.base_url.as_deref().unwrap_or(ANTHROPIC_BASE_URL);
        Ok(Self {
            client: http_client(settings.timeout)?,
            url: format!("{}/messages", base.trim_end_matches('/')),
            settings,
        })
    }

    fn request<'a>(&'a self, messages: &'a [ChatMessage]) -> AnthropicRequest<'a> {
        let system = messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.as_str());

        AnthropicRequest {
            model: &self.settings.model,
            max_tokens: self.settings.max_tokens.unwrap_or(FALLBACK_MAX_TOKENS),
            temperature: self.settings.temperature,
            system,
            messages: messages
                .iter()
                .filter(|m| m.role != Role::System)
                .map(|m| AnthropicMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
        }
    }
}

#[async_trait]
impl ChatProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.settings.model
    }

    async fn submit(&self, messages: &[ChatMessage]) -> Result<ProviderReply, LlmError> {
        let request_body = self.request(messages);

        let response = self
            .client
            .post(&self.url)
            .header("x-api-key", &self.settings.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let reply = response.json::<AnthropicResponse>().await?.into_reply()?;

        debug!(
            model = %self.settings.model,
            total_tokens = reply.total_tokens,
            "Anthropic call succeeded"
        );

        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::ProviderKind;

    #[test]
    fn test_usage_is_input_plus_output() {
        let json = r#"{
            "content": [{"type": "text", "text": "{\"skill\": []}"}],
            "usage": {"input_tokens": 1200, "output_tokens": 80}
        }"#;
        let response: AnthropicResponse = serde_json::from_str(json).unwrap();
        let reply = response.into_reply().unwrap();
        assert_eq!(reply.total_tokens, 1280);
        assert_eq!(reply.text, "{\"skill\": []}");
    }

    #[test]
    fn test_no_text_block_is_empty_content() {
        let json = r#"{"content": [{"type": "tool_use"}], "usage": {"input_tokens": 1, "output_tokens": 1}}"#;
        let response: AnthropicResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(response.into_reply(), Err(LlmError::EmptyContent)));
    }

    #[test]
    fn test_system_prompt_is_lifted_out_of_messages() {
        let provider =
            AnthropicProvider::new(ProviderSettings::new(ProviderKind::Anthropic, "k")).unwrap();
        let messages = vec![
            ChatMessage::system("be precise"),
            ChatMessage::user("example in"),
            ChatMessage::assistant("example out"),
            ChatMessage::user("real input"),
        ];
        let value = serde_json::to_value(provider.request(&messages)).unwrap();

        assert_eq!(value["system"], "be precise");
        assert_eq!(value["max_tokens"], 4096);
        let sent = value["messages"].as_array().unwrap();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0]["role"], "user");
        assert_eq!(sent[1]["role"], "assistant");
        assert_eq!(sent[2]["content"], "real input");
    }
}
