//! Mistral adapter. Speaks the OpenAI-compatible chat completions API.

use async_trait::async_trait;
use reqwest::Client;

use crate::llm_client::openai::{completion_request, post_completion};
use crate::llm_client::{
    http_client, ChatMessage, ChatProvider, LlmError, ProviderReply, ProviderSettings,
};

pub const DEFAULT_MODEL: &str = "open-mistral-7b";
const MISTRAL_BASE_URL: &str = "https://api.mistral.ai/v1";

pub struct MistralProvider {
    client: Client,
    settings: ProviderSettings,
    url: String,
}

impl MistralProvider {
    pub fn new(settings: ProviderSettings) -> Result<Self, LlmError> {
        let base = settings.base_url.as_deref().unwrap_or(MISTRAL_BASE_URL);
        Ok(Self {
            client: http_client(settings.timeout)?,
            url: format!("{}/chat/completions", base.trim_end_matches('/')),
            settings,
        })
    }
}

#[async_trait]
impl ChatProvider for MistralProvider {
    fn name(&self) -> &'static str {
        "mistral"
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
    use crate::llm_client::openai::CompletionResponse;
    use crate::llm_client::ProviderKind;

    #[test]
    fn test_default_url() {
        let provider = MistralProvider::new(ProviderSettings::new(ProviderKind::Mistral, "k")).unwrap();
        assert_eq!(provider.url, "https://api.mistral.ai/v1/chat/completions");
        assert_eq!(provider.model(), DEFAULT_MODEL);
    }

    #[test]
    fn test_custom_base_url() {
        let mut settings = ProviderSettings::new(ProviderKind::Mistral, "k");
        settings.base_url = Some("http://localhost:9000/v1/".to_string());
        let provider = MistralProvider::new(settings).unwrap();
        assert_eq!(provider.url, "http://localhost:9000/v1/chat/completions");
    }

    #[test]
    fn test_request_carries_model_and_token_cap() {
        let settings = ProviderSettings::new(ProviderKind::Mistral, "k");
        let messages = vec![ChatMessage::system("sys"), ChatMessage::user("cv text")];
        let value = serde_json::to_value(completion_request(&settings, &messages)).unwrap();
        assert_eq!(value["model"], "open-mistral-7b");
        assert_eq!(value["max_tokens"], 4096);
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "cv text");
    }

    #[test]
    fn test_usage_is_total_tokens() {
        let json = r#"{
            "id": "cmpl-7",
            "object": "chat.completion",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "1. Rust | SKILL | language |"}}],
            "usage": {"prompt_tokens": 410, "completion_tokens": 22, "total_tokens": 432}
        }"#;
        let response: CompletionResponse = serde_json::from_str(json).unwrap();
        let reply = response.into_reply().unwrap();
        assert_eq!(reply.total_tokens, 432);
    }
}
