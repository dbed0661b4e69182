//! Translation to English via the Google Cloud Translation v2 REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::content::ContentError;

pub const GOOGLE_TRANSLATE_URL: &str = "https://translation.googleapis.com/language/translate/v2";
const TARGET_LANGUAGE: &str = "en";

#[async_trait]
pub trait Translator: Send + Sync {
    /// Returns `text` in English. Empty input yields empty output.
    async fn to_english(&self, text: &str) -> Result<String, ContentError>;
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    target: &'a str,
    format: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    data: Option<TranslateData>,
}

#[derive(Debug, Deserialize)]
struct TranslateData {
    #[serde(default)]
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
struct Translation {
    #[serde(rename = "translatedText")]
    translated_text: Option<String>,
}

impl TranslateResponse {
    fn into_text(self) -> Result<String, ContentError> {
        self.data
            .and_then(|d| d.translations.into_iter().next())
            .and_then(|t| t.translated_text)
            .ok_or_else(|| {
                ContentError::Translation(
                    "response has no data.translations[0].translatedText".to_string(),
                )
            })
    }
}

pub struct GoogleTranslator {
    client: Client,
    url: String,
    api_key: String,
}

impl GoogleTranslator {
    pub fn new(
        url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ContentError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ContentError::Translation(format!("could not build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn to_english(&self, text: &str) -> Result<String, ContentError> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }

        let response = self
            .client
            .post(&self.url)
            .query(&[("key", self.api_key.as_str())])
            .json(&TranslateRequest {
                q: text,
                target: TARGET_LANGUAGE,
                format: "text",
            })
            .send()
            .await
            .map_err(|e| ContentError::Translation(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ContentError::Translation(format!(
                "translation API returned {status}: {body}"
            )));
        }

        let parsed: TranslateResponse = response
            .json()
            .await
            .map_err(|e| ContentError::Translation(format!("unreadable response: {e}")))?;
        let translated = parsed.into_text()?;

        debug!(
            chars_in = text.len(),
            chars_out = translated.len(),
            "Translated page text"
        );
        Ok(translated)
    }
}
