use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::content::translate::GOOGLE_TRANSLATE_URL;
use crate::entities::parser::ReplyFormat;
use crate::llm_client::{ProviderKind, ProviderSettings};

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub llm: ProviderSettings,
    pub reply_format: ReplyFormat,
    pub few_shot_path: PathBuf,
    pub translate_api_url: String,
    pub translate_api_key: String,
    pub translate_timeout: Duration,
    pub tesseract_path: PathBuf,
    pub ocr_lang: String,
    pub pdftoppm_path: PathBuf,
    pub render_dpi: u32,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| {
            get(key).with_context(|| format!("Required environment variable '{key}' is not set"))
        };

        let provider: ProviderKind = parse_or(get("LLM_PROVIDER"), "LLM_PROVIDER", ProviderKind::OpenAi)?;
        let mut llm = ProviderSettings::new(provider, require(provider.api_key_var())?);
        if let Some(model) = get("LLM_MODEL") {
            llm.model = model;
        }
        llm.base_url = get("LLM_BASE_URL");
        llm.timeout = Duration::from_secs(parse_or(get("LLM_TIMEOUT_SECS"), "LLM_TIMEOUT_SECS", 120)?);

        let reply_format: ReplyFormat =
            parse_or(get("REPLY_FORMAT"), "REPLY_FORMAT", ReplyFormat::RepairedJson)?;
        let few_shot_path = get("FEW_SHOT_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| default_fixture_path(reply_format));

        Ok(Config {
            port: parse_or(get("PORT"), "PORT", 8080)?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            llm,
            reply_format,
            few_shot_path,
            translate_api_url: get("TRANSLATE_API_URL")
                .unwrap_or_else(|| GOOGLE_TRANSLATE_URL.to_string()),
            translate_api_key: require("TRANSLATE_API_KEY")?,
            translate_timeout: Duration::from_secs(parse_or(
                get("TRANSLATE_TIMEOUT_SECS"),
                "TRANSLATE_TIMEOUT_SECS",
                30,
            )?),
            tesseract_path: get("TESSERACT_PATH")
                .unwrap_or_else(|| "tesseract".to_string())
                .into(),
            ocr_lang: get("OCR_LANG").unwrap_or_else(|| "eng".to_string()),
            pdftoppm_path: get("PDFTOPPM_PATH")
                .unwrap_or_else(|| "pdftoppm".to_string())
                .into(),
            render_dpi: parse_or(get("RENDER_DPI"), "RENDER_DPI", 200)?,
            max_upload_bytes: parse_or(get("MAX_UPLOAD_BYTES"), "MAX_UPLOAD_BYTES", 20 * 1024 * 1024)?,
        })
    }
}

/// Bundled fixture matching the reply format. Looked up relative to the working
/// directory first, then under the crate directory so the binary also starts from
/// the workspace root.
pub fn default_fixture_path(format: ReplyFormat) -> PathBuf {
    let relative = PathBuf::from(format!("fixtures/few_shot_{}.json", format.as_str()));
    resolve_fixture(relative, Path::new(env!("CARGO_MANIFEST_DIR")))
}

fn resolve_fixture(relative: PathBuf, crate_dir: &Path) -> PathBuf {
    if relative.exists() {
        relative
    } else {
        crate_dir.join(relative)
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(v) => v
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("{key} has invalid value '{v}': {e}")),
    }
}
