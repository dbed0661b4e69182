use std::sync::OnceLock;

use regex::Regex;

/// Mis-encoded cent sign tesseract emits for bullet glyphs.
const OCR_ARTIFACTS: &[&str] = &["Â¢", "¢"];

fn disallowed_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9\s.,]").expect("charset pattern is valid"))
}

fn whitespace_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("whitespace pattern is valid"))
}

/// Lowercases and reduces OCR text to `[a-z0-9 .,]` with single spaces.
///
/// Applying it to its own output changes nothing.
pub fn normalize_text(text: &str) -> String {
    let mut text = text.to_string();
    for artifact in OCR_ARTIFACTS {
        text = text.replace(artifact, " ");
    }
    let text = text.replace('\n', " ").to_lowercase();
    let text = disallowed_chars().replace_all(&text, "");
    let text = whitespace_runs().replace_all(&text, " ");
    text.replace(['\'', '"'], "")
}
