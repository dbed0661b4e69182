//! Response Parser: turns a model reply into `CategorizedEntities`.
//!
//! Three reply shapes are supported, one per prompt style:
//! - `Pipe`: numbered lines of `text | LABEL | explanation`
//! - `Records`: strict JSON, either `[{"label", "text"}]` or an object keyed by label
//! - `RepairedJson`: near-JSON object keyed by label, cleaned up before parsing
//!
//! Model output is never evaluated. Anything that does not parse as JSON after the
//! documented clean-up fails with `ParseError::Malformed`.

use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::entities::labels::{CategorizedEntities, EntityLabel};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("reply is not valid structured data: {0}")]
    Malformed(String),

    #[error("reply has no enclosing {{ ... }} object")]
    MissingBraces,
}

/// Which reply shape the prompt asks for, and therefore which parser runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyFormat {
    Pipe,
    Records,
    RepairedJson,
}

impl ReplyFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ReplyFormat::Pipe => "pipe",
            ReplyFormat::Records => "records",
            ReplyFormat::RepairedJson => "repaired_json",
        }
    }

    pub fn parse_reply(self, reply: &str) -> Result<CategorizedEntities, ParseError> {
        match self {
            ReplyFormat::Pipe => Ok(parse_pipe_delimited(reply)),
            ReplyFormat::Records => parse_labeled_records(reply),
            ReplyFormat::RepairedJson => parse_repaired_json(reply),
        }
    }
}

impl FromStr for ReplyFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pipe" => Ok(ReplyFormat::Pipe),
            "records" => Ok(ReplyFormat::Records),
            "repaired_json" | "json" => Ok(ReplyFormat::RepairedJson),
            other => Err(format!(
                "unknown reply format '{other}' (expected pipe, records or repaired_json)"
            )),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pipe-delimited
// ────────────────────────────────────────────────────────────────────────────

fn pipe_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^[ \t]*\d+\.\s*(.*?)\s*\|\s*(.*?)\s*\|")
            .expect("pipe line pattern is valid")
    })
}

/// Parses `1. <text> | <LABEL> | <explanation>` lines. Lines with unknown labels are dropped.
pub fn parse_pipe_delimited(reply: &str) -> CategorizedEntities {
    let mut entities = CategorizedEntities::default();

    for caps in pipe_line_regex().captures_iter(reply) {
        let text = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
        let Some(label) = caps.get(2).and_then(|m| EntityLabel::parse(m.as_str())) else {
            continue;
        };
        entities.push(label, text);
    }

    entities
}

// ────────────────────────────────────────────────────────────────────────────
// Labeled records (strict JSON)
// ────────────────────────────────────────────────────────────────────────────

/// Strictly parses a JSON reply. Accepts a list of `{label, text}` records or an
/// object keyed by label.
pub fn parse_labeled_records(reply: &str) -> Result<CategorizedEntities, ParseError> {
    let body = strip_json_fences(reply);
    let value: Value =
        serde_json::from_str(body).map_err(|e| ParseError::Malformed(e.to_string()))?;

    match value {
        Value::Array(records) => {
            let mut entities = CategorizedEntities::default();
            for record in &records {
                let label = record
                    .get("label")
                    .and_then(Value::as_str)
                    .and_then(EntityLabel::parse);
                let text = record.get("text").and_then(Value::as_str);
                if let (Some(label), Some(text)) = (label, text) {
                    entities.push(label, text);
                }
            }
            Ok(entities)
        }
        Value::Object(_) => Ok(collect_by_label(&value, &["entity", "text"])),
        other => Err(ParseError::Malformed(format!(
            "expected a JSON array or object, got {}",
            json_kind(&other)
        ))),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Repaired JSON
// ────────────────────────────────────────────────────────────────────────────

/// Extracts the outermost `{ ... }`, repairs quoting, then reads `{LABEL|label: [{entity}]}`.
pub fn parse_repaired_json(reply: &str) -> Result<CategorizedEntities, ParseError> {
    let start = reply.find('{').ok_or(ParseError::MissingBraces)?;
    let end = reply.rfind('}').ok_or(ParseError::MissingBraces)?;
    if end < start {
        return Err(ParseError::MissingBraces);
    }

    let repaired = repair_quotes(&reply[start..=end]);
    let value: Value =
        serde_json::from_str(&repaired).map_err(|e| ParseError::Malformed(e.to_string()))?;

    if !value.is_object() {
        return Err(ParseError::Malformed(format!(
            "expected a JSON object, got {}",
            json_kind(&value)
        )));
    }

    Ok(collect_by_label(&value, &["entity"]))
}

/// Rewrites near-JSON into JSON.
///
/// A `'` becomes `"` when preceded by `{` or whitespace, or followed by `}`, `:` or `,`.
/// A `/` or `\` is dropped when both of its neighbours are non-whitespace.
/// Neighbours are always read from the input, not from earlier rewrites.
pub fn repair_quotes(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());

    for (i, &c) in chars.iter().enumerate() {
        let prev = if i > 0 { chars.get(i - 1).copied() } else { None };
        let next = chars.get(i + 1).copied();

        match c {
            '\'' => {
                let after_open = matches!(prev, Some(p) if p == '{' || p.is_whitespace());
                let before_close = matches!(next, Some('}' | ':' | ','));
                out.push(if after_open || before_close { '"' } else { c });
            }
            '/' | '\\' => {
                let enclosed = matches!(prev, Some(p) if !p.is_whitespace())
                    && matches!(next, Some(n) if !n.is_whitespace());
                if !enclosed {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }

    out
}

// ────────────────────────────────────────────────────────────────────────────
// Shared helpers
// ────────────────────────────────────────────────────────────────────────────

/// Reads `LABEL` then `label` from a JSON object. Each value should be a list of
/// strings or objects carrying one of `fields`; anything else contributes nothing.
fn collect_by_label(object: &Value, fields: &[&str]) -> CategorizedEntities {
    let mut entities = CategorizedEntities::default();

    for label in EntityLabel::ALL {
        for key in [label.upper(), label.as_str()] {
            let Some(items) = object.get(key).and_then(Value::as_array) else {
                continue;
            };
            let texts = items.iter().filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Object(_) => fields
                    .iter()
                    .find_map(|f| item.get(*f).and_then(Value::as_str))
                    .map(String::from),
                _ => None,
            });
            entities.extend(label, texts);
        }
    }

    entities
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
