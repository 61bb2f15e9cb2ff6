//! Model reply decoding
//!
//! The classification prompt demands a bare JSON object
//! `{"action","target","confidence","apply_to_all"}`. Decoding is strict:
//! a reply with a missing or wrong-typed `action` is an error, never a
//! best-effort guess. Models occasionally wrap the object in a markdown
//! code fence anyway, so that wrapping is stripped before parsing.

use serde::Deserialize;

use crate::intent::{Action, ExtractionOperation, PrintOptions};

/// Wire shape of the model's reply
#[derive(Debug, Deserialize)]
struct ModelReply {
    action: String,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    confidence: Option<f32>,
    #[serde(default)]
    apply_to_all: Option<bool>,
}

/// A decoded and vocabulary-mapped reply
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReply {
    pub action: Action,
    pub confidence: f32,
    pub apply_to_all: bool,
}

/// Reply decoding failures
#[derive(Debug, thiserror::Error)]
pub enum ReplyError {
    #[error("malformed reply JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unrecognized action {0:?}")]
    UnrecognizedAction(String),
}

/// Confidence assumed when the model omits the field
const DEFAULT_CONFIDENCE: f32 = 0.8;

/// Decode a raw completion into an action, tolerating code-fence wrapping
pub fn parse_reply(raw: &str) -> Result<ParsedReply, ReplyError> {
    let stripped = strip_code_fence(raw);
    let reply: ModelReply = serde_json::from_str(stripped)?;

    let target = reply.target.unwrap_or_default();
    let action = map_action(&reply.action, &target)
        .ok_or_else(|| ReplyError::UnrecognizedAction(reply.action.clone()))?;

    Ok(ParsedReply {
        action,
        confidence: reply.confidence.unwrap_or(DEFAULT_CONFIDENCE),
        apply_to_all: reply.apply_to_all.unwrap_or(false),
    })
}

/// Map the model's action string (case-insensitive, with synonyms) onto the
/// action vocabulary
fn map_action(name: &str, target: &str) -> Option<Action> {
    let target = target.trim();
    let action = match name.to_lowercase().as_str() {
        "hold" | "store" | "save" | "keep" => Action::Hold,
        "send" | "share" => Action::Send { target: target.to_string() },
        "convert" | "change" => Action::Convert {
            format: non_empty(target).unwrap_or("pdf").to_lowercase(),
        },
        "summarize" | "summarise" => Action::Extract {
            operation: ExtractionOperation::Summarize,
        },
        "extract" | "extract_text" | "ocr" => Action::Extract {
            operation: ExtractionOperation::ExtractText,
        },
        "translate" => Action::Extract {
            operation: ExtractionOperation::Translate {
                language: non_empty(target).unwrap_or("English").to_string(),
            },
        },
        "transcribe" => Action::Extract {
            operation: ExtractionOperation::Transcribe,
        },
        "print" => Action::Print {
            copies: target.parse().unwrap_or(1),
            options: PrintOptions::default(),
        },
        "airplay" | "cast" | "mirror" => Action::Airplay { device: target.to_string() },
        _ => return None,
    };
    Some(action)
}

fn non_empty(s: &str) -> Option<&str> {
    (!s.is_empty()).then_some(s)
}

/// Strip a ```/```json fence if the whole reply is wrapped in one
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.trim_start_matches(['\r', '\n'])
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
}
