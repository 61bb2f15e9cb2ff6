//! Intent data model
//!
//! An Intent is the resolved meaning of a voice command: the action to
//! perform, the original utterance, and an advisory confidence score.
//! Intents are produced once per interaction cycle by the classifier and
//! never mutated afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Operations carried by [`Action::Extract`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ExtractionOperation {
    /// Summarize the item's content
    Summarize,

    /// OCR / plain-text extraction
    ExtractText,

    /// Translate into the given language
    Translate { language: String },

    /// Transcribe audio or video content
    Transcribe,

    /// Free-form extraction prompt
    Custom { prompt: String },
}

/// Print job options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PrintOptions {
    /// Print in color
    pub color: bool,
    /// Print double-sided
    pub double_sided: bool,
}

/// The operation a voice command resolves to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// Keep the item in the pocket, no further processing
    Hold,

    /// Send the item to a named contact or device
    Send { target: String },

    /// Convert the item to another format
    Convert { format: String },

    /// Run a content-extraction operation
    Extract { operation: ExtractionOperation },

    /// Print the item
    Print { copies: u32, options: PrintOptions },

    /// Mirror the item to an AirPlay device
    Airplay { device: String },
}

impl Action {
    /// Short status line shown while the action is being carried out
    pub fn describe(&self) -> String {
        match self {
            Action::Hold => "Holding item".to_string(),
            Action::Send { target } if target.is_empty() => "Sending".to_string(),
            Action::Send { target } => format!("Sending to {}", target),
            Action::Convert { format } => format!("Converting to {}", format),
            Action::Extract { operation } => match operation {
                ExtractionOperation::Summarize => "Summarizing".to_string(),
                ExtractionOperation::ExtractText => "Extracting text".to_string(),
                ExtractionOperation::Translate { language } => {
                    format!("Translating to {}", language)
                }
                ExtractionOperation::Transcribe => "Transcribing".to_string(),
                ExtractionOperation::Custom { .. } => "Processing".to_string(),
            },
            Action::Print { copies, .. } if *copies > 1 => {
                format!("Printing {} copies", copies)
            }
            Action::Print { .. } => "Printing".to_string(),
            Action::Airplay { device } if device.is_empty() => "Casting".to_string(),
            Action::Airplay { device } => format!("Casting to {}", device),
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.describe())
    }
}

/// The classifier's structured interpretation of one voice command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    /// Unique identifier
    pub id: Uuid,

    /// The resolved operation
    pub action: Action,

    /// The original utterance; None when no voice command was given
    pub raw_command: Option<String>,

    /// Advisory confidence in [0, 1]; never gates execution
    pub confidence: f32,

    /// When classification resolved
    pub resolved_at: DateTime<Utc>,

    /// Whether the action applies to every staged item in a batch session
    #[serde(default)]
    pub apply_to_all: bool,
}

impl Intent {
    /// Build an intent for a resolved action
    pub fn new(action: Action, raw_command: Option<String>, confidence: f32) -> Self {
        Self {
            id: Uuid::new_v4(),
            action,
            raw_command,
            confidence,
            resolved_at: Utc::now(),
            apply_to_all: false,
        }
    }

    /// The default intent when no command was given or resolution failed
    pub fn hold(raw_command: Option<String>, confidence: f32) -> Self {
        Self::new(Action::Hold, raw_command, confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_descriptions() {
        let send = Action::Send { target: "John".into() };
        assert_eq!(send.describe(), "Sending to John");

        let convert = Action::Convert { format: "pdf".into() };
        assert_eq!(convert.describe(), "Converting to pdf");

        let print = Action::Print { copies: 3, options: PrintOptions::default() };
        assert_eq!(print.describe(), "Printing 3 copies");

        let translate = Action::Extract {
            operation: ExtractionOperation::Translate { language: "Spanish".into() },
        };
        assert_eq!(translate.describe(), "Translating to Spanish");
    }

    #[test]
    fn test_action_serialization() {
        let action = Action::Extract { operation: ExtractionOperation::Summarize };
        let json = serde_json::to_string(&action).unwrap();
        assert!(json.contains("extract"));
        assert!(json.contains("summarize"));
    }

    #[test]
    fn test_hold_intent() {
        let intent = Intent::hold(None, 1.0);
        assert_eq!(intent.action, Action::Hold);
        assert_eq!(intent.confidence, 1.0);
        assert!(intent.raw_command.is_none());
        assert!(!intent.apply_to_all);
    }
}
