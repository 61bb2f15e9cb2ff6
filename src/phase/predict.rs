//! Action prediction from content type
//!
//! A pure helper that proposes ranked candidate actions for a dragged item
//! before any voice input, letting the user skip speaking by dropping
//! straight onto a prediction. Confidences are hand-tuned per type/action
//! pair; hold always leads the list.

use serde::{Deserialize, Serialize};

use crate::intent::{Action, ExtractionOperation, PrintOptions};
use crate::item::ContentType;

/// Accent color the UI uses for a predicted action chip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorTag {
    Neutral,
    Blue,
    Green,
    Orange,
    Purple,
}

/// One ranked candidate action for a dragged item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictedAction {
    pub action: Action,
    /// Symbol name the UI resolves to an icon
    pub icon: String,
    pub label: String,
    pub confidence: f32,
    pub color: ColorTag,
}

fn candidate(
    action: Action,
    icon: &str,
    label: &str,
    confidence: f32,
    color: ColorTag,
) -> PredictedAction {
    PredictedAction {
        action,
        icon: icon.to_string(),
        label: label.to_string(),
        confidence,
        color,
    }
}

fn hold() -> PredictedAction {
    candidate(Action::Hold, "tray.and.arrow.down", "Hold", 0.95, ColorTag::Neutral)
}

fn send() -> PredictedAction {
    candidate(
        Action::Send { target: String::new() },
        "paperplane",
        "Send",
        0.6,
        ColorTag::Blue,
    )
}

fn convert_to(format: &str, confidence: f32) -> PredictedAction {
    candidate(
        Action::Convert { format: format.to_string() },
        "arrow.triangle.2.circlepath",
        "Convert",
        confidence,
        ColorTag::Orange,
    )
}

fn summarize(confidence: f32) -> PredictedAction {
    candidate(
        Action::Extract { operation: ExtractionOperation::Summarize },
        "text.alignleft",
        "Summarize",
        confidence,
        ColorTag::Purple,
    )
}

fn transcribe(confidence: f32) -> PredictedAction {
    candidate(
        Action::Extract { operation: ExtractionOperation::Transcribe },
        "waveform",
        "Transcribe",
        confidence,
        ColorTag::Purple,
    )
}

fn print(confidence: f32) -> PredictedAction {
    candidate(
        Action::Print { copies: 1, options: PrintOptions::default() },
        "printer",
        "Print",
        confidence,
        ColorTag::Green,
    )
}

fn airplay(confidence: f32) -> PredictedAction {
    candidate(
        Action::Airplay { device: String::new() },
        "airplayvideo",
        "AirPlay",
        confidence,
        ColorTag::Blue,
    )
}

/// Ranked candidate actions for an item of the given type, at most four,
/// hold always first
pub fn predict(content_type: ContentType) -> Vec<PredictedAction> {
    match content_type {
        ContentType::Image => vec![hold(), send(), convert_to("pdf", 0.5), print(0.4)],
        ContentType::Document => vec![hold(), summarize(0.65), send(), print(0.5)],
        ContentType::Link => vec![hold(), summarize(0.6), send()],
        ContentType::Text => vec![hold(), summarize(0.55), send(), convert_to("pdf", 0.4)],
        ContentType::Video => vec![hold(), airplay(0.6), send(), transcribe(0.35)],
        ContentType::Audio => vec![hold(), transcribe(0.7), send(), airplay(0.3)],
    }
}
