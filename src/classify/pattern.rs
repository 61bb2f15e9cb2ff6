//! Deterministic trigger-phrase matching
//!
//! Each action has an ordered list of English and Chinese trigger phrases.
//! Categories are checked in a fixed precedence order (hold before send
//! before convert, and so on) so an utterance containing triggers for two
//! actions always resolves the same way. Action arguments (send target,
//! convert format, translate language, print copies) are pulled from the
//! text after the trigger.

use crate::intent::{Action, ExtractionOperation, PrintOptions};

const HOLD_TRIGGERS: &[&str] = &[
    "hold", "keep this", "keep it", "save this", "save it", "store this",
    "stash", "for later", "保存", "存起来", "留着", "放着",
];

const SEND_TRIGGERS: &[&str] = &[
    "send", "share this", "share it", "发给", "发送给", "传给", "分享给",
];

const CONVERT_TRIGGERS: &[&str] = &[
    "convert", "turn this into", "turn it into", "change to", "change into",
    "转换成", "转成", "变成",
];

const SUMMARIZE_TRIGGERS: &[&str] = &[
    "summarize", "summarise", "sum this up", "sum it up", "give me a summary",
    "总结", "摘要", "概括",
];

const TRANSLATE_TRIGGERS: &[&str] = &["translate", "翻译"];

const PRINT_TRIGGERS: &[&str] = &["print", "打印"];

/// Triggers that introduce a send target
const SEND_TARGET_MARKERS: &[&str] = &[" to ", "发给", "发送给", "传给", "分享给"];

/// Triggers that introduce a conversion format
const CONVERT_FORMAT_MARKERS: &[&str] =
    &["convert to ", "convert it to ", "convert this to ", "turn this into ",
      "turn it into ", "change to ", "change into ", "转换成", "转成", "变成"];

/// Triggers that introduce a translation target language
const TRANSLATE_LANGUAGE_MARKERS: &[&str] =
    &["translate to ", "translate into ", "translate this to ",
      "translate this into ", "翻译成", "翻译到"];

/// Match a corrected utterance against the trigger lists.
///
/// `corrected` is the lowercased auto-corrected text used for matching;
/// `raw` is the original utterance, used to extract arguments with their
/// original casing. Returns None when no category matches.
pub fn match_action(corrected: &str, raw: &str) -> Option<Action> {
    // Fixed precedence: hold > send > convert > summarize > translate > print
    if contains_any(corrected, HOLD_TRIGGERS) {
        return Some(Action::Hold);
    }
    if contains_any(corrected, SEND_TRIGGERS) {
        let target = extract_tail(raw, corrected, SEND_TARGET_MARKERS)
            .map(|t| first_phrase(&t))
            .unwrap_or_default();
        return Some(Action::Send { target });
    }
    if contains_any(corrected, CONVERT_TRIGGERS) {
        let format = extract_tail(raw, corrected, CONVERT_FORMAT_MARKERS)
            .map(|t| first_token(&t).to_lowercase())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "pdf".to_string());
        return Some(Action::Convert { format });
    }
    if contains_any(corrected, SUMMARIZE_TRIGGERS) {
        return Some(Action::Extract { operation: ExtractionOperation::Summarize });
    }
    if contains_any(corrected, TRANSLATE_TRIGGERS) {
        let language = extract_tail(raw, corrected, TRANSLATE_LANGUAGE_MARKERS)
            .map(|t| first_token(&t).to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "English".to_string());
        return Some(Action::Extract {
            operation: ExtractionOperation::Translate { language },
        });
    }
    if contains_any(corrected, PRINT_TRIGGERS) {
        return Some(Action::Print {
            copies: extract_copies(corrected),
            options: PrintOptions::default(),
        });
    }
    None
}

fn contains_any(text: &str, triggers: &[&str]) -> bool {
    triggers.iter().any(|t| text.contains(t))
}

/// Text after the first matching marker, preferring the original-cased
/// utterance so contact names keep their capitalization.
fn extract_tail(raw: &str, corrected: &str, markers: &[&str]) -> Option<String> {
    let raw_lower = raw.to_lowercase();
    for marker in markers {
        if let Some(pos) = raw_lower.find(marker) {
            return Some(raw[pos + marker.len()..].trim().to_string());
        }
        if let Some(pos) = corrected.find(marker) {
            return Some(corrected[pos + marker.len()..].trim().to_string());
        }
    }
    None
}

/// First whitespace-delimited token, trailing punctuation stripped
fn first_token(text: &str) -> &str {
    text.split_whitespace()
        .next()
        .map(|t| t.trim_end_matches(['.', ',', '!', '?']))
        .unwrap_or("")
}

/// Everything up to the first sentence break, trailing punctuation stripped
fn first_phrase(text: &str) -> String {
    text.split(['.', ',', '!', '?'])
        .next()
        .unwrap_or("")
        .trim()
        .to_string()
}

/// First run of decimal digits anywhere in the text, defaulting to 1
fn extract_copies(text: &str) -> u32 {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matched(utterance: &str) -> Option<Action> {
        let corrected = crate::classify::correct(utterance);
        match_action(&corrected, utterance)
    }

    #[test]
    fn test_send_with_target() {
        assert_eq!(
            matched("send this to John"),
            Some(Action::Send { target: "John".into() })
        );
    }

    #[test]
    fn test_send_chinese() {
        assert_eq!(
            matched("发给妈妈"),
            Some(Action::Send { target: "妈妈".into() })
        );
    }

    #[test]
    fn test_convert_format_token() {
        assert_eq!(
            matched("Convert to PDF"),
            Some(Action::Convert { format: "pdf".into() })
        );
        assert_eq!(
            matched("convert this to png please"),
            Some(Action::Convert { format: "png".into() })
        );
    }

    #[test]
    fn test_convert_format_defaults_to_pdf() {
        assert_eq!(
            matched("convert"),
            Some(Action::Convert { format: "pdf".into() })
        );
    }

    #[test]
    fn test_hold_wins_over_send() {
        // Precedence: an utterance with both triggers resolves to hold
        assert_eq!(matched("hold this, don't send it"), Some(Action::Hold));
    }

    #[test]
    fn test_summarize() {
        assert_eq!(
            matched("summarize this for me"),
            Some(Action::Extract { operation: ExtractionOperation::Summarize })
        );
        assert_eq!(
            matched("总结一下"),
            Some(Action::Extract { operation: ExtractionOperation::Summarize })
        );
    }

    #[test]
    fn test_translate_language() {
        assert_eq!(
            matched("translate to Spanish"),
            Some(Action::Extract {
                operation: ExtractionOperation::Translate { language: "Spanish".into() }
            })
        );
    }

    #[test]
    fn test_translate_default_language() {
        assert_eq!(
            matched("translate this"),
            Some(Action::Extract {
                operation: ExtractionOperation::Translate { language: "English".into() }
            })
        );
    }

    #[test]
    fn test_print_copies() {
        assert_eq!(
            matched("print 3 copies"),
            Some(Action::Print { copies: 3, options: PrintOptions::default() })
        );
        assert_eq!(
            matched("print this"),
            Some(Action::Print { copies: 1, options: PrintOptions::default() })
        );
    }

    #[test]
    fn test_no_match() {
        assert_eq!(matched("please make this nicer"), None);
        assert_eq!(matched("xyz123"), None);
    }
}
