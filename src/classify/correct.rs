//! Voice auto-correction
//!
//! Speech recognition reliably mangles a handful of short command words and
//! format names ("pee dee eff", "sent" for "send"). A static substitution
//! table fixes the known cases before matching. Phrase rules run first;
//! they are longer and must win over the single-word rules they contain.

/// Multi-word substitutions, applied to the whole lowercased utterance
const PHRASE_RULES: &[(&str, &str)] = &[
    // Spelled-out or misheard format names
    ("pee dee eff", "pdf"),
    ("p d f", "pdf"),
    ("jay pegs", "jpeg"),
    ("jay peg", "jpeg"),
    ("pee en gee", "png"),
    // Misheard command phrases
    ("sent to", "send to"),
    ("scent to", "send to"),
    ("send it two", "send it to"),
    ("air play", "airplay"),
    ("summer eyes", "summarize"),
    ("convert it too", "convert it to"),
    // Curated Chinese misrecognitions (homophone swaps)
    ("转换城", "转换成"),
    ("专换成", "转换成"),
    ("法给", "发给"),
    ("发松给", "发送给"),
    ("打映", "打印"),
    ("翻一成", "翻译成"),
    ("总接一下", "总结一下"),
    ("投平", "投屏"),
];

/// Single-word substitutions, applied word-by-word after the phrase pass
const WORD_RULES: &[(&str, &str)] = &[
    ("sent", "send"),
    ("scent", "send"),
    ("sand", "send"),
    ("wholed", "hold"),
    ("whole", "hold"),
    ("covert", "convert"),
];

/// Lowercase, trim, and collapse runs of whitespace
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Apply the auto-correction table to a raw transcript.
///
/// The result is normalized (lowercased, single-spaced) and stable:
/// correcting an already-corrected string is a no-op.
pub fn correct(text: &str) -> String {
    let mut out = normalize(text);

    for (wrong, right) in PHRASE_RULES {
        if out.contains(wrong) {
            out = out.replace(wrong, right);
        }
    }

    out = out
        .split(' ')
        .map(|word| {
            WORD_RULES
                .iter()
                .find(|(wrong, _)| word == *wrong)
                .map(|(_, right)| *right)
                .unwrap_or(word)
        })
        .collect::<Vec<_>>()
        .join(" ");

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phrase_rules_fix_format_names() {
        assert_eq!(correct("convert to pee dee eff"), "convert to pdf");
        assert_eq!(correct("Convert To P D F"), "convert to pdf");
    }

    #[test]
    fn test_word_rules_fix_misheard_commands() {
        assert_eq!(correct("sent this to John"), "send this to john");
        assert_eq!(correct("whole this for me"), "hold this for me");
    }

    #[test]
    fn test_phrase_rules_win_over_word_rules() {
        // "sent to" is fixed as a phrase before the word pass ever sees "sent"
        assert_eq!(correct("sent to mike"), "send to mike");
    }

    #[test]
    fn test_chinese_corrections() {
        assert_eq!(correct("转换城pdf"), "转换成pdf");
        assert_eq!(correct("法给妈妈"), "发给妈妈");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "sent this to John",
            "convert to pee dee eff",
            "转换城pdf",
            "hold on to this",
            "please make this nicer",
        ];
        for s in samples {
            let once = correct(s);
            assert_eq!(correct(&once), once, "correction not stable for {s:?}");
        }
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize("  Send   THIS  "), "send this");
    }
}
