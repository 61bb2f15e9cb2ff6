//! Three-tier intent resolution
//!
//! Resolution order: empty-command short circuit, cache lookup, deterministic
//! pattern match, hosted-model fallback. Classification never fails from the
//! caller's point of view; every error path degrades to a hold intent and is
//! surfaced only through the last-error diagnostic.

use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use super::cache::IntentCache;
use super::response::{self, ReplyError};
use super::{correct, pattern};
use crate::intent::Intent;
use crate::item::ContentType;
use crate::llm::{CompletionClient, LlmError};

/// Confidence attached to deterministic pattern matches
const PATTERN_CONFIDENCE: f32 = 0.9;

/// Confidence attached to the hold fallback after a failed model call
const FALLBACK_CONFIDENCE: f32 = 0.5;

/// Cache capacity; identical commands within this window never recompute
const CACHE_CAPACITY: usize = 100;

const SYSTEM_PROMPT: &str = "\
You interpret short voice commands about a file the user just dropped.\n\
Reply with a single JSON object and nothing else:\n\
{\"action\": \"...\", \"target\": \"...\", \"confidence\": 0.0, \"apply_to_all\": false}\n\
\n\
Allowed actions: hold, send, convert, summarize, extract, translate,\n\
transcribe, print, airplay.\n\
- target carries the action argument: the recipient for send, the format\n\
  for convert, the language for translate, the copy count for print, the\n\
  device for airplay. Omit it when there is none.\n\
- confidence is your certainty in [0, 1].\n\
- apply_to_all is false unless told the session holds several items.\n\
\n\
Examples:\n\
command \"put this away for now\" -> {\"action\":\"hold\",\"confidence\":0.9}\n\
command \"shoot it over to Sarah\" -> {\"action\":\"send\",\"target\":\"Sarah\",\"confidence\":0.85}\n\
command \"make this a png\" -> {\"action\":\"convert\",\"target\":\"png\",\"confidence\":0.9}\n\
command \"what does this say\" -> {\"action\":\"extract\",\"confidence\":0.7}\n";

const BATCH_PROMPT_SUFFIX: &str = "\
\nThe session currently holds more than one staged item. Set\n\
\"apply_to_all\": true when the command addresses all of them\n\
(e.g. \"send them all to Mike\").\n";

/// Errors absorbed by the hold fallback; exposed only for diagnostics
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Reply(#[from] ReplyError),
}

/// Maps a voice command and an item type onto an [`Intent`]
pub struct Classifier {
    llm: Arc<dyn CompletionClient>,
    cache: Mutex<IntentCache>,
    last_error: Mutex<Option<String>>,
}

impl Classifier {
    pub fn new(llm: Arc<dyn CompletionClient>) -> Self {
        Self {
            llm,
            cache: Mutex::new(IntentCache::new(CACHE_CAPACITY)),
            last_error: Mutex::new(None),
        }
    }

    /// Classify a single-item command
    pub async fn classify(&self, utterance: Option<&str>, item_type: ContentType) -> Intent {
        self.resolve(utterance, item_type, 1).await
    }

    /// Classify within a batch session holding `staged` items; the model
    /// may then mark the intent as applying to all of them
    pub async fn classify_batch(
        &self,
        utterance: Option<&str>,
        item_type: ContentType,
        staged: usize,
    ) -> Intent {
        self.resolve(utterance, item_type, staged).await
    }

    /// Diagnostic view of the most recent absorbed error
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().unwrap().clone()
    }

    async fn resolve(
        &self,
        utterance: Option<&str>,
        item_type: ContentType,
        staged: usize,
    ) -> Intent {
        // No command means hold, with full confidence and no network call
        let Some(raw) = utterance.map(str::trim).filter(|s| !s.is_empty()) else {
            return Intent::hold(None, 1.0);
        };

        let corrected = correct(raw);
        let key = format!("{}|{}", corrected, item_type);

        if let Some(hit) = self.cache.lock().unwrap().get(&key) {
            debug!(command = %corrected, "intent cache hit");
            return hit;
        }

        if let Some(action) = pattern::match_action(&corrected, raw) {
            debug!(command = %corrected, ?action, "pattern match");
            let intent = Intent::new(action, Some(raw.to_string()), PATTERN_CONFIDENCE);
            self.cache.lock().unwrap().insert(key, intent.clone());
            return intent;
        }

        match self.ask_model(raw, &corrected, item_type, staged).await {
            Ok(intent) => {
                self.cache.lock().unwrap().insert(key, intent.clone());
                intent
            }
            Err(e) => {
                warn!(command = %corrected, error = %e, "classification fell back to hold");
                *self.last_error.lock().unwrap() = Some(e.to_string());
                Intent::hold(Some(raw.to_string()), FALLBACK_CONFIDENCE)
            }
        }
    }

    async fn ask_model(
        &self,
        raw: &str,
        corrected: &str,
        item_type: ContentType,
        staged: usize,
    ) -> Result<Intent, ClassifyError> {
        let batch = staged > 1;
        let system = if batch {
            format!("{}{}", SYSTEM_PROMPT, BATCH_PROMPT_SUFFIX)
        } else {
            SYSTEM_PROMPT.to_string()
        };

        let user = if batch {
            format!(
                "Item type: {}\nStaged items: {}\nCommand: {}",
                item_type, staged, corrected
            )
        } else {
            format!("Item type: {}\nCommand: {}", item_type, corrected)
        };

        let reply = self.llm.complete(&system, &user).await?;
        let parsed = response::parse_reply(&reply)?;

        let mut intent = Intent::new(parsed.action, Some(raw.to_string()), parsed.confidence);
        intent.apply_to_all = batch && parsed.apply_to_all;
        Ok(intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::{Action, ExtractionOperation};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Completion stub returning a canned reply and counting calls
    struct StubModel {
        reply: Result<String, ()>,
        calls: AtomicUsize,
    }

    impl StubModel {
        fn replying(reply: &str) -> Self {
            Self { reply: Ok(reply.to_string()), calls: AtomicUsize::new(0) }
        }

        fn failing() -> Self {
            Self { reply: Err(()), calls: AtomicUsize::new(0) }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionClient for StubModel {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(()) => Err(LlmError::MissingApiKey),
            }
        }
    }

    fn classifier_with(stub: Arc<StubModel>) -> Classifier {
        Classifier::new(stub)
    }

    #[tokio::test]
    async fn test_empty_command_holds_without_network() {
        let stub = Arc::new(StubModel::replying("{}"));
        let classifier = classifier_with(stub.clone());

        let none = classifier.classify(None, ContentType::Document).await;
        let empty = classifier.classify(Some(""), ContentType::Document).await;
        let blank = classifier.classify(Some("   "), ContentType::Document).await;

        for intent in [none, empty, blank] {
            assert_eq!(intent.action, Action::Hold);
            assert_eq!(intent.confidence, 1.0);
            assert!(intent.raw_command.is_none());
        }
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_pattern_match_short_circuits_network() {
        // Even a dead model backend must not matter for pattern matches
        let stub = Arc::new(StubModel::failing());
        let classifier = classifier_with(stub.clone());

        let intent = classifier
            .classify(Some("send this to John"), ContentType::Document)
            .await;

        assert_eq!(intent.action, Action::Send { target: "John".into() });
        assert_eq!(intent.confidence, 0.9);
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_convert_to_pdf_scenario() {
        let stub = Arc::new(StubModel::failing());
        let classifier = classifier_with(stub);

        let intent = classifier
            .classify(Some("Convert to PDF"), ContentType::Document)
            .await;

        assert_eq!(intent.action, Action::Convert { format: "pdf".into() });
        assert_eq!(intent.confidence, 0.9);
    }

    #[tokio::test]
    async fn test_cache_round_trip_single_network_call() {
        let stub = Arc::new(StubModel::replying(
            r#"{"action":"summarize","confidence":0.85}"#,
        ));
        let classifier = classifier_with(stub.clone());

        let first = classifier
            .classify(Some("please make this nicer"), ContentType::Text)
            .await;
        let second = classifier
            .classify(Some("please make this nicer"), ContentType::Text)
            .await;

        assert_eq!(stub.calls(), 1);
        assert_eq!(first, second);
        assert_eq!(
            first.action,
            Action::Extract { operation: ExtractionOperation::Summarize }
        );
        assert_eq!(first.confidence, 0.85);
    }

    #[tokio::test]
    async fn test_cache_distinguishes_item_types() {
        let stub = Arc::new(StubModel::replying(r#"{"action":"extract"}"#));
        let classifier = classifier_with(stub.clone());

        classifier.classify(Some("what is in here"), ContentType::Image).await;
        classifier.classify(Some("what is in here"), ContentType::Document).await;

        assert_eq!(stub.calls(), 2);
    }

    #[tokio::test]
    async fn test_model_failure_falls_back_to_hold() {
        let stub = Arc::new(StubModel::failing());
        let classifier = classifier_with(stub.clone());

        let intent = classifier.classify(Some("xyz123"), ContentType::Document).await;

        assert_eq!(intent.action, Action::Hold);
        assert_eq!(intent.confidence, 0.5);
        assert_eq!(intent.raw_command.as_deref(), Some("xyz123"));
        assert!(classifier.last_error().is_some());
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn test_malformed_reply_falls_back_to_hold() {
        let stub = Arc::new(StubModel::replying("I would rather chat about this"));
        let classifier = classifier_with(stub);

        let intent = classifier.classify(Some("xyz123"), ContentType::Document).await;

        assert_eq!(intent.action, Action::Hold);
        assert_eq!(intent.confidence, 0.5);
        assert!(classifier.last_error().is_some());
    }

    #[tokio::test]
    async fn test_fallback_is_not_cached() {
        let stub = Arc::new(StubModel::failing());
        let classifier = classifier_with(stub.clone());

        classifier.classify(Some("xyz123"), ContentType::Document).await;
        classifier.classify(Some("xyz123"), ContentType::Document).await;

        // A degraded answer must not poison the cache
        assert_eq!(stub.calls(), 2);
    }

    #[tokio::test]
    async fn test_fenced_reply_is_parsed() {
        let stub = Arc::new(StubModel::replying(
            "```json\n{\"action\":\"airplay\",\"target\":\"Bedroom TV\",\"confidence\":0.75}\n```",
        ));
        let classifier = classifier_with(stub);

        let intent = classifier
            .classify(Some("put it on the big screen"), ContentType::Video)
            .await;

        assert_eq!(intent.action, Action::Airplay { device: "Bedroom TV".into() });
        assert_eq!(intent.confidence, 0.75);
    }

    #[tokio::test]
    async fn test_batch_session_sets_apply_to_all() {
        let stub = Arc::new(StubModel::replying(
            r#"{"action":"send","target":"Mike","confidence":0.9,"apply_to_all":true}"#,
        ));
        let classifier = classifier_with(stub);

        let intent = classifier
            .classify_batch(Some("ship them all over to mike"), ContentType::Image, 3)
            .await;

        assert_eq!(intent.action, Action::Send { target: "Mike".into() });
        assert!(intent.apply_to_all);
    }

    #[tokio::test]
    async fn test_single_item_never_applies_to_all() {
        let stub = Arc::new(StubModel::replying(
            r#"{"action":"send","target":"Mike","apply_to_all":true}"#,
        ));
        let classifier = classifier_with(stub);

        let intent = classifier
            .classify(Some("get this over to mike somehow"), ContentType::Image)
            .await;

        assert!(!intent.apply_to_all);
    }

    #[tokio::test]
    async fn test_corrected_command_still_pattern_matches() {
        let stub = Arc::new(StubModel::failing());
        let classifier = classifier_with(stub.clone());

        let intent = classifier
            .classify(Some("sent to Mike"), ContentType::Document)
            .await;

        assert_eq!(intent.action, Action::Send { target: "Mike".into() });
        assert_eq!(stub.calls(), 0);
    }
}
