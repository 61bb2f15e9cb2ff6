//! Groq API client
//!
//! Speaks the OpenAI-compatible surface: bearer-token auth, JSON chat
//! completions, multipart audio transcriptions. Classification uses a low
//! temperature so replies stay parseable.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{CompletionClient, LlmError};

const TEMPERATURE: f32 = 0.1;
const MAX_TOKENS: u32 = 256;

/// Client for the hosted chat-completion and transcription endpoints
pub struct GroqClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    chat_model: String,
    transcribe_model: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

impl GroqClient {
    /// Create a client. `api_key` may be None; calls will then fail with
    /// [`LlmError::MissingApiKey`] without touching the network.
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        chat_model: impl Into<String>,
        transcribe_model: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            chat_model: chat_model.into(),
            transcribe_model: transcribe_model.into(),
        }
    }

    fn key(&self) -> Result<&str, LlmError> {
        self.api_key.as_deref().ok_or(LlmError::MissingApiKey)
    }

    /// Transcribe a WAV recording, returning the recognized text
    pub async fn transcribe(
        &self,
        wav: Vec<u8>,
        language: Option<&str>,
    ) -> Result<String, LlmError> {
        let key = self.key()?;
        let url = format!("{}/audio/transcriptions", self.base_url);

        let file = reqwest::multipart::Part::bytes(wav)
            .file_name("audio.wav")
            .mime_str("audio/wav")?;
        let mut form = reqwest::multipart::Form::new()
            .text("model", self.transcribe_model.clone())
            .part("file", file);
        if let Some(lang) = language {
            form = form.text("language", lang.to_string());
        }

        let response = self
            .http
            .post(&url)
            .bearer_auth(key)
            .multipart(form)
            .send()
            .await?
            .error_for_status()?
            .json::<TranscriptionResponse>()
            .await?;

        debug!(text = %response.text, "transcription received");
        Ok(response.text)
    }
}

#[async_trait]
impl CompletionClient for GroqClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let key = self.key()?;
        let url = format!("{}/chat/completions", self.base_url);

        let body = json!({
            "model": self.chat_model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<ChatResponse>()
            .await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(LlmError::EmptyResponse)?;

        debug!(%content, "completion received");
        Ok(content)
    }
}
