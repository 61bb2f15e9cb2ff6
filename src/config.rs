//! Configuration loading and management

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

/// Endpoint base URL used when GROQ_BASE_URL is not set
const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the Unix domain socket for IPC
    pub socket_path: PathBuf,

    /// Directory for runtime data
    pub data_dir: PathBuf,

    /// Base URL of the hosted model endpoints
    pub api_base_url: String,

    /// Bearer token for the hosted endpoints; None degrades classification
    /// to the pattern tier plus the hold fallback
    pub api_key: Option<String>,

    /// Chat model used for intent classification
    pub chat_model: String,

    /// Model used for audio transcription
    pub transcribe_model: String,

    /// How many finished tasks the history retains
    pub history_capacity: usize,

    /// How long the completion phase is shown before resetting
    pub reset_delay: Duration,
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self> {
        let home = std::env::var("HOME")?;
        let data_dir = std::env::var("POCKET_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                PathBuf::from(&home).join(".local").join("share").join("pocket")
            });

        let socket_path = std::env::var("POCKET_SOCKET")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("daemon.sock"));

        let api_base_url =
            std::env::var("GROQ_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let api_key = std::env::var("GROQ_API_KEY").ok().filter(|k| !k.is_empty());

        let chat_model = std::env::var("POCKET_CHAT_MODEL")
            .unwrap_or_else(|_| "llama-3.1-8b-instant".to_string());
        let transcribe_model = std::env::var("POCKET_TRANSCRIBE_MODEL")
            .unwrap_or_else(|_| "whisper-large-v3".to_string());

        let history_capacity = std::env::var("POCKET_HISTORY_CAP")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(64);

        let reset_delay = std::env::var("POCKET_RESET_DELAY_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(crate::phase::DEFAULT_RESET_DELAY);

        Ok(Self {
            socket_path,
            data_dir,
            api_base_url,
            api_key,
            chat_model,
            transcribe_model,
            history_capacity,
            reset_delay,
        })
    }

    /// Ensure data directory exists
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }
}
