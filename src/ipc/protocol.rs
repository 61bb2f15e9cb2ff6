//! IPC message protocol definitions
//!
//! All messages are JSON-encoded, prefixed with a 4-byte little-endian
//! length. Drop-zone and voice-capture collaborators connect as clients and
//! inject session signals; UI clients subscribe to phase notifications.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::events::PhaseEvent;
use crate::item::{ContentType, PocketItem};
use crate::phase::PredictedAction;

/// A dropped item as carried over IPC; decoded into a [`PocketItem`] with a
/// fresh id and timestamp on receipt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DroppedItem {
    pub content_type: ContentType,
    pub display_name: String,
    #[serde(default)]
    pub data: Vec<u8>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl From<DroppedItem> for PocketItem {
    fn from(dropped: DroppedItem) -> Self {
        let mut item =
            PocketItem::new(dropped.content_type, dropped.display_name, dropped.data);
        item.metadata = dropped.metadata;
        item
    }
}

/// Requests from collaborators to the daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Ping to check connectivity
    Ping,

    /// Request current daemon status
    GetStatus,

    /// Subscribe to phase change notifications
    Subscribe,

    /// A drag was detected somewhere on screen
    DragDetected,

    /// The drag is hovering over the drop target
    HoverEnter,

    /// The drag left the drop target
    HoverExit,

    /// A drop was confirmed and decoded
    DropConfirmed { item: DroppedItem },

    /// Voice capture finished; text is None when nothing usable was heard
    TranscriptReady { text: Option<String> },

    /// Voice capture produced a WAV recording to transcribe
    AudioCaptured { path: PathBuf },

    /// Ask for ranked candidate actions for a dragged item's type, so the
    /// UI can offer drop targets that skip voice input
    GetPredictions { content_type: ContentType },
}

/// Responses from daemon to collaborators
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Pong response to ping
    Pong,

    /// Current daemon status
    Status(DaemonStatus),

    /// Signal accepted
    Ack,

    /// Subscription confirmed
    Subscribed,

    /// Ranked candidate actions for a content type
    Predictions { actions: Vec<PredictedAction> },

    /// Error response
    Error { code: String, message: String },
}

/// Push notification to subscribed clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// A phase transition occurred
    Phase { event: PhaseEvent },
}

/// Full daemon status snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonStatus {
    /// Daemon version
    pub version: String,

    /// Current interaction phase
    pub phase: String,

    /// Display name of the pending item, if a cycle is in flight
    pub pending_item: Option<String>,

    /// Finished cycles retained in history
    pub history_len: usize,

    /// Uptime in seconds
    pub uptime_secs: u64,
}

impl Default for DaemonStatus {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            phase: "idle".to_string(),
            pending_item: None,
            history_len: 0,
            uptime_secs: 0,
        }
    }
}
