//! Pocket item data model
//!
//! A PocketItem is an immutable record of captured content: dropped files,
//! pasted links, or payloads received from another device. Operations that
//! produce derived output (e.g. a conversion) create a new item rather than
//! editing the original.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declared content type of a captured item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Image,
    Document,
    Link,
    Text,
    Video,
    Audio,
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ContentType::Image => "image",
            ContentType::Document => "document",
            ContentType::Link => "link",
            ContentType::Text => "text",
            ContentType::Video => "video",
            ContentType::Audio => "audio",
        };
        write!(f, "{}", s)
    }
}

/// An immutable unit of dropped or transferred content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PocketItem {
    /// Unique identifier
    pub id: Uuid,

    /// Declared content type
    pub content_type: ContentType,

    /// Raw byte payload
    pub data: Vec<u8>,

    /// Human-readable name shown by the UI
    pub display_name: String,

    /// Capture timestamp
    pub created_at: DateTime<Utc>,

    /// Free-form string metadata (source device, original path, ...)
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl PocketItem {
    /// Create a new item from freshly captured content
    pub fn new(
        content_type: ContentType,
        display_name: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            content_type,
            data,
            display_name: display_name.into(),
            created_at: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    /// Attach a metadata entry during construction
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_serialization() {
        let json = serde_json::to_string(&ContentType::Document).unwrap();
        assert_eq!(json, "\"document\"");

        let parsed: ContentType = serde_json::from_str("\"image\"").unwrap();
        assert_eq!(parsed, ContentType::Image);
    }

    #[test]
    fn test_item_creation() {
        let item = PocketItem::new(ContentType::Text, "note.txt", b"hello".to_vec())
            .with_metadata("source", "drop");

        assert_eq!(item.content_type, ContentType::Text);
        assert_eq!(item.display_name, "note.txt");
        assert_eq!(item.metadata.get("source").map(String::as_str), Some("drop"));
    }

    #[test]
    fn test_items_get_distinct_ids() {
        let a = PocketItem::new(ContentType::Image, "a.png", vec![]);
        let b = PocketItem::new(ContentType::Image, "a.png", vec![]);
        assert_ne!(a.id, b.id);
    }
}
