//! Events emitted by the interaction phase machine
//!
//! Collaborators (UI overlays, haptics, the IPC server) subscribe to these
//! to mirror the live phase without reaching into the machine.

use serde::{Deserialize, Serialize};

/// Events emitted on phase transitions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PhaseEvent {
    /// A drag entered the screen; the widget starts anticipating
    AnticipationEntered,

    /// The dragged item is hovering over the drop target
    EngagementEntered,

    /// The hover left the target without a drop
    EngagementLeft,

    /// A drop was confirmed; waiting for a voice command
    ListeningStarted {
        /// Display name of the pending item
        item: String,
    },

    /// A command was classified and execution began
    ProcessingStarted {
        /// Human-readable status line (the intent description)
        status: String,
    },

    /// Execution finished
    CycleCompleted {
        success: bool,
    },

    /// The completion display timed out; back to idle
    CycleReset,
}

impl std::fmt::Display for PhaseEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PhaseEvent::AnticipationEntered => write!(f, "ANTICIPATION_ENTERED"),
            PhaseEvent::EngagementEntered => write!(f, "ENGAGEMENT_ENTERED"),
            PhaseEvent::EngagementLeft => write!(f, "ENGAGEMENT_LEFT"),
            PhaseEvent::ListeningStarted { item } => {
                write!(f, "LISTENING_STARTED ({})", item)
            }
            PhaseEvent::ProcessingStarted { status } => {
                write!(f, "PROCESSING_STARTED ({})", status)
            }
            PhaseEvent::CycleCompleted { success } => {
                write!(f, "CYCLE_COMPLETED (success={})", success)
            }
            PhaseEvent::CycleReset => write!(f, "CYCLE_RESET"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = PhaseEvent::ProcessingStarted { status: "Sending to John".into() };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("processing_started"));
        assert!(json.contains("Sending to John"));
    }

    #[test]
    fn test_event_deserialization() {
        let json = r#"{"type":"cycle_completed","success":false}"#;
        let event: PhaseEvent = serde_json::from_str(json).unwrap();
        assert!(matches!(event, PhaseEvent::CycleCompleted { success: false }));
    }
}
