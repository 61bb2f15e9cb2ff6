//! Task execution seam
//!
//! The daemon never performs file conversion, transfers or printing itself;
//! it hands the resolved intent to an [`ActionExecutor`] collaborator and
//! records the outcome. The built-in [`HoldExecutor`] only knows how to
//! retain items; richer handlers live in the host application.

use async_trait::async_trait;
use tracing::info;

use crate::intent::{Action, Intent};
use crate::item::PocketItem;

/// Errors raised by task execution
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("no handler registered for action: {action}")]
    Unsupported { action: String },

    #[error("execution failed: {0}")]
    Failed(String),
}

/// Carries out a resolved intent against an item
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    /// Execute the intent's action; the Ok payload is a result message
    /// recorded on the finished task.
    async fn execute(&self, item: &PocketItem, intent: &Intent) -> Result<String, ExecError>;
}

/// Executor for a bare daemon with no host application attached
pub struct HoldExecutor;

#[async_trait]
impl ActionExecutor for HoldExecutor {
    async fn execute(&self, item: &PocketItem, intent: &Intent) -> Result<String, ExecError> {
        match &intent.action {
            Action::Hold => {
                info!(item = %item.display_name, "holding item");
                Ok(format!("held {}", item.display_name))
            }
            other => Err(ExecError::Unsupported {
                action: other.describe(),
            }),
        }
    }
}
