//! Task tracking for resolved intents
//!
//! A PocketTask binds one item to one intent plus the mutable execution
//! state. Statuses only move forward: pending -> processing -> one of the
//! terminal states. Finished tasks are archived into a bounded history.

mod executor;

pub use executor::{ActionExecutor, ExecError, HoldExecutor};

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::intent::Intent;
use crate::item::PocketItem;

/// Execution state of a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created, not yet started
    Pending,
    /// Execution in flight
    Processing,
    /// Finished successfully
    Completed,
    /// Finished with an error
    Failed { reason: String },
    /// Abandoned before completion
    Cancelled,
}

impl TaskStatus {
    /// Whether the status is one of the terminal states
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed { .. } | TaskStatus::Cancelled
        )
    }

    /// Whether moving to `next` is a legal forward transition
    fn allows(&self, next: &TaskStatus) -> bool {
        match self {
            TaskStatus::Pending => matches!(
                next,
                TaskStatus::Processing | TaskStatus::Cancelled
            ),
            TaskStatus::Processing => next.is_terminal(),
            // Terminal states never change
            _ => false,
        }
    }
}

/// One item bound to one resolved intent, with execution state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PocketTask {
    pub id: Uuid,
    pub item: PocketItem,
    pub intent: Intent,
    pub status: TaskStatus,
    /// Collaborator-provided result payload, if any
    pub result: Option<String>,
    /// Progress fraction in [0, 1]
    pub progress: f32,
    pub created_at: DateTime<Utc>,
}

impl PocketTask {
    /// Create a pending task for a resolved intent
    pub fn new(item: PocketItem, intent: Intent) -> Self {
        Self {
            id: Uuid::new_v4(),
            item,
            intent,
            status: TaskStatus::Pending,
            result: None,
            progress: 0.0,
            created_at: Utc::now(),
        }
    }

    /// Attempt a status transition; backward transitions are rejected
    pub fn set_status(&mut self, next: TaskStatus) -> bool {
        if !self.status.allows(&next) {
            tracing::debug!(from = ?self.status, to = ?next, "rejected task transition");
            return false;
        }
        self.status = next;
        true
    }

    /// Mark execution started
    pub fn start(&mut self) -> bool {
        self.set_status(TaskStatus::Processing)
    }

    /// Mark completed with the collaborator's result payload
    pub fn complete(&mut self, result: Option<String>) -> bool {
        if self.set_status(TaskStatus::Completed) {
            self.result = result;
            self.progress = 1.0;
            return true;
        }
        false
    }

    /// Mark failed with a reason
    pub fn fail(&mut self, reason: impl Into<String>) -> bool {
        self.set_status(TaskStatus::Failed { reason: reason.into() })
    }
}

/// Bounded archive of finished tasks, oldest evicted first
#[derive(Debug)]
pub struct TaskHistory {
    tasks: VecDeque<PocketTask>,
    capacity: usize,
}

impl TaskHistory {
    /// Create a history with the given capacity (minimum 1)
    pub fn new(capacity: usize) -> Self {
        Self {
            tasks: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Archive a finished task, evicting the oldest entry at capacity
    pub fn push(&mut self, task: PocketTask) {
        if self.tasks.len() == self.capacity {
            self.tasks.pop_front();
        }
        self.tasks.push_back(task);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Most recently archived task
    pub fn last(&self) -> Option<&PocketTask> {
        self.tasks.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PocketTask> {
        self.tasks.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::Action;
    use crate::item::ContentType;

    fn make_task() -> PocketTask {
        let item = PocketItem::new(ContentType::Document, "report.pdf", vec![]);
        let intent = Intent::new(Action::Hold, None, 1.0);
        PocketTask::new(item, intent)
    }

    #[test]
    fn test_forward_transitions() {
        let mut task = make_task();
        assert_eq!(task.status, TaskStatus::Pending);

        assert!(task.start());
        assert_eq!(task.status, TaskStatus::Processing);

        assert!(task.complete(Some("done".into())));
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.result.as_deref(), Some("done"));
        assert_eq!(task.progress, 1.0);
    }

    #[test]
    fn test_backward_transitions_rejected() {
        let mut task = make_task();
        task.start();
        task.complete(None);

        // Terminal status never changes
        assert!(!task.set_status(TaskStatus::Processing));
        assert!(!task.set_status(TaskStatus::Pending));
        assert!(!task.fail("late"));
        assert_eq!(task.status, TaskStatus::Completed);
    }

    #[test]
    fn test_pending_cannot_complete_directly() {
        let mut task = make_task();
        assert!(!task.complete(None));
        assert_eq!(task.status, TaskStatus::Pending);
    }

    #[test]
    fn test_failed_keeps_reason() {
        let mut task = make_task();
        task.start();
        assert!(task.fail("printer on fire"));
        assert_eq!(
            task.status,
            TaskStatus::Failed { reason: "printer on fire".into() }
        );
    }

    #[test]
    fn test_history_evicts_oldest() {
        let mut history = TaskHistory::new(2);
        for _ in 0..3 {
            let mut task = make_task();
            task.start();
            task.complete(None);
            history.push(task);
        }
        assert_eq!(history.len(), 2);
    }
}
