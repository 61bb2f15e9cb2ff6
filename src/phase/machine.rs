//! Interaction phase machine
//!
//! Tracks one drag-drop-speak-execute cycle through idle, anticipation,
//! engagement, listening, processing and completion. Transitions are
//! guarded: a signal that does not match the current phase is a no-op.
//! The one exception is a confirmed drop, which forces the machine into
//! listening from any phase so direct drops always work.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::classify::Classifier;
use crate::events::PhaseEvent;
use crate::item::PocketItem;
use crate::task::{ActionExecutor, PocketTask, TaskHistory};

/// The live phase of the interaction cycle
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    /// Nothing in flight
    Idle,
    /// A drag is somewhere on screen
    Anticipation,
    /// The drag is hovering over the drop target
    Engagement,
    /// An item was dropped; waiting for a voice command
    Listening,
    /// The resolved action is executing
    Processing { status: String },
    /// Execution finished; shown briefly before resetting
    Completion { success: bool },
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::Anticipation => write!(f, "anticipation"),
            Phase::Engagement => write!(f, "engagement"),
            Phase::Listening => write!(f, "listening"),
            Phase::Processing { status } => write!(f, "processing: {}", status),
            Phase::Completion { success } => write!(f, "completion (success={})", success),
        }
    }
}

/// Signals fed into the machine by drop-zone and voice-capture collaborators
#[derive(Debug, Clone)]
pub enum SessionSignal {
    /// A drag was detected somewhere on screen
    DragDetected,
    /// The drag moved over the drop target
    HoverEnter,
    /// The drag left the drop target without dropping
    HoverExit,
    /// A drop was confirmed and decoded into an item
    DropConfirmed(PocketItem),
    /// Voice capture finished; None when nothing usable was heard
    TranscriptReady(Option<String>),
}

/// How long the completion phase is displayed before resetting to idle
pub const DEFAULT_RESET_DELAY: Duration = Duration::from_secs(2);

/// The state machine driving one interaction cycle at a time
pub struct PhaseMachine {
    phase: Phase,
    /// The dropped item awaiting a command, cleared on completion
    pending_item: Option<PocketItem>,
    history: TaskHistory,
    classifier: Classifier,
    executor: Arc<dyn ActionExecutor>,
    event_tx: broadcast::Sender<PhaseEvent>,
    reset_delay: Duration,
    /// Deadline for the automatic completion -> idle reset
    reset_at: Option<Instant>,
}

impl PhaseMachine {
    pub fn new(
        classifier: Classifier,
        executor: Arc<dyn ActionExecutor>,
        event_tx: broadcast::Sender<PhaseEvent>,
        reset_delay: Duration,
        history_capacity: usize,
    ) -> Self {
        Self {
            phase: Phase::Idle,
            pending_item: None,
            history: TaskHistory::new(history_capacity),
            classifier,
            executor,
            event_tx,
            reset_delay,
            reset_at: None,
        }
    }

    /// Current phase
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// The item dropped in this cycle, if one is pending
    pub fn pending_item(&self) -> Option<&PocketItem> {
        self.pending_item.as_ref()
    }

    /// Archive of finished cycles
    pub fn history(&self) -> &TaskHistory {
        &self.history
    }

    /// Diagnostic from the classifier's most recent absorbed error
    pub fn last_classify_error(&self) -> Option<String> {
        self.classifier.last_error()
    }

    /// Run the machine, processing session signals until the channel closes
    pub async fn run(&mut self, mut signal_rx: mpsc::Receiver<SessionSignal>) {
        info!("phase machine started in idle");

        loop {
            match self.reset_at {
                Some(deadline) => tokio::select! {
                    signal = signal_rx.recv() => match signal {
                        Some(signal) => self.handle_signal(signal).await,
                        None => break,
                    },
                    _ = tokio::time::sleep_until(deadline) => self.reset(),
                },
                None => match signal_rx.recv().await {
                    Some(signal) => self.handle_signal(signal).await,
                    None => break,
                },
            }
        }

        info!("phase machine stopped");
    }

    /// Apply one signal, honoring the phase guards
    async fn handle_signal(&mut self, signal: SessionSignal) {
        match signal {
            SessionSignal::DragDetected => {
                if self.phase == Phase::Idle {
                    self.transition(Phase::Anticipation, PhaseEvent::AnticipationEntered);
                } else {
                    debug!(phase = %self.phase, "ignoring drag signal");
                }
            }
            SessionSignal::HoverEnter => {
                if self.phase == Phase::Anticipation {
                    self.transition(Phase::Engagement, PhaseEvent::EngagementEntered);
                } else {
                    debug!(phase = %self.phase, "ignoring hover enter");
                }
            }
            SessionSignal::HoverExit => {
                if self.phase == Phase::Engagement {
                    self.transition(Phase::Anticipation, PhaseEvent::EngagementLeft);
                } else {
                    debug!(phase = %self.phase, "ignoring hover exit");
                }
            }
            SessionSignal::DropConfirmed(item) => {
                // Unguarded: a confirmed drop always starts listening, so a
                // direct drop works without the drag/hover prelude
                let event = PhaseEvent::ListeningStarted { item: item.display_name.clone() };
                self.pending_item = Some(item);
                self.reset_at = None;
                self.transition(Phase::Listening, event);
            }
            SessionSignal::TranscriptReady(transcript) => {
                if self.phase == Phase::Listening {
                    self.process(transcript).await;
                } else {
                    debug!(phase = %self.phase, "ignoring transcript");
                }
            }
        }
    }

    /// Classify the transcript, execute the intent, and finish the cycle
    async fn process(&mut self, transcript: Option<String>) {
        let Some(item) = self.pending_item.clone() else {
            warn!("listening with no pending item, resetting");
            self.reset();
            return;
        };

        let intent = self
            .classifier
            .classify(transcript.as_deref(), item.content_type)
            .await;

        let status = intent.action.describe();
        self.transition(
            Phase::Processing { status: status.clone() },
            PhaseEvent::ProcessingStarted { status },
        );

        let mut task = PocketTask::new(item.clone(), intent.clone());
        task.start();

        let success = match self.executor.execute(&item, &intent).await {
            Ok(result) => {
                task.complete(Some(result));
                true
            }
            Err(e) => {
                error!(error = %e, action = %intent.action, "execution failed");
                task.fail(e.to_string());
                false
            }
        };

        self.pending_item = None;
        self.history.push(task);
        self.transition(
            Phase::Completion { success },
            PhaseEvent::CycleCompleted { success },
        );
        self.reset_at = Some(Instant::now() + self.reset_delay);
    }

    /// Automatic completion -> idle reset
    fn reset(&mut self) {
        self.reset_at = None;
        self.pending_item = None;
        self.transition(Phase::Idle, PhaseEvent::CycleReset);
    }

    /// Perform a transition and broadcast the matching event
    fn transition(&mut self, next: Phase, event: PhaseEvent) {
        info!(from = %self.phase, to = %next, "phase transition");
        self.phase = next;
        let _ = self.event_tx.send(event);
    }
}
