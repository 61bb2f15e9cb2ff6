//! pocket-daemon: Background daemon for the Pocket voice-driven file assistant
//!
//! Hosts the reusable core of the drag-drop-speak-execute flow:
//! - Interaction phase state machine (idle through completion)
//! - Three-tier voice-command intent classification
//! - IPC server for drop-zone, voice-capture and UI collaborators
//!
//! Out of scope, behind collaborator seams:
//! - Rendering, drag-and-drop OS integration, haptics
//! - File conversion, peer transfer, printing, AirPlay
//! - Audio capture (only finished recordings/transcripts arrive here)

mod classify;
mod config;
mod events;
mod intent;
mod ipc;
mod item;
mod lifecycle;
mod llm;
mod phase;
mod task;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::classify::Classifier;
use crate::config::Config;
use crate::events::PhaseEvent;
use crate::ipc::Server;
use crate::lifecycle::ShutdownSignal;
use crate::llm::GroqClient;
use crate::phase::PhaseMachine;
use crate::task::HoldExecutor;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "pocket-daemon starting"
    );

    // Load configuration
    let config = Config::load()?;
    config.ensure_dirs()?;
    info!(?config.socket_path, "configuration loaded");

    if config.api_key.is_none() {
        warn!("GROQ_API_KEY not set - classification limited to pattern matching");
    }

    // Create shutdown signal handler
    let shutdown = ShutdownSignal::new();

    // Create channels for inter-component communication
    // IPC clients -> phase machine
    let (signal_tx, signal_rx) = mpsc::channel(32);
    // Phase machine -> subscribers (IPC server, status view)
    let (event_tx, _event_rx) = broadcast::channel::<PhaseEvent>(64);

    // One client serves both classification and transcription
    let groq = Arc::new(GroqClient::new(
        config.api_base_url.clone(),
        config.api_key.clone(),
        config.chat_model.clone(),
        config.transcribe_model.clone(),
    ));

    let classifier = Classifier::new(groq.clone());
    let mut machine = PhaseMachine::new(
        classifier,
        Arc::new(HoldExecutor),
        event_tx.clone(),
        config.reset_delay,
        config.history_capacity,
    );

    // Create IPC server wired to the machine's signal channel
    let server = Server::new(&config.socket_path, signal_tx, event_tx.clone(), groq)?;

    // Subscribe to phase events to keep the IPC status view current
    let mut status_event_rx = event_tx.subscribe();
    let server_for_events = &server;

    info!("daemon initialized, entering main loop");

    // Main event loop
    tokio::select! {
        // Run the phase machine (processes session signals)
        _ = machine.run(signal_rx) => {
            info!("phase machine exited");
        }

        // Run the IPC server (accepts client connections)
        result = server.run() => {
            if let Err(e) = result {
                error!(?e, "IPC server error");
            }
        }

        // Mirror phase events into the IPC status snapshot
        _ = async {
            loop {
                match status_event_rx.recv().await {
                    Ok(event) => {
                        info!(%event, "phase event");
                        server_for_events.apply_event(&event).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "phase event receiver lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
        } => {
            info!("phase event handler exited");
        }

        // Wait for shutdown signal
        _ = shutdown.wait() => {
            info!("shutdown signal received");
        }
    }

    // Cleanup
    info!("shutting down...");

    server.shutdown().await;

    info!("pocket-daemon stopped");

    Ok(())
}
