//! Unix domain socket server for IPC
//!
//! Accepts connections from drop-zone, voice-capture and UI collaborators.
//! Requests either query daemon status or inject session signals into the
//! phase machine; subscribed clients additionally receive a push
//! notification for every phase transition.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc, RwLock};
use tracing::{debug, error, info, warn};

use crate::events::PhaseEvent;
use crate::llm::GroqClient;
use crate::phase::SessionSignal;

use super::protocol::{DaemonStatus, Notification, Request, Response};

/// IPC Server handling client connections
pub struct Server {
    socket_path: PathBuf,
    listener: Option<UnixListener>,
    shared: Arc<Shared>,
    shutdown_tx: broadcast::Sender<()>,
}

/// State and collaborator handles shared with client tasks
struct Shared {
    state: RwLock<ServerState>,
    /// Signals forwarded into the phase machine
    signal_tx: mpsc::Sender<SessionSignal>,
    /// Phase events pushed to subscribed clients
    event_tx: broadcast::Sender<PhaseEvent>,
    /// Transcription backend for captured audio
    transcriber: Arc<GroqClient>,
}

/// The server's view of the machine, kept current via [`Server::apply_event`]
struct ServerState {
    phase: String,
    pending_item: Option<String>,
    history_len: usize,
    start_time: std::time::Instant,
}

impl Server {
    /// Create a new IPC server bound to `socket_path`
    pub fn new(
        socket_path: &Path,
        signal_tx: mpsc::Sender<SessionSignal>,
        event_tx: broadcast::Sender<PhaseEvent>,
        transcriber: Arc<GroqClient>,
    ) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent).context("failed to create socket directory")?;
        }

        // Remove stale socket if it exists
        if socket_path.exists() {
            std::fs::remove_file(socket_path).context("failed to remove stale socket")?;
        }

        let listener = UnixListener::bind(socket_path).context("failed to bind Unix socket")?;

        // Set socket permissions to owner-only (0600)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
        }

        let (shutdown_tx, _) = broadcast::channel(1);

        let shared = Arc::new(Shared {
            state: RwLock::new(ServerState {
                phase: "idle".to_string(),
                pending_item: None,
                history_len: 0,
                start_time: std::time::Instant::now(),
            }),
            signal_tx,
            event_tx,
            transcriber,
        });

        info!(?socket_path, "IPC server listening");

        Ok(Self {
            socket_path: socket_path.to_owned(),
            listener: Some(listener),
            shared,
            shutdown_tx,
        })
    }

    /// Update the server's phase view from a machine event
    pub async fn apply_event(&self, event: &PhaseEvent) {
        let mut state = self.shared.state.write().await;
        match event {
            PhaseEvent::AnticipationEntered | PhaseEvent::EngagementLeft => {
                state.phase = "anticipation".to_string();
            }
            PhaseEvent::EngagementEntered => {
                state.phase = "engagement".to_string();
            }
            PhaseEvent::ListeningStarted { item } => {
                state.phase = "listening".to_string();
                state.pending_item = Some(item.clone());
            }
            PhaseEvent::ProcessingStarted { status } => {
                state.phase = format!("processing: {}", status);
            }
            PhaseEvent::CycleCompleted { success } => {
                state.phase = format!("completion (success={})", success);
                state.pending_item = None;
                state.history_len += 1;
            }
            PhaseEvent::CycleReset => {
                state.phase = "idle".to_string();
                state.pending_item = None;
            }
        }
    }

    /// Run the server, accepting connections
    pub async fn run(&self) -> Result<()> {
        let listener = self.listener.as_ref().context("server not initialized")?;

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    debug!("client connected");
                    let shared = Arc::clone(&self.shared);
                    let mut shutdown_rx = self.shutdown_tx.subscribe();

                    tokio::spawn(async move {
                        tokio::select! {
                            result = Self::handle_client(stream, shared) => {
                                if let Err(e) = result {
                                    warn!(?e, "client handler error");
                                }
                            }
                            _ = shutdown_rx.recv() => {
                                debug!("client handler shutting down");
                            }
                        }
                    });
                }
                Err(e) => {
                    error!(?e, "accept error");
                }
            }
        }
    }

    /// Handle a single client connection
    async fn handle_client(stream: UnixStream, shared: Arc<Shared>) -> Result<()> {
        // Split so notifications can be written while a read is pending
        let (mut read_half, mut write_half) = stream.into_split();
        let mut len_buf = [0u8; 4];
        let mut event_rx = shared.event_tx.subscribe();
        let mut is_subscribed = false;

        loop {
            tokio::select! {
                read = read_half.read_exact(&mut len_buf) => {
                    match read {
                        Ok(_) => {}
                        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                            debug!("client disconnected");
                            return Ok(());
                        }
                        Err(e) => return Err(e.into()),
                    }

                    let len = u32::from_le_bytes(len_buf) as usize;
                    if len > 16 * 1024 * 1024 {
                        warn!(len, "message too large, disconnecting");
                        return Ok(());
                    }

                    let mut msg_buf = vec![0u8; len];
                    read_half.read_exact(&mut msg_buf).await?;

                    let request: Request =
                        serde_json::from_slice(&msg_buf).context("failed to parse request")?;
                    debug!(?request, "received request");

                    let (response, subscribe) = Self::process_request(request, &shared).await;
                    if subscribe {
                        is_subscribed = true;
                        debug!("client subscribed to notifications");
                    }

                    Self::send_message(&mut write_half, &response).await?;
                }

                event = event_rx.recv(), if is_subscribed => {
                    match event {
                        Ok(event) => {
                            let note = Notification::Phase { event };
                            Self::send_message(&mut write_half, &note).await?;
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!(skipped = n, "notification receiver lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }

    /// Send a length-prefixed JSON message
    async fn send_message<T, W>(stream: &mut W, msg: &T) -> Result<()>
    where
        T: serde::Serialize,
        W: AsyncWriteExt + Unpin,
    {
        let msg_bytes = serde_json::to_vec(msg)?;
        let msg_len = (msg_bytes.len() as u32).to_le_bytes();

        stream.write_all(&msg_len).await?;
        stream.write_all(&msg_bytes).await?;

        Ok(())
    }

    /// Process a request and return (response, should_subscribe)
    async fn process_request(request: Request, shared: &Arc<Shared>) -> (Response, bool) {
        match request {
            Request::Ping => (Response::Pong, false),

            Request::GetStatus => {
                let state = shared.state.read().await;
                let status = DaemonStatus {
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    phase: state.phase.clone(),
                    pending_item: state.pending_item.clone(),
                    history_len: state.history_len,
                    uptime_secs: state.start_time.elapsed().as_secs(),
                };
                (Response::Status(status), false)
            }

            Request::Subscribe => (Response::Subscribed, true),

            Request::DragDetected => {
                (Self::forward(shared, SessionSignal::DragDetected).await, false)
            }

            Request::HoverEnter => {
                (Self::forward(shared, SessionSignal::HoverEnter).await, false)
            }

            Request::HoverExit => {
                (Self::forward(shared, SessionSignal::HoverExit).await, false)
            }

            Request::DropConfirmed { item } => {
                let signal = SessionSignal::DropConfirmed(item.into());
                (Self::forward(shared, signal).await, false)
            }

            Request::TranscriptReady { text } => {
                // Treat a blank transcript like silence
                let text = text.filter(|t| !t.trim().is_empty());
                (Self::forward(shared, SessionSignal::TranscriptReady(text)).await, false)
            }

            Request::AudioCaptured { path } => {
                let transcript = match tokio::fs::read(&path).await {
                    Ok(wav) => match shared.transcriber.transcribe(wav, None).await {
                        Ok(text) => Some(text),
                        Err(e) => {
                            warn!(?path, error = %e, "transcription failed");
                            None
                        }
                    },
                    Err(e) => {
                        warn!(?path, error = %e, "could not read captured audio");
                        None
                    }
                };
                (Self::forward(shared, SessionSignal::TranscriptReady(transcript)).await, false)
            }

            Request::GetPredictions { content_type } => {
                let actions = crate::phase::predict(content_type);
                (Response::Predictions { actions }, false)
            }
        }
    }

    /// Forward a signal to the phase machine
    async fn forward(shared: &Arc<Shared>, signal: SessionSignal) -> Response {
        match shared.signal_tx.send(signal).await {
            Ok(()) => Response::Ack,
            Err(e) => {
                error!(?e, "phase machine channel closed");
                Response::Error {
                    code: "machine_unavailable".to_string(),
                    message: "phase machine is not running".to_string(),
                }
            }
        }
    }

    /// Gracefully shutdown the server
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());

        // Remove socket file
        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!(?e, "failed to remove socket file");
            }
        }

        info!("IPC server shutdown complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipc::protocol::DroppedItem;
    use crate::item::ContentType;
    use std::collections::HashMap;

    fn test_server(
        socket: &Path,
    ) -> (Server, mpsc::Receiver<SessionSignal>, broadcast::Sender<PhaseEvent>) {
        let (signal_tx, signal_rx) = mpsc::channel(8);
        let (event_tx, _) = broadcast::channel(8);
        let transcriber = Arc::new(GroqClient::new("http://127.0.0.1:1", None, "m", "m"));
        let server = Server::new(socket, signal_tx, event_tx.clone(), transcriber).unwrap();
        (server, signal_rx, event_tx)
    }

    fn temp_socket(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("pocket-test-{}-{}.sock", std::process::id(), name))
    }

    async fn send_request(stream: &mut UnixStream, request: &Request) {
        let bytes = serde_json::to_vec(request).unwrap();
        stream.write_all(&(bytes.len() as u32).to_le_bytes()).await.unwrap();
        stream.write_all(&bytes).await.unwrap();
    }

    async fn read_frame<T: serde::de::DeserializeOwned>(stream: &mut UnixStream) -> T {
        let mut len_buf = [0u8; 4];
        stream.read_exact(&mut len_buf).await.unwrap();
        let mut buf = vec![0u8; u32::from_le_bytes(len_buf) as usize];
        stream.read_exact(&mut buf).await.unwrap();
        serde_json::from_slice(&buf).unwrap()
    }

    #[tokio::test]
    async fn test_ping_and_signal_forwarding() {
        let socket = temp_socket("ping");
        let (server, mut signal_rx, _event_tx) = test_server(&socket);

        tokio::spawn(async move {
            let _ = server.run().await;
        });

        let mut stream = UnixStream::connect(&socket).await.unwrap();

        send_request(&mut stream, &Request::Ping).await;
        let resp: Response = read_frame(&mut stream).await;
        assert!(matches!(resp, Response::Pong));

        let item = DroppedItem {
            content_type: ContentType::Document,
            display_name: "report.pdf".into(),
            data: vec![],
            metadata: HashMap::new(),
        };
        send_request(&mut stream, &Request::DropConfirmed { item }).await;
        let resp: Response = read_frame(&mut stream).await;
        assert!(matches!(resp, Response::Ack));

        match signal_rx.recv().await.unwrap() {
            SessionSignal::DropConfirmed(item) => {
                assert_eq!(item.display_name, "report.pdf");
            }
            other => panic!("unexpected signal: {other:?}"),
        }

        let _ = std::fs::remove_file(&socket);
    }

    #[tokio::test]
    async fn test_subscriber_receives_phase_notifications() {
        let socket = temp_socket("subscribe");
        let (server, _signal_rx, event_tx) = test_server(&socket);

        tokio::spawn(async move {
            let _ = server.run().await;
        });

        let mut stream = UnixStream::connect(&socket).await.unwrap();
        send_request(&mut stream, &Request::Subscribe).await;
        let resp: Response = read_frame(&mut stream).await;
        assert!(matches!(resp, Response::Subscribed));

        event_tx
            .send(PhaseEvent::ListeningStarted { item: "photo.png".into() })
            .unwrap();

        let note: Notification = read_frame(&mut stream).await;
        match note {
            Notification::Phase { event: PhaseEvent::ListeningStarted { item } } => {
                assert_eq!(item, "photo.png");
            }
            other => panic!("unexpected notification: {other:?}"),
        }

        let _ = std::fs::remove_file(&socket);
    }

    #[tokio::test]
    async fn test_status_reflects_applied_events() {
        let socket = temp_socket("status");
        let (server, _signal_rx, _event_tx) = test_server(&socket);

        server
            .apply_event(&PhaseEvent::ListeningStarted { item: "note.txt".into() })
            .await;
        server
            .apply_event(&PhaseEvent::CycleCompleted { success: true })
            .await;

        let state = server.shared.state.read().await;
        assert!(state.phase.starts_with("completion"));
        assert_eq!(state.pending_item, None);
        assert_eq!(state.history_len, 1);
        drop(state);

        let _ = std::fs::remove_file(&socket);
    }
}
