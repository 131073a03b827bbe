use std::time::Duration;

use futures_util::StreamExt;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use super::EventCallback;
use super::dispatch;

/// Lifecycle of the shared notification connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Opening the socket, or waiting out a backoff window between attempts.
    Connecting,
    Open,
    /// Terminal: released by the owner, or the reconnect budget is spent.
    Closed,
}

/// Exponential backoff with a hard attempt ceiling.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Consecutive failed reconnects tolerated before giving up for good.
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_attempts: 5,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before reconnect attempt `attempt` (zero-based):
    /// `min(base * 2^attempt, cap)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_delay)
    }
}

/// Owns the process-wide WebSocket connection to the notification endpoint.
///
/// At most one connection task is live at a time. `acquire` hands the same
/// connection to every caller while it is usable; only the callback passed
/// to the acquisition that actually opened it ever receives events. The
/// connection deliberately outlives any one consumer surface and is torn
/// down only by [`ConnectionManager::release`] (or by dropping the manager,
/// which ends the owning scope).
///
/// Construct one of these at application start and pass it by reference to
/// every surface that needs notifications.
pub struct ConnectionManager {
    url: String,
    policy: ReconnectPolicy,
    active: Mutex<Option<Active>>,
}

struct Active {
    state_rx: watch::Receiver<ConnectionState>,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Cloneable consumer view of the shared connection.
#[derive(Clone)]
pub struct ConnectionHandle {
    state_rx: watch::Receiver<ConnectionState>,
}

impl ConnectionHandle {
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Wait until the connection reaches `target`. Returns false if the
    /// connection task went away without ever reaching it.
    pub async fn wait_for(&mut self, target: ConnectionState) -> bool {
        loop {
            if *self.state_rx.borrow_and_update() == target {
                return true;
            }
            if self.state_rx.changed().await.is_err() {
                return *self.state_rx.borrow() == target;
            }
        }
    }
}

impl ConnectionManager {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_policy(url, ReconnectPolicy::default())
    }

    pub fn with_policy(url: impl Into<String>, policy: ReconnectPolicy) -> Self {
        Self {
            url: url.into(),
            policy,
            active: Mutex::new(None),
        }
    }

    /// Get the shared connection, opening it if necessary.
    ///
    /// While a connection is usable (any state but terminal `Closed`) the
    /// callback registered by the opening acquisition stays the only active
    /// listener; `on_event` from later acquisitions is discarded. Must be
    /// called from within a Tokio runtime. Connect failures never surface
    /// here; they are observable through the handle's state and the logs.
    pub fn acquire(&self, on_event: EventCallback) -> ConnectionHandle {
        let mut active = self.active.lock();
        if let Some(existing) = active.as_ref() {
            if *existing.state_rx.borrow() != ConnectionState::Closed {
                return ConnectionHandle {
                    state_rx: existing.state_rx.clone(),
                };
            }
        }

        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run_connection(
            self.url.clone(),
            self.policy.clone(),
            on_event,
            state_tx,
            shutdown_rx,
        ));
        let handle = ConnectionHandle {
            state_rx: state_rx.clone(),
        };
        *active = Some(Active {
            state_rx,
            shutdown_tx,
            task,
        });
        handle
    }

    /// Tear the connection down, cancelling any pending backoff sleep, and
    /// wait for the task to finish.
    pub async fn release(&self) {
        let active = self.active.lock().take();
        if let Some(active) = active {
            let _ = active.shutdown_tx.send(true);
            let _ = active.task.await;
        }
    }
}

enum SessionEnd {
    /// The connect handshake failed; nothing was ever open.
    ConnectFailed,
    /// An open connection was lost.
    Dropped,
}

async fn run_connection(
    url: String,
    policy: ReconnectPolicy,
    on_event: EventCallback,
    state_tx: watch::Sender<ConnectionState>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    // Consecutive reconnects scheduled since the last successful open.
    let mut attempts: u32 = 0;
    loop {
        let _ = state_tx.send(ConnectionState::Connecting);
        let ended = tokio::select! {
            ended = run_session(&url, &on_event, &state_tx) => ended,
            _ = shutdown(&mut shutdown_rx) => break,
        };
        match ended {
            SessionEnd::Dropped => {
                attempts = 0;
                warn!("notification socket closed unexpectedly");
            }
            SessionEnd::ConnectFailed => {}
        }
        if attempts >= policy.max_attempts {
            warn!(attempts, "reconnect budget exhausted, giving up");
            break;
        }
        let delay = policy.delay_for(attempts);
        attempts += 1;
        debug!(?delay, attempt = attempts, "scheduling reconnect");
        // The sleep stays cancellable so a release() during the backoff
        // window suppresses the scheduled attempt.
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = shutdown(&mut shutdown_rx) => break,
        }
    }
    let _ = state_tx.send(ConnectionState::Closed);
}

async fn run_session(
    url: &str,
    on_event: &EventCallback,
    state_tx: &watch::Sender<ConnectionState>,
) -> SessionEnd {
    let mut stream = match connect_async(url).await {
        Ok((stream, _)) => stream,
        Err(err) => {
            warn!(url, error = %err, "notification socket connect failed");
            return SessionEnd::ConnectFailed;
        }
    };
    info!(url, "notification socket open");
    let _ = state_tx.send(ConnectionState::Open);

    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => dispatch::dispatch_frame(&text, on_event),
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            // Transport errors are logged only; reconnection is driven by
            // the stream ending, never by the error itself.
            Err(err) => warn!(error = %err, "notification socket error"),
        }
    }
    SessionEnd::Dropped
}

async fn shutdown(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        // A dropped sender means the manager is gone; shut down too.
        if rx.changed().await.is_err() {
            return;
        }
    }
}
