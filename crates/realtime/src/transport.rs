//! Reconnecting websocket transport.
//!
//! One background task owns the socket. It connects with the token in the
//! URL query, sends the greeting, hands every recognized event to the
//! [`EventSink`], and on any closure waits a fixed delay and connects again
//! until [`RealtimeTransport::disconnect`] is called.

use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use url::Url;
use uuid::Uuid;

use hrdesk_core::events::{EventKind, EventSink};

use crate::error::{Result, TransportError};
use crate::frames::{parse_frame, OutboundFrame};

/// Default real-time endpoint.
pub const DEFAULT_WS_URL: &str = "ws://localhost:8000/ws";

/// Default pause between a closed connection and the next attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(2000);

/// Default greeting content.
pub const DEFAULT_GREETING: &str = "hello from hrdesk";

/// Settings for [`RealtimeTransport`].
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Websocket endpoint without the token, e.g. `wss://hr.example.com/ws`
    pub url: String,
    pub reconnect_delay: Duration,
    /// Content of the greeting frame sent on every open
    pub greeting: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_WS_URL.to_string(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            greeting: DEFAULT_GREETING.to_string(),
        }
    }
}

impl TransportConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = greeting.into();
        self
    }
}

/// Connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    /// Waiting out the reconnect delay after a closure or failed attempt.
    Reconnecting,
}

/// Diagnostic counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportStats {
    pub connect_attempts: u64,
    pub connections_opened: u64,
    pub events_dispatched: u64,
    pub frames_dropped: u64,
}

#[derive(Debug, Default)]
struct Counters {
    connect_attempts: AtomicU64,
    connections_opened: AtomicU64,
    events_dispatched: AtomicU64,
    frames_dropped: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> TransportStats {
        TransportStats {
            connect_attempts: self.connect_attempts.load(Ordering::Relaxed),
            connections_opened: self.connections_opened.load(Ordering::Relaxed),
            events_dispatched: self.events_dispatched.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
        }
    }
}

struct RunningTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Manages the single real-time connection of the client.
pub struct RealtimeTransport {
    config: TransportConfig,
    sink: Arc<dyn EventSink>,
    state: Arc<watch::Sender<ConnectionState>>,
    counters: Arc<Counters>,
    task: Mutex<Option<RunningTask>>,
}

impl RealtimeTransport {
    pub fn new(config: TransportConfig, sink: Arc<dyn EventSink>) -> Self {
        let (state, _receiver) = watch::channel(ConnectionState::Disconnected);
        Self {
            config,
            sink,
            state: Arc::new(state),
            counters: Arc::new(Counters::default()),
            task: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    pub fn stats(&self) -> TransportStats {
        self.counters.snapshot()
    }

    /// Starts the connection task with `credential`.
    ///
    /// Does nothing while a connection task is already running. Must be
    /// called from within a tokio runtime.
    pub fn connect(&self, credential: &str) -> Result<()> {
        if credential.trim().is_empty() {
            return Err(TransportError::MissingCredential);
        }

        let mut task = self.lock_task();
        if task.as_ref().is_some_and(|running| !running.handle.is_finished()) {
            debug!("Real-time connection already active; ignoring connect");
            return Ok(());
        }

        let mut url = Url::parse(&self.config.url)?;
        url.query_pairs_mut().append_pair("token", credential);

        let cancel = CancellationToken::new();
        let worker = Worker {
            url,
            greeting: self.config.greeting.clone(),
            reconnect_delay: self.config.reconnect_delay,
            sink: self.sink.clone(),
            state: self.state.clone(),
            counters: self.counters.clone(),
            cancel: cancel.clone(),
        };

        self.state.send_replace(ConnectionState::Connecting);
        let handle = tokio::spawn(worker.run());
        *task = Some(RunningTask { cancel, handle });
        Ok(())
    }

    /// Stops the connection task, including a pending reconnect, and waits
    /// for it to exit. A later [`connect`](Self::connect) starts afresh.
    pub async fn disconnect(&self) {
        let running = self.lock_task().take();
        if let Some(running) = running {
            running.cancel.cancel();
            if let Err(e) = running.handle.await {
                warn!("Real-time connection task ended abnormally: {}", e);
            }
            info!("Real-time transport disconnected");
        }
        self.state.send_replace(ConnectionState::Disconnected);
    }

    fn lock_task(&self) -> MutexGuard<'_, Option<RunningTask>> {
        self.task.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for RealtimeTransport {
    fn drop(&mut self) {
        if let Some(running) = self.lock_task().take() {
            running.cancel.cancel();
        }
    }
}

impl std::fmt::Debug for RealtimeTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeTransport")
            .field("url", &self.config.url)
            .field("state", &self.state())
            .field("stats", &self.stats())
            .finish()
    }
}

/// State owned by the background connection task.
struct Worker {
    url: Url,
    greeting: String,
    reconnect_delay: Duration,
    sink: Arc<dyn EventSink>,
    state: Arc<watch::Sender<ConnectionState>>,
    counters: Arc<Counters>,
    cancel: CancellationToken,
}

impl Worker {
    async fn run(self) {
        loop {
            let connection_id = Uuid::new_v4();
            self.counters.connect_attempts.fetch_add(1, Ordering::Relaxed);

            match self.run_connection(connection_id).await {
                Ok(()) => info!("[{}] Real-time connection closed", connection_id),
                Err(e) => warn!("[{}] Real-time connection failed: {}", connection_id, e),
            }

            if self.cancel.is_cancelled() {
                break;
            }

            self.state.send_replace(ConnectionState::Reconnecting);
            info!("Reconnecting in {:?}", self.reconnect_delay);

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.reconnect_delay) => {}
            }

            self.state.send_replace(ConnectionState::Connecting);
        }
        debug!("Real-time connection task stopped");
    }

    /// Runs one connection until it closes. `Ok` means a clean close or a
    /// cancellation.
    async fn run_connection(&self, connection_id: Uuid) -> Result<()> {
        debug!("[{}] Connecting to {}", connection_id, self.redacted_url());

        let (mut socket, _response) = tokio::select! {
            _ = self.cancel.cancelled() => return Ok(()),
            connected = connect_async(self.url.as_str()) => connected?,
        };

        self.state.send_replace(ConnectionState::Connected);
        self.counters.connections_opened.fetch_add(1, Ordering::Relaxed);
        info!("[{}] Real-time connection open", connection_id);

        let greeting = OutboundFrame::greeting(self.greeting.as_str()).to_text()?;
        socket.send(Message::Text(greeting.into())).await?;

        loop {
            let message = tokio::select! {
                _ = self.cancel.cancelled() => {
                    if let Err(e) = socket.close(None).await {
                        debug!("[{}] Close handshake failed: {}", connection_id, e);
                    }
                    return Ok(());
                }
                message = socket.next() => message,
            };

            match message {
                None => return Ok(()),
                Some(Err(e)) => return Err(e.into()),
                Some(Ok(Message::Text(text))) => self.handle_text(connection_id, text.as_str()),
                Some(Ok(Message::Close(frame))) => {
                    debug!("[{}] Server closed the connection: {:?}", connection_id, frame);
                    return Ok(());
                }
                Some(Ok(_)) => {}
            }
        }
    }

    fn handle_text(&self, connection_id: Uuid, text: &str) {
        let event = match parse_frame(text) {
            Ok(event) => event,
            Err(e) => {
                self.counters.frames_dropped.fetch_add(1, Ordering::Relaxed);
                warn!("[{}] Dropping malformed frame: {}", connection_id, e);
                return;
            }
        };

        match &event.kind {
            EventKind::Unknown(kind) => {
                debug!("[{}] Ignoring unknown event kind '{}'", connection_id, kind);
            }
            kind => {
                debug!("[{}] Received {} event", connection_id, kind);
                self.counters.events_dispatched.fetch_add(1, Ordering::Relaxed);
                self.sink.dispatch(event);
            }
        }
    }

    /// Endpoint for logs, without the token.
    fn redacted_url(&self) -> String {
        let mut url = self.url.clone();
        url.set_query(None);
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hrdesk_core::events::{DiscardSink, RecordingSink};

    fn worker(sink: Arc<dyn EventSink>) -> Worker {
        let (state, _receiver) = watch::channel(ConnectionState::Disconnected);
        Worker {
            url: Url::parse("ws://localhost:1/ws?token=secret").unwrap(),
            greeting: DEFAULT_GREETING.to_string(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            sink,
            state: Arc::new(state),
            counters: Arc::new(Counters::default()),
            cancel: CancellationToken::new(),
        }
    }

    #[test]
    fn handle_text_dispatches_recognized_and_drops_malformed() {
        let sink = RecordingSink::new();
        let worker = worker(Arc::new(sink.clone()));
        let id = Uuid::new_v4();

        worker.handle_text(id, "{oops");
        worker.handle_text(id, r#"{"type":"something_else","data":{"id":1}}"#);
        worker.handle_text(id, r#"{"type":"log","data":{"id":1}}"#);

        assert_eq!(sink.len(), 1);
        assert_eq!(sink.events()[0].kind, EventKind::AttendanceLog);
        let stats = worker.counters.snapshot();
        assert_eq!(stats.frames_dropped, 1);
        assert_eq!(stats.events_dispatched, 1);
    }

    #[test]
    fn redacted_url_hides_token() {
        let worker = worker(Arc::new(DiscardSink));
        assert_eq!(worker.redacted_url(), "ws://localhost:1/ws");
    }

    #[test]
    fn connect_requires_credential() {
        let transport = RealtimeTransport::new(TransportConfig::default(), Arc::new(DiscardSink));
        assert!(matches!(
            transport.connect(" "),
            Err(TransportError::MissingCredential)
        ));
        assert_eq!(transport.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn connect_rejects_invalid_url() {
        let transport =
            RealtimeTransport::new(TransportConfig::new("not a url"), Arc::new(DiscardSink));
        assert!(matches!(transport.connect("tok"), Err(TransportError::Url(_))));
    }
}
