// Telemetry client - Connection state machine and batch validation for the vessel feed
use crate::domain::vessel::{VesselBatch, VesselData};
use crate::infrastructure::config::SharedSettings;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

const EVENT_QUEUE_DEPTH: usize = 256;
const TEARDOWN_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Open,
    Closed { clean: bool },
}

/// Lifecycle of one connection, in arrival order
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryEvent {
    Opened,
    MessageReceived(String),
    Error(String),
    Closed { clean: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryEnvelope {
    pub connection: u64,
    pub event: TelemetryEvent,
}

/// Where a transport reports events for the connection it was opened for
#[derive(Debug, Clone)]
pub struct EventSink {
    connection: u64,
    tx: mpsc::Sender<TelemetryEnvelope>,
}

impl EventSink {
    pub async fn emit(&self, event: TelemetryEvent) {
        let envelope = TelemetryEnvelope {
            connection: self.connection,
            event,
        };
        if self.tx.send(envelope).await.is_err() {
            tracing::debug!("Telemetry client gone, dropping event for connection {}", self.connection);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Text(String),
    Close,
}

/// Exclusive handle on a live connection. Dropping it aborts the socket task.
#[derive(Debug)]
pub struct ConnectionHandle {
    outbound: mpsc::UnboundedSender<Outbound>,
    task: JoinHandle<()>,
}

impl ConnectionHandle {
    pub fn new(outbound: mpsc::UnboundedSender<Outbound>, task: JoinHandle<()>) -> Self {
        Self { outbound, task }
    }

    fn send_text(&self, text: String) -> bool {
        self.outbound.send(Outbound::Text(text)).is_ok()
    }

    fn close(&self) {
        let _ = self.outbound.send(Outbound::Close);
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Opens the streaming connection and reports its lifecycle through the sink
pub trait TelemetryTransport: Send + Sync {
    fn open(&self, url: &str, events: EventSink) -> ConnectionHandle;
}

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("message is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("message is not an array")]
    NotAnArray,

    #[error("element {index} has no vessel_name")]
    MissingVesselName { index: usize },

    #[error("element {index} has no pose")]
    MissingPose { index: usize },
}

/// Parse a feed message into a full vessel batch. Any bad element rejects the whole message.
/// A truthy non-string `vessel_name` (number, `true`) is taken as its text form.
pub fn validate_batch(text: &str) -> Result<Vec<VesselData>, BatchError> {
    let mut value: Value = serde_json::from_str(text)?;
    let items = value.as_array_mut().ok_or(BatchError::NotAnArray)?;

    for (index, item) in items.iter_mut().enumerate() {
        let name = item
            .get("vessel_name")
            .and_then(vessel_name_text)
            .ok_or(BatchError::MissingVesselName { index })?;
        if item.get("pose").is_none_or(Value::is_null) {
            return Err(BatchError::MissingPose { index });
        }
        item["vessel_name"] = Value::String(name);
    }

    Ok(serde_json::from_value(value)?)
}

/// Name of a vessel if the value is truthy and usable as a key
fn vessel_name_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64().is_some_and(|f| f != 0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

pub struct TelemetryClient {
    settings: SharedSettings,
    transport: Arc<dyn TelemetryTransport>,
    state: ConnectionState,
    connection: Option<ConnectionHandle>,
    generation: u64,
    events_tx: mpsc::Sender<TelemetryEnvelope>,
    events_rx: mpsc::Receiver<TelemetryEnvelope>,
    state_tx: watch::Sender<ConnectionState>,
    batches: watch::Sender<Arc<VesselBatch>>,
    dropped_messages: u64,
}

impl TelemetryClient {
    pub fn new(settings: SharedSettings, transport: Arc<dyn TelemetryTransport>) -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        let (batches, _) = watch::channel(Arc::new(VesselBatch::empty()));
        Self {
            settings,
            transport,
            state: ConnectionState::Disconnected,
            connection: None,
            generation: 0,
            events_tx,
            events_rx,
            state_tx,
            batches,
            dropped_messages: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// Latest valid batch. Each new batch replaces the previous one.
    pub fn subscribe_batches(&self) -> watch::Receiver<Arc<VesselBatch>> {
        self.batches.subscribe()
    }

    pub fn dropped_messages(&self) -> u64 {
        self.dropped_messages
    }

    fn set_state(&mut self, state: ConnectionState) {
        tracing::debug!("Telemetry state {:?} -> {:?}", self.state, state);
        self.state = state;
        self.state_tx.send_replace(state);
    }

    /// Open a connection unless one is already in progress or open
    pub async fn connect(&mut self) -> bool {
        if !matches!(
            self.state,
            ConnectionState::Disconnected | ConnectionState::Closed { .. }
        ) {
            tracing::info!("Connect ignored, telemetry is already {:?}", self.state);
            return false;
        }

        let url = self.settings.read().await.telemetry_url();
        self.generation += 1;
        self.set_state(ConnectionState::Connecting);
        tracing::info!("Connecting to telemetry feed at {}", url);

        let sink = EventSink {
            connection: self.generation,
            tx: self.events_tx.clone(),
        };
        self.connection = Some(self.transport.open(&url, sink));
        true
    }

    /// Ask the transport to close; the state moves on when the Closed event arrives
    pub fn disconnect(&mut self) {
        match &self.connection {
            Some(connection) => {
                tracing::info!("Closing telemetry connection");
                connection.close();
            }
            None => tracing::debug!("Disconnect ignored, no active connection"),
        }
    }

    /// Tear down the current connection, then open a fresh one with the current settings
    pub async fn remount(&mut self) {
        if self.connection.is_some() {
            self.disconnect();
            let deadline = tokio::time::sleep(TEARDOWN_TIMEOUT);
            tokio::pin!(deadline);

            while self.connection.is_some() {
                tokio::select! {
                    Some(envelope) = self.events_rx.recv() => self.handle_event(envelope).await,
                    _ = &mut deadline => {
                        tracing::warn!("Telemetry connection did not close in time, aborting it");
                        break;
                    }
                }
            }

            self.connection = None;
            self.generation += 1;
            self.set_state(ConnectionState::Disconnected);
        }
        self.connect().await;
    }

    /// Wait for and apply the next connection event
    pub async fn process_next(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(envelope) => {
                self.handle_event(envelope).await;
                true
            }
            None => false,
        }
    }

    pub async fn handle_event(&mut self, envelope: TelemetryEnvelope) {
        if envelope.connection != self.generation {
            tracing::debug!(
                "Ignoring event from superseded connection {}",
                envelope.connection
            );
            return;
        }

        match envelope.event {
            TelemetryEvent::Opened => {
                self.set_state(ConnectionState::Open);
                self.send_identity().await;
            }
            TelemetryEvent::MessageReceived(text) => self.apply_message(&text),
            TelemetryEvent::Error(e) => {
                tracing::warn!("Telemetry transport error: {}", e);
            }
            TelemetryEvent::Closed { clean } => {
                if clean {
                    tracing::info!("Telemetry connection closed");
                } else {
                    // No automatic reconnect; the operator has to connect again.
                    tracing::warn!("Telemetry connection closed uncleanly");
                }
                self.connection = None;
                self.set_state(ConnectionState::Closed { clean });
            }
        }
    }

    async fn send_identity(&self) {
        let instance = self.settings.read().await.selected_instance.clone();
        let identity = serde_json::json!({ "instance": instance }).to_string();

        let Some(connection) = &self.connection else {
            return;
        };
        if connection.send_text(identity) {
            tracing::info!("Identified to telemetry feed as instance {}", instance);
        } else {
            tracing::warn!("Could not send identity, connection task has stopped");
        }
    }

    fn apply_message(&mut self, text: &str) {
        match validate_batch(text) {
            Ok(vessels) => {
                tracing::debug!("Telemetry batch with {} vessels", vessels.len());
                self.batches.send_replace(Arc::new(VesselBatch::new(vessels)));
            }
            Err(e) => {
                self.dropped_messages += 1;
                tracing::warn!("Dropping telemetry message: {}", e);
            }
        }
    }

    /// Drive the client from session commands and connection events until the session ends
    pub async fn run(mut self, mut commands: mpsc::Receiver<SessionCommand>) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(SessionCommand::Connect) => {
                        self.connect().await;
                    }
                    Some(SessionCommand::Disconnect) => self.disconnect(),
                    Some(SessionCommand::Remount) => self.remount().await,
                    None => break,
                },
                Some(envelope) = self.events_rx.recv() => self.handle_event(envelope).await,
            }
        }
        tracing::debug!("Telemetry session ended");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Connect,
    Disconnect,
    Remount,
}

/// A telemetry client running on its own task. Dropping the session tears the connection down.
pub struct TelemetrySession {
    commands: mpsc::Sender<SessionCommand>,
    state: watch::Receiver<ConnectionState>,
    batches: watch::Receiver<Arc<VesselBatch>>,
    task: JoinHandle<()>,
}

impl TelemetrySession {
    pub fn spawn(client: TelemetryClient) -> Self {
        let (commands, rx) = mpsc::channel(16);
        let state = client.subscribe_state();
        let batches = client.subscribe_batches();
        let task = tokio::spawn(client.run(rx));
        Self {
            commands,
            state,
            batches,
            task,
        }
    }

    pub async fn send(&self, command: SessionCommand) -> anyhow::Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| anyhow::anyhow!("telemetry session has stopped"))
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    pub fn batches(&self) -> watch::Receiver<Arc<VesselBatch>> {
        self.batches.clone()
    }
}

impl Drop for TelemetrySession {
    fn drop(&mut self) {
        self.task.abort();
    }
}
