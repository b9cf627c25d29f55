//! Push channel manager: one live leaderboard stream with fixed-interval reconnect.
//!
//! A single actor task owns the connection handle and the reconnect timer.
//! Commands from the dashboard and signals from the connection and timer
//! tasks are handled one at a time, so no two handlers ever interleave.

use crate::api_client::ApiClientError;
use crate::config::ReconnectConfig;
use crate::events::TuiEvent;
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use podium_cache::QueryCacheBridge;
use podium_core::LeaderboardSnapshot;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Advisory text delivered to [`ChannelListener::on_error`] on every failure episode.
pub const CONNECTION_LOST: &str = "Connection lost. Reconnecting...";

/// Data of every message event on an open connection, in server order.
pub type MessageStream = BoxStream<'static, Result<String, ApiClientError>>;

/// Wire strategy behind the manager.
#[async_trait]
pub trait PushTransport: Send + Sync + 'static {
    /// Open one connection. Resolves once the server accepted it.
    async fn open(&self) -> Result<MessageStream, ApiClientError>;

    fn endpoint(&self) -> &str {
        "push transport"
    }
}

/// Receives connection lifecycle callbacks. Never called concurrently.
pub trait ChannelListener: Send + Sync + 'static {
    fn on_connection_change(&self, connected: bool);
    fn on_error(&self, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Never connected, or torn down.
    Closed,
    Connecting,
    Open,
    /// A reconnect attempt is scheduled.
    Reconnecting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub delay_ms: u64,
    pub jitter_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            delay_ms: 3000,
            jitter_ms: 0,
        }
    }
}

impl From<&ReconnectConfig> for ReconnectPolicy {
    fn from(config: &ReconnectConfig) -> Self {
        Self {
            delay_ms: config.delay_ms,
            jitter_ms: config.jitter_ms,
        }
    }
}

impl ReconnectPolicy {
    pub fn next_delay(&self) -> Duration {
        Duration::from_millis(jittered_backoff(self.delay_ms, self.jitter_ms))
    }
}

enum Command {
    Connect,
    Teardown(oneshot::Sender<()>),
}

enum Signal {
    Opened { generation: u64 },
    Frame { generation: u64, payload: String },
    Failed { generation: u64, reason: String },
    ReconnectDue { timer: u64 },
}

/// Handle to the actor. Dropping it tears the channel down.
pub struct PushChannelManager {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<ConnectionState>,
}

impl PushChannelManager {
    /// Spawn the actor on the current runtime. Nothing connects until [`connect`](Self::connect).
    pub fn spawn(
        transport: Arc<dyn PushTransport>,
        bridge: QueryCacheBridge,
        listener: Arc<dyn ChannelListener>,
        policy: ReconnectPolicy,
    ) -> Self {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (signals, signal_rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(ConnectionState::Closed);

        let actor = ChannelActor {
            transport,
            bridge,
            listener,
            policy,
            state: state_tx,
            signals,
            generation: 0,
            connection: None,
            reconnect: None,
            next_timer: 0,
        };
        tokio::spawn(actor.run(command_rx, signal_rx));

        Self { commands, state }
    }

    /// Open the channel unless a connection is already live.
    pub fn connect(&self) {
        let _ = self.commands.send(Command::Connect);
    }

    /// Cancel any pending reconnect and close any live connection.
    ///
    /// Safe before `connect` and safe to repeat.
    pub async fn teardown(&self) {
        let (ack, done) = oneshot::channel();
        if self.commands.send(Command::Teardown(ack)).is_ok() {
            let _ = done.await;
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }
}

struct PendingReconnect {
    timer: u64,
    handle: JoinHandle<()>,
}

struct ChannelActor {
    transport: Arc<dyn PushTransport>,
    bridge: QueryCacheBridge,
    listener: Arc<dyn ChannelListener>,
    policy: ReconnectPolicy,
    state: watch::Sender<ConnectionState>,
    signals: mpsc::UnboundedSender<Signal>,
    generation: u64,
    connection: Option<JoinHandle<()>>,
    reconnect: Option<PendingReconnect>,
    next_timer: u64,
}

impl ChannelActor {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut signals: mpsc::UnboundedReceiver<Signal>,
    ) {
        loop {
            tokio::select! {
                biased;
                command = commands.recv() => match command {
                    Some(Command::Connect) => self.connect(),
                    Some(Command::Teardown(ack)) => {
                        self.teardown();
                        let _ = ack.send(());
                    }
                    None => {
                        self.teardown();
                        break;
                    }
                },
                Some(signal) = signals.recv() => self.handle_signal(signal),
            }
        }
        debug!("Push channel manager stopped");
    }

    fn connect(&mut self) {
        if self.connection.is_some() {
            debug!("Connect ignored: connection already live");
            return;
        }
        // A manual connect supersedes the scheduled attempt.
        self.cancel_reconnect();
        self.open_connection();
    }

    fn open_connection(&mut self) {
        self.generation += 1;
        let generation = self.generation;
        info!(endpoint = self.transport.endpoint(), generation, "Connecting push channel");
        self.set_state(ConnectionState::Connecting);
        let transport = Arc::clone(&self.transport);
        let signals = self.signals.clone();
        self.connection = Some(tokio::spawn(run_connection(transport, generation, signals)));
    }

    fn teardown(&mut self) {
        self.cancel_reconnect();
        if let Some(connection) = self.connection.take() {
            connection.abort();
            info!(generation = self.generation, "Push channel closed");
        }
        // Invalidate signals still queued from the discarded connection.
        self.generation += 1;
        self.set_state(ConnectionState::Closed);
    }

    fn handle_signal(&mut self, signal: Signal) {
        match signal {
            Signal::Opened { generation } if self.is_current(generation) => {
                self.cancel_reconnect();
                self.set_state(ConnectionState::Open);
                info!(generation, "Push channel open");
                self.listener.on_connection_change(true);
            }
            Signal::Frame {
                generation,
                payload,
            } if self.is_current(generation) => self.deliver(&payload),
            Signal::Failed { generation, reason } if self.is_current(generation) => {
                self.fail(&reason)
            }
            Signal::ReconnectDue { timer } => {
                let due = self
                    .reconnect
                    .as_ref()
                    .map(|pending| pending.timer == timer)
                    .unwrap_or(false);
                if due {
                    self.reconnect = None;
                    self.open_connection();
                }
            }
            _ => debug!("Dropping signal from a discarded connection"),
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.connection.is_some() && generation == self.generation
    }

    fn deliver(&mut self, payload: &str) {
        match LeaderboardSnapshot::parse(payload) {
            Ok(snapshot) => {
                let teams = snapshot.len();
                let version = self.bridge.publish(snapshot);
                let invalidated = self.bridge.invalidate_related();
                debug!(teams, version, invalidated, "Pushed leaderboard published");
            }
            Err(err) => {
                warn!(error = %err, bytes = payload.len(), "Dropping malformed leaderboard payload");
            }
        }
    }

    fn fail(&mut self, reason: &str) {
        if let Some(connection) = self.connection.take() {
            connection.abort();
        }
        warn!(generation = self.generation, reason, "Push channel lost");
        self.listener.on_connection_change(false);
        self.listener.on_error(CONNECTION_LOST);
        self.schedule_reconnect();
    }

    fn schedule_reconnect(&mut self) {
        if self.reconnect.is_some() {
            return;
        }
        self.next_timer += 1;
        let timer = self.next_timer;
        let delay = self.policy.next_delay();
        let signals = self.signals.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = signals.send(Signal::ReconnectDue { timer });
        });
        self.reconnect = Some(PendingReconnect { timer, handle });
        self.set_state(ConnectionState::Reconnecting);
        debug!(delay_ms = delay.as_millis() as u64, "Reconnect scheduled");
    }

    fn cancel_reconnect(&mut self) {
        if let Some(pending) = self.reconnect.take() {
            pending.handle.abort();
            debug!(timer = pending.timer, "Pending reconnect cancelled");
        }
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.send_replace(state);
    }
}

async fn run_connection(
    transport: Arc<dyn PushTransport>,
    generation: u64,
    signals: mpsc::UnboundedSender<Signal>,
) {
    let mut stream = match transport.open().await {
        Ok(stream) => stream,
        Err(err) => {
            let _ = signals.send(Signal::Failed {
                generation,
                reason: err.to_string(),
            });
            return;
        }
    };
    if signals.send(Signal::Opened { generation }).is_err() {
        return;
    }

    let reason = loop {
        match stream.next().await {
            Some(Ok(payload)) => {
                if signals.send(Signal::Frame { generation, payload }).is_err() {
                    return;
                }
            }
            Some(Err(err)) => break err.to_string(),
            None => break "stream closed by server".to_string(),
        }
    };
    let _ = signals.send(Signal::Failed { generation, reason });
}

fn jittered_backoff(base_ms: u64, jitter_ms: u64) -> u64 {
    if jitter_ms == 0 {
        return base_ms;
    }
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_nanos(0))
        .subsec_nanos() as u64;
    let jitter = nanos % jitter_ms;
    base_ms.saturating_add(jitter)
}

/// Forwards channel callbacks into the dashboard's event loop.
///
/// Lifecycle events travel on their own unbounded channel so a busy input
/// queue can never swallow a disconnect.
pub struct EventForwarder {
    sender: mpsc::UnboundedSender<TuiEvent>,
}

impl EventForwarder {
    pub fn new(sender: mpsc::UnboundedSender<TuiEvent>) -> Self {
        Self { sender }
    }

    fn forward(&self, event: TuiEvent) {
        if self.sender.send(event).is_err() {
            debug!("Dashboard event loop gone; channel callback discarded");
        }
    }
}

impl ChannelListener for EventForwarder {
    fn on_connection_change(&self, connected: bool) {
        self.forward(TuiEvent::Connection(connected));
    }

    fn on_error(&self, message: &str) {
        self.forward(TuiEvent::ChannelError(message.to_string()));
    }
}
