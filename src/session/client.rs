//! Low-level session websocket client and outbound command sender.
//!
//! The client spawns a background worker that owns the websocket and keeps
//! redialing the console service for as long as the connection handle is
//! alive. Inbound frames that fail to decode are dropped, not surfaced.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use crate::reconnect::ReconnectPolicy;
use crate::session::proto::{CommandFrame, EventFrame};

/// Local development websocket endpoint for the console service.
pub const LOCAL_SESSION_ENDPOINT: &str = "ws://localhost:8080/ws";

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Entry point for creating session connections.
#[derive(Clone, Debug)]
pub struct SessionClient {
    endpoint_override: Option<String>,
    reconnect: ReconnectPolicy,
}

impl SessionClient {
    /// Creates a client targeting the local development endpoint.
    pub fn new() -> Self {
        Self {
            endpoint_override: None,
            reconnect: ReconnectPolicy::default(),
        }
    }

    /// Sets an explicit session endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        self.endpoint_override = Some(endpoint.trim_end().to_string());
        self
    }

    /// Overrides redial pacing.
    pub fn with_reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    /// Opens a session connection.
    ///
    /// This spawns a background worker that owns the websocket and returns
    /// immediately with a handle pair; the connection reports `Connecting`
    /// until the dial completes and keeps redialing after every loss. The
    /// worker owns its channel exclusively, and dropping the returned handle
    /// closes it. Must be called within a Tokio runtime.
    pub fn connect(&self) -> SessionConnection {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);

        let url = self.endpoint().to_string();
        let policy = self.reconnect.clone();
        tokio::spawn(async move {
            session_worker(url, policy, outbound_rx, inbound_tx, state_tx).await;
        });

        SessionConnection {
            sender: CommandSender { tx: outbound_tx },
            receiver: inbound_rx,
            state: state_rx,
        }
    }

    fn endpoint(&self) -> &str {
        self.endpoint_override
            .as_deref()
            .unwrap_or(LOCAL_SESSION_ENDPOINT)
    }
}

impl Default for SessionClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle of the realtime channel.
///
/// `Closed` is transient while the connection handle is alive: the worker
/// publishes it at the moment of loss and immediately re-enters
/// `Connecting`. It becomes final only once the handle is dropped.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

impl ConnectionState {
    /// True when the realtime channel can carry outbound commands.
    pub fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }
}

/// Active session connection handles.
///
/// Internally, frames are produced by the background websocket worker.
#[derive(Debug)]
pub struct SessionConnection {
    sender: CommandSender,
    receiver: mpsc::UnboundedReceiver<EventFrame>,
    state: watch::Receiver<ConnectionState>,
}

impl SessionConnection {
    /// Returns a cloneable sender for outbound commands.
    pub fn sender(&self) -> CommandSender {
        self.sender.clone()
    }

    /// Current lifecycle state of the channel.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Returns a watch receiver observing lifecycle changes.
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Receives the next inbound event frame from the worker.
    pub async fn recv(&mut self) -> Option<EventFrame> {
        self.receiver.recv().await
    }
}

/// Cloneable sender for outbound command frames.
#[derive(Clone, Debug)]
pub struct CommandSender {
    tx: mpsc::UnboundedSender<CommandFrame>,
}

impl CommandSender {
    /// Queues a command frame for the session worker.
    pub fn send(&self, frame: CommandFrame) -> Result<(), SessionError> {
        self.tx
            .send(frame)
            .map_err(|_| SessionError::SendQueueClosed)
    }
}

/// Errors produced by session transport handles.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Outbound command queue has been closed.
    #[error("send queue is closed")]
    SendQueueClosed,
}

enum ChannelOutcome {
    GracefulShutdown,
    Reconnect,
}

async fn session_worker(
    url: String,
    policy: ReconnectPolicy,
    mut outbound_rx: mpsc::UnboundedReceiver<CommandFrame>,
    inbound_tx: mpsc::UnboundedSender<EventFrame>,
    state_tx: watch::Sender<ConnectionState>,
) {
    let mut attempt: usize = 0;

    loop {
        attempt += 1;
        let _ = state_tx.send(ConnectionState::Connecting);

        let outcome = match connect_async(url.as_str()).await {
            Ok((socket, _)) => {
                let _ = state_tx.send(ConnectionState::Open);
                debug!(event = "session_channel_open", attempt);
                run_open_channel(socket, &mut outbound_rx, &inbound_tx).await
            }
            Err(err) => {
                debug!(event = "session_connect_failed", attempt, error = %err);
                ChannelOutcome::Reconnect
            }
        };

        match outcome {
            ChannelOutcome::GracefulShutdown => break,
            ChannelOutcome::Reconnect => {
                let _ = state_tx.send(ConnectionState::Closed);
                let _ = state_tx.send(ConnectionState::Connecting);
                let delay = policy.delay_for_attempt(attempt);
                if !discard_commands_during_delay(delay, &mut outbound_rx).await {
                    break;
                }
            }
        }
    }

    let _ = state_tx.send(ConnectionState::Closed);
}

async fn run_open_channel(
    mut socket: Socket,
    outbound_rx: &mut mpsc::UnboundedReceiver<CommandFrame>,
    inbound_tx: &mpsc::UnboundedSender<EventFrame>,
) -> ChannelOutcome {
    loop {
        tokio::select! {
            maybe_outbound = outbound_rx.recv() => {
                match maybe_outbound {
                    Some(frame) => {
                        let text = match frame.to_text() {
                            Ok(text) => text,
                            Err(err) => {
                                warn!(event = "command_encode_failed", error = %err);
                                continue;
                            }
                        };
                        // A failed write drops the frame; commands are not
                        // retained once handed to the transport.
                        if socket.send(Message::Text(text)).await.is_err() {
                            return ChannelOutcome::Reconnect;
                        }
                    }
                    None => {
                        let _ = socket.close(None).await;
                        return ChannelOutcome::GracefulShutdown;
                    }
                }
            }
            maybe_inbound = socket.next() => {
                match maybe_inbound {
                    Some(Ok(Message::Text(text))) => match EventFrame::from_text(&text) {
                        Ok(frame) => {
                            let _ = inbound_tx.send(frame);
                        }
                        Err(err) => {
                            // Garbled frames are dropped; the channel stays up.
                            debug!(event = "event_decode_failed", error = %err);
                        }
                    },
                    Some(Ok(Message::Ping(payload))) => {
                        if socket.send(Message::Pong(payload)).await.is_err() {
                            return ChannelOutcome::Reconnect;
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {}
                    Some(Ok(Message::Close(_))) => return ChannelOutcome::Reconnect,
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        debug!(event = "session_channel_error", error = %err);
                        return ChannelOutcome::Reconnect;
                    }
                    None => return ChannelOutcome::Reconnect,
                }
            }
        }
    }
}

async fn discard_commands_during_delay(
    delay: Duration,
    outbound_rx: &mut mpsc::UnboundedReceiver<CommandFrame>,
) -> bool {
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            _ = &mut sleep => return true,
            maybe_frame = outbound_rx.recv() => {
                match maybe_frame {
                    Some(_) => {
                        debug!(event = "command_dropped_while_disconnected");
                    }
                    None => return false,
                }
            }
        }
    }
}
