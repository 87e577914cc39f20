//! Chat transport port.
//!
//! The orchestrator talks to the network only through [`ChatTransport`]. A
//! connected session is a pair of channels: protocol events flow in on
//! `events`, commands flow out through the cloneable [`Outbound`] handle.
//! The IRC implementation lives in bridge-infra.

use std::future::Future;

use tokio::sync::mpsc;

use bridge_types::error::TransportError;
use bridge_types::identity::ServerEndpoint;

/// Protocol events surfaced to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Registration completed; the bot may now join its channel.
    Welcome,
    PublicMessage {
        sender: String,
        channel: String,
        text: String,
    },
    PrivateMessage {
        sender: String,
        text: String,
    },
    /// The requested nickname is taken.
    NicknameInUse,
    /// The connection ended; no further events follow.
    Disconnected { reason: String },
}

/// Commands the transport writes to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundCommand {
    Join { channel: String },
    Say { target: String, text: String },
    ChangeNick { nickname: String },
    Quit { reason: String },
}

/// Cloneable sending half of a session.
///
/// Each call enqueues one complete command, so concurrent senders never
/// interleave partial lines.
#[derive(Debug, Clone)]
pub struct Outbound {
    tx: mpsc::Sender<OutboundCommand>,
}

impl Outbound {
    pub fn new(tx: mpsc::Sender<OutboundCommand>) -> Self {
        Self { tx }
    }

    pub async fn send(&self, command: OutboundCommand) -> Result<(), TransportError> {
        self.tx.send(command).await.map_err(|_| TransportError::Closed)
    }

    pub async fn join(&self, channel: &str) -> Result<(), TransportError> {
        self.send(OutboundCommand::Join {
            channel: channel.to_string(),
        })
        .await
    }

    pub async fn say(&self, target: &str, text: &str) -> Result<(), TransportError> {
        self.send(OutboundCommand::Say {
            target: target.to_string(),
            text: text.to_string(),
        })
        .await
    }

    pub async fn change_nick(&self, nickname: &str) -> Result<(), TransportError> {
        self.send(OutboundCommand::ChangeNick {
            nickname: nickname.to_string(),
        })
        .await
    }

    pub async fn quit(&self, reason: &str) -> Result<(), TransportError> {
        self.send(OutboundCommand::Quit {
            reason: reason.to_string(),
        })
        .await
    }

    /// Whether the transport side has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// A live connection as seen by the orchestrator.
#[derive(Debug)]
pub struct ChatSession {
    pub outbound: Outbound,
    pub events: mpsc::Receiver<TransportEvent>,
}

/// The transport's ends of a session's channels.
#[derive(Debug)]
pub struct TransportSide {
    pub events: mpsc::Sender<TransportEvent>,
    pub commands: mpsc::Receiver<OutboundCommand>,
}

impl ChatSession {
    /// Create a session and the matching transport-side handles.
    pub fn channel(capacity: usize) -> (Self, TransportSide) {
        let (event_tx, event_rx) = mpsc::channel(capacity);
        let (command_tx, command_rx) = mpsc::channel(capacity);
        (
            Self {
                outbound: Outbound::new(command_tx),
                events: event_rx,
            },
            TransportSide {
                events: event_tx,
                commands: command_rx,
            },
        )
    }
}

/// Opens connections to a chat server.
pub trait ChatTransport: Send + Sync {
    /// Connect and register under `nickname`.
    ///
    /// Returns once the connection is open; registration completes
    /// asynchronously and is reported by [`TransportEvent::Welcome`].
    fn connect(
        &self,
        endpoint: &ServerEndpoint,
        nickname: &str,
    ) -> impl Future<Output = Result<ChatSession, TransportError>> + Send;
}
