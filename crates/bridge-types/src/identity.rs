//! Bot identity on the chat network.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Host and port of the chat server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEndpoint {
    pub host: String,
    pub port: u16,
}

impl ServerEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for ServerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Who the bot is and where it lives.
///
/// The nickname only changes when the server reports a collision; the
/// `label` keeps the configured nickname so private replies stay signed
/// consistently after a rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    /// Current nickname on the server.
    pub nickname: String,
    /// Nickname as configured at startup.
    pub label: String,
    /// The single channel the bot joins.
    pub channel: String,
    pub server: ServerEndpoint,
}

impl BotIdentity {
    pub fn new(nickname: impl Into<String>, channel: impl Into<String>, server: ServerEndpoint) -> Self {
        let nickname = nickname.into();
        Self {
            label: nickname.clone(),
            nickname,
            channel: channel.into(),
            server,
        }
    }

    /// Adopt a new nickname after a collision.
    pub fn rename(&mut self, nickname: impl Into<String>) {
        self.nickname = nickname.into();
    }

    /// Whether `sender` is the bot itself (exact nickname match).
    pub fn is_self(&self, sender: &str) -> bool {
        sender == self.nickname
    }

    /// Whether `text` mentions the bot's current nickname, ignoring case.
    pub fn is_mentioned_in(&self, text: &str) -> bool {
        text.to_lowercase().contains(&self.nickname.to_lowercase())
    }
}
