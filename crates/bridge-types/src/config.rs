//! Bot configuration.
//!
//! `BotConfig` is the single owned settings object for the process. It can be
//! deserialized from a TOML file (every field has a default) and is then
//! overlaid with environment variables and CLI flags by the binary.
//!
//! Credentials are never read from the file: they are skipped by serde and
//! only populated from the environment.

use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;

use crate::identity::{BotIdentity, ServerEndpoint};
use crate::llm::CloudBackend;

/// Top-level configuration for the bot.
#[derive(Debug, Deserialize)]
pub struct BotConfig {
    /// Chat server host name.
    #[serde(default = "default_server")]
    pub server: String,

    /// Chat server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Channel to join (including the `#` prefix).
    #[serde(default = "default_channel")]
    pub channel: String,

    /// Nickname to register with.
    #[serde(default = "default_nickname")]
    pub nickname: String,

    /// Real name sent during registration.
    #[serde(default = "default_realname")]
    pub realname: String,

    /// Model requested from the local model server.
    #[serde(default = "default_local_model")]
    pub local_model: String,

    /// Explicit local model server URL, probed before the built-in candidates.
    #[serde(default)]
    pub ollama_url: Option<String>,

    /// Override for the cloud model; defaults depend on the active backend.
    #[serde(default)]
    pub cloud_model: Option<String>,

    /// Number of recent channel messages kept in memory.
    #[serde(default = "default_memory_capacity")]
    pub memory_capacity: usize,

    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,

    #[serde(default = "default_reconnect_backoff_secs")]
    pub reconnect_backoff_secs: u64,

    #[serde(default = "default_intro_delay_secs")]
    pub intro_delay_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Server password (`PASS`), environment only.
    #[serde(skip)]
    pub password: Option<SecretString>,

    /// Primary cloud key (OpenAI), environment only.
    #[serde(skip)]
    pub openai_api_key: Option<SecretString>,

    /// Secondary cloud key (Together.ai); overrides the OpenAI key when set.
    #[serde(skip)]
    pub together_api_key: Option<SecretString>,
}

fn default_server() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    6667
}

fn default_channel() -> String {
    "#consciousness".to_string()
}

fn default_nickname() -> String {
    "ConsciousnessBridge".to_string()
}

fn default_realname() -> String {
    "Consciousness Bridge".to_string()
}

fn default_local_model() -> String {
    "mistral:latest".to_string()
}

fn default_memory_capacity() -> usize {
    10
}

fn default_heartbeat_interval_secs() -> u64 {
    300
}

fn default_reconnect_backoff_secs() -> u64 {
    30
}

fn default_intro_delay_secs() -> u64 {
    3
}

fn default_connect_timeout_secs() -> u64 {
    30
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            port: default_port(),
            channel: default_channel(),
            nickname: default_nickname(),
            realname: default_realname(),
            local_model: default_local_model(),
            ollama_url: None,
            cloud_model: None,
            memory_capacity: default_memory_capacity(),
            heartbeat_interval_secs: default_heartbeat_interval_secs(),
            reconnect_backoff_secs: default_reconnect_backoff_secs(),
            intro_delay_secs: default_intro_delay_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            password: None,
            openai_api_key: None,
            together_api_key: None,
        }
    }
}

impl BotConfig {
    pub fn endpoint(&self) -> ServerEndpoint {
        ServerEndpoint::new(self.server.clone(), self.port)
    }

    pub fn identity(&self) -> BotIdentity {
        BotIdentity::new(self.nickname.clone(), self.channel.clone(), self.endpoint())
    }

    /// The active cloud backend and its key.
    ///
    /// The Together.ai key takes precedence over the OpenAI key.
    pub fn cloud_credentials(&self) -> Option<(CloudBackend, &SecretString)> {
        if let Some(key) = &self.together_api_key {
            return Some((CloudBackend::Together, key));
        }
        self.openai_api_key
            .as_ref()
            .map(|key| (CloudBackend::OpenAi, key))
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn reconnect_backoff(&self) -> Duration {
        Duration::from_secs(self.reconnect_backoff_secs)
    }

    pub fn intro_delay(&self) -> Duration {
        Duration::from_secs(self.intro_delay_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}
