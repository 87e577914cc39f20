//! Command-line definition for the `consciousness-bridge` binary.
//!
//! Every connection setting may come from a positional argument, a flag or
//! its environment variable; anything left unset keeps the value from the
//! config file.

use std::path::PathBuf;

use clap::Parser;

use bridge_types::config::BotConfig;

/// Bridge an IRC channel to local and cloud language models.
#[derive(Parser, Debug)]
#[command(name = "consciousness-bridge", version, about, long_about = None)]
pub struct Cli {
    /// IRC server hostname.
    #[arg(env = "IRC_SERVER")]
    pub server: Option<String>,

    /// Channel to join (a leading '#' is added when missing).
    #[arg(env = "IRC_CHANNEL")]
    pub channel: Option<String>,

    /// Nickname to register with.
    #[arg(env = "IRC_NICK")]
    pub nick: Option<String>,

    /// IRC server port.
    #[arg(long, env = "IRC_PORT")]
    pub port: Option<u16>,

    /// Local model requested from Ollama.
    #[arg(long, env = "AI_MODEL")]
    pub model: Option<String>,

    /// Ollama base URL, tried before the built-in candidates.
    #[arg(long, env = "OLLAMA_HOST")]
    pub ollama_url: Option<String>,

    /// Cloud model, overriding the backend default.
    #[arg(long)]
    pub cloud_model: Option<String>,

    /// Path to a TOML config file.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Export spans to stdout through OpenTelemetry.
    #[arg(long)]
    pub otel: bool,

    /// Only log warnings and errors.
    #[arg(long)]
    pub quiet: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Overlay the values given on the command line (or via env) onto `config`.
    pub fn apply(&self, config: &mut BotConfig) {
        if let Some(server) = &self.server {
            config.server = server.clone();
        }
        if let Some(channel) = &self.channel {
            config.channel = channel.clone();
        }
        if let Some(nick) = &self.nick {
            config.nickname = nick.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(model) = &self.model {
            config.local_model = model.clone();
        }
        if let Some(url) = &self.ollama_url {
            config.ollama_url = Some(url.clone());
        }
        if let Some(model) = &self.cloud_model {
            config.cloud_model = Some(model.clone());
        }
    }
}
