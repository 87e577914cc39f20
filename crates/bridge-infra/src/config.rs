//! Configuration loader for the consciousness bridge.
//!
//! Reads an optional TOML file into [`BotConfig`], falling back to defaults
//! when the file is missing or malformed. Secrets never come from the file;
//! they are overlaid from the environment by [`apply_env_secrets`].

use std::path::Path;

use secrecy::SecretString;

use bridge_types::config::BotConfig;
use bridge_types::error::ConfigError;

pub const IRC_PASSWORD_ENV: &str = "IRC_PASSWORD";
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const TOGETHER_API_KEY_ENV: &str = "TOGETHER_API_KEY";

/// Load configuration from `path`, or defaults when no path is given.
///
/// - If the file does not exist, returns [`BotConfig::default()`].
/// - If the file exists but fails to read or parse, logs a warning and
///   returns the default.
pub async fn load_bot_config(path: Option<&Path>) -> BotConfig {
    let Some(path) = path else {
        return BotConfig::default();
    };

    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return BotConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            return BotConfig::default();
        }
    };

    match toml::from_str::<BotConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", path.display());
            BotConfig::default()
        }
    }
}

/// Overlay credentials from the process environment.
pub fn apply_env_secrets(config: &mut BotConfig) {
    apply_secrets_from(config, |key| std::env::var(key).ok());
}

/// Overlay credentials from `lookup`. Empty values count as unset.
pub fn apply_secrets_from(config: &mut BotConfig, lookup: impl Fn(&str) -> Option<String>) {
    let secret = |key: &str| {
        lookup(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(SecretString::from)
    };

    if let Some(password) = secret(IRC_PASSWORD_ENV) {
        config.password = Some(password);
    }
    if let Some(key) = secret(OPENAI_API_KEY_ENV) {
        config.openai_api_key = Some(key);
    }
    if let Some(key) = secret(TOGETHER_API_KEY_ENV) {
        config.together_api_key = Some(key);
    }
}

/// Normalise and check the final configuration.
///
/// A channel given without a `#` or `&` prefix gets `#` prepended.
pub fn finalize(config: &mut BotConfig) -> Result<(), ConfigError> {
    config.channel = config.channel.trim().to_string();
    if !config.channel.is_empty() && !config.channel.starts_with(['#', '&']) {
        config.channel.insert(0, '#');
    }

    if config.server.trim().is_empty() {
        return Err(ConfigError::Invalid {
            field: "server",
            message: "must not be empty".to_string(),
        });
    }
    if config.port == 0 {
        return Err(ConfigError::Invalid {
            field: "port",
            message: "must be between 1 and 65535".to_string(),
        });
    }
    if config.channel.len() < 2 || config.channel.contains([' ', ',']) {
        return Err(ConfigError::Invalid {
            field: "channel",
            message: format!("'{}' is not a valid channel name", config.channel),
        });
    }
    if config.nickname.is_empty() || config.nickname.contains(char::is_whitespace) {
        return Err(ConfigError::Invalid {
            field: "nickname",
            message: format!("'{}' is not a valid nickname", config.nickname),
        });
    }
    if config.memory_capacity == 0 {
        return Err(ConfigError::Invalid {
            field: "memory_capacity",
            message: "must be at least 1".to_string(),
        });
    }
    if config.heartbeat_interval_secs == 0 {
        return Err(ConfigError::Invalid {
            field: "heartbeat_interval_secs",
            message: "must be at least 1".to_string(),
        });
    }
    Ok(())
}
