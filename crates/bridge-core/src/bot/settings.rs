//! Timing and policy knobs for the orchestrator.

use std::fmt;
use std::time::Duration;

use bridge_types::config::BotConfig;

use crate::decision::ResponsePolicy;
use crate::random::RandomSource;

/// How long the bot "deliberates" before posting a channel reply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplyDelay {
    pub base: Duration,
    /// Extra seconds drawn uniformly from `[jitter_min, jitter_max)`.
    pub jitter_min: f64,
    pub jitter_max: f64,
}

impl ReplyDelay {
    pub fn draw<R>(&self, rng: &mut R) -> Duration
    where
        R: RandomSource + ?Sized,
    {
        self.base + Duration::from_secs_f64(rng.between(self.jitter_min, self.jitter_max))
    }
}

impl Default for ReplyDelay {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(1),
            jitter_min: 0.5,
            jitter_max: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BotSettings {
    pub memory_capacity: usize,
    pub heartbeat_interval: Duration,
    pub reconnect_backoff: Duration,
    pub intro_delay: Duration,
    pub reply_delay: ReplyDelay,
    pub policy: ResponsePolicy,
    /// How long to wait for the server to close after QUIT.
    pub quit_drain_timeout: Duration,
}

impl BotSettings {
    pub fn from_config(config: &BotConfig) -> Self {
        Self {
            memory_capacity: config.memory_capacity,
            heartbeat_interval: config.heartbeat_interval(),
            reconnect_backoff: config.reconnect_backoff(),
            intro_delay: config.intro_delay(),
            reply_delay: ReplyDelay::default(),
            policy: ResponsePolicy::default(),
            quit_drain_timeout: Duration::from_secs(2),
        }
    }
}

impl Default for BotSettings {
    fn default() -> Self {
        Self::from_config(&BotConfig::default())
    }
}

/// Lifecycle of the chat connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Terminating,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Terminating => "terminating",
        };
        f.write_str(s)
    }
}

/// Replacement nickname after a collision: `<current>_<10..=99>`.
pub fn collision_nickname<R>(current: &str, rng: &mut R) -> String
where
    R: RandomSource + ?Sized,
{
    format!("{current}_{}", rng.int_inclusive(10, 99))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{SequenceRandom, ThreadRandom};

    #[test]
    fn defaults_follow_config_defaults() {
        let settings = BotSettings::default();
        assert_eq!(settings.memory_capacity, 10);
        assert_eq!(settings.heartbeat_interval, Duration::from_secs(300));
        assert_eq!(settings.reconnect_backoff, Duration::from_secs(30));
        assert_eq!(settings.intro_delay, Duration::from_secs(3));
    }

    #[test]
    fn reply_delay_stays_in_range() {
        let delay = ReplyDelay::default();
        let mut rng = ThreadRandom::seeded(7);
        for _ in 0..200 {
            let d = delay.draw(&mut rng);
            assert!(d >= Duration::from_millis(1500));
            assert!(d < Duration::from_secs(3));
        }
    }

    #[test]
    fn collision_nickname_has_two_digit_suffix() {
        let mut rng = ThreadRandom::seeded(42);
        for _ in 0..100 {
            let nick = collision_nickname("ConsciousnessBridge", &mut rng);
            let suffix = nick.strip_prefix("ConsciousnessBridge_").unwrap();
            assert_eq!(suffix.len(), 2);
            let n: u32 = suffix.parse().unwrap();
            assert!((10..=99).contains(&n));
        }
    }

    #[test]
    fn collision_nickname_bounds() {
        assert_eq!(collision_nickname("bot", &mut SequenceRandom::constant(0.0)), "bot_10");
        assert_eq!(collision_nickname("bot", &mut SequenceRandom::constant(0.999)), "bot_99");
    }

    #[test]
    fn state_display() {
        assert_eq!(ConnectionState::Connected.to_string(), "connected");
        assert_eq!(ConnectionState::Terminating.to_string(), "terminating");
    }
}
