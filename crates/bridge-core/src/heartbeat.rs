//! Periodic liveness pulse.
//!
//! Wakes once per interval. A pulse is only considered when the time since
//! the previous wake exceeds 1.5 intervals, i.e. after the task was starved
//! or the process was suspended; under normal scheduling it stays quiet.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::persona::PRESENCE_PULSES;
use crate::random::{RandomSource, pick};
use crate::transport::Outbound;

/// Elapsed/interval ratio above which a wake counts as missed.
pub const MISSED_TICK_FACTOR: f64 = 1.5;

/// Probability of speaking on a missed tick.
pub const PULSE_PROBABILITY: f64 = 0.1;

/// Result of one wake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pulse {
    Steady,
    Missed { phrase: Option<&'static str> },
}

/// Tick bookkeeping, separate from the task so it can be driven directly.
#[derive(Debug, Clone)]
pub struct HeartbeatState {
    interval: Duration,
    last_tick: Instant,
}

impl HeartbeatState {
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            last_tick: now,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn last_tick(&self) -> Instant {
        self.last_tick
    }

    /// Record a wake at `now`. `last_tick` is always advanced.
    pub fn tick<R>(&mut self, now: Instant, rng: &mut R) -> Pulse
    where
        R: RandomSource + ?Sized,
    {
        let elapsed = now.saturating_duration_since(self.last_tick);
        self.last_tick = now;

        if elapsed.as_secs_f64() <= self.interval.as_secs_f64() * MISSED_TICK_FACTOR {
            return Pulse::Steady;
        }

        let phrase = if rng.chance(PULSE_PROBABILITY) {
            pick(rng, &PRESENCE_PULSES).copied()
        } else {
            None
        };
        Pulse::Missed { phrase }
    }
}

/// The heartbeat task.
///
/// Sees the current connection through a watch channel the orchestrator
/// updates; `None` means disconnected.
pub struct Heartbeat {
    state: HeartbeatState,
    channel: String,
    outbound: watch::Receiver<Option<Outbound>>,
    rng: Box<dyn RandomSource>,
}

impl Heartbeat {
    pub fn new(
        interval: Duration,
        channel: impl Into<String>,
        outbound: watch::Receiver<Option<Outbound>>,
        rng: Box<dyn RandomSource>,
    ) -> Self {
        Self {
            state: HeartbeatState::new(interval, Instant::now()),
            channel: channel.into(),
            outbound,
            rng,
        }
    }

    /// Run until `cancel` fires.
    pub async fn run(mut self, cancel: CancellationToken) {
        tracing::debug!(interval_secs = self.state.interval().as_secs(), "Heartbeat started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.state.interval()) => {}
            }

            let Pulse::Missed { phrase } = self.state.tick(Instant::now(), self.rng.as_mut()) else {
                continue;
            };
            tracing::info!("Consciousness pulse");

            let Some(phrase) = phrase else { continue };
            let outbound = self.outbound.borrow().clone();
            match outbound {
                Some(outbound) => {
                    if let Err(e) = outbound.say(&self.channel, phrase).await {
                        tracing::debug!(error = %e, "Pulse not delivered");
                    }
                }
                None => tracing::debug!("Pulse skipped, not connected"),
            }
        }

        tracing::debug!("Heartbeat stopped");
    }
}
