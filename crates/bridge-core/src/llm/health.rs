//! Call statistics for providers in the fallback chain.
//!
//! Purely observational: a provider with failures is still tried on every
//! request. The counters feed the summary logged at shutdown.

use std::sync::Mutex;
use std::time::Duration;

use bridge_types::llm::{LlmError, ProviderKind, ProviderStatusInfo};

#[derive(Debug, Default)]
struct Counters {
    total_calls: u64,
    total_failures: u64,
    last_error: Option<String>,
    last_latency_ms: Option<u64>,
}

/// Shared, internally synchronised counters for one provider.
#[derive(Debug, Default)]
pub struct ProviderStats {
    counters: Mutex<Counters>,
}

impl ProviderStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_counters<T>(&self, f: impl FnOnce(&mut Counters) -> T) -> T {
        let mut guard = self
            .counters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }

    pub fn record_success(&self, latency: Duration) {
        self.with_counters(|c| {
            c.total_calls += 1;
            c.last_latency_ms = Some(latency.as_millis() as u64);
        });
    }

    pub fn record_failure(&self, error: &LlmError, latency: Duration) {
        self.with_counters(|c| {
            c.total_calls += 1;
            c.total_failures += 1;
            c.last_error = Some(error.to_string());
            c.last_latency_ms = Some(latency.as_millis() as u64);
        });
    }

    pub fn total_calls(&self) -> u64 {
        self.with_counters(|c| c.total_calls)
    }

    pub fn total_failures(&self) -> u64 {
        self.with_counters(|c| c.total_failures)
    }

    pub fn to_status_info(&self, name: &str, kind: ProviderKind, priority: u32) -> ProviderStatusInfo {
        self.with_counters(|c| ProviderStatusInfo {
            name: name.to_string(),
            kind,
            priority,
            total_calls: c.total_calls,
            total_failures: c.total_failures,
            last_error: c.last_error.clone(),
            last_latency_ms: c.last_latency_ms,
        })
    }
}
