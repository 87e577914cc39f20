//! Multi-provider fallback chain.
//!
//! Routes a generation request through the configured providers in priority
//! order (local before cloud). The first success wins; any failure moves on
//! to the next provider. Each provider is called at most once per request and
//! never retried. When every provider fails, or none is configured, the
//! caller gets [`LlmError::NoProviderAvailable`].

use std::time::Instant;

use tracing::Instrument;

use bridge_observe::genai_attrs::{
    GEN_AI_OPERATION_NAME, GEN_AI_PROVIDER_NAME, GEN_AI_REQUEST_MAX_TOKENS, GEN_AI_REQUEST_MODEL,
    GEN_AI_REQUEST_TEMPERATURE, GEN_AI_USAGE_INPUT_TOKENS, GEN_AI_USAGE_OUTPUT_TOKENS, OP_CHAT,
};
use bridge_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, Message, ProviderKind, ProviderStatusInfo,
};

use super::box_provider::BoxLlmProvider;
use super::health::ProviderStats;

/// Output token cap for a chat reply.
pub const REPLY_MAX_TOKENS: u32 = 150;

/// Sampling temperature for chat replies.
pub const REPLY_TEMPERATURE: f64 = 0.8;

/// A provider together with its position in the chain.
#[derive(Debug)]
pub struct ProviderSlot {
    name: String,
    kind: ProviderKind,
    priority: u32,
    provider: BoxLlmProvider,
    stats: ProviderStats,
}

impl ProviderSlot {
    /// Lower `priority` is tried first.
    pub fn new(kind: ProviderKind, priority: u32, provider: BoxLlmProvider) -> Self {
        Self {
            name: provider.name().to_string(),
            kind,
            priority,
            provider,
            stats: ProviderStats::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    pub fn stats(&self) -> &ProviderStats {
        &self.stats
    }
}

/// Result of a successful completion through the fallback chain.
#[derive(Debug)]
pub struct FallbackResult {
    /// The completion response from the provider.
    pub response: CompletionResponse,
    /// Name of the provider that handled the request.
    pub provider_name: String,
    /// Set when a lower-priority provider had to answer.
    pub failover_warning: Option<String>,
}

/// Ordered, immutable list of generation providers.
#[derive(Debug, Default)]
pub struct FallbackChain {
    slots: Vec<ProviderSlot>,
}

impl FallbackChain {
    /// Build a chain; slots are ordered by ascending priority (stable).
    pub fn new(mut slots: Vec<ProviderSlot>) -> Self {
        slots.sort_by_key(|slot| slot.priority);
        Self { slots }
    }

    /// A chain with no providers; every request is exhausted immediately.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[ProviderSlot] {
        &self.slots
    }

    /// Name of the highest-priority provider, if any.
    pub fn primary_name(&self) -> Option<&str> {
        self.slots.first().map(|slot| slot.name.as_str())
    }

    /// Call statistics for every provider, in chain order.
    pub fn health_status(&self) -> Vec<ProviderStatusInfo> {
        self.slots
            .iter()
            .map(|slot| slot.stats.to_status_info(&slot.name, slot.kind, slot.priority))
            .collect()
    }

    /// Build the chat request for one reply.
    ///
    /// The model is left empty so every provider uses its own.
    pub fn reply_request(system_prompt: &str, user_text: &str) -> CompletionRequest {
        CompletionRequest {
            model: String::new(),
            messages: vec![Message::user(user_text)],
            system: Some(system_prompt.to_string()),
            max_tokens: REPLY_MAX_TOKENS,
            temperature: Some(REPLY_TEMPERATURE),
        }
    }

    /// Generate a reply for `user_text` under `system_prompt`.
    pub async fn generate(
        &self,
        system_prompt: &str,
        user_text: &str,
    ) -> Result<FallbackResult, LlmError> {
        let request = Self::reply_request(system_prompt, user_text);
        self.complete(&request).await
    }

    /// Send a completion request through the chain.
    ///
    /// An empty or whitespace-only completion counts as a failure.
    pub async fn complete(&self, request: &CompletionRequest) -> Result<FallbackResult, LlmError> {
        if self.slots.is_empty() {
            tracing::debug!("No providers configured");
            return Err(LlmError::NoProviderAvailable);
        }

        let mut failed: Vec<&str> = Vec::new();

        for slot in &self.slots {
            let span = tracing::info_span!(
                "chat",
                { GEN_AI_OPERATION_NAME } = OP_CHAT,
                { GEN_AI_PROVIDER_NAME } = slot.name.as_str(),
                { GEN_AI_REQUEST_MODEL } = slot.model(),
                { GEN_AI_REQUEST_MAX_TOKENS } = request.max_tokens,
                { GEN_AI_REQUEST_TEMPERATURE } = request.temperature,
                { GEN_AI_USAGE_INPUT_TOKENS } = tracing::field::Empty,
                { GEN_AI_USAGE_OUTPUT_TOKENS } = tracing::field::Empty,
            );

            let start = Instant::now();
            let outcome = slot
                .provider
                .complete(request)
                .instrument(span.clone())
                .await
                .and_then(|response| {
                    if response.content.trim().is_empty() {
                        Err(LlmError::EmptyCompletion)
                    } else {
                        Ok(response)
                    }
                });
            let latency = start.elapsed();

            match outcome {
                Ok(response) => {
                    slot.stats.record_success(latency);
                    span.record(GEN_AI_USAGE_INPUT_TOKENS, response.usage.input_tokens);
                    span.record(GEN_AI_USAGE_OUTPUT_TOKENS, response.usage.output_tokens);

                    let failover_warning = if failed.is_empty() {
                        None
                    } else {
                        Some(format!(
                            "Switched to {} after {} failed",
                            slot.name,
                            failed.join(", ")
                        ))
                    };
                    if let Some(ref warning) = failover_warning {
                        tracing::warn!(%warning, "Failover occurred");
                    }

                    tracing::debug!(
                        provider = %slot.name,
                        latency_ms = latency.as_millis() as u64,
                        output_tokens = response.usage.output_tokens,
                        "Provider answered"
                    );

                    return Ok(FallbackResult {
                        response,
                        provider_name: slot.name.clone(),
                        failover_warning,
                    });
                }
                Err(err) => {
                    tracing::warn!(
                        provider = %slot.name,
                        kind = %slot.kind,
                        error = %err,
                        "Provider failed, trying next in chain"
                    );
                    slot.stats.record_failure(&err, latency);
                    failed.push(&slot.name);
                }
            }
        }

        tracing::warn!(tried = failed.len(), "All providers in fallback chain failed");
        Err(LlmError::NoProviderAvailable)
    }
}
