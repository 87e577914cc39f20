//! Generation provider implementations.
//!
//! Contains the concrete [`LlmProvider`](bridge_core::llm::provider::LlmProvider)
//! implementations (Ollama for local models, an OpenAI-compatible client for
//! the cloud) and the factory that assembles them into a fallback chain.

pub mod ollama;
pub mod openai_compat;

#[cfg(test)]
pub(crate) mod testing;

use secrecy::{ExposeSecret, SecretString};

use bridge_core::llm::box_provider::BoxLlmProvider;
use bridge_core::llm::fallback::{FallbackChain, ProviderSlot};
use bridge_core::llm::provider::LlmProvider;
use bridge_types::config::BotConfig;
use bridge_types::llm::ProviderKind;

use self::openai_compat::OpenAiCompatibleProvider;

/// Priority of the local tier; lower is tried first.
pub const LOCAL_PRIORITY: u32 = 0;
/// Priority of the cloud tier.
pub const CLOUD_PRIORITY: u32 = 1;

/// The configured cloud provider, if any key is present.
///
/// The Together.ai key takes precedence over the OpenAI key.
pub fn cloud_provider(config: &BotConfig) -> Option<OpenAiCompatibleProvider> {
    let (backend, key) = config.cloud_credentials()?;
    let key = SecretString::from(key.expose_secret().to_string());
    Some(OpenAiCompatibleProvider::for_backend(
        backend,
        key,
        config.cloud_model.as_deref(),
    ))
}

/// Probe for a local server and assemble the provider chain.
///
/// Missing tiers are logged and skipped; the result may be empty, in which
/// case every reply comes from the canned table.
pub async fn build_fallback_chain(config: &BotConfig) -> FallbackChain {
    let mut slots = Vec::new();

    let candidates = ollama::candidate_urls(config.ollama_url.as_deref());
    match ollama::discover(&candidates, &config.local_model).await {
        Some(provider) => {
            tracing::info!(
                url = %provider.base_url(),
                model = %provider.model(),
                "Local generation available"
            );
            slots.push(ProviderSlot::new(
                ProviderKind::Local,
                LOCAL_PRIORITY,
                BoxLlmProvider::new(provider),
            ));
        }
        None => tracing::warn!(
            tried = candidates.len(),
            "No Ollama endpoint reachable, continuing without local generation"
        ),
    }

    match cloud_provider(config) {
        Some(provider) => {
            let provider = BoxLlmProvider::new(provider);
            tracing::info!(
                provider = %provider.name(),
                model = %provider.model(),
                "Cloud generation available"
            );
            slots.push(ProviderSlot::new(ProviderKind::Cloud, CLOUD_PRIORITY, provider));
        }
        None => tracing::warn!("No cloud API key configured, continuing without cloud generation"),
    }

    if slots.is_empty() {
        tracing::warn!("No generation providers available, replies will use canned responses");
    }

    FallbackChain::new(slots)
}
