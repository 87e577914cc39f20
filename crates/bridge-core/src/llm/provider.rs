//! LlmProvider trait definition.
//!
//! This is the core abstraction that all generation backends implement.
//! Uses native async fn in traits (RPITIT) for `complete`.

use bridge_types::llm::{CompletionRequest, CompletionResponse, LlmError};

/// Trait for generation backends (Ollama, OpenAI-compatible APIs).
///
/// Implementations live in bridge-infra (e.g., `OllamaProvider`) and are
/// expected to enforce their own network timeouts so a call never hangs.
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "ollama", "together").
    fn name(&self) -> &str;

    /// Model the provider uses when the request leaves `model` empty.
    fn model(&self) -> &str;

    /// Send a chat-completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
