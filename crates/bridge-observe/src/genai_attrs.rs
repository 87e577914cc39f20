//! OpenTelemetry GenAI semantic convention attribute names.
//!
//! Usable as constant field names in `tracing` span macros, e.g.
//! `info_span!("chat", { GEN_AI_OPERATION_NAME } = OP_CHAT)`.

/// The operation being performed (e.g., "chat").
pub const GEN_AI_OPERATION_NAME: &str = "gen_ai.operation.name";

/// The generation provider (e.g., "ollama", "together").
pub const GEN_AI_PROVIDER_NAME: &str = "gen_ai.provider.name";

/// The model requested.
pub const GEN_AI_REQUEST_MODEL: &str = "gen_ai.request.model";

pub const GEN_AI_REQUEST_TEMPERATURE: &str = "gen_ai.request.temperature";

pub const GEN_AI_REQUEST_MAX_TOKENS: &str = "gen_ai.request.max_tokens";

/// Recorded once the provider reports usage.
pub const GEN_AI_USAGE_INPUT_TOKENS: &str = "gen_ai.usage.input_tokens";

pub const GEN_AI_USAGE_OUTPUT_TOKENS: &str = "gen_ai.usage.output_tokens";

/// Chat completion operation.
pub const OP_CHAT: &str = "chat";
