//! Observability setup: structured logging with optional OpenTelemetry export.

pub mod genai_attrs;
pub mod tracing_setup;
