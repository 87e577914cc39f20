//! Generation provider abstractions.
//!
//! - `LlmProvider`: async trait for concrete provider implementations
//! - `BoxLlmProvider`: object-safe wrapper for dynamic dispatch
//! - `FallbackChain`: ordered providers tried until one answers
//! - `ProviderStats`: per-provider call counters

pub mod box_provider;
pub mod fallback;
pub mod health;
pub mod provider;

#[cfg(test)]
pub(crate) mod testing;
