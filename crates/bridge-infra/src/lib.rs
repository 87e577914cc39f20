//! Infrastructure layer for the consciousness bridge.
//!
//! Contains implementations of the ports defined in `bridge-core`: the IRC
//! chat transport, the Ollama and OpenAI-compatible generation providers, and
//! the configuration loader.

pub mod config;
pub mod irc;
pub mod llm;
