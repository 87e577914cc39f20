//! Shared domain types for the consciousness bridge bot.
//!
//! This crate contains the types passed between the bot's layers: the bot's
//! identity on the chat network, its configuration, LLM request/response
//! shapes, and the error enums for each boundary.
//!
//! Zero infrastructure dependencies -- only serde, thiserror, secrecy.

pub mod config;
pub mod error;
pub mod identity;
pub mod llm;
