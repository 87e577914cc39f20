//! Business logic and port definitions for the consciousness bridge bot.
//!
//! This crate decides when to speak, what to say, and how to keep a chat
//! connection alive. It defines the "ports" that the infrastructure layer
//! implements (`LlmProvider`, `ChatTransport`) and depends only on
//! `bridge-types` -- never on `bridge-infra` or any network crate.

pub mod bot;
pub mod canned;
pub mod decision;
pub mod format;
pub mod heartbeat;
pub mod llm;
pub mod memory;
pub mod persona;
pub mod random;
pub mod responder;
pub mod transport;
