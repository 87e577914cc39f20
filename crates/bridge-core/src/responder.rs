//! Turns an incoming message into reply text.
//!
//! Generation goes through the fallback chain; when every provider fails the
//! caller-supplied canned line is used instead, so a reply is always produced.

use std::sync::Arc;

use crate::format::format_reply;
use crate::llm::fallback::FallbackChain;
use crate::persona::SYSTEM_PROMPT;

/// Where a reply's text came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplySource {
    /// Generated by the named provider.
    Provider(String),
    /// Taken from the canned table.
    Canned,
}

/// A formatted reply ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub source: ReplySource,
}

/// Shared handle for reply generation; cheap to clone into spawned tasks.
#[derive(Debug, Clone)]
pub struct Responder {
    chain: Arc<FallbackChain>,
    system_prompt: Arc<str>,
}

impl Responder {
    pub fn new(chain: Arc<FallbackChain>) -> Self {
        Self {
            chain,
            system_prompt: Arc::from(SYSTEM_PROMPT),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Arc::from(prompt.into());
        self
    }

    pub fn chain(&self) -> &FallbackChain {
        &self.chain
    }

    /// The single user turn sent to the provider.
    pub fn user_turn(sender: &str, message: &str) -> String {
        format!("{sender} said: {message}")
    }

    /// Produce a reply to `message`, falling back to `canned` on exhaustion.
    ///
    /// Canned text is passed in rather than chosen here so the caller can
    /// draw it from its own random source.
    pub async fn reply(&self, sender: &str, message: &str, canned: &'static str) -> Reply {
        let user_turn = Self::user_turn(sender, message);
        match self.chain.generate(&self.system_prompt, &user_turn).await {
            Ok(result) => Reply {
                text: format_reply(&result.response.content),
                source: ReplySource::Provider(result.provider_name),
            },
            Err(err) => {
                tracing::info!(error = %err, %sender, "Using canned response");
                Reply {
                    text: canned.to_string(),
                    source: ReplySource::Canned,
                }
            }
        }
    }
}
