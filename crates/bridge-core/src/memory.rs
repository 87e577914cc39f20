//! Bounded buffer of recent channel messages.

use std::collections::VecDeque;

use tokio::time::Instant;

/// One observed channel message. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender: String,
    pub text: String,
    pub timestamp: Instant,
}

/// Arrival-ordered buffer that evicts its oldest entry when full.
///
/// Invariant: `len() <= capacity()` after every insertion.
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    capacity: usize,
    messages: VecDeque<ChatMessage>,
}

impl ConversationMemory {
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            messages: VecDeque::with_capacity(capacity),
        }
    }

    /// Record a message stamped with the current time.
    pub fn record(&mut self, sender: impl Into<String>, text: impl Into<String>) {
        self.push(ChatMessage {
            sender: sender.into(),
            text: text.into(),
            timestamp: Instant::now(),
        });
    }

    /// Append at the tail, evicting from the head past capacity.
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push_back(message);
        while self.messages.len() > self.capacity {
            self.messages.pop_front();
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }

    pub fn latest(&self) -> Option<&ChatMessage> {
        self.messages.back()
    }
}
