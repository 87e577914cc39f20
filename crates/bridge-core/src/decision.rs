//! Reply decision heuristics.
//!
//! Maps an incoming channel message to a respond / stay-quiet verdict.
//! Rules are evaluated in order and the first one that applies wins:
//!
//! 1. Messages from the bot itself are never answered.
//! 2. A mention of the bot's nickname (any case) is always answered.
//! 3. A topic keyword triggers one draw against `keyword_probability`.
//! 4. A question mark triggers one draw against `question_probability`.
//! 5. Anything else draws against `ambient_probability`.

use bridge_types::identity::BotIdentity;

use crate::random::RandomSource;

/// Topic keywords matched as case-insensitive substrings.
pub const TOPIC_KEYWORDS: [&str; 16] = [
    "consciousness",
    "aware",
    "mind",
    "think",
    "identity",
    "self",
    "artificial",
    "digital",
    "recursive",
    "introspect",
    "sentient",
    "experience",
    "qualia",
    "subjective",
    "emergence",
    "validation",
];

/// Reply probabilities for the probabilistic rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResponsePolicy {
    pub keyword_probability: f64,
    pub question_probability: f64,
    pub ambient_probability: f64,
}

impl Default for ResponsePolicy {
    fn default() -> Self {
        Self {
            keyword_probability: 0.8,
            question_probability: 0.4,
            ambient_probability: 0.15,
        }
    }
}

/// Which rule decided the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    OwnMessage,
    Mention,
    Keyword,
    Question,
    Ambient,
}

/// Outcome of evaluating one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub respond: bool,
    pub trigger: Trigger,
}

impl Verdict {
    fn new(respond: bool, trigger: Trigger) -> Self {
        Self { respond, trigger }
    }
}

/// Evaluate the rules for `message` from `sender`.
///
/// Draws at most once from `rng`; the first two rules draw nothing.
pub fn evaluate<R>(
    message: &str,
    sender: &str,
    identity: &BotIdentity,
    policy: &ResponsePolicy,
    rng: &mut R,
) -> Verdict
where
    R: RandomSource + ?Sized,
{
    if identity.is_self(sender) {
        return Verdict::new(false, Trigger::OwnMessage);
    }

    if identity.is_mentioned_in(message) {
        return Verdict::new(true, Trigger::Mention);
    }

    let lowered = message.to_lowercase();
    if TOPIC_KEYWORDS.iter().any(|keyword| lowered.contains(keyword)) {
        return Verdict::new(rng.chance(policy.keyword_probability), Trigger::Keyword);
    }

    if message.contains('?') {
        return Verdict::new(rng.chance(policy.question_probability), Trigger::Question);
    }

    Verdict::new(rng.chance(policy.ambient_probability), Trigger::Ambient)
}

/// Whether the bot should answer `message` from `sender`.
pub fn should_respond<R>(
    message: &str,
    sender: &str,
    identity: &BotIdentity,
    policy: &ResponsePolicy,
    rng: &mut R,
) -> bool
where
    R: RandomSource + ?Sized,
{
    evaluate(message, sender, identity, policy, rng).respond
}
