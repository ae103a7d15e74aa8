//! Synthetic chat replies for inference outages.
//!
//! The chat endpoint promises a usable answer on every request, so when
//! the inference worker fails or returns garbage, a reply is drawn from a
//! fixed set of generic answers instead. Follow-up suggestions are the
//! first entries of a fixed ordered list, which keeps the reply shape
//! identical to a real one.

use rand::seq::SliceRandom;

use crate::models::ChatReply;

/// Generic answers substituted when the chat worker is unavailable.
pub const FALLBACK_RESPONSES: [&str; 4] = [
    "I'm experiencing technical difficulties. Please try again or ask a \
     different question.",
    "I'm here to help with university and visa information. Please ask me \
     about specific universities, programs, admission requirements, or visa \
     processes.",
    "I encountered an error processing your query. Please try asking about \
     specific universities, programs, or visa requirements.",
    "I'm here to help with university information! Please ask me about \
     specific universities, programs, tuition fees, or visa requirements.",
];

/// Ordered follow-up prompts; a reply carries the first few.
pub const FOLLOW_UP_PROMPTS: [&str; 6] = [
    "What programs are available?",
    "Tell me about admission requirements",
    "How do I apply for a student visa?",
    "What documents do I need for F-1 visa?",
    "Which universities offer scholarships?",
    "Tell me about tuition fees",
];

const FOLLOW_UP_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackResponder;

impl FallbackResponder {
    /// Produce a well-formed reply without consulting any worker.
    pub fn respond(&self, _message: &str) -> ChatReply {
        let mut rng = rand::thread_rng();
        let text = FALLBACK_RESPONSES
            .choose(&mut rng)
            .copied()
            .unwrap_or(FALLBACK_RESPONSES[0]);

        ChatReply {
            text: text.to_string(),
            follow_ups: FOLLOW_UP_PROMPTS[..FOLLOW_UP_COUNT]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}
