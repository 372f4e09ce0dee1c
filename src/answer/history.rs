//! Bounded conversation history.
//!
//! A FIFO of the last ten question/answer exchanges, scoped to one
//! orchestrator session. Only the follow-up template ever reads it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Exchanges retained per session.
pub const HISTORY_CAPACITY: usize = 10;

/// Exchanges rendered into a follow-up prompt.
const PROMPT_EXCHANGES: usize = 6;

/// One question/answer exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exchange {
    /// The question asked.
    pub question: String,
    /// The answer produced.
    pub answer: String,
    /// When the exchange completed.
    pub timestamp: DateTime<Utc>,
}

/// Bounded FIFO of exchanges.
#[derive(Debug, Default)]
pub struct ConversationHistory {
    entries: VecDeque<Exchange>,
}

impl ConversationHistory {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an exchange, evicting the oldest beyond capacity.
    pub fn push(&mut self, question: &str, answer: &str) {
        self.entries.push_back(Exchange {
            question: question.to_string(),
            answer: answer.to_string(),
            timestamp: Utc::now(),
        });
        while self.entries.len() > HISTORY_CAPACITY {
            self.entries.pop_front();
        }
    }

    /// Number of retained exchanges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Checks whether the history is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clears all exchanges.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns a snapshot of the retained exchanges, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Exchange> {
        self.entries.iter().cloned().collect()
    }

    /// Renders the most recent exchanges for a follow-up prompt.
    #[must_use]
    pub fn render_recent(&self) -> String {
        let skip = self.entries.len().saturating_sub(PROMPT_EXCHANGES);
        self.entries
            .iter()
            .skip(skip)
            .map(|e| format!("User: {}\nAssistant: {}", e.question, e.answer))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
