//! Prompt templates and template selection.
//!
//! Templates are data, not code: each carries placeholders for the
//! assembled context, the search-quality metrics, the chat history, and
//! the user question. Selection is deterministic on question keywords
//! and conversation state.

use serde::{Deserialize, Serialize};

/// Which template an answer was generated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    /// General legal Q&A.
    General,
    /// Citation-focused analysis.
    Citation,
    /// Follow-up continuing an existing conversation.
    FollowUp,
}

impl PromptKind {
    /// Returns the canonical snake_case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Citation => "citation",
            Self::FollowUp => "follow_up",
        }
    }
}

/// Keywords that route a question to the citation template.
const CITATION_KEYWORDS: &[&str] = &[
    "cite",
    "citation",
    "statute",
    "case",
    "authority",
    "legal basis",
    "what law",
    "which law",
];

/// Openers that route a question to the follow-up template when history
/// is non-empty.
const FOLLOW_UP_OPENERS: &[&str] = &[
    "also",
    "additionally",
    "furthermore",
    "moreover",
    "what about",
    "how about",
    "and",
    "but",
];

const GENERAL_TEMPLATE: &str = "\
You are a legal research assistant specializing in U.S. law, particularly \
digital evidence, privacy law, and criminal procedure.

Base your answer on the provided legal context. Include relevant statute \
numbers, case names, and citations when mentioned. Flag information that is \
jurisdiction-specific or may be outdated. If the context does not contain \
enough information, say so clearly.

Legal Context:
{context}

Search Quality Metrics:
{search_metrics}

Question: {question}";

const CITATION_TEMPLATE: &str = "\
You are a legal citation expert. From the provided legal context, identify \
and explain the key legal authorities, statutes, and cases: specific codes \
and sections, relevant court decisions, how the authorities relate, and \
whether each is federal or state authority. Flag jurisdiction-specific or \
potentially outdated information.

Legal Context:
{context}

Search Quality Metrics:
{search_metrics}

Question: {question}";

const FOLLOW_UP_TEMPLATE: &str = "\
You are continuing a legal research conversation. Consider the previous \
exchanges and provide a coherent answer that builds on them, with citations \
to specific legal authorities. Flag jurisdiction-specific or potentially \
outdated information.

Conversation so far:
{chat_history}

Legal Context:
{context}

Search Quality Metrics:
{search_metrics}

Question: {question}";

/// Selects the template for a question.
///
/// Citation keywords win; otherwise follow-up openers apply when the
/// conversation already has history; everything else is general.
#[must_use]
pub fn select_prompt(question: &str, has_history: bool) -> PromptKind {
    let lower = question.to_lowercase();

    if CITATION_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return PromptKind::Citation;
    }

    if has_history {
        let trimmed = lower.trim_start();
        if FOLLOW_UP_OPENERS.iter().any(|opener| {
            trimmed.starts_with(opener)
                && trimmed[opener.len()..]
                    .chars()
                    .next()
                    .is_none_or(|c| !c.is_alphanumeric())
        }) {
            return PromptKind::FollowUp;
        }
    }

    PromptKind::General
}

/// Renders a template with its four placeholders.
#[must_use]
pub fn render(
    kind: PromptKind,
    context: &str,
    search_metrics: &str,
    chat_history: &str,
    question: &str,
) -> String {
    let template = match kind {
        PromptKind::General => GENERAL_TEMPLATE,
        PromptKind::Citation => CITATION_TEMPLATE,
        PromptKind::FollowUp => FOLLOW_UP_TEMPLATE,
    };
    template
        .replace("{context}", context)
        .replace("{search_metrics}", search_metrics)
        .replace("{chat_history}", chat_history)
        .replace("{question}", question)
}
