//! Confidence scoring and safety flags.
//!
//! Confidence starts from the top result's composite score and is
//! adjusted multiplicatively by retrieval quality, then clamped to
//! [0, 1]. Low confidence is never an error: it is a successful answer
//! carrying the `low_confidence` flag.

use crate::core::Jurisdiction;
use crate::patterns;
use crate::search::SearchOutcome;
use chrono::Datelike;
use serde::{Deserialize, Serialize};

/// Confidence below this sets the `low_confidence` flag.
pub const CONFIDENCE_THRESHOLD: f32 = 0.7;

/// Results older than this many years set `potentially_outdated`.
const STALE_YEARS: i32 = 10;

/// Boolean safety flags attached to every answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyFlags {
    /// The question matched the use-of-force keyword list.
    pub use_of_force: bool,
    /// Some admitted result carries a non-federal jurisdiction tag.
    pub jurisdiction_specific: bool,
    /// Some admitted result carries a date older than ten years.
    pub potentially_outdated: bool,
    /// Confidence fell below the threshold.
    pub low_confidence: bool,
}

/// Confidence plus flags for one answer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SafetyAssessment {
    /// Confidence in [0, 1].
    pub confidence: f32,
    /// The safety flags.
    pub flags: SafetyFlags,
}

/// Computes confidence and safety flags from retrieval quality.
#[derive(Debug, Clone, Copy)]
pub struct SafetyEvaluator {
    reference_year: i32,
}

impl Default for SafetyEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl SafetyEvaluator {
    /// Creates an evaluator anchored to the current year.
    #[must_use]
    pub fn new() -> Self {
        Self {
            reference_year: chrono::Utc::now().year(),
        }
    }

    /// Creates an evaluator anchored to a fixed year.
    #[must_use]
    pub const fn with_reference_year(reference_year: i32) -> Self {
        Self { reference_year }
    }

    /// Evaluates one question/retrieval pair.
    #[must_use]
    pub fn evaluate(&self, question: &str, outcome: &SearchOutcome) -> SafetyAssessment {
        let confidence = Self::confidence(outcome);
        let flags = SafetyFlags {
            use_of_force: is_use_of_force_query(question),
            jurisdiction_specific: outcome
                .results
                .iter()
                .any(|r| r.jurisdiction != Jurisdiction::Federal),
            potentially_outdated: self.has_stale_dates(outcome),
            low_confidence: confidence < CONFIDENCE_THRESHOLD,
        };
        SafetyAssessment { confidence, flags }
    }

    fn confidence(outcome: &SearchOutcome) -> f32 {
        let Some(top) = outcome.results.first() else {
            return 0.0;
        };
        let mut confidence = top.score.min(1.0);

        let total = outcome.results.len();
        if total >= 5 {
            confidence *= 1.10;
        } else if total < 2 {
            confidence *= 0.80;
        }

        let breakdown = outcome.relevance_breakdown();
        if breakdown.semantic > 0.8 {
            confidence *= 1.05;
        }
        if breakdown.keyword > 0.8 {
            confidence *= 1.05;
        }
        if outcome.citation_factor() < 0.5 {
            confidence *= 0.90;
        }

        confidence.clamp(0.0, 1.0)
    }

    fn has_stale_dates(&self, outcome: &SearchOutcome) -> bool {
        outcome.results.iter().any(|result| {
            result
                .metadata
                .get("dates")
                .and_then(crate::core::MetaValue::as_list)
                .is_some_and(|dates| {
                    dates.iter().any(|date| {
                        patterns::date_year(date)
                            .is_some_and(|year| self.reference_year - year > STALE_YEARS)
                    })
                })
        })
    }
}

/// Whole-word, case-insensitive check against the use-of-force keyword
/// list.
#[must_use]
pub fn is_use_of_force_query(question: &str) -> bool {
    let lower = question.to_lowercase();
    patterns::USE_OF_FORCE_KEYWORDS
        .iter()
        .any(|keyword| contains_word(&lower, keyword))
}

/// Substring search that requires non-alphanumeric (or edge) boundaries
/// around the match.
fn contains_word(haystack: &str, needle: &str) -> bool {
    let mut from = 0;
    while let Some(pos) = haystack[from..].find(needle) {
        let start = from + pos;
        let end = start + needle.len();
        let before_ok = start == 0
            || haystack[..start]
                .chars()
                .next_back()
                .is_none_or(|c| !c.is_alphanumeric());
        let after_ok = end == haystack.len()
            || haystack[end..]
                .chars()
                .next()
                .is_none_or(|c| !c.is_alphanumeric());
        if before_ok && after_ok {
            return true;
        }
        from = start + 1;
    }
    false
}
