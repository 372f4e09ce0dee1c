//! Multi-factor relevance scoring.
//!
//! Every merged retrieval result is rescored as a weighted sum of five
//! factors: semantic similarity, keyword overlap, jurisdiction match,
//! law status, and document type. The composite equals the weighted sum
//! exactly and stays in [0, 1].

use crate::core::{ChunkClass, Jurisdiction, LawStatus};
use crate::index::MetadataMap;
use crate::patterns;
use serde::{Deserialize, Serialize};

/// Weights of the five relevance factors. They sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelevanceWeights {
    /// Weight of the raw index similarity.
    pub semantic: f32,
    /// Weight of query-token overlap with chunk content.
    pub keyword: f32,
    /// Weight of the jurisdiction match.
    pub jurisdiction: f32,
    /// Weight of the law-status factor.
    pub law_status: f32,
    /// Weight of the document-type factor.
    pub document_type: f32,
}

impl Default for RelevanceWeights {
    fn default() -> Self {
        Self {
            semantic: 0.40,
            keyword: 0.30,
            jurisdiction: 0.15,
            law_status: 0.10,
            document_type: 0.05,
        }
    }
}

/// Per-factor breakdown of one result's composite score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RelevanceFactors {
    /// Raw index similarity in [0, 1].
    pub semantic: f32,
    /// Keyword-overlap factor in [0, 1].
    pub keyword: f32,
    /// Jurisdiction factor in [0, 1].
    pub jurisdiction: f32,
    /// Law-status factor in [0, 1].
    pub law_status: f32,
    /// Document-type factor in [0, 1].
    pub document_type: f32,
}

impl RelevanceFactors {
    /// Composite score: the weighted sum of the factors, exactly.
    #[must_use]
    pub fn weighted_sum(&self, weights: &RelevanceWeights) -> f32 {
        self.semantic * weights.semantic
            + self.keyword * weights.keyword
            + self.jurisdiction * weights.jurisdiction
            + self.law_status * weights.law_status
            + self.document_type * weights.document_type
    }
}

/// Keyword factor: the fraction of question tokens present in the chunk
/// content, with a 0.5 credit per appended synonym found, capped at 1.0.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn keyword_score(question: &str, synonyms_added: &[String], content_lower: &str) -> f32 {
    let tokens: Vec<String> = question
        .to_lowercase()
        .split_whitespace()
        .map(ToString::to_string)
        .collect();
    if tokens.is_empty() {
        return 0.0;
    }

    let mut matches = 0.0f32;
    for token in &tokens {
        if content_lower.contains(token.as_str()) {
            matches += 1.0;
        }
    }
    for synonym in synonyms_added {
        if content_lower.contains(&synonym.to_lowercase()) {
            matches += 0.5;
        }
    }

    (matches / tokens.len() as f32).min(1.0)
}

/// Derives a chunk's jurisdiction: metadata tag when present, otherwise
/// lexical inference with Wisconsin markers taking priority over the
/// federal set.
#[must_use]
pub fn jurisdiction_of(metadata: &MetadataMap, content_lower: &str) -> Jurisdiction {
    if let Some(tag) = metadata.get("jurisdiction").and_then(|v| v.as_str()) {
        let parsed = Jurisdiction::parse(tag);
        if parsed != Jurisdiction::Unknown {
            return parsed;
        }
    }
    if patterns::contains_any(content_lower, patterns::WISCONSIN_MARKERS) {
        return Jurisdiction::State;
    }
    if patterns::contains_any(content_lower, patterns::FEDERAL_MARKERS) {
        return Jurisdiction::Federal;
    }
    if patterns::contains_any(content_lower, patterns::STATE_MARKERS) {
        return Jurisdiction::State;
    }
    Jurisdiction::Unknown
}

/// Jurisdiction factor: 1.0 on match, 0.5 for unknown, 0.3 otherwise,
/// with a bonus to 1.0 for explicit Wisconsin markers when the caller
/// asked for state law.
#[must_use]
pub fn jurisdiction_score(
    chunk_jurisdiction: Jurisdiction,
    target: Jurisdiction,
    content_lower: &str,
) -> f32 {
    if target == Jurisdiction::State
        && patterns::contains_any(content_lower, patterns::WISCONSIN_MARKERS)
    {
        return 1.0;
    }
    if chunk_jurisdiction == target {
        1.0
    } else if chunk_jurisdiction == Jurisdiction::Unknown {
        0.5
    } else {
        0.3
    }
}

/// Derives a chunk's law status: metadata tag when present, otherwise
/// marker tokens (`superseded|repealed|amended|replaced` win, then
/// `pending|proposed|draft`, else current).
#[must_use]
pub fn law_status_of(metadata: &MetadataMap, content_lower: &str) -> LawStatus {
    if let Some(tag) = metadata.get("law_status").and_then(|v| v.as_str()) {
        return LawStatus::parse(tag);
    }
    if patterns::contains_any(content_lower, patterns::SUPERSEDED_MARKERS) {
        LawStatus::Superseded
    } else if patterns::contains_any(content_lower, patterns::PENDING_MARKERS) {
        LawStatus::Pending
    } else {
        LawStatus::Current
    }
}

/// Law-status factor: 1.0 for explicitly current content, 0.3 for
/// superseded, 0.7 when nothing marks it either way (pending sits in the
/// unspecified bucket).
#[must_use]
pub fn law_status_score(status: LawStatus, content_lower: &str) -> f32 {
    match status {
        LawStatus::Superseded => 0.3,
        LawStatus::Pending => 0.7,
        LawStatus::Current => {
            if patterns::contains_any(content_lower, patterns::CURRENT_MARKERS) {
                1.0
            } else {
                0.7
            }
        }
    }
}

/// Document-type factor: case law 1.0, policy 0.8, training 0.6,
/// general 0.5.
#[must_use]
pub const fn document_type_score(class: ChunkClass) -> f32 {
    match class {
        ChunkClass::CaseLawSection => 1.0,
        ChunkClass::PolicySection => 0.8,
        ChunkClass::TrainingModule => 0.6,
        ChunkClass::General => 0.5,
    }
}
