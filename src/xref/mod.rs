//! Cross-reference engine.
//!
//! Scores document-to-document similarity from shared entities with a
//! weighted Jaccard-like metric (time-proximity-aware on dates), records
//! qualifying pairs in the persistent relationship graph at ingestion,
//! and suggests related content for free-text queries at a lower
//! threshold.

mod entities;
mod graph;

pub use entities::{EntityBag, extract_entities, extract_many};
pub use graph::{CommonEntities, ReferenceGraph, RelationshipEdge};

use crate::embedding::EmbeddingClient;
use crate::error::Result;
use crate::index::VectorIndex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Minimum similarity recorded in the graph at ingestion.
pub const RECORD_THRESHOLD: f32 = 0.3;

/// Minimum similarity accepted for query suggestions.
pub const SUGGEST_THRESHOLD: f32 = 0.2;

/// Candidate chunks retrieved per similarity pass.
const CANDIDATE_POOL: usize = 20;

/// Category weights of the similarity metric.
const KEYWORD_WEIGHT: f32 = 0.40;
const CITATION_WEIGHT: f32 = 0.20;
const LOCATION_WEIGHT: f32 = 0.20;
const DATE_WEIGHT: f32 = 0.15;
const NAME_WEIGHT: f32 = 0.10;
const TOTAL_WEIGHT: f32 =
    KEYWORD_WEIGHT + CITATION_WEIGHT + LOCATION_WEIGHT + DATE_WEIGHT + NAME_WEIGHT;

/// Days within which two dates count as proximate.
const DATE_PROXIMITY_DAYS: i64 = 30;

/// A suggested related document for a query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    /// Document id of the suggestion.
    pub document_id: String,
    /// File name, when recorded on the index.
    pub file_name: Option<String>,
    /// Index similarity of the matched chunk.
    pub relevance_score: f32,
    /// Entity-overlap similarity.
    pub similarity_score: f32,
    /// Human-readable overlap explanation.
    pub why_relevant: String,
}

/// Computes the weighted entity-overlap similarity of two documents.
#[must_use]
pub fn similarity(a: &EntityBag, b: &EntityBag) -> f32 {
    let mut score = 0.0f32;

    score += overlap_term(&a.keywords, &b.keywords, KEYWORD_WEIGHT);
    score += overlap_term(&a.citations, &b.citations, CITATION_WEIGHT);
    score += overlap_term(&a.locations, &b.locations, LOCATION_WEIGHT);
    score += overlap_term(&a.names, &b.names, NAME_WEIGHT);
    score += date_term(&a.dates, &b.dates);

    score / TOTAL_WEIGHT
}

#[allow(clippy::cast_precision_loss)]
fn overlap_term(a: &[String], b: &[String], weight: f32) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let set_a: HashSet<&String> = a.iter().collect();
    let set_b: HashSet<&String> = b.iter().collect();
    let common = set_a.intersection(&set_b).count();
    if common == 0 {
        return 0.0;
    }
    weight * common as f32 / set_a.len().max(set_b.len()) as f32
}

/// Date contribution: proximity-aware credit when any two parsed dates
/// fall within thirty days.
#[allow(clippy::cast_precision_loss)]
fn date_term(a: &[String], b: &[String]) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let parsed_a: Vec<chrono::NaiveDate> =
        a.iter().filter_map(|d| crate::patterns::parse_date(d)).collect();
    let parsed_b: Vec<chrono::NaiveDate> =
        b.iter().filter_map(|d| crate::patterns::parse_date(d)).collect();
    if parsed_a.is_empty() || parsed_b.is_empty() {
        return 0.0;
    }

    let min_diff = parsed_a
        .iter()
        .flat_map(|da| parsed_b.iter().map(move |db| (*da - *db).num_days().abs()))
        .min()
        .unwrap_or(i64::MAX);

    if min_diff <= DATE_PROXIMITY_DAYS {
        DATE_WEIGHT * (1.0 - min_diff as f32 / DATE_PROXIMITY_DAYS as f32)
    } else {
        0.0
    }
}

/// Returns the entities common to both bags.
#[must_use]
pub fn common_entities(a: &EntityBag, b: &EntityBag) -> CommonEntities {
    fn intersect(a: &[String], b: &[String]) -> Vec<String> {
        let set_b: HashSet<&String> = b.iter().collect();
        a.iter().filter(|x| set_b.contains(x)).cloned().collect()
    }
    CommonEntities {
        locations: intersect(&a.locations, &b.locations),
        citations: intersect(&a.citations, &b.citations),
        keywords: intersect(&a.keywords, &b.keywords),
        names: intersect(&a.names, &b.names),
    }
}

/// Cross-reference engine over the vector index and the graph.
pub struct CrossReferenceEngine {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingClient>,
    graph: Arc<ReferenceGraph>,
}

impl CrossReferenceEngine {
    /// Creates an engine over the given collaborators.
    #[must_use]
    pub fn new(
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingClient>,
        graph: Arc<ReferenceGraph>,
    ) -> Self {
        Self {
            index,
            embedder,
            graph,
        }
    }

    /// The underlying relationship graph.
    #[must_use]
    pub fn graph(&self) -> &Arc<ReferenceGraph> {
        &self.graph
    }

    /// Finds and records cross-references for a newly ingested document.
    ///
    /// Pairs scoring at or above [`RECORD_THRESHOLD`] enter the graph
    /// with their shared-entity breakdown; the graph is persisted
    /// best-effort afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error when the embedding or index call fails.
    pub async fn record_document(&self, document_id: &str, text: &str) -> Result<usize> {
        let own_entities = extract_entities(text);
        let candidates = self.candidates(text, document_id).await?;

        let contents: Vec<String> = candidates.iter().map(|c| c.content.clone()).collect();
        let bags = extract_many(&contents);

        let mut recorded = 0usize;
        for (candidate, bag) in candidates.iter().zip(bags.iter()) {
            let score = similarity(&own_entities, bag);
            if score >= RECORD_THRESHOLD {
                self.graph.record(
                    document_id,
                    &candidate.document_id,
                    RelationshipEdge {
                        similarity: score,
                        common_entities: common_entities(&own_entities, bag),
                        timestamp: chrono::Utc::now(),
                    },
                );
                recorded += 1;
            }
        }

        debug!(document_id, recorded, "cross-references recorded");
        self.graph.save();
        Ok(recorded)
    }

    /// Suggests related documents for a free-text query.
    ///
    /// # Errors
    ///
    /// Returns an error when the embedding or index call fails.
    pub async fn suggest(&self, query: &str) -> Result<Vec<Suggestion>> {
        let query_entities = extract_entities(query);
        let candidates = self.candidates(query, "").await?;

        let contents: Vec<String> = candidates.iter().map(|c| c.content.clone()).collect();
        let bags = extract_many(&contents);

        let mut suggestions: Vec<Suggestion> = candidates
            .iter()
            .zip(bags.iter())
            .filter_map(|(candidate, bag)| {
                let score = similarity(&query_entities, bag);
                if score < SUGGEST_THRESHOLD {
                    return None;
                }
                Some(Suggestion {
                    document_id: candidate.document_id.clone(),
                    file_name: candidate.file_name.clone(),
                    relevance_score: candidate.relevance,
                    similarity_score: score,
                    why_relevant: explain(&common_entities(&query_entities, bag)),
                })
            })
            .collect();

        suggestions.sort_by(|a, b| {
            (b.relevance_score, b.similarity_score)
                .partial_cmp(&(a.relevance_score, a.similarity_score))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        suggestions.truncate(10);
        Ok(suggestions)
    }

    /// Returns the recorded relationships of a document.
    #[must_use]
    pub fn related_documents(
        &self,
        document_id: &str,
        max_results: usize,
    ) -> Vec<(String, RelationshipEdge)> {
        self.graph.related(document_id, max_results)
    }

    /// Retrieves candidate chunks for similarity scoring, one per
    /// document, skipping the excluded document.
    async fn candidates(&self, text: &str, exclude_document: &str) -> Result<Vec<Candidate>> {
        let vector = self.embedder.encode_one(text).await?;
        let matches = self.index.query(&vector, CANDIDATE_POOL, None, true).await?;

        let mut out: Vec<Candidate> = Vec::new();
        let mut seen_documents: HashSet<String> = HashSet::new();
        for m in matches {
            let metadata = m.metadata.unwrap_or_default();
            let Some(document_id) = metadata
                .get("document_id")
                .and_then(|v| v.as_str())
                .map(ToString::to_string)
            else {
                warn!(id = %m.id, "indexed chunk without document_id");
                continue;
            };
            if document_id == exclude_document || !seen_documents.insert(document_id.clone()) {
                continue;
            }
            out.push(Candidate {
                document_id,
                file_name: metadata
                    .get("file_name")
                    .and_then(|v| v.as_str())
                    .map(ToString::to_string),
                content: metadata
                    .get("content")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                relevance: m.score,
            });
        }
        Ok(out)
    }
}

struct Candidate {
    document_id: String,
    file_name: Option<String>,
    content: String,
    relevance: f32,
}

fn explain(common: &CommonEntities) -> String {
    let mut reasons = Vec::new();
    if !common.locations.is_empty() {
        reasons.push(format!("same locations: {}", common.locations.join(", ")));
    }
    if !common.citations.is_empty() {
        reasons.push(format!("same legal citations: {}", common.citations.join(", ")));
    }
    if !common.keywords.is_empty() {
        reasons.push(format!("same legal topics: {}", common.keywords.join(", ")));
    }
    if !common.names.is_empty() {
        reasons.push(format!("same individuals: {}", common.names.join(", ")));
    }
    if reasons.is_empty() {
        "semantic similarity".to_string()
    } else {
        reasons.join("; ")
    }
}
