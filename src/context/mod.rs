//! Context-window assembly.
//!
//! Packs the top retrieval results into a single bounded string for the
//! LLM collaborator, preserving scoring order, truncating only the last
//! admitted chunk, and appending a Related Citations block expanded
//! through the citation graph when space remains.

mod citations;

pub use citations::{CitationGraph, MAX_CHAIN_DEPTH};

use crate::index::MetadataMap;
use crate::search::SearchResult;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default context budget in characters.
pub const DEFAULT_MAX_CONTEXT: usize = 4000;

/// Minimum leftover space worth filling with a truncated chunk.
const MIN_TRUNCATION_SPACE: usize = 100;

/// Citations listed in the Related Citations block.
const MAX_LISTED_CITATIONS: usize = 5;

/// Separator between packed chunks.
const SEPARATOR: &str = "\n\n";

/// Identifying record of a chunk admitted into the context window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmittedChunk {
    /// Chunk id.
    pub chunk_id: String,
    /// Composite score at admission time.
    pub score: f32,
    /// Whether the content was truncated to fit.
    pub truncated: bool,
    /// The chunk's metadata, carried through untouched.
    pub metadata: MetadataMap,
}

/// The assembled context window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssembledContext {
    /// The bounded context string handed to the LLM.
    pub text: String,
    /// Chunks admitted, in scoring order.
    pub admitted: Vec<AdmittedChunk>,
    /// The expanded citation chain of the admitted chunks.
    pub citation_chain: Vec<String>,
}

impl AssembledContext {
    /// Context length in characters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    /// Checks whether nothing was admitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Packs search results into a bounded context window.
pub struct ContextAssembler {
    max_length: usize,
    citations: Arc<CitationGraph>,
}

impl ContextAssembler {
    /// Creates an assembler with the default budget.
    #[must_use]
    pub fn new(citations: Arc<CitationGraph>) -> Self {
        Self {
            max_length: DEFAULT_MAX_CONTEXT,
            citations,
        }
    }

    /// Overrides the context budget.
    #[must_use]
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    /// Assembles the context window from scored results.
    ///
    /// Results are packed in the order given (descending score), the
    /// last admitted chunk may be truncated with an ellipsis when at
    /// least 100 characters remain, and the output never exceeds the
    /// configured budget.
    #[must_use]
    pub fn assemble(&self, results: &[SearchResult]) -> AssembledContext {
        let mut parts: Vec<String> = Vec::new();
        let mut admitted: Vec<AdmittedChunk> = Vec::new();
        let mut used = 0usize;

        for result in results {
            let separator = if parts.is_empty() { 0 } else { SEPARATOR.len() };
            let content_len = result.content.chars().count();

            if used + separator + content_len <= self.max_length {
                parts.push(result.content.clone());
                used += separator + content_len;
                admitted.push(AdmittedChunk {
                    chunk_id: result.chunk_id.clone(),
                    score: result.score,
                    truncated: false,
                    metadata: result.metadata.clone(),
                });
                continue;
            }

            let remaining = self.max_length.saturating_sub(used + separator);
            if remaining >= MIN_TRUNCATION_SPACE {
                let keep = remaining.saturating_sub(3);
                let truncated: String = result.content.chars().take(keep).collect();
                parts.push(format!("{truncated}..."));
                used += separator + keep + 3;
                admitted.push(AdmittedChunk {
                    chunk_id: result.chunk_id.clone(),
                    score: result.score,
                    truncated: true,
                    metadata: result.metadata.clone(),
                });
            }
            break;
        }

        // Union of citations from admitted chunks, expanded through the
        // relationship graph.
        let admitted_ids: std::collections::HashSet<&str> =
            admitted.iter().map(|a| a.chunk_id.as_str()).collect();
        let mut seeds: Vec<String> = Vec::new();
        for result in results {
            if !admitted_ids.contains(result.chunk_id.as_str()) {
                continue;
            }
            for citation in &result.citation_chain {
                if !seeds.contains(citation) {
                    seeds.push(citation.clone());
                }
            }
        }
        let citation_chain = self.citations.expand(&seeds, MAX_CHAIN_DEPTH);

        let mut text = parts.join(SEPARATOR);
        if !citation_chain.is_empty() {
            let block = citation_block(&citation_chain);
            if used + block.chars().count() <= self.max_length {
                text.push_str(&block);
            }
        }

        AssembledContext {
            text,
            admitted,
            citation_chain,
        }
    }
}

fn citation_block(chain: &[String]) -> String {
    let lines: Vec<String> = chain
        .iter()
        .take(MAX_LISTED_CITATIONS)
        .map(|c| format!("- {c}"))
        .collect();
    format!("\n\nRelated Citations:\n{}", lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ChunkClass, Jurisdiction, LawStatus};
    use crate::search::RelevanceFactors;

    fn result(id: &str, content: &str, score: f32) -> SearchResult {
        SearchResult {
            chunk_id: id.to_string(),
            content: content.to_string(),
            score,
            factors: RelevanceFactors {
                semantic: score,
                ..Default::default()
            },
            citation_chain: crate::patterns::extract_citations(content),
            jurisdiction: Jurisdiction::Federal,
            law_status: LawStatus::Current,
            chunk_class: ChunkClass::General,
            metadata: MetadataMap::new(),
        }
    }

    fn assembler(max: usize) -> ContextAssembler {
        ContextAssembler::new(Arc::new(CitationGraph::new())).with_max_length(max)
    }

    #[test]
    fn test_packs_in_score_order() {
        let results = vec![
            result("a_0", "first chunk text", 0.9),
            result("b_0", "second chunk text", 0.8),
        ];
        let context = assembler(4000).assemble(&results);

        assert_eq!(context.admitted.len(), 2);
        assert!(context.text.find("first").unwrap() < context.text.find("second").unwrap());
    }

    #[test]
    fn test_never_exceeds_budget() {
        let long = "x".repeat(900);
        let results: Vec<SearchResult> = (0..10)
            .map(|i| result(&format!("d_{i}"), &long, 0.5))
            .collect();
        let context = assembler(4000).assemble(&results);
        assert!(context.len() <= 4000);
    }

    #[test]
    fn test_truncates_last_chunk_with_ellipsis() {
        let results = vec![
            result("a_0", &"a".repeat(300), 0.9),
            result("b_0", &"b".repeat(300), 0.8),
        ];
        let context = assembler(450).assemble(&results);

        assert_eq!(context.admitted.len(), 2);
        assert!(context.admitted[1].truncated);
        assert!(context.text.ends_with("..."));
        assert!(context.len() <= 450);
    }

    #[test]
    fn test_skips_truncation_when_space_too_small() {
        let results = vec![
            result("a_0", &"a".repeat(300), 0.9),
            result("b_0", &"b".repeat(300), 0.8),
        ];
        // Only 50 characters of slack: not worth a truncated fragment.
        let context = assembler(350).assemble(&results);
        assert_eq!(context.admitted.len(), 1);
        assert!(!context.text.ends_with("..."));
    }

    #[test]
    fn test_related_citations_block() {
        let results = vec![result(
            "a_0",
            "Liability under 940.01 applies, see also § 940.02.",
            0.9,
        )];
        let context = assembler(4000).assemble(&results);

        assert!(context.text.contains("Related Citations:"));
        assert!(context.text.contains("- 940.01"));
        assert!(context.citation_chain.contains(&"940.02".to_string()));
        assert!(context.len() <= 4000);
    }

    #[test]
    fn test_citation_block_omitted_when_no_space() {
        let content = format!("{} 940.01 applies.", "x".repeat(150));
        let results = vec![result("a_0", &content, 0.9)];
        let context = assembler(content.chars().count()).assemble(&results);
        assert!(!context.text.contains("Related Citations:"));
        assert!(context.len() <= content.chars().count());
    }

    #[test]
    fn test_chain_expansion_through_graph() {
        let graph = Arc::new(CitationGraph::new());
        graph.add_relationship("940.01", "939.50");
        let assembler = ContextAssembler::new(graph).with_max_length(4000);

        let results = vec![result("a_0", "Charges under 940.01 were filed.", 0.9)];
        let context = assembler.assemble(&results);
        assert!(context.citation_chain.contains(&"939.50".to_string()));
    }

    #[test]
    fn test_empty_results() {
        let context = assembler(4000).assemble(&[]);
        assert!(context.is_empty());
        assert!(context.admitted.is_empty());
        assert!(context.citation_chain.is_empty());
    }

    #[test]
    fn test_citations_only_from_admitted_chunks() {
        let results = vec![
            result("a_0", &format!("{} cites 940.01.", "a".repeat(380)), 0.9),
            result("b_0", &format!("{} cites 941.99.", "b".repeat(380)), 0.8),
        ];
        // Budget admits only the first result.
        let context = assembler(400).assemble(&results);
        assert_eq!(context.admitted.len(), 1);
        assert!(context.citation_chain.contains(&"940.01".to_string()));
        assert!(!context.citation_chain.contains(&"941.99".to_string()));
    }
}
