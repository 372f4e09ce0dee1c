//! Hybrid search with multi-factor relevance scoring.
//!
//! Combines a semantic query against the vector index with
//! metadata-filtered keyword queries for statute numbers and case names
//! extracted from the question, then rescores the merged set with the
//! five-factor weighted sum and deterministic tie-breaks.

mod scoring;

pub use scoring::{
    RelevanceFactors, RelevanceWeights, document_type_score, jurisdiction_of, jurisdiction_score,
    keyword_score, law_status_of, law_status_score,
};

use crate::core::{ChunkClass, Jurisdiction, LawStatus};
use crate::embedding::EmbeddingClient;
use crate::enhance::{QueryEnhancement, QueryEnhancer};
use crate::error::{CollaboratorError, Result, SearchError};
use crate::index::{IndexMatch, MetadataFilter, MetadataMap, VectorIndex};
use crate::patterns;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Default number of results returned to the orchestrator.
pub const DEFAULT_TOP_K: usize = 5;

/// Matches returned per extracted statute or case token.
const KEYWORD_MATCHES_PER_TOKEN: usize = 5;

/// Default deadline applied to each external call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// A scored retrieval result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Chunk id (`{document_id}_{ordinal}`).
    pub chunk_id: String,
    /// Chunk content as stored on the index.
    pub content: String,
    /// Composite score in [0, 1]; the weighted sum of the factors.
    pub score: f32,
    /// Per-factor breakdown.
    pub factors: RelevanceFactors,
    /// Citations extracted from the content.
    pub citation_chain: Vec<String>,
    /// Jurisdiction tag of the chunk.
    pub jurisdiction: Jurisdiction,
    /// Law-status tag of the chunk.
    pub law_status: LawStatus,
    /// Chunk class.
    pub chunk_class: ChunkClass,
    /// Full metadata map from the index.
    pub metadata: MetadataMap,
}

/// Output of one hybrid search: the enhancement applied plus the scored
/// results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// The query-enhancement record.
    pub enhancement: QueryEnhancement,
    /// Scored results, best first.
    pub results: Vec<SearchResult>,
}

impl SearchOutcome {
    /// Averages each relevance factor across the results.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn relevance_breakdown(&self) -> RelevanceFactors {
        if self.results.is_empty() {
            return RelevanceFactors::default();
        }
        let n = self.results.len() as f32;
        let mut sum = RelevanceFactors::default();
        for result in &self.results {
            sum.semantic += result.factors.semantic;
            sum.keyword += result.factors.keyword;
            sum.jurisdiction += result.factors.jurisdiction;
            sum.law_status += result.factors.law_status;
            sum.document_type += result.factors.document_type;
        }
        RelevanceFactors {
            semantic: sum.semantic / n,
            keyword: sum.keyword / n,
            jurisdiction: sum.jurisdiction / n,
            law_status: sum.law_status / n,
            document_type: sum.document_type / n,
        }
    }

    /// Fraction of results carrying a non-empty citation chain.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn citation_factor(&self) -> f32 {
        if self.results.is_empty() {
            return 0.0;
        }
        let with_citations = self
            .results
            .iter()
            .filter(|r| !r.citation_chain.is_empty())
            .count();
        with_citations as f32 / self.results.len() as f32
    }
}

/// Hybrid searcher over the vector index.
pub struct HybridSearcher {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingClient>,
    enhancer: QueryEnhancer,
    weights: RelevanceWeights,
    call_timeout: Duration,
}

impl HybridSearcher {
    /// Creates a searcher over the given collaborators.
    #[must_use]
    pub fn new(index: Arc<dyn VectorIndex>, embedder: Arc<dyn EmbeddingClient>) -> Self {
        Self {
            index,
            embedder,
            enhancer: QueryEnhancer::new(),
            weights: RelevanceWeights::default(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Overrides the per-call deadline.
    #[must_use]
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Overrides the relevance weights.
    #[must_use]
    pub fn with_weights(mut self, weights: RelevanceWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Runs the hybrid search for a question.
    ///
    /// # Errors
    ///
    /// Returns an error on empty input, zero `k`, or collaborator
    /// failure. Retrieval failures are not degraded into empty results.
    #[instrument(skip(self))]
    pub async fn search(
        &self,
        question: &str,
        jurisdiction: Jurisdiction,
        k: usize,
    ) -> Result<SearchOutcome> {
        if question.trim().is_empty() {
            return Err(SearchError::EmptyQuery.into());
        }
        if k == 0 {
            return Err(SearchError::ZeroResults.into());
        }

        let enhancement = self.enhancer.enhance(question);
        debug!(enhanced = %enhancement.enhanced, "query enhanced");

        let query_vector = self
            .timed("query embedding", self.embedder.encode_one(&enhancement.enhanced))
            .await?;

        let semantic = self
            .timed(
                "semantic query",
                self.index.query(&query_vector, 2 * k, None, true),
            )
            .await?;

        let keyword = self.keyword_matches(question).await?;

        // Merge by chunk id, keeping the maximum score on collision.
        let mut merged: HashMap<String, IndexMatch> = HashMap::new();
        for m in semantic.into_iter().chain(keyword) {
            match merged.get(&m.id) {
                Some(existing) if existing.score >= m.score => {}
                _ => {
                    merged.insert(m.id.clone(), m);
                }
            }
        }

        let mut results: Vec<SearchResult> = merged
            .into_values()
            .map(|m| self.rescore(m, question, &enhancement, jurisdiction))
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    b.factors
                        .semantic
                        .partial_cmp(&a.factors.semantic)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .then_with(|| a.chunk_id.cmp(&b.chunk_id))
        });
        results.truncate(k);

        debug!(results = results.len(), "hybrid search complete");
        Ok(SearchOutcome {
            enhancement,
            results,
        })
    }

    /// Semantic-only search with an optional metadata filter, used by
    /// the document-search surface.
    ///
    /// # Errors
    ///
    /// Returns an error on empty input or collaborator failure.
    pub async fn semantic_search(
        &self,
        query: &str,
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<IndexMatch>> {
        if query.trim().is_empty() {
            return Err(SearchError::EmptyQuery.into());
        }
        let vector = self
            .timed("query embedding", self.embedder.encode_one(query))
            .await?;
        self.timed(
            "filtered query",
            self.index.query(&vector, top_k, filter, true),
        )
        .await
    }

    /// Issues the per-token filtered queries for statutes and case names
    /// found in the original question.
    async fn keyword_matches(&self, question: &str) -> Result<Vec<IndexMatch>> {
        let mut out = Vec::new();

        for statute in patterns::extract_statutes(question) {
            let vector = self
                .timed(
                    "statute embedding",
                    self.embedder.encode_one(&format!("statute {statute}")),
                )
                .await?;
            let filter = MetadataFilter::field("statute_numbers", &statute);
            let matches = self
                .timed(
                    "statute query",
                    self.index
                        .query(&vector, KEYWORD_MATCHES_PER_TOKEN, Some(&filter), true),
                )
                .await?;
            out.extend(matches);
        }

        for case in patterns::CASE_NAME
            .find_iter(question)
            .map(|m| m.as_str().to_string())
        {
            let vector = self
                .timed(
                    "case embedding",
                    self.embedder.encode_one(&format!("case {case}")),
                )
                .await?;
            let filter = MetadataFilter::field("case_citations", &case);
            let matches = self
                .timed(
                    "case query",
                    self.index
                        .query(&vector, KEYWORD_MATCHES_PER_TOKEN, Some(&filter), true),
                )
                .await?;
            out.extend(matches);
        }

        Ok(out)
    }

    /// Applies the five-factor rescoring to one merged match.
    fn rescore(
        &self,
        m: IndexMatch,
        question: &str,
        enhancement: &QueryEnhancement,
        target: Jurisdiction,
    ) -> SearchResult {
        let metadata = m.metadata.unwrap_or_default();
        let content = metadata
            .get("content")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let content_lower = content.to_lowercase();

        let chunk_class = metadata
            .get("chunk_type")
            .and_then(|v| v.as_str())
            .map_or(ChunkClass::General, ChunkClass::parse);
        let jurisdiction = jurisdiction_of(&metadata, &content_lower);
        let law_status = law_status_of(&metadata, &content_lower);

        let factors = RelevanceFactors {
            semantic: m.score.clamp(0.0, 1.0),
            keyword: keyword_score(question, &enhancement.synonyms_added, &content_lower),
            jurisdiction: jurisdiction_score(jurisdiction, target, &content_lower),
            law_status: law_status_score(law_status, &content_lower),
            document_type: document_type_score(chunk_class),
        };
        let score = factors.weighted_sum(&self.weights);

        SearchResult {
            chunk_id: m.id,
            citation_chain: patterns::extract_citations(&content),
            content,
            score,
            factors,
            jurisdiction,
            law_status,
            chunk_class,
            metadata,
        }
    }

    async fn timed<T>(
        &self,
        operation: &str,
        fut: impl std::future::Future<Output = Result<T>> + Send,
    ) -> Result<T> {
        tokio::time::timeout(self.call_timeout, fut)
            .await
            .map_err(|_| CollaboratorError::Timeout {
                operation: operation.to_string(),
            })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Chunk, ChunkClass, MetaValue};
    use crate::embedding::{DEFAULT_DIMENSIONS, HashEmbedder};
    use crate::index::{MemoryIndex, VectorRecord};

    async fn seeded_searcher(chunks: Vec<(&str, &str)>) -> HybridSearcher {
        let embedder = Arc::new(HashEmbedder::new(DEFAULT_DIMENSIONS));
        let index = Arc::new(MemoryIndex::new(DEFAULT_DIMENSIONS));

        for (id, content) in chunks {
            let mut chunk = Chunk::new(
                id.rsplit_once('_').map_or(id, |(d, _)| d),
                0,
                content.to_string(),
                0..content.len(),
                ChunkClass::General,
            );
            chunk.metadata.statute_numbers = patterns::extract_statutes(content);
            chunk.metadata.case_citations = patterns::extract_case_citations(content);

            let mut metadata = chunk.metadata.flatten();
            metadata.insert("content".to_string(), MetaValue::from(content));
            metadata.insert("chunk_type".to_string(), MetaValue::from("general"));
            metadata.insert(
                "document_id".to_string(),
                MetaValue::from(chunk.document_id.as_str()),
            );

            let vector = embedder.encode_one(content).await.unwrap();
            index
                .upsert(vec![VectorRecord {
                    id: id.to_string(),
                    vector,
                    metadata,
                }])
                .await
                .unwrap();
        }

        HybridSearcher::new(index, embedder)
    }

    #[tokio::test]
    async fn test_empty_query_rejected() {
        let searcher = seeded_searcher(vec![]).await;
        let result = searcher.search("   ", Jurisdiction::Federal, 5).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_zero_k_rejected() {
        let searcher = seeded_searcher(vec![]).await;
        let result = searcher.search("question", Jurisdiction::Federal, 0).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_statute_query_finds_exact_chunk() {
        let searcher = seeded_searcher(vec![
            ("a_0", "The statute 18 U.S.C. 2703 governs stored communications."),
            ("b_0", "An unrelated passage about traffic stops."),
        ])
        .await;

        let outcome = searcher
            .search("18 U.S.C. 2703", Jurisdiction::Federal, 5)
            .await
            .unwrap();

        assert!(!outcome.results.is_empty());
        assert_eq!(outcome.results[0].chunk_id, "a_0");
        assert!(outcome.results[0].factors.keyword >= 0.5);
    }

    #[tokio::test]
    async fn test_results_sorted_and_bounded() {
        let searcher = seeded_searcher(vec![
            ("a_0", "digital evidence handling for seized phones"),
            ("b_0", "digital evidence collection procedures"),
            ("c_0", "cafeteria menu for the spring banquet"),
        ])
        .await;

        let outcome = searcher
            .search("digital evidence", Jurisdiction::Federal, 2)
            .await
            .unwrap();

        assert!(outcome.results.len() <= 2);
        for pair in outcome.results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        for result in &outcome.results {
            assert!((0.0..=1.0).contains(&result.score));
            let recomputed = result.factors.weighted_sum(&RelevanceWeights::default());
            assert!((result.score - recomputed).abs() < 1e-6);
        }
    }

    #[tokio::test]
    async fn test_citation_chain_extracted() {
        let searcher = seeded_searcher(vec![(
            "a_0",
            "Under 940.01, see also § 940.02 for penalties.",
        )])
        .await;

        let outcome = searcher
            .search("homicide penalties 940.01", Jurisdiction::Federal, 5)
            .await
            .unwrap();

        let top = &outcome.results[0];
        assert!(top.citation_chain.contains(&"940.01".to_string()));
        assert!(top.citation_chain.contains(&"940.02".to_string()));
    }

    #[tokio::test]
    async fn test_relevance_breakdown_averages() {
        let searcher = seeded_searcher(vec![
            ("a_0", "search warrant procedures for homes"),
            ("b_0", "search warrant rules for vehicles"),
        ])
        .await;

        let outcome = searcher
            .search("search warrant", Jurisdiction::Federal, 5)
            .await
            .unwrap();
        let breakdown = outcome.relevance_breakdown();
        assert!(breakdown.keyword > 0.0);
        assert!(breakdown.document_type > 0.0);
    }

    #[tokio::test]
    async fn test_semantic_search_with_filter() {
        let searcher = seeded_searcher(vec![
            ("a_0", "wisconsin statutes on sovereignty"),
            ("b_0", "federal code of regulations"),
        ])
        .await;

        let filter = MetadataFilter::field("document_id", "a");
        let matches = searcher
            .semantic_search("sovereignty", 10, Some(&filter))
            .await
            .unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, "a_0");
    }

    #[tokio::test]
    async fn test_empty_index_returns_empty() {
        let searcher = seeded_searcher(vec![]).await;
        let outcome = searcher
            .search("anything at all", Jurisdiction::Federal, 5)
            .await
            .unwrap();
        assert!(outcome.results.is_empty());
        assert!(outcome.citation_factor().abs() < 1e-6);
    }
}
