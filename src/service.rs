//! Service facade: startup wiring and the operations the external
//! surface exposes.
//!
//! Exactly one embedding client, one vector-index handle, and one
//! answer orchestrator exist per process. They are constructed here at
//! startup and passed explicitly to the components that need them; the
//! embedder/index dimension check is fatal before anything else runs.

use crate::answer::{AnswerEvent, AnswerOrchestrator, AnswerResponse, Exchange};
use crate::chunking::ChunkerConfig;
use crate::config::ServiceConfig;
use crate::context::{CitationGraph, ContextAssembler};
use crate::core::Jurisdiction;
use crate::embedding::EmbeddingClient;
use crate::error::{CollaboratorError, Result};
use crate::index::{IndexMatch, IndexStats, MetadataFilter, VectorIndex};
use crate::ingest::{
    DocumentProcessor, DocumentSummary, IngestionManager, IngestionTask, UploadMetadata,
};
use crate::llm::LanguageModel;
use crate::search::HybridSearcher;
use crate::xref::{CrossReferenceEngine, ReferenceGraph, Suggestion};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::info;
use uuid::Uuid;

/// Component availability, as reported by the health surface.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HealthStatus {
    /// The answer orchestrator is constructed.
    pub chatbot: bool,
    /// The ingestion processor is constructed.
    pub processor: bool,
    /// The vector index answers describe calls.
    pub vector: bool,
}

/// One result row of the document-search surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSearchResult {
    /// Chunk id.
    pub id: String,
    /// Index similarity score.
    pub score: f32,
    /// Stored chunk content.
    pub content: String,
    /// Full metadata map.
    pub metadata: crate::index::MetadataMap,
}

/// The assembled retrieval-augmented QA service.
pub struct LegalRagService {
    config: ServiceConfig,
    index: Arc<dyn VectorIndex>,
    searcher: Arc<HybridSearcher>,
    orchestrator: AnswerOrchestrator,
    ingestion: IngestionManager,
    xref: Arc<CrossReferenceEngine>,
}

impl LegalRagService {
    /// Wires the service from its collaborators.
    ///
    /// # Errors
    ///
    /// Returns a fatal error when the embedder dimension does not match
    /// the index dimension, or the configuration is invalid.
    pub fn new(
        config: ServiceConfig,
        embedder: Arc<dyn EmbeddingClient>,
        index: Arc<dyn VectorIndex>,
        model: Arc<dyn LanguageModel>,
    ) -> Result<Self> {
        config.validate()?;
        if embedder.dimension() != index.dimension() {
            return Err(CollaboratorError::DimensionMismatch {
                embedder: embedder.dimension(),
                index: index.dimension(),
            }
            .into());
        }

        let citations = Arc::new(CitationGraph::new());
        let reference_graph = Arc::new(ReferenceGraph::load(&config.graph_path));
        let xref = Arc::new(CrossReferenceEngine::new(
            Arc::clone(&index),
            Arc::clone(&embedder),
            reference_graph,
        ));

        let chunker_config = ChunkerConfig::new()
            .with_size(config.chunk_size)
            .with_overlap(config.chunk_overlap);
        let processor = Arc::new(
            DocumentProcessor::new(
                Arc::clone(&embedder),
                Arc::clone(&index),
                Arc::clone(&citations),
                Arc::clone(&xref),
            )
            .with_chunker_config(chunker_config),
        );
        let ingestion = IngestionManager::new(Arc::clone(&processor), config.upload_dir.clone())
            .with_max_upload_bytes(config.max_upload_bytes);

        let searcher = Arc::new(HybridSearcher::new(
            Arc::clone(&index),
            Arc::clone(&embedder),
        ));
        let assembler = Arc::new(
            ContextAssembler::new(Arc::clone(&citations))
                .with_max_length(config.max_context_chars),
        );
        let orchestrator =
            AnswerOrchestrator::new(Arc::clone(&searcher), assembler, model);

        info!(index = %config.index_name, region = %config.index_region, "service constructed");
        Ok(Self {
            config,
            index,
            searcher,
            orchestrator,
            ingestion,
            xref,
        })
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Reports component availability.
    pub async fn health(&self) -> HealthStatus {
        HealthStatus {
            chatbot: true,
            processor: true,
            vector: self.index.describe().await.is_ok(),
        }
    }

    /// Answers a question.
    ///
    /// # Errors
    ///
    /// Returns an error when retrieval fails.
    pub async fn ask(
        &self,
        question: &str,
        jurisdiction: Jurisdiction,
        include_metadata: bool,
    ) -> Result<AnswerResponse> {
        self.orchestrator
            .ask(question, jurisdiction, include_metadata)
            .await
    }

    /// Answers a question as a stream of events.
    ///
    /// # Errors
    ///
    /// Returns an error when retrieval fails before streaming starts.
    pub async fn ask_stream(
        &self,
        question: &str,
        jurisdiction: Jurisdiction,
        include_metadata: bool,
    ) -> Result<ReceiverStream<AnswerEvent>> {
        self.orchestrator
            .ask_stream(question, jurisdiction, include_metadata)
            .await
    }

    /// Searches document chunks with optional jurisdiction and type
    /// filters (logical-or composed, matching the index contract).
    ///
    /// # Errors
    ///
    /// Returns an error on empty queries or collaborator failure.
    pub async fn search_documents(
        &self,
        query: &str,
        max_results: usize,
        jurisdiction: Option<Jurisdiction>,
        document_type: Option<&str>,
    ) -> Result<Vec<DocumentSearchResult>> {
        let mut filters = Vec::new();
        if let Some(jurisdiction) = jurisdiction {
            filters.push(MetadataFilter::field("jurisdiction", jurisdiction.as_str()));
        }
        if let Some(document_type) = document_type {
            filters.push(MetadataFilter::field("chunk_type", document_type));
        }
        let filter = if filters.is_empty() {
            None
        } else {
            Some(MetadataFilter::any_of(filters))
        };

        let matches = self
            .searcher
            .semantic_search(query, max_results, filter.as_ref())
            .await?;
        Ok(matches.into_iter().map(to_search_result).collect())
    }

    /// Lists the documents on the index.
    ///
    /// # Errors
    ///
    /// Returns an error when the index call fails.
    pub async fn list_documents(&self) -> Result<Vec<DocumentSummary>> {
        self.ingestion.processor().list_documents().await
    }

    /// Deletes a document and all its chunks, returning the count.
    ///
    /// # Errors
    ///
    /// Returns an error when the index call fails.
    pub async fn delete_document(&self, document_id: &str) -> Result<usize> {
        self.ingestion.processor().delete_document(document_id).await
    }

    /// Accepts an upload for background ingestion.
    ///
    /// # Errors
    ///
    /// Returns an error on invalid uploads.
    pub async fn submit_upload(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        metadata: UploadMetadata,
    ) -> Result<Uuid> {
        self.ingestion.submit(file_name, bytes, metadata).await
    }

    /// Returns one task snapshot.
    ///
    /// # Errors
    ///
    /// Returns `TaskNotFound` for unknown ids.
    pub fn task_status(&self, id: Uuid) -> Result<IngestionTask> {
        self.ingestion.status(id)
    }

    /// Returns all task snapshots, newest first.
    #[must_use]
    pub fn list_tasks(&self) -> Vec<IngestionTask> {
        self.ingestion.list()
    }

    /// Cancels a running task.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown ids or terminal tasks.
    pub async fn cancel_task(&self, id: Uuid) -> Result<()> {
        self.ingestion.cancel(id).await
    }

    /// Removes a task from tracking.
    ///
    /// # Errors
    ///
    /// Returns `TaskNotFound` for unknown ids.
    pub async fn remove_task(&self, id: Uuid) -> Result<IngestionTask> {
        self.ingestion.remove(id).await
    }

    /// Suggests related documents for a free-text query.
    ///
    /// # Errors
    ///
    /// Returns an error when collaborators fail.
    pub async fn suggest_related(&self, query: &str) -> Result<Vec<Suggestion>> {
        self.xref.suggest(query).await
    }

    /// Index statistics passthrough.
    ///
    /// # Errors
    ///
    /// Returns an error when the index call fails.
    pub async fn index_stats(&self) -> Result<IndexStats> {
        self.index.describe().await
    }

    /// Returns the conversation history.
    #[must_use]
    pub fn chat_history(&self) -> Vec<Exchange> {
        self.orchestrator.history()
    }

    /// Clears the conversation history.
    pub fn clear_chat_history(&self) {
        self.orchestrator.clear_history();
    }
}

fn to_search_result(m: IndexMatch) -> DocumentSearchResult {
    let metadata = m.metadata.unwrap_or_default();
    let content = metadata
        .get("content")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    DocumentSearchResult {
        id: m.id,
        score: m.score,
        content,
        metadata,
    }
}
