//! The ingestion pipeline for one file.
//!
//! Extraction, chunking, metadata annotation, batched embedding, and the
//! vector-index upsert, followed by citation-graph and cross-reference
//! updates. Also the document-level operations the service surface
//! needs: listing and cascading deletion.

use crate::chunking::{ChunkerConfig, chunk_document, detect_document_type};
use crate::context::CitationGraph;
use crate::core::{
    Chunk, Document, DocumentType, MetaValue, build_report, document_id,
};
use crate::embedding::EmbeddingClient;
use crate::error::{IngestError, Result};
use crate::extract::extract;
use crate::index::{MetadataFilter, MetadataMap, VectorIndex, VectorRecord};
use crate::ingest::task::{TaskResult, UploadMetadata};
use crate::patterns;
use crate::xref::CrossReferenceEngine;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Chunks embedded and upserted per batch.
pub const EMBED_BATCH_SIZE: usize = 100;

/// Content characters stored on the index per chunk.
const STORED_CONTENT_CHARS: usize = 1000;

/// A document as listed from the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    /// Document id.
    pub document_id: String,
    /// Chunk class most chunks carry.
    pub document_type: String,
    /// Original file name, when recorded.
    pub file_name: Option<String>,
    /// Number of indexed chunks.
    pub chunk_count: usize,
}

/// Outcome of processing one file.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    /// Task-facing result summary.
    pub result: TaskResult,
    /// The full document record.
    pub document: Document,
}

/// Runs the extract → chunk → embed → upsert pipeline.
pub struct DocumentProcessor {
    embedder: Arc<dyn EmbeddingClient>,
    index: Arc<dyn VectorIndex>,
    citations: Arc<CitationGraph>,
    xref: Arc<CrossReferenceEngine>,
    chunker_config: ChunkerConfig,
}

impl DocumentProcessor {
    /// Creates a processor over the given collaborators.
    #[must_use]
    pub fn new(
        embedder: Arc<dyn EmbeddingClient>,
        index: Arc<dyn VectorIndex>,
        citations: Arc<CitationGraph>,
        xref: Arc<CrossReferenceEngine>,
    ) -> Self {
        Self {
            embedder,
            index,
            citations,
            xref,
            chunker_config: ChunkerConfig::default(),
        }
    }

    /// Overrides the chunker configuration.
    #[must_use]
    pub fn with_chunker_config(mut self, config: ChunkerConfig) -> Self {
        self.chunker_config = config;
        self
    }

    /// Processes one file into indexed chunks.
    ///
    /// `on_progress` receives percentage/message checkpoints as the
    /// stages complete.
    ///
    /// # Errors
    ///
    /// Returns an error on extraction failure, empty extraction, zero
    /// chunks, or collaborator failure. No index writes happen unless
    /// chunking succeeded.
    pub async fn process_file(
        &self,
        path: &Path,
        file_name: &str,
        upload: &UploadMetadata,
        on_progress: &(dyn Fn(u8, &str) + Send + Sync),
    ) -> Result<ProcessOutcome> {
        let bytes = tokio::fs::read(path).await.map_err(IngestError::from)?;
        let doc_id = document_id(file_name, &bytes);

        let extraction = extract(path).await?;
        if extraction.text.trim().is_empty() {
            return Err(IngestError::EmptyExtraction {
                file_name: file_name.to_string(),
            }
            .into());
        }
        on_progress(30, "text extracted");

        let document_type = upload
            .document_type
            .unwrap_or_else(|| detect_document_type(&extraction.text));

        let mut chunks = chunk_document(&doc_id, &extraction.text, document_type, &self.chunker_config)?;
        if chunks.is_empty() {
            return Err(IngestError::NoChunks {
                file_name: file_name.to_string(),
            }
            .into());
        }
        for chunk in &mut chunks {
            annotate(chunk, file_name, upload);
        }
        on_progress(50, "document chunked");

        self.embed_and_upsert(&chunks, &doc_id, document_type, on_progress)
            .await?;

        // Citation relationships feed the context assembler's chain
        // expansion on the query path.
        for chunk in &chunks {
            self.citations
                .record_chunk(&patterns::extract_citations(&chunk.content));
        }

        on_progress(95, "updating cross-references");
        if let Err(e) = self.xref.record_document(&doc_id, &extraction.text).await {
            warn!(document_id = %doc_id, error = %e, "cross-reference pass failed");
        }

        let document = Document {
            id: doc_id.clone(),
            file_name: file_name.to_string(),
            document_type,
            jurisdiction: upload.jurisdiction,
            law_status: upload.law_status,
            ingested_at: Utc::now(),
            chunk_count: chunks.len(),
            report: build_report(&extraction.text, document_type),
        };

        info!(document_id = %doc_id, chunks = chunks.len(), "document ingested");
        Ok(ProcessOutcome {
            result: TaskResult {
                document_id: doc_id,
                chunks_created: chunks.len(),
                file_name: file_name.to_string(),
                document_type,
            },
            document,
        })
    }

    /// Deletes a document and all of its chunks from the index.
    ///
    /// # Errors
    ///
    /// Returns an error when the index call fails.
    pub async fn delete_document(&self, document_id: &str) -> Result<usize> {
        let removed = self
            .index
            .delete(&MetadataFilter::field("document_id", document_id))
            .await?;
        info!(document_id, removed, "document deleted");
        Ok(removed)
    }

    /// Lists the documents currently present on the index, aggregated
    /// from chunk metadata.
    ///
    /// # Errors
    ///
    /// Returns an error when the index call fails.
    pub async fn list_documents(&self) -> Result<Vec<DocumentSummary>> {
        let items = self.index.list(10_000).await?;
        let mut documents: BTreeMap<String, DocumentSummary> = BTreeMap::new();

        for item in items {
            let metadata = item.metadata.unwrap_or_default();
            let Some(doc_id) = metadata.get("document_id").and_then(|v| v.as_str()) else {
                continue;
            };
            let entry = documents
                .entry(doc_id.to_string())
                .or_insert_with(|| DocumentSummary {
                    document_id: doc_id.to_string(),
                    document_type: metadata
                        .get("chunk_type")
                        .and_then(|v| v.as_str())
                        .unwrap_or("general")
                        .to_string(),
                    file_name: metadata
                        .get("file_name")
                        .and_then(|v| v.as_str())
                        .map(ToString::to_string),
                    chunk_count: 0,
                });
            entry.chunk_count += 1;
        }

        Ok(documents.into_values().collect())
    }

    /// Embeds the chunks in batches and upserts them keyed
    /// `{document_id}_{ordinal}`.
    async fn embed_and_upsert(
        &self,
        chunks: &[Chunk],
        doc_id: &str,
        document_type: DocumentType,
        on_progress: &(dyn Fn(u8, &str) + Send + Sync),
    ) -> Result<()> {
        let total_batches = chunks.len().div_ceil(EMBED_BATCH_SIZE);

        for (batch_index, batch) in chunks.chunks(EMBED_BATCH_SIZE).enumerate() {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let vectors = self.embedder.encode(&texts).await?;

            let records: Vec<VectorRecord> = batch
                .iter()
                .zip(vectors)
                .map(|(chunk, vector)| VectorRecord {
                    id: chunk.id.clone(),
                    vector,
                    metadata: index_metadata(chunk, doc_id, document_type, chunks.len()),
                })
                .collect();
            self.index.upsert(records).await?;

            #[allow(clippy::cast_possible_truncation)]
            let progress = 60 + (30 * (batch_index + 1) / total_batches) as u8;
            on_progress(progress, "embedding and indexing chunks");
        }
        Ok(())
    }
}

/// Annotates a chunk with the original file name and the uploader's
/// supplied tags.
fn annotate(chunk: &mut Chunk, file_name: &str, upload: &UploadMetadata) {
    chunk.metadata.file_name = Some(file_name.to_string());
    chunk
        .metadata
        .extensions
        .insert("jurisdiction".to_string(), MetaValue::from(upload.jurisdiction.as_str()));
    chunk
        .metadata
        .extensions
        .insert("law_status".to_string(), MetaValue::from(upload.law_status.as_str()));
    if let Some(uploaded_by) = &upload.uploaded_by {
        chunk
            .metadata
            .extensions
            .insert("uploaded_by".to_string(), MetaValue::from(uploaded_by.as_str()));
    }
}

/// Builds the flattened metadata map stored with a chunk's vector.
fn index_metadata(
    chunk: &Chunk,
    doc_id: &str,
    document_type: DocumentType,
    total_chunks: usize,
) -> MetadataMap {
    let mut metadata = chunk.metadata.flatten();
    metadata.insert("document_id".to_string(), MetaValue::from(doc_id));
    metadata.insert("document_type".to_string(), MetaValue::from(document_type.as_str()));
    metadata.insert("chunk_type".to_string(), MetaValue::from(chunk.class.as_str()));
    metadata.insert("chunk_index".to_string(), MetaValue::from(chunk.ordinal.to_string()));
    metadata.insert("total_chunks".to_string(), MetaValue::from(total_chunks.to_string()));
    let stored: String = chunk.content.chars().take(STORED_CONTENT_CHARS).collect();
    metadata.insert("content".to_string(), MetaValue::from(stored));
    metadata.insert("processed_at".to_string(), MetaValue::from(Utc::now().to_rfc3339()));
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::{DEFAULT_DIMENSIONS, HashEmbedder};
    use crate::index::MemoryIndex;
    use crate::xref::ReferenceGraph;
    use std::io::Write;

    fn processor() -> (DocumentProcessor, Arc<MemoryIndex>) {
        let embedder = Arc::new(HashEmbedder::new(DEFAULT_DIMENSIONS));
        let index = Arc::new(MemoryIndex::new(DEFAULT_DIMENSIONS));
        let citations = Arc::new(CitationGraph::new());
        let xref = Arc::new(CrossReferenceEngine::new(
            index.clone(),
            embedder.clone(),
            Arc::new(ReferenceGraph::new()),
        ));
        (
            DocumentProcessor::new(embedder, index.clone(), citations, xref),
            index,
        )
    }

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{content}").unwrap();
        path
    }

    #[tokio::test]
    async fn test_process_file_indexes_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "opinion.txt",
            "OPINION\nThe court holds that 18 U.S.C. 2703 requires a warrant.\nDISSENT\nI dissent from the holding.",
        );
        let (processor, index) = processor();

        let upload = UploadMetadata {
            document_type: Some(DocumentType::CaseLaw),
            ..Default::default()
        };
        let outcome = processor
            .process_file(&path, "opinion.txt", &upload, &|_, _| {})
            .await
            .unwrap();

        assert_eq!(outcome.result.chunks_created, 2);
        assert_eq!(outcome.result.document_type, DocumentType::CaseLaw);
        assert_eq!(index.len().await, 2);

        // Chunk ids are keyed {document_id}_{ordinal}.
        let listed = index.list(10).await.unwrap();
        for item in &listed {
            assert!(item.id.starts_with(&outcome.result.document_id));
        }
    }

    #[tokio::test]
    async fn test_metadata_carries_upload_tags() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "policy.txt", "1.1 Purpose\nApplies to everyone.");
        let (processor, index) = processor();

        let upload = UploadMetadata {
            document_type: Some(DocumentType::Policy),
            jurisdiction: crate::core::Jurisdiction::State,
            law_status: crate::core::LawStatus::Current,
            uploaded_by: Some("records".to_string()),
        };
        processor
            .process_file(&path, "policy.txt", &upload, &|_, _| {})
            .await
            .unwrap();

        let listed = index.list(10).await.unwrap();
        let metadata = listed[0].metadata.as_ref().unwrap();
        assert_eq!(
            metadata.get("jurisdiction"),
            Some(&MetaValue::from("state"))
        );
        assert_eq!(
            metadata.get("file_name"),
            Some(&MetaValue::from("policy.txt"))
        );
        assert_eq!(
            metadata.get("uploaded_by"),
            Some(&MetaValue::from("records"))
        );
        assert_eq!(
            metadata.get("chunk_type"),
            Some(&MetaValue::from("policy_section"))
        );
    }

    #[tokio::test]
    async fn test_empty_extraction_fails_without_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "empty.txt", "   \n  ");
        let (processor, index) = processor();

        let result = processor
            .process_file(&path, "empty.txt", &UploadMetadata::default(), &|_, _| {})
            .await;
        assert!(result.is_err());
        assert_eq!(index.len().await, 0);
    }

    #[tokio::test]
    async fn test_auto_detection_when_type_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "case.txt",
            "Case No. 21-1234\nOpinion of the Court\nThe petitioner appeals the judgment.",
        );
        let (processor, _) = processor();

        let outcome = processor
            .process_file(&path, "case.txt", &UploadMetadata::default(), &|_, _| {})
            .await
            .unwrap();
        assert_eq!(outcome.result.document_type, DocumentType::CaseLaw);
    }

    #[tokio::test]
    async fn test_delete_document_cascades() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "opinion.txt",
            "OPINION\nFirst holding text.\nDISSENT\nSecond opinion text.",
        );
        let (processor, index) = processor();

        let upload = UploadMetadata {
            document_type: Some(DocumentType::CaseLaw),
            ..Default::default()
        };
        let outcome = processor
            .process_file(&path, "opinion.txt", &upload, &|_, _| {})
            .await
            .unwrap();
        assert_eq!(index.len().await, 2);

        let removed = processor
            .delete_document(&outcome.result.document_id)
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(index.len().await, 0);
    }

    #[tokio::test]
    async fn test_list_documents_groups_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let (processor, _) = processor();

        for name in ["a.txt", "b.txt"] {
            let path = write_file(
                &dir,
                name,
                "OPINION\nSome holding text here.\nDISSENT\nSome dissent text here.",
            );
            processor
                .process_file(
                    &path,
                    name,
                    &UploadMetadata {
                        document_type: Some(DocumentType::CaseLaw),
                        ..Default::default()
                    },
                    &|_, _| {},
                )
                .await
                .unwrap();
        }

        let documents = processor.list_documents().await.unwrap();
        assert_eq!(documents.len(), 2);
        for doc in &documents {
            assert_eq!(doc.chunk_count, 2);
            assert!(doc.file_name.is_some());
        }
    }

    #[tokio::test]
    async fn test_progress_checkpoints_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "note.txt", "A short general note about procedures.");
        let (processor, _) = processor();

        let seen = std::sync::Mutex::new(Vec::new());
        processor
            .process_file(&path, "note.txt", &UploadMetadata::default(), &|pct, _| {
                seen.lock().unwrap().push(pct);
            })
            .await
            .unwrap();

        let seen = seen.into_inner().unwrap();
        assert!(seen.contains(&30));
        assert!(seen.contains(&50));
        assert!(seen.iter().any(|&p| p >= 90));
    }
}
