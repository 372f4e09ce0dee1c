//! # lexrag
//!
//! Retrieval-augmented question answering over legal corpora.
//!
//! lexrag ingests legal documents (case law, policies, training
//! material), splits them into hierarchy-aware chunks with legal
//! metadata, embeds and indexes them, and answers natural-language
//! questions with source citations, a confidence score, and safety
//! flags.
//!
//! ## Features
//!
//! - **Chunking**: per-document-type strategies that respect legal
//!   structure (opinion sections, numbered policy sections, training
//!   modules) with bounded overlap
//! - **Hybrid search**: semantic retrieval combined with
//!   metadata-filtered statute/case lookups and five-factor relevance
//!   scoring
//! - **Context assembly**: bounded context windows with citation-chain
//!   expansion
//! - **Background ingestion**: one independent worker per upload with a
//!   monotonic task lifecycle
//! - **Cross-referencing**: entity-overlap similarity with a persisted
//!   relationship graph
//!
//! The embedding model, vector store, and LLM are external
//! collaborators consumed through the [`embedding::EmbeddingClient`],
//! [`index::VectorIndex`], and [`llm::LanguageModel`] traits.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![warn(unsafe_code)]

pub mod answer;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod context;
pub mod core;
pub mod embedding;
pub mod enhance;
pub mod error;
pub mod extract;
pub mod index;
pub mod ingest;
pub mod llm;
pub mod patterns;
pub mod safety;
pub mod search;
pub mod service;
pub mod xref;

// Re-export commonly used types at crate root
pub use error::{Error, Result};

// Re-export core domain types
pub use crate::core::{
    Chunk, ChunkClass, ChunkMetadata, Document, DocumentType, Jurisdiction, LawStatus,
};

// Re-export configuration and service wiring
pub use config::ServiceConfig;
pub use service::{HealthStatus, LegalRagService};

// Re-export collaborator contracts
pub use embedding::{DEFAULT_DIMENSIONS, EmbeddingClient, HashEmbedder};
pub use index::{MemoryIndex, MetadataFilter, VectorIndex, VectorRecord};
pub use llm::LanguageModel;

// Re-export the pipeline surfaces
pub use answer::{AnswerEvent, AnswerOrchestrator, AnswerResponse};
pub use chunking::{Chunker, ChunkerConfig, chunk_document, detect_document_type};
pub use enhance::{QueryEnhancement, QueryEnhancer};
pub use ingest::{IngestionManager, IngestionTask, TaskState, UploadMetadata};
pub use search::{HybridSearcher, SearchOutcome, SearchResult};
