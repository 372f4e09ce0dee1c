//! Core domain types for lexrag.
//!
//! Documents, chunks, and the tag enums (document type, jurisdiction,
//! law status) that flow through ingestion and retrieval.

mod chunk;
mod document;

pub use chunk::{Chunk, ChunkClass, ChunkMetadata, MetaValue, find_char_boundary};
pub use document::{
    Document, DocumentType, Jurisdiction, LawStatus, ProcessingReport, build_report, document_id,
};
