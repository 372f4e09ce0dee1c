//! Legal-hierarchy-aware document chunking.
//!
//! Four strategies, dispatched on document type: case law (court-opinion
//! section boundaries), policy (numbered-section boundaries), training
//! (module boundaries), and general (sentence packing). All strategies
//! honor a target chunk size with sentence/paragraph re-breaking and a
//! bounded carried overlap, and extract legal metadata from each chunk's
//! own content.

mod case_law;
mod detect;
mod general;
mod policy;
mod training;
mod traits;

pub use case_law::CaseLawChunker;
pub use detect::detect_document_type;
pub use general::GeneralChunker;
pub use policy::PolicyChunker;
pub use training::TrainingChunker;
pub use traits::{Chunker, ChunkerConfig};

use crate::core::{Chunk, DocumentType};
use crate::error::Result;

/// Default target chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Default overlap carried between consecutive chunks, in characters.
pub const DEFAULT_OVERLAP: usize = 200;

/// Creates the chunker for a document type.
#[must_use]
pub fn create_chunker(document_type: DocumentType) -> Box<dyn Chunker> {
    match document_type {
        DocumentType::CaseLaw => Box::new(CaseLawChunker::new()),
        DocumentType::Policy => Box::new(PolicyChunker::new()),
        DocumentType::Training => Box::new(TrainingChunker::new()),
        DocumentType::General => Box::new(GeneralChunker::new()),
    }
}

/// Chunks a document with the strategy for its type.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or a strategy
/// produces an empty chunk.
pub fn chunk_document(
    document_id: &str,
    text: &str,
    document_type: DocumentType,
    config: &ChunkerConfig,
) -> Result<Vec<Chunk>> {
    let chunker = create_chunker(document_type);
    chunker.validate(config)?;
    chunker.chunk(document_id, text, config)
}

/// A trimmed source line with its character span in the original text.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SourceLine<'a> {
    /// Char offset of the trimmed line start.
    pub start: usize,
    /// Char offset one past the trimmed line end.
    pub end: usize,
    /// The trimmed line text. Empty for blank lines.
    pub text: &'a str,
}

/// Splits text into trimmed lines with character offsets.
///
/// Blank lines are kept (with empty `text`) so strategies that care about
/// paragraph boundaries can see them.
pub(crate) fn source_lines(text: &str) -> Vec<SourceLine<'_>> {
    let mut lines = Vec::new();
    let mut pos = 0usize;
    for raw in text.split('\n') {
        let raw_chars = raw.chars().count();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            lines.push(SourceLine {
                start: pos,
                end: pos,
                text: "",
            });
        } else {
            let leading = raw.chars().take_while(|c| c.is_whitespace()).count();
            let start = pos + leading;
            lines.push(SourceLine {
                start,
                end: start + trimmed.chars().count(),
                text: trimmed,
            });
        }
        pos += raw_chars + 1;
    }
    lines
}
