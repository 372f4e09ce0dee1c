//! Chunker trait definition.
//!
//! Defines the interface for the per-document-type chunking strategies.

use crate::core::{Chunk, ChunkClass};
use crate::error::{ChunkingError, Result};

/// Size parameters for a chunking run.
#[derive(Debug, Clone, Copy)]
pub struct ChunkerConfig {
    /// Target chunk size in characters.
    pub chunk_size: usize,
    /// Overlap carried between consecutive chunks, in characters.
    pub overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: super::DEFAULT_CHUNK_SIZE,
            overlap: super::DEFAULT_OVERLAP,
        }
    }
}

impl ChunkerConfig {
    /// Creates a config with default size and overlap.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the chunk size.
    #[must_use]
    pub const fn with_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Sets the overlap.
    #[must_use]
    pub const fn with_overlap(mut self, overlap: usize) -> Self {
        self.overlap = overlap;
        self
    }
}

/// Trait for chunking text into passages.
///
/// Implementations must be `Send + Sync` and deterministic: the same
/// input and configuration always produce byte-identical chunk
/// boundaries.
pub trait Chunker: Send + Sync {
    /// Chunks the input text.
    ///
    /// # Arguments
    ///
    /// * `document_id` - Id of the owning document; chunk ids derive
    ///   from it.
    /// * `text` - The extracted document text.
    /// * `config` - Size and overlap parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    fn chunk(&self, document_id: &str, text: &str, config: &ChunkerConfig) -> Result<Vec<Chunk>>;

    /// The chunk class this strategy produces.
    fn class(&self) -> ChunkClass;

    /// Returns the name of the chunking strategy.
    fn name(&self) -> &'static str;

    /// Validates configuration before chunking.
    ///
    /// # Errors
    ///
    /// Returns an error if chunk size is zero or overlap reaches the
    /// chunk size.
    fn validate(&self, config: &ChunkerConfig) -> Result<()> {
        if config.chunk_size == 0 {
            return Err(ChunkingError::InvalidConfig {
                reason: "chunk_size must be > 0".to_string(),
            }
            .into());
        }
        if config.overlap >= config.chunk_size {
            return Err(ChunkingError::OverlapTooLarge {
                overlap: config.overlap,
                size: config.chunk_size,
            }
            .into());
        }
        Ok(())
    }
}
