//! Error types for lexrag operations.
//!
//! This module provides the error hierarchy using `thiserror` for all
//! operations including extraction, chunking, retrieval, ingestion, and
//! collaborator (embedding / vector index / LLM) calls.

use thiserror::Error;

/// Result type alias for lexrag operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error types for lexrag operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Text-extraction errors (file parsing).
    #[error("extraction error: {0}")]
    Extract(#[from] ExtractError),

    /// Chunking-related errors (text segmentation).
    #[error("chunking error: {0}")]
    Chunking(#[from] ChunkingError),

    /// Retrieval errors (query handling).
    #[error("search error: {0}")]
    Search(#[from] SearchError),

    /// Ingestion pipeline and task-lifecycle errors.
    #[error("ingestion error: {0}")]
    Ingest(#[from] IngestError),

    /// External collaborator errors (embedding, vector index, LLM).
    #[error("collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),

    /// Invalid state errors.
    #[error("invalid state: {message}")]
    InvalidState {
        /// Description of the invalid state.
        message: String,
    },

    /// Configuration errors.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },
}

/// Extraction-specific errors for pulling text out of uploaded files.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// File extension is not in the accepted set.
    #[error("unsupported file type: {extension}")]
    UnsupportedType {
        /// The rejected extension.
        extension: String,
    },

    /// File not found on disk.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path to the file that was not found.
        path: String,
    },

    /// File bytes could not be decoded with any known encoding.
    #[error("failed to decode file: {path}")]
    DecodeFailed {
        /// Path to the undecodable file.
        path: String,
    },

    /// A required extraction capability is not available in this build.
    #[error("extractor unavailable: {capability}")]
    ExtractorUnavailable {
        /// Name of the missing capability (e.g. "ocr").
        capability: String,
    },

    /// Failed to read the file from disk.
    #[error("failed to read file: {path}: {reason}")]
    ReadFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Format-level parse failure (corrupt PDF/DOCX/HTML).
    #[error("failed to parse {format} file: {reason}")]
    Parse {
        /// The file format being parsed.
        format: String,
        /// Reason for failure.
        reason: String,
    },
}

/// Chunking-specific errors for text segmentation.
#[derive(Error, Debug)]
pub enum ChunkingError {
    /// Invalid chunker configuration.
    #[error("invalid chunk configuration: {reason}")]
    InvalidConfig {
        /// Reason the configuration is invalid.
        reason: String,
    },

    /// Overlap must be strictly smaller than the chunk size.
    #[error("overlap {overlap} must be less than chunk size {size}")]
    OverlapTooLarge {
        /// Overlap size.
        overlap: usize,
        /// Chunk size.
        size: usize,
    },

    /// A strategy produced a chunk with no content.
    #[error("chunk {ordinal} has empty content")]
    EmptyChunk {
        /// Ordinal of the offending chunk.
        ordinal: usize,
    },
}

/// Retrieval-specific errors.
#[derive(Error, Debug)]
pub enum SearchError {
    /// The question was empty or whitespace-only.
    #[error("query must not be empty")]
    EmptyQuery,

    /// The requested result count was zero.
    #[error("result count must be greater than zero")]
    ZeroResults,
}

/// Ingestion pipeline and task-lifecycle errors.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Unknown task id.
    #[error("task not found: {id}")]
    TaskNotFound {
        /// The unknown task id.
        id: String,
    },

    /// Upload exceeded the configured size cap.
    #[error("upload of {size} bytes exceeds maximum {max}")]
    UploadTooLarge {
        /// Size of the rejected upload.
        size: u64,
        /// Configured maximum.
        max: u64,
    },

    /// Upload had no content.
    #[error("uploaded file is empty")]
    EmptyUpload,

    /// Extraction produced no text.
    #[error("no text extracted from {file_name}")]
    EmptyExtraction {
        /// File that yielded no text.
        file_name: String,
    },

    /// Chunking produced no chunks.
    #[error("no chunks produced from {file_name}")]
    NoChunks {
        /// File that yielded no chunks.
        file_name: String,
    },

    /// The task was cancelled before completion.
    #[error("task cancelled")]
    Cancelled,

    /// Filesystem failure in the upload area.
    #[error("upload I/O error: {reason}")]
    Io {
        /// Reason for failure.
        reason: String,
    },
}

/// External collaborator errors.
///
/// Transient failures are surfaced to the caller without retries; retry
/// policy belongs to the caller, not the core.
#[derive(Error, Debug)]
pub enum CollaboratorError {
    /// Embedding provider failure.
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Vector index failure.
    #[error("vector index error: {0}")]
    Index(String),

    /// LLM completion failure.
    #[error("completion error: {0}")]
    Completion(String),

    /// Embedder and index dimensions disagree; fatal at startup.
    #[error("embedding dimension {embedder} does not match index dimension {index}")]
    DimensionMismatch {
        /// Dimension reported by the embedding client.
        embedder: usize,
        /// Dimension configured on the index.
        index: usize,
    },

    /// An external call exceeded its deadline.
    #[error("{operation} timed out")]
    Timeout {
        /// Name of the operation that timed out.
        operation: String,
    },
}

// Implement From traits for standard library errors

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Ingest(IngestError::Io {
            reason: err.to_string(),
        })
    }
}

impl From<std::io::Error> for IngestError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            reason: err.to_string(),
        }
    }
}
