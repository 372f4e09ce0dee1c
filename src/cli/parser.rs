//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// lexrag: retrieval-augmented question answering over legal corpora.
///
/// The standalone runner chunks files, inspects query enhancement, and
/// runs one-shot hybrid searches over a corpus directory using the
/// in-process embedder and index.
#[derive(Parser, Debug)]
#[command(name = "lexrag")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Emit JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Chunk a document and print the resulting passages.
    Chunk {
        /// Path to the document.
        file: PathBuf,

        /// Document type (case_law, policy, training, general).
        /// Auto-detected when omitted.
        #[arg(short = 't', long)]
        document_type: Option<String>,

        /// Target chunk size in characters.
        #[arg(long, default_value = "1000")]
        chunk_size: usize,

        /// Overlap between chunks in characters.
        #[arg(long, default_value = "200")]
        overlap: usize,
    },

    /// Detect the document type of a file.
    Detect {
        /// Path to the document.
        file: PathBuf,
    },

    /// Show how a query would be enhanced.
    Enhance {
        /// The query to enhance.
        query: String,
    },

    /// Ingest a corpus directory and run one hybrid search against it.
    Search {
        /// Directory of documents to ingest.
        #[arg(short, long, env = "LEXRAG_CORPUS_DIR")]
        corpus: PathBuf,

        /// The question to search for.
        query: String,

        /// Number of results to return.
        #[arg(short = 'k', long, default_value = "5")]
        top_k: usize,

        /// Jurisdiction preference (federal, state).
        #[arg(short, long, default_value = "federal")]
        jurisdiction: String,
    },
}
