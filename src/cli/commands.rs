//! CLI command execution.
//!
//! Each command returns its rendered output; the binary decides where
//! it goes.

use crate::chunking::{ChunkerConfig, chunk_document, detect_document_type};
use crate::cli::{Cli, Commands};
use crate::config::ServiceConfig;
use crate::core::{DocumentType, Jurisdiction};
use crate::embedding::{DEFAULT_DIMENSIONS, HashEmbedder};
use crate::enhance::QueryEnhancer;
use crate::error::{Error, Result};
use crate::index::MemoryIndex;
use crate::ingest::UploadMetadata;
use crate::llm::ScriptedModel;
use crate::service::LegalRagService;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

/// Executes one CLI command and returns its output.
///
/// # Errors
///
/// Returns an error when the underlying operation fails.
pub async fn execute(cli: &Cli) -> Result<String> {
    match &cli.command {
        Commands::Chunk {
            file,
            document_type,
            chunk_size,
            overlap,
        } => chunk_file(file, document_type.as_deref(), *chunk_size, *overlap, cli.json).await,
        Commands::Detect { file } => detect_file(file, cli.json).await,
        Commands::Enhance { query } => enhance_query(query, cli.json),
        Commands::Search {
            corpus,
            query,
            top_k,
            jurisdiction,
        } => search_corpus(corpus, query, *top_k, jurisdiction, cli.json).await,
    }
}

async fn chunk_file(
    file: &Path,
    document_type: Option<&str>,
    chunk_size: usize,
    overlap: usize,
    json: bool,
) -> Result<String> {
    let extraction = crate::extract::extract(file).await?;
    let document_type = document_type.map_or_else(
        || detect_document_type(&extraction.text),
        DocumentType::parse,
    );
    let config = ChunkerConfig::new().with_size(chunk_size).with_overlap(overlap);
    let chunks = chunk_document("cli", &extraction.text, document_type, &config)?;

    if json {
        return to_json(&chunks);
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} chunks ({document_type}) from {}",
        chunks.len(),
        file.display()
    );
    for chunk in &chunks {
        let _ = writeln!(
            out,
            "[{}] {} chars, class={}, statutes={}, citations={}",
            chunk.ordinal,
            chunk.content.chars().count(),
            chunk.class,
            chunk.metadata.statute_numbers.len(),
            chunk.metadata.case_citations.len(),
        );
        let _ = writeln!(out, "    {}", chunk.preview(96).replace('\n', " "));
    }
    Ok(out)
}

async fn detect_file(file: &Path, json: bool) -> Result<String> {
    let extraction = crate::extract::extract(file).await?;
    let detected = detect_document_type(&extraction.text);
    if json {
        Ok(format!("{{\"document_type\":\"{detected}\"}}\n"))
    } else {
        Ok(format!("{detected}\n"))
    }
}

fn enhance_query(query: &str, json: bool) -> Result<String> {
    let enhancement = QueryEnhancer::new().enhance(query);
    if json {
        return to_json(&enhancement);
    }

    let mut out = String::new();
    let _ = writeln!(out, "original:  {}", enhancement.original);
    let _ = writeln!(out, "enhanced:  {}", enhancement.enhanced);
    for (abbr, full) in &enhancement.abbreviations {
        let _ = writeln!(out, "expanded:  {abbr} -> {full}");
    }
    for (wrong, right) in &enhancement.corrections {
        let _ = writeln!(out, "corrected: {wrong} -> {right}");
    }
    if !enhancement.synonyms_added.is_empty() {
        let _ = writeln!(out, "synonyms:  {}", enhancement.synonyms_added.join(", "));
    }
    Ok(out)
}

async fn search_corpus(
    corpus: &Path,
    query: &str,
    top_k: usize,
    jurisdiction: &str,
    json: bool,
) -> Result<String> {
    let service = in_process_service(corpus)?;
    ingest_directory(&service, corpus).await?;

    let jurisdiction = Jurisdiction::parse(jurisdiction);
    let response = service.ask(query, jurisdiction, true).await?;

    if json {
        return to_json(&response);
    }

    let mut out = String::new();
    let _ = writeln!(out, "query:      {query}");
    let _ = writeln!(out, "enhanced:   {}", response.enhanced_query);
    let _ = writeln!(out, "confidence: {:.3}", response.confidence);
    for source in response.source_documents.iter().take(top_k) {
        let _ = writeln!(
            out,
            "#{} [{:.3}] {} ({}, {})",
            source.source_number,
            source.relevance_score,
            source.file_name.as_deref().unwrap_or("unknown"),
            source.document_type,
            source.jurisdiction,
        );
        let _ = writeln!(out, "    {}", source.content_preview.replace('\n', " "));
    }
    if !response.citation_chain.is_empty() {
        let _ = writeln!(out, "citations:  {}", response.citation_chain.join(", "));
    }
    Ok(out)
}

/// Builds a fully in-process service for one-shot commands.
fn in_process_service(corpus: &Path) -> Result<LegalRagService> {
    let config = ServiceConfig {
        upload_dir: std::env::temp_dir().join("lexrag-cli-uploads"),
        graph_path: corpus.join("cross_references.json"),
        ..Default::default()
    };
    LegalRagService::new(
        config,
        Arc::new(HashEmbedder::new(DEFAULT_DIMENSIONS)),
        Arc::new(MemoryIndex::new(DEFAULT_DIMENSIONS)),
        Arc::new(ScriptedModel::new(
            "Generation is disabled in the standalone runner; see the ranked sources below.",
        )),
    )
}

/// Ingests every supported file directly under the corpus directory.
async fn ingest_directory(service: &LegalRagService, corpus: &Path) -> Result<usize> {
    let mut entries = tokio::fs::read_dir(corpus)
        .await
        .map_err(crate::error::IngestError::from)?;

    let mut submitted = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(crate::error::IngestError::from)? {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !crate::extract::is_allowed_file(file_name) {
            continue;
        }
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(crate::error::IngestError::from)?;
        submitted.push(
            service
                .submit_upload(file_name, bytes, UploadMetadata::default())
                .await?,
        );
    }

    if submitted.is_empty() {
        return Err(Error::InvalidState {
            message: format!("no supported documents in {}", corpus.display()),
        });
    }

    // Wait for every worker to reach a terminal state.
    loop {
        let pending = submitted
            .iter()
            .filter(|id| {
                service
                    .task_status(**id)
                    .is_ok_and(|task| !task.state.is_terminal())
            })
            .count();
        if pending == 0 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    Ok(submitted.len())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| Error::InvalidState {
        message: format!("could not serialize output: {e}"),
    })
}
