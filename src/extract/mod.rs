//! Text extraction from uploaded files.
//!
//! Dispatches on the file extension and returns the raw text plus a
//! small metadata bag. Failures are classified as unsupported type,
//! decode failure, or missing extractor capability; the ingestion
//! manager decides what to do with them, there are no retries here.

mod docx;
mod html;
mod pdf;
mod text;

use crate::error::{ExtractError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Recognized upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    /// Plain text or Markdown.
    Text,
    /// PDF.
    Pdf,
    /// DOCX (and legacy DOC, parsed with the same reader).
    Docx,
    /// HTML.
    Html,
}

/// Extensions accepted for upload.
pub const ALLOWED_EXTENSIONS: &[&str] = &["txt", "md", "pdf", "docx", "doc", "html", "htm"];

/// Metadata bag captured during extraction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    /// File size in bytes.
    pub file_size: u64,
    /// Page count, when the format reports one.
    pub page_count: Option<usize>,
    /// Paragraph count, when the format reports one.
    pub paragraph_count: Option<usize>,
    /// Table count, when the format reports one.
    pub table_count: Option<usize>,
    /// Filesystem creation time, when available.
    pub created: Option<DateTime<Utc>>,
    /// Filesystem modification time, when available.
    pub modified: Option<DateTime<Utc>>,
}

/// Raw text plus metadata for one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Extraction {
    /// The extracted UTF-8 text.
    pub text: String,
    /// The metadata bag.
    pub metadata: ExtractionMetadata,
}

/// Maps a path to its file kind.
///
/// # Errors
///
/// Returns `UnsupportedType` when the extension is not in
/// [`ALLOWED_EXTENSIONS`].
pub fn detect_file_kind(path: &Path) -> Result<FileKind> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "txt" | "md" => Ok(FileKind::Text),
        "pdf" => Ok(FileKind::Pdf),
        "docx" | "doc" => Ok(FileKind::Docx),
        "html" | "htm" => Ok(FileKind::Html),
        _ => Err(ExtractError::UnsupportedType { extension }.into()),
    }
}

/// Checks whether a file name carries an accepted extension.
#[must_use]
pub fn is_allowed_file(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| ALLOWED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
}

/// Extracts text and metadata from a file.
///
/// # Errors
///
/// Returns an error on unsupported types, unreadable files, decode
/// failures, and format-level parse failures.
pub async fn extract(path: &Path) -> Result<Extraction> {
    let kind = detect_file_kind(path)?;

    let bytes = tokio::fs::read(path).await.map_err(|e| ExtractError::ReadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut metadata = file_times(path).await;
    metadata.file_size = bytes.len() as u64;

    let text = match kind {
        FileKind::Text => text::extract_text_file(&bytes, path)?,
        FileKind::Pdf => pdf::extract_pdf(bytes, &mut metadata).await?,
        FileKind::Docx => docx::extract_docx(bytes, &mut metadata).await?,
        FileKind::Html => html::extract_html(&bytes, path)?,
    };

    Ok(Extraction { text, metadata })
}

async fn file_times(path: &Path) -> ExtractionMetadata {
    let mut metadata = ExtractionMetadata::default();
    if let Ok(fs_meta) = tokio::fs::metadata(path).await {
        metadata.created = fs_meta.created().ok().map(DateTime::<Utc>::from);
        metadata.modified = fs_meta.modified().ok().map(DateTime::<Utc>::from);
    }
    metadata
}
