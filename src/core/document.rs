//! Document representation and classification tags.
//!
//! A `Document` is the unit of ingestion: created once when a file is
//! processed, never mutated, and deleted only as a whole (which cascades
//! to its chunks in the vector index).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use unicode_segmentation::UnicodeSegmentation;

/// Kind of legal document, driving the chunking strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// Court opinions, dissents, concurrences.
    CaseLaw,
    /// Department policies and procedures.
    Policy,
    /// Training modules and course material.
    Training,
    /// Anything else.
    General,
}

impl DocumentType {
    /// Returns the canonical snake_case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CaseLaw => "case_law",
            Self::Policy => "policy",
            Self::Training => "training",
            Self::General => "general",
        }
    }

    /// Parses a document type from its canonical name.
    ///
    /// Unrecognized names map to `General`.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "case_law" | "case-law" | "caselaw" => Self::CaseLaw,
            "policy" => Self::Policy,
            "training" => Self::Training,
            _ => Self::General,
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Jurisdiction tag attached to documents and chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Jurisdiction {
    /// Federal law and federal courts.
    Federal,
    /// State, local, municipal.
    State,
    /// Could not be determined.
    Unknown,
}

impl Jurisdiction {
    /// Returns the canonical snake_case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Federal => "federal",
            Self::State => "state",
            Self::Unknown => "unknown",
        }
    }

    /// Parses a jurisdiction from its canonical name.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "federal" => Self::Federal,
            "state" => Self::State,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for Jurisdiction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Law-status tag, inferred lexically from marker tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LawStatus {
    /// In force, or no markers found.
    Current,
    /// Superseded, repealed, amended, or replaced.
    Superseded,
    /// Pending, proposed, or draft.
    Pending,
}

impl LawStatus {
    /// Returns the canonical snake_case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Superseded => "superseded",
            Self::Pending => "pending",
        }
    }

    /// Parses a law status from its canonical name.
    ///
    /// Unrecognized names map to `Current`.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "superseded" => Self::Superseded,
            "pending" => Self::Pending,
            _ => Self::Current,
        }
    }
}

impl std::fmt::Display for LawStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of ingestion. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Stable identifier derived from the file stem and content hash.
    pub id: String,
    /// Original file name of the upload.
    pub file_name: String,
    /// Detected or caller-supplied document type.
    pub document_type: DocumentType,
    /// Jurisdiction tag.
    pub jurisdiction: Jurisdiction,
    /// Law-status tag.
    pub law_status: LawStatus,
    /// When the document was ingested.
    pub ingested_at: DateTime<Utc>,
    /// Number of chunks produced from this document.
    pub chunk_count: usize,
    /// Document-level processing report.
    pub report: ProcessingReport,
}

/// Document-level summary produced during processing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingReport {
    /// Leading-sentence summary, length keyed to document type.
    pub summary: String,
    /// Headings found in the text (short all-caps lines).
    pub headings: Vec<String>,
    /// Classification tags (document type plus content markers).
    pub tags: Vec<String>,
    /// Docket, court, and policy references found in the text.
    pub references: Vec<String>,
    /// Word count of the extracted text.
    pub word_count: usize,
    /// Paragraph count (blank-line separated).
    pub paragraph_count: usize,
}

/// Derives the stable document id from the file name and content bytes.
///
/// The id is `{stem}_{first 8 hex chars of sha256}` so re-uploading the
/// same bytes under the same name produces the same id.
#[must_use]
pub fn document_id(file_name: &str, bytes: &[u8]) -> String {
    let stem = std::path::Path::new(file_name)
        .file_stem()
        .map_or_else(|| file_name.to_string(), |s| s.to_string_lossy().to_string());
    let digest = Sha256::digest(bytes);
    let hex: String = digest.iter().take(4).map(|b| format!("{b:02x}")).collect();
    format!("{stem}_{hex}")
}

/// Builds the document-level processing report.
///
/// Summary length follows the document type: case law and general take
/// the first three sentences, policy two, training four.
#[must_use]
pub fn build_report(text: &str, document_type: DocumentType) -> ProcessingReport {
    let sentence_budget = match document_type {
        DocumentType::Policy => 2,
        DocumentType::Training => 4,
        DocumentType::CaseLaw | DocumentType::General => 3,
    };

    let summary: String = text
        .unicode_sentences()
        .take(sentence_budget)
        .collect::<Vec<_>>()
        .join("")
        .trim()
        .to_string();

    let headings: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| {
            !line.is_empty()
                && line.len() < 100
                && !line.ends_with('.')
                && line.chars().all(|c| !c.is_lowercase())
                && line.chars().any(char::is_alphabetic)
        })
        .map(ToString::to_string)
        .collect();

    ProcessingReport {
        summary,
        headings,
        tags: generate_tags(text, document_type),
        references: extract_references(text, document_type),
        word_count: text.split_whitespace().count(),
        paragraph_count: text.split("\n\n").filter(|p| !p.trim().is_empty()).count(),
    }
}

/// Pulls document-level references: courts and dockets for case law,
/// policy numbers for policies.
fn extract_references(text: &str, document_type: DocumentType) -> Vec<String> {
    let mut references: Vec<String> = Vec::new();
    let mut push_unique = |value: String| {
        if !references.contains(&value) {
            references.push(value);
        }
    };

    match document_type {
        DocumentType::CaseLaw => {
            for m in crate::patterns::COURT.find_iter(text) {
                push_unique(m.as_str().to_string());
            }
            for caps in crate::patterns::DOCKET_NUMBER.captures_iter(text) {
                push_unique(caps[0].to_string());
            }
        }
        DocumentType::Policy => {
            for caps in crate::patterns::POLICY_NUMBER.captures_iter(text) {
                push_unique(caps[0].to_string());
            }
        }
        DocumentType::Training | DocumentType::General => {}
    }

    references
}

fn generate_tags(text: &str, document_type: DocumentType) -> Vec<String> {
    let mut tags = vec![document_type.as_str().to_string()];

    match document_type {
        DocumentType::CaseLaw => {
            tags.extend(["legal", "court", "judgment"].map(String::from));
        }
        DocumentType::Policy => {
            tags.extend(["policy", "procedure", "guideline"].map(String::from));
        }
        DocumentType::Training => {
            tags.extend(["training", "education", "learning"].map(String::from));
        }
        DocumentType::General => {}
    }

    let lower = text.to_lowercase();
    if ["confidential", "secret", "private"]
        .iter()
        .any(|w| lower.contains(w))
    {
        tags.push("confidential".to_string());
    }
    if ["urgent", "immediate", "emergency"]
        .iter()
        .any(|w| lower.contains(w))
    {
        tags.push("urgent".to_string());
    }

    tags.dedup();
    tags
}
