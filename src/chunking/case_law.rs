//! Case-law chunking strategy.
//!
//! Hard boundaries on court-opinion section markers (OPINION, DISSENT,
//! CONCURRENCE). Oversize chunks re-break at the last sentence boundary,
//! carrying the trailing sentence forward when it is shorter than the
//! configured overlap.

use crate::chunking::traits::{Chunker, ChunkerConfig};
use crate::chunking::source_lines;
use crate::core::{Chunk, ChunkClass};
use crate::error::Result;
use crate::patterns;
use std::ops::Range;

/// Chunker for court opinions.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaseLawChunker;

impl CaseLawChunker {
    /// Creates a new case-law chunker.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Chunker for CaseLawChunker {
    fn chunk(&self, document_id: &str, text: &str, config: &ChunkerConfig) -> Result<Vec<Chunk>> {
        self.validate(config)?;

        let mut chunks: Vec<Chunk> = Vec::new();
        let mut buf = String::new();
        let mut span: Range<usize> = 0..0;
        let mut section: Option<String> = None;

        for line in source_lines(text) {
            if line.text.is_empty() {
                continue;
            }

            if patterns::OPINION_MARKER.is_match(line.text) {
                emit(document_id, &mut chunks, &buf, span.clone(), section.as_deref());
                section = Some(line.text.to_string());
                buf = line.text.to_string();
                span = line.start..line.end;
                continue;
            }

            let line_len = line.text.chars().count();
            if !buf.is_empty() && buf.chars().count() + 1 + line_len > config.chunk_size {
                let carried = break_at_sentence(
                    document_id,
                    &mut chunks,
                    &buf,
                    &span,
                    section.as_deref(),
                    config.overlap,
                );
                span = (span.end.saturating_sub(carried.chars().count()))..span.end;
                buf = carried;
            }

            if buf.is_empty() {
                span = line.start..line.end;
                buf = line.text.to_string();
            } else {
                buf.push('\n');
                buf.push_str(line.text);
                span.end = line.end;
            }
        }

        emit(document_id, &mut chunks, &buf, span, section.as_deref());
        Ok(chunks)
    }

    fn class(&self) -> ChunkClass {
        ChunkClass::CaseLawSection
    }

    fn name(&self) -> &'static str {
        "case_law"
    }
}

/// Breaks an oversize buffer at its last `. ` sentence boundary, emitting
/// the head and returning the carried tail (empty when the tail is not
/// shorter than the overlap, or when no boundary exists).
fn break_at_sentence(
    document_id: &str,
    chunks: &mut Vec<Chunk>,
    buf: &str,
    span: &Range<usize>,
    section: Option<&str>,
    overlap: usize,
) -> String {
    match buf.rfind(". ") {
        None => {
            emit(document_id, chunks, buf, span.clone(), section);
            String::new()
        }
        Some(idx) => {
            let head = &buf[..=idx];
            let tail = &buf[idx + 2..];
            let head_end = span.start + head.chars().count();
            emit(
                document_id,
                chunks,
                head,
                span.start..head_end.min(span.end),
                section,
            );
            if tail.chars().count() < overlap {
                tail.to_string()
            } else {
                String::new()
            }
        }
    }
}

/// Emits one chunk with metadata extracted from its own content.
fn emit(
    document_id: &str,
    chunks: &mut Vec<Chunk>,
    content: &str,
    span: Range<usize>,
    section: Option<&str>,
) {
    let content = content.trim();
    if content.is_empty() {
        return;
    }
    let mut chunk = Chunk::new(
        document_id,
        chunks.len(),
        content.to_string(),
        span,
        ChunkClass::CaseLawSection,
    );
    chunk.metadata.statute_numbers = patterns::extract_statutes(content);
    chunk.metadata.case_citations = patterns::extract_case_citations(content);
    chunk.metadata.dates = patterns::extract_dates(content);
    chunk.metadata.section_type = section.map(ToString::to_string);
    chunks.push(chunk);
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_OPINION: &str = "\
SUPREME COURT OF THE UNITED STATES
Case No. 21-1234

OPINION OF THE COURT

This case concerns digital communications under 18 U.S.C. 2703.
The petitioner cites Smith v. Maryland, 442 U.S. 735 for support.
Filed: 1/15/2024

DISSENT

I respectfully dissent. The majority misreads 18 U.S.C. 2703.
";

    #[test]
    fn test_breaks_on_section_markers() {
        let chunker = CaseLawChunker::new();
        let chunks = chunker
            .chunk("doc", SAMPLE_OPINION, &ChunkerConfig::default())
            .unwrap();

        assert_eq!(chunks.len(), 3);
        assert!(chunks[0].content.contains("SUPREME COURT"));
        assert!(chunks[1].content.starts_with("OPINION OF THE COURT"));
        assert!(chunks[2].content.starts_with("DISSENT"));
        assert_eq!(
            chunks[1].metadata.section_type.as_deref(),
            Some("OPINION OF THE COURT")
        );
        assert_eq!(chunks[2].metadata.section_type.as_deref(), Some("DISSENT"));
    }

    #[test]
    fn test_chunk_classes_and_ordinals() {
        let chunker = CaseLawChunker::new();
        let chunks = chunker
            .chunk("doc", SAMPLE_OPINION, &ChunkerConfig::default())
            .unwrap();
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.class, ChunkClass::CaseLawSection);
            assert_eq!(chunk.ordinal, i);
        }
    }

    #[test]
    fn test_metadata_from_own_content_only() {
        let chunker = CaseLawChunker::new();
        let chunks = chunker
            .chunk("doc", SAMPLE_OPINION, &ChunkerConfig::default())
            .unwrap();

        // The opinion section cites a case; the dissent does not.
        assert!(
            chunks[1]
                .metadata
                .case_citations
                .contains(&"Smith v. Maryland, 442 U.S. 735".to_string())
        );
        assert!(chunks[2].metadata.case_citations.is_empty());
        for chunk in &chunks {
            for statute in &chunk.metadata.statute_numbers {
                assert!(chunk.content.contains(statute));
            }
        }
    }

    #[test]
    fn test_oversize_section_rebreaks_on_sentences() {
        let body = "The court holds that the statute applies. ".repeat(40);
        let text = format!("OPINION\n{body}");
        let chunker = CaseLawChunker::new();
        let config = ChunkerConfig {
            chunk_size: 300,
            overlap: 100,
        };
        let chunks = chunker.chunk("doc", &text, &config).unwrap();

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(!chunk.is_empty());
            assert_eq!(chunk.metadata.section_type.as_deref(), Some("OPINION"));
        }
    }

    #[test]
    fn test_deterministic() {
        let chunker = CaseLawChunker::new();
        let config = ChunkerConfig::default();
        let a = chunker.chunk("doc", SAMPLE_OPINION, &config).unwrap();
        let b = chunker.chunk("doc", SAMPLE_OPINION, &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_input() {
        let chunker = CaseLawChunker::new();
        let chunks = chunker
            .chunk("doc", "", &ChunkerConfig::default())
            .unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_dissent_mid_line_does_not_break() {
        let text = "OPINION\nThe court discusses the DISSENT below.\nMore text.";
        let chunker = CaseLawChunker::new();
        let chunks = chunker
            .chunk("doc", text, &ChunkerConfig::default())
            .unwrap();
        assert_eq!(chunks.len(), 1);
    }
}
