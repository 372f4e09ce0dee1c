//! Policy chunking strategy.
//!
//! Hard boundaries on numbered section headings (`1.1 Purpose`). Oversize
//! chunks re-break on paragraph boundaries (blank lines), carrying the
//! trailing paragraph forward when it is shorter than the overlap.

use crate::chunking::source_lines;
use crate::chunking::traits::{Chunker, ChunkerConfig};
use crate::core::{Chunk, ChunkClass};
use crate::error::Result;
use crate::patterns;
use std::ops::Range;

/// Chunker for department policies and procedures.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyChunker;

/// Section context carried onto every chunk cut from that section.
#[derive(Debug, Clone, Default)]
struct Section {
    number: Option<String>,
    title: Option<String>,
}

impl PolicyChunker {
    /// Creates a new policy chunker.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Chunker for PolicyChunker {
    fn chunk(&self, document_id: &str, text: &str, config: &ChunkerConfig) -> Result<Vec<Chunk>> {
        self.validate(config)?;

        let mut chunks: Vec<Chunk> = Vec::new();
        let mut buf = String::new();
        let mut span: Range<usize> = 0..0;
        let mut section = Section::default();

        for line in source_lines(text) {
            if line.text.is_empty() {
                // Record a paragraph boundary inside the buffer.
                if !buf.is_empty() && !buf.ends_with('\n') {
                    buf.push('\n');
                }
                continue;
            }

            if let Some(caps) = patterns::SECTION_HEADING.captures(line.text) {
                emit(document_id, &mut chunks, &buf, span.clone(), &section);
                section = Section {
                    number: caps.get(1).map(|m| m.as_str().to_string()),
                    title: caps.get(2).map(|m| m.as_str().to_string()),
                };
                buf = line.text.to_string();
                span = line.start..line.end;
                continue;
            }

            let line_len = line.text.chars().count();
            if !buf.is_empty() && buf.chars().count() + 1 + line_len > config.chunk_size {
                let carried = break_at_paragraph(
                    document_id,
                    &mut chunks,
                    &buf,
                    &span,
                    &section,
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

        emit(document_id, &mut chunks, &buf, span, &section);
        Ok(chunks)
    }

    fn class(&self) -> ChunkClass {
        ChunkClass::PolicySection
    }

    fn name(&self) -> &'static str {
        "policy"
    }
}

/// Breaks an oversize buffer at its last paragraph boundary, emitting the
/// head and returning the carried tail (empty when the tail is not
/// shorter than the overlap, or when the buffer is a single paragraph).
fn break_at_paragraph(
    document_id: &str,
    chunks: &mut Vec<Chunk>,
    buf: &str,
    span: &Range<usize>,
    section: &Section,
    overlap: usize,
) -> String {
    match buf.rfind("\n\n") {
        None => {
            emit(document_id, chunks, buf, span.clone(), section);
            String::new()
        }
        Some(idx) => {
            let head = &buf[..idx];
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
    section: &Section,
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
        ChunkClass::PolicySection,
    );
    chunk.metadata.policy_numbers = patterns::extract_policy_numbers(content);
    chunk.metadata.dates = patterns::extract_dates(content);
    chunk.metadata.section_number = section.number.clone();
    chunk.metadata.section_title = section.title.clone();
    chunks.push(chunk);
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_POLICY: &str = "\
1.1 Purpose
This policy establishes evidence handling rules under Policy No. LE-2021-04.
Effective 1/15/2024.

1.2 Scope
Applies to all sworn personnel and civilian staff.
";

    #[test]
    fn test_breaks_on_section_headings() {
        let chunker = PolicyChunker::new();
        let chunks = chunker
            .chunk("doc", SAMPLE_POLICY, &ChunkerConfig::default())
            .unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].metadata.section_number.as_deref(), Some("1.1"));
        assert_eq!(chunks[0].metadata.section_title.as_deref(), Some("Purpose"));
        assert_eq!(chunks[1].metadata.section_number.as_deref(), Some("1.2"));
        assert_eq!(chunks[1].metadata.section_title.as_deref(), Some("Scope"));
    }

    #[test]
    fn test_policy_numbers_and_dates() {
        let chunker = PolicyChunker::new();
        let chunks = chunker
            .chunk("doc", SAMPLE_POLICY, &ChunkerConfig::default())
            .unwrap();
        assert_eq!(chunks[0].metadata.policy_numbers, vec!["LE-2021-04"]);
        assert_eq!(chunks[0].metadata.dates, vec!["1/15/2024"]);
        assert!(chunks[1].metadata.policy_numbers.is_empty());
    }

    #[test]
    fn test_oversize_section_rebreaks_on_paragraphs() {
        let paragraph = "All officers shall document chain of custody for seized items.";
        let body = vec![paragraph; 12].join("\n\n");
        let text = format!("3.4 Evidence\n{body}");
        let chunker = PolicyChunker::new();
        let config = ChunkerConfig {
            chunk_size: 250,
            overlap: 100,
        };
        let chunks = chunker.chunk("doc", &text, &config).unwrap();

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(!chunk.is_empty());
            assert_eq!(chunk.metadata.section_number.as_deref(), Some("3.4"));
        }
    }

    #[test]
    fn test_preamble_before_first_section() {
        let text = "Department Policy Manual\n\n1.1 Purpose\nSets out rules.";
        let chunker = PolicyChunker::new();
        let chunks = chunker
            .chunk("doc", text, &ChunkerConfig::default())
            .unwrap();
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].metadata.section_number.is_none());
        assert_eq!(chunks[1].metadata.section_number.as_deref(), Some("1.1"));
    }

    #[test]
    fn test_deterministic() {
        let chunker = PolicyChunker::new();
        let config = ChunkerConfig::default();
        assert_eq!(
            chunker.chunk("doc", SAMPLE_POLICY, &config).unwrap(),
            chunker.chunk("doc", SAMPLE_POLICY, &config).unwrap()
        );
    }
}
