//! General chunking strategy.
//!
//! Sentence packing for documents with no recognized legal hierarchy:
//! sentences accumulate until the target size would be exceeded, and the
//! trailing two sentences carry forward as overlap when they fit inside
//! the overlap budget.

use crate::chunking::traits::{Chunker, ChunkerConfig};
use crate::core::{Chunk, ChunkClass};
use crate::error::Result;
use crate::patterns;
use std::ops::Range;
use unicode_segmentation::UnicodeSegmentation;

/// Sentence-packing chunker for untyped documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneralChunker;

impl GeneralChunker {
    /// Creates a new general chunker.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

/// A sentence with its character span in the source.
struct Sentence<'a> {
    text: &'a str,
    span: Range<usize>,
}

impl Chunker for GeneralChunker {
    fn chunk(&self, document_id: &str, text: &str, config: &ChunkerConfig) -> Result<Vec<Chunk>> {
        self.validate(config)?;

        let sentences = sentence_spans(text);
        let mut chunks: Vec<Chunk> = Vec::new();
        // Indices into `sentences` forming the current chunk.
        let mut current: Vec<usize> = Vec::new();
        let mut current_len = 0usize;

        for (i, sentence) in sentences.iter().enumerate() {
            let len = sentence.text.chars().count();
            if !current.is_empty() && current_len + len > config.chunk_size {
                emit(document_id, &mut chunks, &sentences, &current);

                // Carry the trailing two sentences when they fit the overlap.
                let tail: Vec<usize> = current.iter().rev().take(2).rev().copied().collect();
                let tail_len: usize = tail
                    .iter()
                    .map(|&j| sentences[j].text.chars().count())
                    .sum();
                if tail.len() == 2 && tail_len < config.overlap {
                    current = tail;
                    current_len = tail_len;
                } else {
                    current.clear();
                    current_len = 0;
                }
            }
            current.push(i);
            current_len += len;
        }

        emit(document_id, &mut chunks, &sentences, &current);
        Ok(chunks)
    }

    fn class(&self) -> ChunkClass {
        ChunkClass::General
    }

    fn name(&self) -> &'static str {
        "general"
    }
}

/// Splits text on Unicode sentence boundaries, tracking char spans.
fn sentence_spans(text: &str) -> Vec<Sentence<'_>> {
    let mut out = Vec::new();
    let mut pos = 0usize;
    for piece in text.split_sentence_bounds() {
        let len = piece.chars().count();
        if !piece.trim().is_empty() {
            out.push(Sentence {
                text: piece,
                span: pos..pos + len,
            });
        }
        pos += len;
    }
    out
}

/// Emits one chunk from the given sentence indices.
fn emit(document_id: &str, chunks: &mut Vec<Chunk>, sentences: &[Sentence<'_>], indices: &[usize]) {
    if indices.is_empty() {
        return;
    }
    let content: String = indices
        .iter()
        .filter_map(|&i| sentences.get(i).map(|s| s.text))
        .collect();
    let content = content.trim().to_string();
    if content.is_empty() {
        return;
    }

    let start = indices
        .first()
        .and_then(|&i| sentences.get(i))
        .map_or(0, |s| s.span.start);
    let end = indices
        .last()
        .and_then(|&i| sentences.get(i))
        .map_or(start, |s| s.span.end);

    let mut chunk = Chunk::new(document_id, chunks.len(), content, start..end, ChunkClass::General);
    chunk.metadata.statute_numbers = patterns::extract_statutes(&chunk.content);
    chunk.metadata.dates = patterns::extract_dates(&chunk.content);
    chunks.push(chunk);
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_short_text_single_chunk() {
        let chunker = GeneralChunker::new();
        let chunks = chunker
            .chunk("doc", "One sentence. Two sentences.", &ChunkerConfig::default())
            .unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].ordinal, 0);
    }

    #[test]
    fn test_packing_respects_size() {
        let text = "This is a filler sentence for the packing test. ".repeat(40);
        let chunker = GeneralChunker::new();
        let config = ChunkerConfig {
            chunk_size: 200,
            overlap: 120,
        };
        let chunks = chunker.chunk("doc", &text, &config).unwrap();

        assert!(chunks.len() > 1);
        // Each chunk stays within size plus one sentence of slack.
        for chunk in &chunks {
            assert!(chunk.content.chars().count() <= 200 + 120);
        }
    }

    #[test]
    fn test_overlap_carries_trailing_sentences() {
        let text = "Alpha one here. Beta two here. Gamma three here. Delta four here. \
                    Epsilon five here. Zeta six here."
            .to_string();
        let chunker = GeneralChunker::new();
        let config = ChunkerConfig {
            chunk_size: 60,
            overlap: 50,
        };
        let chunks = chunker.chunk("doc", &text, &config).unwrap();
        assert!(chunks.len() > 1);

        // The first sentence of a later chunk repeats a trailing sentence
        // of the previous one.
        let first_tail = chunks[0]
            .content
            .rsplit(". ")
            .next()
            .map(str::to_string)
            .unwrap_or_default();
        assert!(chunks[1].content.contains(first_tail.trim_end_matches('.')));
    }

    #[test]
    fn test_metadata_extraction() {
        let text = "The seizure was authorized under 18 U.S.C. 2703 on 1/15/2024.";
        let chunker = GeneralChunker::new();
        let chunks = chunker
            .chunk("doc", text, &ChunkerConfig::default())
            .unwrap();
        assert_eq!(chunks[0].metadata.statute_numbers, vec!["18 U.S.C. 2703"]);
        assert_eq!(chunks[0].metadata.dates, vec!["1/15/2024"]);
    }

    #[test]
    fn test_empty_input() {
        let chunker = GeneralChunker::new();
        let chunks = chunker
            .chunk("doc", "   \n  ", &ChunkerConfig::default())
            .unwrap();
        assert!(chunks.is_empty());
    }

    proptest! {
        #[test]
        fn prop_chunking_is_idempotent(text in "[ -~\\n]{0,1200}") {
            let chunker = GeneralChunker::new();
            let config = ChunkerConfig { chunk_size: 200, overlap: 50 };
            let a = chunker.chunk("doc", &text, &config).unwrap();
            let b = chunker.chunk("doc", &text, &config).unwrap();
            prop_assert_eq!(a, b);
        }

        #[test]
        fn prop_chunks_never_empty(text in "[ -~\\n]{0,1200}") {
            let chunker = GeneralChunker::new();
            let config = ChunkerConfig { chunk_size: 150, overlap: 40 };
            let chunks = chunker.chunk("doc", &text, &config).unwrap();
            for (i, chunk) in chunks.iter().enumerate() {
                prop_assert!(!chunk.is_empty());
                prop_assert_eq!(chunk.ordinal, i);
            }
        }
    }
}
