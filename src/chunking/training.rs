//! Training-material chunking strategy.
//!
//! Hard boundaries on module markers (`Module|Topic|Chapter|Lesson N`).
//! Oversize chunks re-break on sentence boundaries. All-caps lines feed
//! key terms; lines mentioning objectives, outcomes, or goals feed the
//! learning-objectives metadata.

use crate::chunking::source_lines;
use crate::chunking::traits::{Chunker, ChunkerConfig};
use crate::core::{Chunk, ChunkClass};
use crate::error::Result;
use crate::patterns;
use std::ops::Range;

/// Chunker for training modules and course material.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrainingChunker;

impl TrainingChunker {
    /// Creates a new training chunker.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Chunker for TrainingChunker {
    fn chunk(&self, document_id: &str, text: &str, config: &ChunkerConfig) -> Result<Vec<Chunk>> {
        self.validate(config)?;

        let mut chunks: Vec<Chunk> = Vec::new();
        let mut buf = String::new();
        let mut span: Range<usize> = 0..0;
        let mut module: Option<String> = None;

        for line in source_lines(text) {
            if line.text.is_empty() {
                continue;
            }

            if patterns::MODULE_MARKER.is_match(line.text) {
                emit(document_id, &mut chunks, &buf, span.clone(), module.as_deref());
                module = Some(line.text.to_string());
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
                    module.as_deref(),
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

        emit(document_id, &mut chunks, &buf, span, module.as_deref());
        Ok(chunks)
    }

    fn class(&self) -> ChunkClass {
        ChunkClass::TrainingModule
    }

    fn name(&self) -> &'static str {
        "training"
    }
}

/// Breaks an oversize buffer at its last `. ` sentence boundary.
fn break_at_sentence(
    document_id: &str,
    chunks: &mut Vec<Chunk>,
    buf: &str,
    span: &Range<usize>,
    module: Option<&str>,
    overlap: usize,
) -> String {
    match buf.rfind(". ") {
        None => {
            emit(document_id, chunks, buf, span.clone(), module);
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
                module,
            );
            if tail.chars().count() < overlap {
                tail.to_string()
            } else {
                String::new()
            }
        }
    }
}

/// Emits one chunk, deriving objectives and key terms from its lines.
fn emit(
    document_id: &str,
    chunks: &mut Vec<Chunk>,
    content: &str,
    span: Range<usize>,
    module: Option<&str>,
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
        ChunkClass::TrainingModule,
    );
    chunk.metadata.module_title = module.map(ToString::to_string);
    for line in content.lines().map(str::trim) {
        if line.is_empty() {
            continue;
        }
        if patterns::OBJECTIVE_LINE.is_match(line) {
            chunk.metadata.learning_objectives.push(line.to_string());
        }
        if patterns::KEY_TERM_LINE.is_match(line) {
            chunk.metadata.key_terms.push(line.to_string());
        }
    }
    chunks.push(chunk);
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_TRAINING: &str = "\
Module 1: Digital Evidence
Objective: Identify lawful bases for device seizure.
CHAIN OF CUSTODY
Officers must log every transfer of seized media.

Module 2: Report Writing
The goal of this module is clear documentation.
";

    #[test]
    fn test_breaks_on_module_markers() {
        let chunker = TrainingChunker::new();
        let chunks = chunker
            .chunk("doc", SAMPLE_TRAINING, &ChunkerConfig::default())
            .unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(
            chunks[0].metadata.module_title.as_deref(),
            Some("Module 1: Digital Evidence")
        );
        assert_eq!(
            chunks[1].metadata.module_title.as_deref(),
            Some("Module 2: Report Writing")
        );
    }

    #[test]
    fn test_objectives_and_key_terms() {
        let chunker = TrainingChunker::new();
        let chunks = chunker
            .chunk("doc", SAMPLE_TRAINING, &ChunkerConfig::default())
            .unwrap();

        assert!(
            chunks[0]
                .metadata
                .learning_objectives
                .iter()
                .any(|o| o.contains("lawful bases"))
        );
        assert!(
            chunks[0]
                .metadata
                .key_terms
                .contains(&"CHAIN OF CUSTODY".to_string())
        );
        assert!(
            chunks[1]
                .metadata
                .learning_objectives
                .iter()
                .any(|o| o.contains("goal"))
        );
    }

    #[test]
    fn test_oversize_module_rebreaks() {
        let body = "Trainees practice the procedure until proficient. ".repeat(30);
        let text = format!("Lesson 4\n{body}");
        let chunker = TrainingChunker::new();
        let config = ChunkerConfig {
            chunk_size: 200,
            overlap: 80,
        };
        let chunks = chunker.chunk("doc", &text, &config).unwrap();

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert_eq!(chunk.metadata.module_title.as_deref(), Some("Lesson 4"));
        }
    }

    #[test]
    fn test_deterministic() {
        let chunker = TrainingChunker::new();
        let config = ChunkerConfig::default();
        assert_eq!(
            chunker.chunk("doc", SAMPLE_TRAINING, &config).unwrap(),
            chunker.chunk("doc", SAMPLE_TRAINING, &config).unwrap()
        );
    }
}
