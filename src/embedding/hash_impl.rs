//! Hash-based deterministic embedder.
//!
//! Generates reproducible pseudo-embeddings from lexical content: word
//! hashing for vocabulary capture plus character trigram hashing for
//! fuzzy matching, normalized to unit length for cosine similarity.
//! This is lexical overlap, not semantics; production deployments plug a
//! real provider into [`EmbeddingClient`](super::EmbeddingClient).

use crate::embedding::EmbeddingClient;
use crate::error::Result;
use async_trait::async_trait;
use rayon::prelude::*;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Deterministic lexical embedder used by tests and the standalone
/// runner.
///
/// # Examples
///
/// ```
/// use lexrag::embedding::{DEFAULT_DIMENSIONS, EmbeddingClient, HashEmbedder};
///
/// let embedder = HashEmbedder::new(DEFAULT_DIMENSIONS);
/// assert_eq!(embedder.dimension(), DEFAULT_DIMENSIONS);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    /// Creates a new hash embedder with the specified dimension.
    #[must_use]
    pub const fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn hash_string(s: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        s.hash(&mut hasher);
        hasher.finish()
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    fn generate(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimension];

        // Normalize text: lowercase, non-alphanumerics to spaces.
        let normalized: String = text
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c.is_whitespace() {
                    c.to_ascii_lowercase()
                } else {
                    ' '
                }
            })
            .collect();

        // Word-level hashing (primary signal).
        for word in normalized.split_whitespace() {
            let hash = Self::hash_string(word);
            let idx = (hash as usize) % self.dimension;
            let sign = if (hash >> 32) & 1 == 0 { 1.0 } else { -1.0 };
            let magnitude = 1.0 + ((hash >> 16) & 0xFF) as f32 / 255.0;
            embedding[idx] += sign * magnitude;
        }

        // Character trigram hashing (secondary signal for fuzzy matching).
        let chars: Vec<char> = normalized.chars().collect();
        if chars.len() >= 3 {
            for window in chars.windows(3) {
                let trigram: String = window.iter().collect();
                let hash = Self::hash_string(&trigram);
                let idx = (hash as usize) % self.dimension;
                let sign = if (hash >> 32) & 1 == 0 { 0.5 } else { -0.5 };
                embedding[idx] += sign;
            }
        }

        // Normalize to unit length for cosine similarity.
        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for val in &mut embedding {
                *val /= magnitude;
            }
        }

        embedding
    }
}

#[async_trait]
impl EmbeddingClient for HashEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        // CPU-bound; batch in parallel.
        Ok(texts.par_iter().map(|text| self.generate(text)).collect())
    }
}
