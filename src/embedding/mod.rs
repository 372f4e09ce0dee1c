//! Embedding-client contract.
//!
//! The embedding model is an external collaborator; the core consumes it
//! through the [`EmbeddingClient`] trait. Exactly one client exists per
//! process, constructed at startup, and its dimension must equal the
//! vector index's configured dimension or the service refuses to start.

mod hash_impl;

pub use hash_impl::HashEmbedder;

use crate::error::Result;
use async_trait::async_trait;

/// Default embedding dimension used by the in-process embedder.
pub const DEFAULT_DIMENSIONS: usize = 384;

/// Contract for embedding providers.
///
/// Implementations must be thread-safe (`Send + Sync`); the call is a
/// suspension point and may be cancelled by the caller's deadline.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Returns the fixed embedding dimension of this instance.
    fn dimension(&self) -> usize;

    /// Encodes a batch of texts into vectors, one per input, each of
    /// [`Self::dimension`] length.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider call fails.
    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Encodes a single text.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider call fails or returns no vector.
    async fn encode_one(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.encode(std::slice::from_ref(&text.to_string())).await?;
        vectors.pop().ok_or_else(|| {
            crate::error::CollaboratorError::Embedding("provider returned no vector".to_string())
                .into()
        })
    }
}

/// Computes cosine similarity between two embedding vectors.
///
/// Returns a value between -1.0 (opposite) and 1.0 (identical), or 0.0
/// if the vectors differ in length or have zero magnitude.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity_identical() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_opposite() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_mismatched_lengths() {
        let a = vec![1.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_zero_vector() {
        let a = vec![0.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_encode_one_default_impl() {
        let embedder = HashEmbedder::new(DEFAULT_DIMENSIONS);
        let vector = embedder.encode_one("hello world").await.unwrap();
        assert_eq!(vector.len(), DEFAULT_DIMENSIONS);
    }
}
