//! In-process vector index.
//!
//! Backs tests and the standalone runner. Stores records in a map behind
//! an async read/write lock: upserts are last-writer-wins per id and
//! queries score a consistent snapshot with cosine similarity clamped to
//! [0, 1].

use crate::embedding::cosine_similarity;
use crate::error::{CollaboratorError, Result};
use crate::index::{IndexMatch, IndexStats, MetadataFilter, VectorIndex, VectorRecord};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// In-memory [`VectorIndex`] implementation.
#[derive(Debug)]
pub struct MemoryIndex {
    dimension: usize,
    records: RwLock<BTreeMap<String, VectorRecord>>,
}

impl MemoryIndex {
    /// Creates an empty index with the given dimension.
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            records: RwLock::new(BTreeMap::new()),
        }
    }

    /// Returns the number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Checks whether the index is empty.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<()> {
        for record in &records {
            if record.vector.len() != self.dimension {
                return Err(CollaboratorError::DimensionMismatch {
                    embedder: record.vector.len(),
                    index: self.dimension,
                }
                .into());
            }
        }

        let mut store = self.records.write().await;
        for record in records {
            store.insert(record.id.clone(), record);
        }
        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
        include_metadata: bool,
    ) -> Result<Vec<IndexMatch>> {
        let store = self.records.read().await;

        let mut scored: Vec<IndexMatch> = store
            .values()
            .filter(|record| filter.is_none_or(|f| f.matches(&record.metadata)))
            .map(|record| IndexMatch {
                id: record.id.clone(),
                score: cosine_similarity(vector, &record.vector).max(0.0),
                metadata: include_metadata.then(|| record.metadata.clone()),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn delete(&self, filter: &MetadataFilter) -> Result<usize> {
        let mut store = self.records.write().await;
        let doomed: Vec<String> = store
            .values()
            .filter(|record| filter.matches(&record.metadata))
            .map(|record| record.id.clone())
            .collect();
        for id in &doomed {
            store.remove(id);
        }
        Ok(doomed.len())
    }

    async fn describe(&self) -> Result<IndexStats> {
        Ok(IndexStats {
            count: self.records.read().await.len(),
            dimension: self.dimension,
            fullness: 0.0,
        })
    }

    async fn list(&self, top_k: usize) -> Result<Vec<IndexMatch>> {
        let store = self.records.read().await;
        Ok(store
            .values()
            .take(top_k)
            .map(|record| IndexMatch {
                id: record.id.clone(),
                score: 0.0,
                metadata: Some(record.metadata.clone()),
            })
            .collect())
    }
}
