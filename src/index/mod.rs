//! Vector-index contract.
//!
//! The vector store is an external collaborator; the core consumes it
//! through the [`VectorIndex`] trait. The filter grammar it must honor
//! is small: scalar equality, membership on array-valued fields, and
//! logical-or composition. Per-id upserts are last-writer-wins and
//! queries see a consistent snapshot of acknowledged upserts.

mod memory;

pub use memory::MemoryIndex;

use crate::core::MetaValue;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata map attached to each stored vector.
pub type MetadataMap = BTreeMap<String, MetaValue>;

/// One vector with its id and metadata, as stored in the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Stable record id (`{document_id}_{ordinal}` for chunks).
    pub id: String,
    /// The embedding vector.
    pub vector: Vec<f32>,
    /// Flattened metadata for filtering and display.
    pub metadata: MetadataMap,
}

/// A match returned from a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMatch {
    /// Record id.
    pub id: String,
    /// Similarity score in [0, 1].
    pub score: f32,
    /// Metadata, present when requested.
    pub metadata: Option<MetadataMap>,
}

/// Aggregate statistics for an index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of stored vectors.
    pub count: usize,
    /// Configured vector dimension.
    pub dimension: usize,
    /// Fraction of capacity in use, when the backend reports one.
    pub fullness: f32,
}

/// Metadata filter grammar consumed by the index.
///
/// `Eq` compares scalars and tests membership on list values; `Or`
/// composes alternatives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MetadataFilter {
    /// Equality on scalars; membership on array-valued fields.
    Eq {
        /// Metadata key.
        key: String,
        /// Value to compare or look up.
        value: String,
    },
    /// Logical-or of sub-filters.
    Or(Vec<MetadataFilter>),
}

impl MetadataFilter {
    /// Builds an equality/membership filter.
    #[must_use]
    pub fn field(key: &str, value: &str) -> Self {
        Self::Eq {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    /// Builds a logical-or filter, collapsing a single alternative.
    #[must_use]
    pub fn any_of(mut filters: Vec<Self>) -> Self {
        if filters.len() == 1 {
            #[allow(clippy::unwrap_used)]
            return filters.pop().unwrap();
        }
        Self::Or(filters)
    }

    /// Evaluates the filter against a metadata map.
    #[must_use]
    pub fn matches(&self, metadata: &MetadataMap) -> bool {
        match self {
            Self::Eq { key, value } => metadata.get(key).is_some_and(|v| v.matches(value)),
            Self::Or(filters) => filters.iter().any(|f| f.matches(metadata)),
        }
    }
}

/// Contract for the vector store.
///
/// All operations are suspension points and may be cancelled by the
/// caller's deadline.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Returns the configured vector dimension.
    fn dimension(&self) -> usize;

    /// Upserts records by id, last writer wins.
    ///
    /// # Errors
    ///
    /// Returns an error if a record's dimension does not match the
    /// index, or the backend fails.
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<()>;

    /// Queries the `top_k` nearest records, optionally filtered.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
        include_metadata: bool,
    ) -> Result<Vec<IndexMatch>>;

    /// Deletes all records matching the filter, returning the count.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    async fn delete(&self, filter: &MetadataFilter) -> Result<usize>;

    /// Returns aggregate index statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    async fn describe(&self) -> Result<IndexStats>;

    /// Lists up to `top_k` records with metadata, in id order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    async fn list(&self, top_k: usize) -> Result<Vec<IndexMatch>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_metadata() -> MetadataMap {
        let mut map = MetadataMap::new();
        map.insert("jurisdiction".to_string(), MetaValue::from("federal"));
        map.insert(
            "statute_numbers".to_string(),
            MetaValue::List(vec!["940.19".to_string(), "18 U.S.C. 2703".to_string()]),
        );
        map
    }

    #[test]
    fn test_filter_scalar_equality() {
        let metadata = sample_metadata();
        assert!(MetadataFilter::field("jurisdiction", "federal").matches(&metadata));
        assert!(!MetadataFilter::field("jurisdiction", "state").matches(&metadata));
        assert!(!MetadataFilter::field("missing", "x").matches(&metadata));
    }

    #[test]
    fn test_filter_array_membership() {
        let metadata = sample_metadata();
        assert!(MetadataFilter::field("statute_numbers", "18 U.S.C. 2703").matches(&metadata));
        assert!(!MetadataFilter::field("statute_numbers", "999.99").matches(&metadata));
    }

    #[test]
    fn test_filter_or_composition() {
        let metadata = sample_metadata();
        let filter = MetadataFilter::any_of(vec![
            MetadataFilter::field("jurisdiction", "state"),
            MetadataFilter::field("statute_numbers", "940.19"),
        ]);
        assert!(filter.matches(&metadata));

        let filter = MetadataFilter::any_of(vec![
            MetadataFilter::field("jurisdiction", "state"),
            MetadataFilter::field("statute_numbers", "999.99"),
        ]);
        assert!(!filter.matches(&metadata));
    }

    #[test]
    fn test_any_of_single_collapses() {
        let filter = MetadataFilter::any_of(vec![MetadataFilter::field("a", "b")]);
        assert_eq!(filter, MetadataFilter::field("a", "b"));
    }

    #[test]
    fn test_filter_serde() {
        let filter = MetadataFilter::any_of(vec![
            MetadataFilter::field("jurisdiction", "state"),
            MetadataFilter::field("chunk_type", "policy_section"),
        ]);
        let json = serde_json::to_string(&filter).unwrap();
        let back: MetadataFilter = serde_json::from_str(&json).unwrap();
        assert_eq!(back, filter);
    }
}
