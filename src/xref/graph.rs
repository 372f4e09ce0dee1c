//! Persistent cross-reference graph.
//!
//! An undirected weighted graph over document ids. Each edge carries the
//! similarity score and the entities common to both endpoints. The graph
//! lives behind a read/write lock; writes are serialized and flushed to
//! a single JSON file best-effort.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::warn;

/// Entities shared by two related documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonEntities {
    /// Shared locations.
    #[serde(default)]
    pub locations: Vec<String>,
    /// Shared citations.
    #[serde(default)]
    pub citations: Vec<String>,
    /// Shared keywords.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Shared names.
    #[serde(default)]
    pub names: Vec<String>,
}

/// One edge of the relationship graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipEdge {
    /// Similarity score of the pair.
    pub similarity: f32,
    /// Entities common to both documents.
    pub common_entities: CommonEntities,
    /// When the edge was recorded.
    pub timestamp: DateTime<Utc>,
}

/// Serialized graph layout: two top-level keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct GraphData {
    cross_references: BTreeMap<String, BTreeSet<String>>,
    relationship_graph: BTreeMap<String, BTreeMap<String, RelationshipEdge>>,
}

/// The cross-reference graph with optional file persistence.
#[derive(Debug)]
pub struct ReferenceGraph {
    data: RwLock<GraphData>,
    path: Option<PathBuf>,
}

impl Default for ReferenceGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceGraph {
    /// Creates an empty in-memory graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: RwLock::new(GraphData::default()),
            path: None,
        }
    }

    /// Loads the graph from a JSON file, starting empty when the file
    /// does not exist or cannot be parsed.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        let data = std::fs::read_to_string(path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();
        Self {
            data: RwLock::new(data),
            path: Some(path.to_path_buf()),
        }
    }

    /// Records an undirected edge between two documents.
    pub fn record(&self, a: &str, b: &str, edge: RelationshipEdge) {
        if a == b {
            return;
        }
        if let Ok(mut data) = self.data.write() {
            data.cross_references
                .entry(a.to_string())
                .or_default()
                .insert(b.to_string());
            data.cross_references
                .entry(b.to_string())
                .or_default()
                .insert(a.to_string());
            data.relationship_graph
                .entry(a.to_string())
                .or_default()
                .insert(b.to_string(), edge.clone());
            data.relationship_graph
                .entry(b.to_string())
                .or_default()
                .insert(a.to_string(), edge);
        }
    }

    /// Returns the documents related to `document_id`, best first.
    #[must_use]
    pub fn related(&self, document_id: &str, max_results: usize) -> Vec<(String, RelationshipEdge)> {
        let Ok(data) = self.data.read() else {
            return Vec::new();
        };
        let mut related: Vec<(String, RelationshipEdge)> = data
            .relationship_graph
            .get(document_id)
            .map(|edges| {
                edges
                    .iter()
                    .map(|(id, edge)| (id.clone(), edge.clone()))
                    .collect()
            })
            .unwrap_or_default();
        related.sort_by(|a, b| {
            b.1.similarity
                .partial_cmp(&a.1.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        related.truncate(max_results);
        related
    }

    /// Number of documents with at least one edge.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.read().map_or(0, |d| d.cross_references.len())
    }

    /// Checks whether the graph has no edges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flushes the graph to its file, best-effort.
    pub fn save(&self) {
        let Some(path) = &self.path else {
            return;
        };
        let Ok(data) = self.data.read() else {
            return;
        };
        match serde_json::to_string_pretty(&*data) {
            Ok(json) => {
                if let Err(e) = std::fs::write(path, json) {
                    warn!(path = %path.display(), error = %e, "could not persist cross-reference graph");
                }
            }
            Err(e) => warn!(error = %e, "could not serialize cross-reference graph"),
        }
    }
}
