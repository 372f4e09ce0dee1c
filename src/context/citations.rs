//! Citation relationship graph.
//!
//! A small in-process parent→child map over citation strings, updated at
//! ingestion and used to expand the citation chain of retrieved chunks
//! up to a bounded depth. Writes are serialized behind a write lock;
//! readers take snapshots.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

/// Maximum expansion depth for citation chains.
pub const MAX_CHAIN_DEPTH: usize = 3;

/// Parent→child citation relationships.
#[derive(Debug, Default)]
pub struct CitationGraph {
    relationships: RwLock<HashMap<String, Vec<String>>>,
}

impl CitationGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a parent→child relationship, ignoring duplicates.
    pub fn add_relationship(&self, parent: &str, child: &str) {
        if parent == child {
            return;
        }
        if let Ok(mut map) = self.relationships.write() {
            let children = map.entry(parent.to_string()).or_default();
            if !children.iter().any(|c| c == child) {
                children.push(child.to_string());
            }
        }
    }

    /// Records the relationships implied by one chunk's citations: the
    /// first citation is treated as parent of the rest.
    pub fn record_chunk(&self, citations: &[String]) {
        if let Some((parent, children)) = citations.split_first() {
            for child in children {
                self.add_relationship(parent, child);
            }
        }
    }

    /// Expands seed citations through the relationship map up to
    /// `max_depth` hops, preserving first-seen order.
    #[must_use]
    pub fn expand(&self, seeds: &[String], max_depth: usize) -> Vec<String> {
        let mut chain: Vec<String> = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        for seed in seeds {
            if visited.insert(seed.clone()) {
                chain.push(seed.clone());
            }
        }

        let Ok(map) = self.relationships.read() else {
            return chain;
        };

        let mut frontier: Vec<String> = chain.clone();
        for _ in 0..max_depth {
            let mut next = Vec::new();
            for citation in &frontier {
                if let Some(children) = map.get(citation) {
                    for child in children {
                        if visited.insert(child.clone()) {
                            next.push(child.clone());
                        }
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            chain.extend(next.iter().cloned());
            frontier = next;
        }

        chain
    }

    /// Number of parents with recorded children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.relationships.read().map_or(0, |map| map.len())
    }

    /// Checks whether the graph has no relationships.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
