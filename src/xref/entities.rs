//! Entity extraction for cross-referencing.
//!
//! Pulls five categories of entities (locations, citations, dates,
//! names, keywords) out of document text using the shared pattern
//! catalog plus the fixed legal vocabulary.

use crate::patterns;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Entities extracted from one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityBag {
    /// Counties, cities, addresses, ZIP codes.
    pub locations: Vec<String>,
    /// Statute and reporter citations.
    pub citations: Vec<String>,
    /// Dates in their source form.
    pub dates: Vec<String>,
    /// Personal names (First Last).
    pub names: Vec<String>,
    /// Matches from the legal vocabulary.
    pub keywords: Vec<String>,
}

impl EntityBag {
    /// Checks whether no entities were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
            && self.citations.is_empty()
            && self.dates.is_empty()
            && self.names.is_empty()
            && self.keywords.is_empty()
    }
}

/// Extracts the five entity categories from text.
#[must_use]
pub fn extract_entities(text: &str) -> EntityBag {
    let lower = text.to_lowercase();
    let keywords = patterns::LEGAL_KEYWORDS
        .iter()
        .filter(|k| lower.contains(*k))
        .map(ToString::to_string)
        .collect();

    let mut names = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for m in patterns::PERSON_NAME.find_iter(text) {
        if seen.insert(m.as_str()) {
            names.push(m.as_str().to_string());
        }
    }

    EntityBag {
        locations: patterns::extract_locations(text),
        citations: patterns::extract_entity_citations(text),
        dates: patterns::extract_dates(text),
        names,
        keywords,
    }
}

/// Extracts entities from many texts in parallel.
#[must_use]
pub fn extract_many(texts: &[String]) -> Vec<EntityBag> {
    texts.par_iter().map(|t| extract_entities(t)).collect()
}
