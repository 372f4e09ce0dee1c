//! Chunk representation for lexrag.
//!
//! Chunks are passages produced by the chunking strategies. Each chunk
//! carries the legal metadata extracted from its own content and is
//! exclusively owned by one document; its id is the document id plus
//! the chunk ordinal, which is also the vector-index key.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Range;

/// Class of a chunk, set by the strategy that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkClass {
    /// A section of a court opinion (OPINION / DISSENT / CONCURRENCE).
    CaseLawSection,
    /// A numbered policy section.
    PolicySection,
    /// A training module passage.
    TrainingModule,
    /// Sentence-packed general text.
    General,
}

impl ChunkClass {
    /// Returns the canonical snake_case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CaseLawSection => "case_law_section",
            Self::PolicySection => "policy_section",
            Self::TrainingModule => "training_module",
            Self::General => "general",
        }
    }

    /// Parses a chunk class from its canonical name.
    ///
    /// Unrecognized names map to `General`.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name.trim() {
            "case_law_section" => Self::CaseLawSection,
            "policy_section" => Self::PolicySection,
            "training_module" => Self::TrainingModule,
            _ => Self::General,
        }
    }
}

impl std::fmt::Display for ChunkClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metadata value: a string or an ordered list of strings.
///
/// This is the full value grammar accepted by the vector-store filter
/// contract, so any metadata bag built from these flattens losslessly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    /// A single string value.
    Str(String),
    /// An ordered list of string values.
    List(Vec<String>),
}

impl MetaValue {
    /// Returns true if a scalar equals `value` or a list contains it.
    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::Str(s) => s == value,
            Self::List(items) => items.iter().any(|item| item == value),
        }
    }

    /// Returns the scalar value, if this is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::List(_) => None,
        }
    }

    /// Returns the list items, if this is a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::Str(_) => None,
            Self::List(items) => Some(items),
        }
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<Vec<String>> for MetaValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

/// Legal metadata extracted from a chunk's own content.
///
/// All values originate from text inside the chunk, never outside it.
/// The `extensions` submap is the open escape hatch for caller-supplied
/// fields; it is restricted to the same string/list grammar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Statute numbers found in the chunk.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub statute_numbers: Vec<String>,

    /// Case citations found in the chunk.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub case_citations: Vec<String>,

    /// Dates found in the chunk, in their source form.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dates: Vec<String>,

    /// Policy numbers found in the chunk.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub policy_numbers: Vec<String>,

    /// Section number for policy sections (e.g. `1.2`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_number: Option<String>,

    /// Section title for policy sections.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_title: Option<String>,

    /// Marker line for case-law sections (e.g. `OPINION OF THE COURT`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_type: Option<String>,

    /// Module heading for training chunks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_title: Option<String>,

    /// Learning-objective lines for training chunks.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub learning_objectives: Vec<String>,

    /// Key terms (all-caps lines) for training chunks.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_terms: Vec<String>,

    /// Original file name, annotated at ingestion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,

    /// Open submap for additional caller-supplied fields.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, MetaValue>,
}

impl ChunkMetadata {
    /// Appends values from another extraction pass, deduplicating.
    pub fn absorb_lists(&mut self, statutes: Vec<String>, citations: Vec<String>, dates: Vec<String>) {
        for s in statutes {
            if !self.statute_numbers.contains(&s) {
                self.statute_numbers.push(s);
            }
        }
        for c in citations {
            if !self.case_citations.contains(&c) {
                self.case_citations.push(c);
            }
        }
        for d in dates {
            if !self.dates.contains(&d) {
                self.dates.push(d);
            }
        }
    }

    /// Flattens the metadata into the filter-grammar map stored on the
    /// vector index. Empty fields are omitted.
    #[must_use]
    pub fn flatten(&self) -> BTreeMap<String, MetaValue> {
        let mut map = self.extensions.clone();

        let lists = [
            ("statute_numbers", &self.statute_numbers),
            ("case_citations", &self.case_citations),
            ("dates", &self.dates),
            ("policy_numbers", &self.policy_numbers),
            ("learning_objectives", &self.learning_objectives),
            ("key_terms", &self.key_terms),
        ];
        for (key, values) in lists {
            if !values.is_empty() {
                map.insert(key.to_string(), MetaValue::List(values.clone()));
            }
        }

        let scalars = [
            ("section_number", &self.section_number),
            ("section_title", &self.section_title),
            ("section_type", &self.section_type),
            ("module_title", &self.module_title),
            ("file_name", &self.file_name),
        ];
        for (key, value) in scalars {
            if let Some(v) = value {
                map.insert(key.to_string(), MetaValue::Str(v.clone()));
            }
        }

        map
    }
}

/// A contiguous passage of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk id: `{document_id}_{ordinal}`. Also the vector-index key.
    pub id: String,

    /// Id of the owning document.
    pub document_id: String,

    /// Dense ordinal within the document, starting at 0.
    pub ordinal: usize,

    /// Chunk content.
    pub content: String,

    /// Character span in the source text this chunk was derived from.
    pub span: Range<usize>,

    /// Class assigned by the producing strategy.
    pub class: ChunkClass,

    /// Legal metadata extracted from the content.
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Creates a new chunk, deriving its id from document id and ordinal.
    #[must_use]
    pub fn new(
        document_id: &str,
        ordinal: usize,
        content: String,
        span: Range<usize>,
        class: ChunkClass,
    ) -> Self {
        Self {
            id: format!("{document_id}_{ordinal}"),
            document_id: document_id.to_string(),
            ordinal,
            content,
            span,
            class,
            metadata: ChunkMetadata::default(),
        }
    }

    /// Returns the content size in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.content.len()
    }

    /// Checks whether the chunk has no content.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// Returns a preview of the content (first `max_len` bytes, cut at a
    /// character boundary).
    #[must_use]
    pub fn preview(&self, max_len: usize) -> &str {
        if self.content.len() <= max_len {
            &self.content
        } else {
            let end = find_char_boundary(&self.content, max_len);
            &self.content[..end]
        }
    }
}

/// Finds a valid UTF-8 character boundary at or before the given position.
#[must_use]
pub fn find_char_boundary(s: &str, pos: usize) -> usize {
    if pos >= s.len() {
        return s.len();
    }
    let mut boundary = pos;
    while !s.is_char_boundary(boundary) && boundary > 0 {
        boundary -= 1;
    }
    boundary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_id_format() {
        let chunk = Chunk::new("doc_ab12cd34", 3, "text".to_string(), 0..4, ChunkClass::General);
        assert_eq!(chunk.id, "doc_ab12cd34_3");
        assert_eq!(chunk.ordinal, 3);
    }

    #[test]
    fn test_chunk_class_round_trip() {
        for class in [
            ChunkClass::CaseLawSection,
            ChunkClass::PolicySection,
            ChunkClass::TrainingModule,
            ChunkClass::General,
        ] {
            assert_eq!(ChunkClass::parse(class.as_str()), class);
        }
    }

    #[test]
    fn test_meta_value_matches() {
        let scalar = MetaValue::Str("940.19".to_string());
        assert!(scalar.matches("940.19"));
        assert!(!scalar.matches("941.20"));

        let list = MetaValue::List(vec!["940.19".to_string(), "941.20".to_string()]);
        assert!(list.matches("941.20"));
        assert!(!list.matches("999.99"));
    }

    #[test]
    fn test_metadata_absorb_dedups() {
        let mut meta = ChunkMetadata::default();
        meta.absorb_lists(
            vec!["940.19".to_string()],
            vec!["Smith v. Maryland".to_string()],
            vec![],
        );
        meta.absorb_lists(vec!["940.19".to_string(), "941.20".to_string()], vec![], vec![]);
        assert_eq!(meta.statute_numbers, vec!["940.19", "941.20"]);
        assert_eq!(meta.case_citations, vec!["Smith v. Maryland"]);
    }

    #[test]
    fn test_metadata_flatten() {
        let mut meta = ChunkMetadata {
            statute_numbers: vec!["940.19".to_string()],
            section_number: Some("1.2".to_string()),
            ..Default::default()
        };
        meta.extensions
            .insert("jurisdiction".to_string(), MetaValue::from("state"));

        let map = meta.flatten();
        assert_eq!(
            map.get("statute_numbers"),
            Some(&MetaValue::List(vec!["940.19".to_string()]))
        );
        assert_eq!(map.get("section_number"), Some(&MetaValue::from("1.2")));
        assert_eq!(map.get("jurisdiction"), Some(&MetaValue::from("state")));
        assert!(!map.contains_key("case_citations"));
    }

    #[test]
    fn test_meta_value_untagged_serde() {
        let scalar: MetaValue = serde_json::from_str("\"hello\"").unwrap();
        assert_eq!(scalar, MetaValue::from("hello"));

        let list: MetaValue = serde_json::from_str("[\"a\",\"b\"]").unwrap();
        assert_eq!(
            list,
            MetaValue::List(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn test_chunk_preview() {
        let chunk = Chunk::new("d", 0, "Hello, world!".to_string(), 0..13, ChunkClass::General);
        assert_eq!(chunk.preview(5), "Hello");
        assert_eq!(chunk.preview(100), "Hello, world!");
    }

    #[test]
    fn test_find_char_boundary() {
        let s = "héllo";
        // The boundary request lands inside the two-byte é.
        let boundary = find_char_boundary(s, 2);
        assert!(s.is_char_boundary(boundary));
        assert_eq!(find_char_boundary(s, 100), s.len());
    }

    #[test]
    fn test_chunk_empty() {
        let chunk = Chunk::new("d", 0, "   ".to_string(), 0..3, ChunkClass::General);
        assert!(chunk.is_empty());
    }
}
