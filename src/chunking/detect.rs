//! Document-type auto-detection.
//!
//! Scores the opening window of a document against per-type keyword and
//! pattern lists. Keywords score one point, patterns two; the highest
//! non-zero score wins, ties breaking in the order case law > policy >
//! training, and an all-zero score falls back to general.

use crate::core::DocumentType;
use regex::Regex;
use std::sync::LazyLock;

/// Characters of the document inspected for detection.
const DETECT_WINDOW: usize = 4000;

struct TypeProfile {
    document_type: DocumentType,
    keywords: &'static [&'static str],
    patterns: &'static [&'static str],
}

/// Detection profiles in tie-break priority order.
const PROFILES: &[TypeProfile] = &[
    TypeProfile {
        document_type: DocumentType::CaseLaw,
        keywords: &[
            "case",
            "court",
            "judgment",
            "opinion",
            "appeal",
            "petitioner",
            "respondent",
        ],
        patterns: &[
            r"Case No\.?\s*[A-Z0-9-]+",
            r"In the [A-Z\s]+ Court",
            r"Opinion of the Court",
            r"Filed\s+\d{1,2}/\d{1,2}/\d{4}",
        ],
    },
    TypeProfile {
        document_type: DocumentType::Policy,
        keywords: &[
            "policy",
            "procedure",
            "guideline",
            "regulation",
            "standard",
            "protocol",
        ],
        patterns: &[
            r"Policy\s+No\.?\s*[A-Z0-9-]+",
            r"Effective Date:\s*\d{1,2}/\d{1,2}/\d{4}",
            r"Department\s+Policy",
            r"Standard Operating Procedure",
        ],
    },
    TypeProfile {
        document_type: DocumentType::Training,
        keywords: &[
            "training",
            "course",
            "module",
            "lesson",
            "instruction",
            "education",
        ],
        patterns: &[
            r"Training\s+Module\s*\d+",
            r"Course\s+Objective",
            r"Learning\s+Outcome",
            r"Training\s+Material",
        ],
    },
];

static COMPILED: LazyLock<Vec<Vec<Regex>>> = LazyLock::new(|| {
    PROFILES
        .iter()
        .map(|profile| {
            profile
                .patterns
                .iter()
                .map(|p| {
                    #[allow(clippy::unwrap_used)]
                    let re = Regex::new(&format!("(?i){p}")).unwrap();
                    re
                })
                .collect()
        })
        .collect()
});

/// Detects the document type from the opening window of the text.
#[must_use]
pub fn detect_document_type(text: &str) -> DocumentType {
    let end = crate::core::find_char_boundary(text, DETECT_WINDOW);
    let window = &text[..end];
    let window_lower = window.to_lowercase();

    let mut best = DocumentType::General;
    let mut best_score = 0usize;

    for (profile, compiled) in PROFILES.iter().zip(COMPILED.iter()) {
        let keyword_score = profile
            .keywords
            .iter()
            .filter(|k| window_lower.contains(*k))
            .count();
        let pattern_score = compiled.iter().filter(|re| re.is_match(window)).count() * 2;
        let score = keyword_score + pattern_score;

        // Strictly greater keeps the earlier profile on ties.
        if score > best_score {
            best_score = score;
            best = profile.document_type;
        }
    }

    best
}
