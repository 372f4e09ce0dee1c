//! Shared catalog of legal-entity patterns and marker vocabularies.
//!
//! The chunker, context assembler, and cross-reference engine all read
//! from this one module so the notion of "a statute number" or "a case
//! citation" cannot drift between components. Patterns are compiled once
//! at first use; marker sets are plain data so the heuristics they feed
//! (jurisdiction, law status) can be tuned without touching code.

use regex::Regex;
use std::sync::LazyLock;

/// Compiles a pattern from the catalog.
#[allow(clippy::unwrap_used)]
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap()
}

/// Statute numbers: `940.19`, `1.1A`, or the U.S.C. form `18 U.S.C. 2703`.
pub static STATUTE_NUMBER: LazyLock<Regex> = LazyLock::new(|| compile(r"(\d+\.\d+[A-Z]*|\d+\s+U\.S\.C\.\s+\d+)"));

/// Short case names such as `Smith v. Maryland`.
pub static CASE_NAME: LazyLock<Regex> = LazyLock::new(|| compile(r"[A-Z][a-z]+\s+v\.\s+[A-Z][a-z]+"));

/// Full case citations with an optional reporter tail,
/// e.g. `Smith v. Maryland, 442 U.S. 735`.
pub static CASE_CITATION: LazyLock<Regex> = LazyLock::new(|| compile(r"[A-Z][a-z]+\s+v\.\s+[A-Z][a-z]+(?:,\s+\d+\s+[A-Z][A-Za-z.]*\s+\d+)?"));

/// Numeric date forms: `1/15/2024` and `2024-01-15`.
pub static NUMERIC_DATE: LazyLock<Regex> = LazyLock::new(|| compile(r"(\d{1,2}/\d{1,2}/\d{4}|\d{4}-\d{2}-\d{2})"));

/// Written-out date form: `January 15, 2024`.
pub static WRITTEN_DATE: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"(?:January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{1,2},?\s+\d{4}",
    )
});

/// Policy numbers: `Policy No. LE-2021-04`. Capture group 1 is the number.
pub static POLICY_NUMBER: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)Policy\s+No\.?\s*([A-Z0-9-]+)"));

/// Court names recognized in metadata extraction.
pub static COURT: LazyLock<Regex> = LazyLock::new(|| compile(r"(Supreme Court|Court of Appeals|District Court|Circuit Court)"));

/// Docket identifiers: `Docket No. 21-1234` or `Case No. 21-1234`.
pub static DOCKET_NUMBER: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)(?:Docket|Case)\s+No\.?\s*([A-Z0-9-]+)"));

/// Policy section headings of the form `1.1 Purpose`.
/// Group 1 is the section number, group 2 the title.
pub static SECTION_HEADING: LazyLock<Regex> = LazyLock::new(|| compile(r"^(\d+\.\d+)\s+(.+)$"));

/// Court-opinion section markers that hard-break case-law chunks.
pub static OPINION_MARKER: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)^(OPINION|DISSENT|CONCURRENCE)"));

/// Training-module markers that hard-break training chunks.
pub static MODULE_MARKER: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)^(?:Module|Topic|Chapter|Lesson)\s+\d+"));

/// All-caps lines treated as key terms in training material.
pub static KEY_TERM_LINE: LazyLock<Regex> = LazyLock::new(|| compile(r"^[A-Z][A-Z\s]+$"));

/// Lines that describe learning objectives.
pub static OBJECTIVE_LINE: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)objective|outcome|goal"));

/// Citation-chain patterns, in extraction order. The explicit `see`/`cf.`
/// forms capture the referenced section; the rest match in place.
static CITATION_CHAIN: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)see also § (\d+\.\d+)",
        r"(?i)see § (\d+\.\d+)",
        r"(?i)cf\. § (\d+\.\d+)",
        r"(\d+\.\d+[A-Z]*)",
        r"(\d+\s+U\.S\.C\.\s+\d+)",
        r"([A-Z][a-z]+\s+v\.\s+[A-Z][a-z]+)",
    ]
    .iter()
    .map(|p| compile(p))
    .collect()
});

/// Location patterns for entity extraction.
static LOCATION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\b[A-Z][a-z]+ County\b",
        r"\b[A-Z][a-z]+ (?:City|Town|Village)\b",
        r"\b\d+\s+[A-Z][a-z]+\s+(?:Street|St|Avenue|Ave|Road|Rd|Drive|Dr)\b",
        r"\b[A-Z]{2}\s+\d{5}\b",
        r"\bWisconsin\b",
        r"\bMadison\b",
        r"\bMilwaukee\b",
    ]
    .iter()
    .map(|p| compile(p))
    .collect()
});

/// Citation patterns used for entity overlap (broader than the chain set).
static ENTITY_CITATION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\b\d+\.\d+[A-Z]?\b",
        r"\b\d+\s+U\.S\.\s+\d+\b",
        r"\b\d+\s+Wis\.\s+\d+\b",
        r"\b\d+\s+U\.S\.C\.\s+\d+\b",
    ]
    .iter()
    .map(|p| compile(p))
    .collect()
});

/// Personal names, First Last form.
pub static PERSON_NAME: LazyLock<Regex> = LazyLock::new(|| compile(r"\b[A-Z][a-z]+\s+[A-Z][a-z]+\b"));

/// Wisconsin indicators. Checked before the federal set: explicit state
/// markers win when both appear.
pub const WISCONSIN_MARKERS: &[&str] = &[
    "wisconsin",
    "state of wisconsin",
    "wi statutes",
    "wisconsin statutes",
    "state sovereignty",
    "state jurisdiction",
    "chapter 1 sovereignty",
];

/// Federal-jurisdiction indicators.
pub const FEDERAL_MARKERS: &[&str] =
    &["federal", "u.s.", "united states", "congress", "supreme court"];

/// Generic state/local indicators.
pub const STATE_MARKERS: &[&str] = &["state", "local", "municipal", "county"];

/// Tokens that mark a law as explicitly current.
pub const CURRENT_MARKERS: &[&str] = &["current", "effective", "active", "valid"];

/// Tokens that mark a law as superseded. Lexical on purpose: a chunk
/// describing an amendment to another statute is still classed superseded.
pub const SUPERSEDED_MARKERS: &[&str] = &["superseded", "repealed", "amended", "replaced"];

/// Tokens that mark a law as pending.
pub const PENDING_MARKERS: &[&str] = &["pending", "proposed", "draft"];

/// Keywords that flag a question as use-of-force related.
pub const USE_OF_FORCE_KEYWORDS: &[&str] = &[
    "use of force",
    "deadly force",
    "lethal force",
    "shooting",
    "firearm",
    "weapon",
    "assault",
    "battery",
    "self-defense",
    "defense of others",
    "reasonable force",
    "excessive force",
    "police shooting",
    "officer involved",
];

/// Fixed legal vocabulary for keyword-entity extraction.
pub const LEGAL_KEYWORDS: &[&str] = &[
    "domestic violence",
    "traffic stop",
    "dui",
    "assault",
    "theft",
    "burglary",
    "drug possession",
    "weapon",
    "firearm",
    "miranda",
    "search warrant",
    "probable cause",
    "reasonable suspicion",
    "use of force",
    "excessive force",
    "civil rights",
    "discrimination",
    "county",
    "counties",
    "boundaries",
    "statutes",
    "laws",
    "training",
    "procedures",
    "policies",
    "enforcement",
    "officer",
    "police",
];

/// Extracts statute numbers from text, first-seen order, deduplicated.
#[must_use]
pub fn extract_statutes(text: &str) -> Vec<String> {
    dedup_matches(STATUTE_NUMBER.find_iter(text).map(|m| m.as_str()))
}

/// Extracts case citations (full form preferred) from text.
#[must_use]
pub fn extract_case_citations(text: &str) -> Vec<String> {
    dedup_matches(CASE_CITATION.find_iter(text).map(|m| m.as_str()))
}

/// Extracts dates in all three recognized forms.
#[must_use]
pub fn extract_dates(text: &str) -> Vec<String> {
    let numeric = NUMERIC_DATE.find_iter(text).map(|m| m.as_str());
    let written = WRITTEN_DATE.find_iter(text).map(|m| m.as_str());
    dedup_matches(numeric.chain(written))
}

/// Extracts policy numbers (the identifier capture, not the prefix).
#[must_use]
pub fn extract_policy_numbers(text: &str) -> Vec<String> {
    dedup_matches(
        POLICY_NUMBER
            .captures_iter(text)
            .filter_map(|c| c.get(1).map(|m| m.as_str())),
    )
}

/// Extracts the citation chain seeds from text: explicit `see`/`cf.`
/// references plus in-place statute numbers and case names.
#[must_use]
pub fn extract_citations(text: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for pattern in CITATION_CHAIN.iter() {
        for caps in pattern.captures_iter(text) {
            let value = caps
                .get(1)
                .map_or_else(|| caps[0].to_string(), |m| m.as_str().to_string());
            if seen.insert(value.clone()) {
                out.push(value);
            }
        }
    }
    out
}

/// Extracts locations using the location pattern set.
#[must_use]
pub fn extract_locations(text: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for pattern in LOCATION_PATTERNS.iter() {
        for m in pattern.find_iter(text) {
            if seen.insert(m.as_str().to_string()) {
                out.push(m.as_str().to_string());
            }
        }
    }
    out
}

/// Extracts citation entities for cross-reference overlap scoring.
#[must_use]
pub fn extract_entity_citations(text: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for pattern in ENTITY_CITATION_PATTERNS.iter() {
        for m in pattern.find_iter(text) {
            if seen.insert(m.as_str().to_string()) {
                out.push(m.as_str().to_string());
            }
        }
    }
    out
}

/// Returns true if any marker in `set` occurs as a substring of
/// the lowercased text.
#[must_use]
pub fn contains_any(text_lower: &str, set: &[&str]) -> bool {
    set.iter().any(|marker| text_lower.contains(marker))
}

/// Parses a recognized date string to a calendar date.
///
/// Accepts the same three forms the extraction patterns match.
#[must_use]
pub fn parse_date(text: &str) -> Option<chrono::NaiveDate> {
    let trimmed = text.trim();
    chrono::NaiveDate::parse_from_str(trimmed, "%m/%d/%Y")
        .or_else(|_| chrono::NaiveDate::parse_from_str(trimmed, "%Y-%m-%d"))
        .or_else(|_| chrono::NaiveDate::parse_from_str(trimmed, "%B %d, %Y"))
        .or_else(|_| chrono::NaiveDate::parse_from_str(trimmed, "%B %d %Y"))
        .ok()
}

/// Extracts the year from a recognized date string.
#[must_use]
pub fn date_year(text: &str) -> Option<i32> {
    use chrono::Datelike;
    parse_date(text).map(|d| d.year())
}

fn dedup_matches<'a>(matches: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for m in matches {
        if seen.insert(m) {
            out.push(m.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statute_numbers() {
        let statutes = extract_statutes("See 940.19 and 18 U.S.C. 2703 for details.");
        assert_eq!(statutes, vec!["940.19", "18 U.S.C. 2703"]);
    }

    #[test]
    fn test_statute_with_suffix() {
        let statutes = extract_statutes("Statute 1.1A applies here.");
        assert_eq!(statutes, vec!["1.1A"]);
    }

    #[test]
    fn test_case_citation_full_form() {
        let cites = extract_case_citations("In Smith v. Maryland, 442 U.S. 735 the court held...");
        assert_eq!(cites, vec!["Smith v. Maryland, 442 U.S. 735"]);
    }

    #[test]
    fn test_case_citation_short_form() {
        let cites = extract_case_citations("Compare with Katz v. United");
        assert_eq!(cites, vec!["Katz v. United"]);
    }

    #[test]
    fn test_dates_three_forms() {
        let dates = extract_dates("Filed 1/15/2024, amended 2023-06-01, effective March 3, 2022.");
        assert_eq!(dates.len(), 3);
        assert!(dates.contains(&"1/15/2024".to_string()));
        assert!(dates.contains(&"2023-06-01".to_string()));
        assert!(dates.contains(&"March 3, 2022".to_string()));
    }

    #[test]
    fn test_policy_numbers() {
        let nums = extract_policy_numbers("Per Policy No. LE-2021-04 and policy no. 7.");
        assert_eq!(nums, vec!["LE-2021-04", "7"]);
    }

    #[test]
    fn test_citation_chain_see_also() {
        let citations = extract_citations("For penalties see also § 940.01 of the statutes.");
        assert!(citations.contains(&"940.01".to_string()));
    }

    #[test]
    fn test_citations_dedup_preserves_order() {
        let citations = extract_citations("940.01 then 941.20 then 940.01 again");
        assert_eq!(citations, vec!["940.01", "941.20"]);
    }

    #[test]
    fn test_extraction_is_substring_of_input() {
        let text = "The court in Carpenter v. United, 585 U.S. 296 applied 18 U.S.C. 2703.";
        for statute in extract_statutes(text) {
            assert!(text.contains(&statute));
        }
        for cite in extract_case_citations(text) {
            assert!(text.contains(&cite));
        }
    }

    #[test]
    fn test_locations() {
        let locations = extract_locations("The arrest in Dane County near Madison, WI 53703.");
        assert!(locations.contains(&"Dane County".to_string()));
        assert!(locations.contains(&"Madison".to_string()));
        assert!(locations.contains(&"WI 53703".to_string()));
    }

    #[test]
    fn test_contains_any() {
        assert!(contains_any("this statute was repealed in 1999", SUPERSEDED_MARKERS));
        assert!(!contains_any("this statute is in effect", SUPERSEDED_MARKERS));
        assert!(contains_any("a proposed rule", PENDING_MARKERS));
    }

    #[test]
    fn test_parse_date_forms() {
        assert!(parse_date("1/15/2024").is_some());
        assert!(parse_date("2024-01-15").is_some());
        assert!(parse_date("January 15, 2024").is_some());
        assert!(parse_date("not a date").is_none());
    }

    #[test]
    fn test_date_year() {
        assert_eq!(date_year("1/15/2024"), Some(2024));
        assert_eq!(date_year("1999-03-02"), Some(1999));
    }

    #[test]
    fn test_opinion_marker() {
        assert!(OPINION_MARKER.is_match("OPINION OF THE COURT"));
        assert!(OPINION_MARKER.is_match("Dissent"));
        assert!(!OPINION_MARKER.is_match("The opinion below"));
    }

    #[test]
    fn test_section_heading() {
        let caps = SECTION_HEADING.captures("1.2 Scope").unwrap();
        assert_eq!(&caps[1], "1.2");
        assert_eq!(&caps[2], "Scope");
        assert!(SECTION_HEADING.captures("no heading here").is_none());
    }

    #[test]
    fn test_court_and_docket() {
        assert!(COURT.is_match("the Court of Appeals held"));
        assert!(!COURT.is_match("a municipal tribunal"));

        let caps = DOCKET_NUMBER.captures("Docket No. 21-1234").unwrap();
        assert_eq!(&caps[1], "21-1234");
        assert!(DOCKET_NUMBER.is_match("case no. A-77"));
    }

    #[test]
    fn test_module_marker() {
        assert!(MODULE_MARKER.is_match("Module 3: Report Writing"));
        assert!(MODULE_MARKER.is_match("lesson 12"));
        assert!(!MODULE_MARKER.is_match("This module covers"));
    }
}
