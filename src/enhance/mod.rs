//! Query enhancement for legal terminology.
//!
//! Three transforms applied in order: abbreviation expansion, spell
//! correction, synonym addition. The tables are process-wide constants,
//! loaded once and never mutated. Enhancement is idempotent: running it
//! on an already-enhanced query changes nothing.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Law-enforcement and legal abbreviations and their expansions.
const ABBREVIATIONS: &[(&str, &str)] = &[
    ("LEO", "Law Enforcement Officer"),
    ("DOJ", "Department of Justice"),
    ("FBI", "Federal Bureau of Investigation"),
    ("DEA", "Drug Enforcement Administration"),
    ("ATF", "Bureau of Alcohol, Tobacco, Firearms and Explosives"),
    ("ICE", "Immigration and Customs Enforcement"),
    ("DHS", "Department of Homeland Security"),
    ("USC", "United States Code"),
    ("CFR", "Code of Federal Regulations"),
    ("SCOTUS", "Supreme Court of the United States"),
    ("F.R.C.P.", "Federal Rules of Civil Procedure"),
    ("F.R.Cr.P.", "Federal Rules of Criminal Procedure"),
    ("F.R.E.", "Federal Rules of Evidence"),
    ("4th Am.", "Fourth Amendment"),
    ("5th Am.", "Fifth Amendment"),
    ("6th Am.", "Sixth Amendment"),
    ("8th Am.", "Eighth Amendment"),
    ("14th Am.", "Fourteenth Amendment"),
];

/// Common misspellings of legal terms.
const SPELL_CORRECTIONS: &[(&str, &str)] = &[
    ("amendmant", "amendment"),
    ("ammendment", "amendment"),
    ("constititional", "constitutional"),
    ("constituional", "constitutional"),
    ("jurisdiciton", "jurisdiction"),
    ("jurisdicition", "jurisdiction"),
    ("statutue", "statute"),
    ("statutte", "statute"),
    ("warrrant", "warrant"),
    ("warrantt", "warrant"),
    ("evidance", "evidence"),
    ("evidense", "evidence"),
    ("privacey", "privacy"),
    ("privicy", "privacy"),
    ("digitial", "digital"),
    ("digtial", "digital"),
    ("enforcment", "enforcement"),
    ("enforcemnt", "enforcement"),
    ("investigaton", "investigation"),
    ("criminial", "criminal"),
    ("crimnal", "criminal"),
    ("federral", "federal"),
    ("fedral", "federal"),
    ("supreem", "supreme"),
    ("appelate", "appellate"),
    ("distric", "district"),
    ("distrct", "district"),
];

/// Legal synonyms and related terms, keyed by source term.
const SYNONYMS: &[(&str, &[&str])] = &[
    ("search", &["search", "seizure", "inspection", "examination", "investigation"]),
    ("warrant", &["warrant", "court order", "judicial authorization", "search warrant"]),
    ("evidence", &["evidence", "proof", "testimony", "documentation", "exhibit"]),
    ("privacy", &["privacy", "confidentiality", "secrecy", "protection", "right to privacy"]),
    ("digital", &["digital", "electronic", "computer", "online", "cyber", "virtual"]),
    ("amendment", &["amendment", "constitutional right", "bill of rights"]),
    ("statute", &["statute", "law", "code", "regulation", "ordinance"]),
    ("case", &["case", "decision", "ruling", "opinion", "precedent"]),
    ("court", &["court", "tribunal", "judiciary", "bench"]),
    ("law enforcement", &["law enforcement", "police", "officer", "detective", "investigator"]),
    ("criminal", &["criminal", "felony", "misdemeanor", "offense", "crime"]),
    ("civil", &["civil", "civilian", "private", "non-criminal"]),
    ("federal", &["federal", "national", "U.S.", "United States"]),
    ("state", &["state", "local", "municipal", "county"]),
    ("supreme court", &["supreme court", "SCOTUS", "U.S. Supreme Court"]),
    ("appeals court", &["appeals court", "circuit court", "appellate court"]),
    ("district court", &["district court", "trial court", "federal district court"]),
];

/// Per-term synonym cap.
const MAX_SYNONYMS_PER_TERM: usize = 2;

/// Total appended-synonym cap per query.
const MAX_SYNONYMS_TOTAL: usize = 5;

/// Whole-word rewrite rules compiled once at startup.
static ABBREVIATION_RULES: LazyLock<Vec<(String, Regex, &'static str)>> = LazyLock::new(|| {
    ABBREVIATIONS
        .iter()
        .map(|(abbr, full)| ((*abbr).to_string(), word_bounded(abbr), *full))
        .collect()
});

static CORRECTION_RULES: LazyLock<Vec<(String, Regex, &'static str)>> = LazyLock::new(|| {
    SPELL_CORRECTIONS
        .iter()
        .map(|(wrong, right)| ((*wrong).to_string(), word_bounded(wrong), *right))
        .collect()
});

/// Builds a whole-word, case-insensitive pattern for a table entry.
///
/// `\b` only works where the entry starts/ends with a word character, so
/// dotted abbreviations like `4th Am.` get no trailing anchor.
fn word_bounded(entry: &str) -> Regex {
    let escaped = regex::escape(entry);
    let leading = if entry.starts_with(|c: char| c.is_alphanumeric()) {
        r"\b"
    } else {
        ""
    };
    let trailing = if entry.ends_with(|c: char| c.is_alphanumeric()) {
        r"\b"
    } else {
        ""
    };
    #[allow(clippy::unwrap_used)]
    let re = Regex::new(&format!("(?i){leading}{escaped}{trailing}")).unwrap();
    re
}

/// Record of the transforms applied to one query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryEnhancement {
    /// The query as submitted.
    pub original: String,
    /// Query after abbreviation expansion and spell correction.
    pub corrected: String,
    /// Abbreviations found, mapped to their expansions.
    pub abbreviations: BTreeMap<String, String>,
    /// Misspellings found, mapped to their corrections.
    pub corrections: BTreeMap<String, String>,
    /// Synonyms appended to the end of the query, in order.
    pub synonyms_added: Vec<String>,
    /// The final enhanced query.
    pub enhanced: String,
}

/// Applies the three enhancement transforms to legal queries.
///
/// Stateless; the tables live for the life of the process.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryEnhancer;

impl QueryEnhancer {
    /// Creates a new query enhancer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Enhances a query, recording every transform applied.
    #[must_use]
    pub fn enhance(&self, query: &str) -> QueryEnhancement {
        let mut text = query.to_string();
        let mut abbreviations = BTreeMap::new();
        let mut corrections = BTreeMap::new();

        for (abbr, rule, full) in ABBREVIATION_RULES.iter() {
            if rule.is_match(&text) {
                text = rule.replace_all(&text, regex::NoExpand(*full)).into_owned();
                abbreviations.insert(abbr.clone(), (*full).to_string());
            }
        }

        for (wrong, rule, right) in CORRECTION_RULES.iter() {
            if rule.is_match(&text) {
                text = rule
                    .replace_all(&text, regex::NoExpand(*right))
                    .into_owned();
                corrections.insert(wrong.clone(), (*right).to_string());
            }
        }

        let corrected = text.clone();
        let query_lower = query.to_lowercase();
        let mut synonyms_added: Vec<String> = Vec::new();

        for (term, synonyms) in SYNONYMS {
            if !query_lower.contains(term) {
                continue;
            }
            // Only the first two candidates per term are considered, so
            // re-running on an enhanced query appends nothing new.
            for synonym in synonyms.iter().take(MAX_SYNONYMS_PER_TERM) {
                if synonyms_added.len() >= MAX_SYNONYMS_TOTAL {
                    break;
                }
                let synonym_lower = synonym.to_lowercase();
                let already_present = query_lower.contains(&synonym_lower)
                    || synonyms_added
                        .iter()
                        .any(|s| s.to_lowercase() == synonym_lower);
                if !already_present {
                    synonyms_added.push((*synonym).to_string());
                }
            }
        }

        let enhanced = if synonyms_added.is_empty() {
            corrected.clone()
        } else {
            format!("{corrected} {}", synonyms_added.join(" "))
        };

        QueryEnhancement {
            original: query.to_string(),
            corrected,
            abbreviations,
            corrections,
            synonyms_added,
            enhanced,
        }
    }
}
