//! HTML text extraction.
//!
//! Parses the document, drops script and style content, and collapses
//! whitespace runs.

use crate::error::Result;
use crate::extract::text::extract_text_file;
use scraper::Html;
use std::path::Path;

/// Extracts visible text from HTML bytes.
pub fn extract_html(bytes: &[u8], path: &Path) -> Result<String> {
    let raw = extract_text_file(bytes, path)?;
    let document = Html::parse_document(&raw);

    let mut out = String::new();
    for node in document.tree.nodes() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let skip = node
            .parent()
            .and_then(|p| p.value().as_element().map(|e| e.name().to_lowercase()))
            .is_some_and(|name| name == "script" || name == "style");
        if !skip {
            out.push_str(text);
            out.push(' ');
        }
    }

    // Collapse whitespace runs while keeping line breaks meaningful.
    let collapsed: String = out.split_whitespace().collect::<Vec<_>>().join(" ");
    Ok(collapsed)
}
