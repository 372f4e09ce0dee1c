//! PDF text extraction.
//!
//! Three-stage fallback: layout-aware extraction over the whole
//! document, then structural per-page extraction, then OCR. Each stage
//! runs only when the previous produced no text. OCR is not built into
//! this crate, so the third stage reports a missing capability instead
//! of failing the file outright.

use crate::error::{ExtractError, Result};
use crate::extract::ExtractionMetadata;

/// Extracts text from PDF bytes.
pub async fn extract_pdf(bytes: Vec<u8>, metadata: &mut ExtractionMetadata) -> Result<String> {
    let (text, page_count) = tokio::task::spawn_blocking(move || extract_stages(&bytes))
        .await
        .map_err(|e| ExtractError::Parse {
            format: "pdf".to_string(),
            reason: e.to_string(),
        })??;

    if let Some(pages) = page_count {
        metadata.page_count = Some(pages);
    }

    if text.trim().is_empty() {
        return Err(ExtractError::ExtractorUnavailable {
            capability: "ocr".to_string(),
        }
        .into());
    }

    Ok(text)
}

fn extract_stages(bytes: &[u8]) -> Result<(String, Option<usize>)> {
    // Stage 1: layout-aware extraction across the whole document.
    let layout_text = pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Parse {
        format: "pdf".to_string(),
        reason: e.to_string(),
    })?;
    if !layout_text.trim().is_empty() {
        return Ok((layout_text, None));
    }

    // Stage 2: structural per-page extraction.
    let pages =
        pdf_extract::extract_text_from_mem_by_pages(bytes).map_err(|e| ExtractError::Parse {
            format: "pdf".to_string(),
            reason: e.to_string(),
        })?;
    let page_count = pages.len();
    let joined = pages.join("\n");
    Ok((joined, Some(page_count)))
}
