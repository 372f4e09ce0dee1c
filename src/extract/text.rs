//! Plain-text extraction with encoding fallback.
//!
//! UTF-8 first, then a fixed list of legacy encodings. A file that none
//! of them decode is fatal for that file.

use crate::error::{ExtractError, Result};
use std::path::Path;

/// Decodes a text file: UTF-8, then windows-1252, then iso-8859-1.
pub fn extract_text_file(bytes: &[u8], path: &Path) -> Result<String> {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok(text.to_string());
    }

    for encoding in [encoding_rs::WINDOWS_1252, encoding_rs::ISO_8859_15] {
        let (decoded, _, had_errors) = encoding.decode(bytes);
        if !had_errors {
            return Ok(decoded.into_owned());
        }
    }

    Err(ExtractError::DecodeFailed {
        path: path.display().to_string(),
    }
    .into())
}
