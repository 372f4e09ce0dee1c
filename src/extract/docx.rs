//! DOCX text extraction.
//!
//! Paragraph text first, then table-cell text, both in document order.

use crate::error::{ExtractError, Result};
use crate::extract::ExtractionMetadata;
use docx_rs::{
    DocumentChild, Paragraph, ParagraphChild, RunChild, TableCellContent, TableChild,
    TableRowChild,
};

/// Extracts text from DOCX bytes.
pub async fn extract_docx(bytes: Vec<u8>, metadata: &mut ExtractionMetadata) -> Result<String> {
    let (text, paragraphs, tables) = tokio::task::spawn_blocking(move || read_docx_text(&bytes))
        .await
        .map_err(|e| ExtractError::Parse {
            format: "docx".to_string(),
            reason: e.to_string(),
        })??;

    metadata.paragraph_count = Some(paragraphs);
    metadata.table_count = Some(tables);
    Ok(text)
}

fn read_docx_text(bytes: &[u8]) -> Result<(String, usize, usize)> {
    let docx = docx_rs::read_docx(bytes).map_err(|e| ExtractError::Parse {
        format: "docx".to_string(),
        reason: e.to_string(),
    })?;

    let mut text = String::new();
    let mut paragraph_count = 0usize;
    let mut table_count = 0usize;

    // Paragraph text in document order.
    for child in &docx.document.children {
        if let DocumentChild::Paragraph(paragraph) = child {
            paragraph_count += 1;
            text.push_str(&paragraph_text(paragraph));
            text.push('\n');
        }
    }

    // Table-cell text afterwards, in document order.
    for child in &docx.document.children {
        if let DocumentChild::Table(table) = child {
            table_count += 1;
            for row in &table.rows {
                let TableChild::TableRow(row) = row;
                for cell in &row.cells {
                    let TableRowChild::TableCell(cell) = cell;
                    for content in &cell.children {
                        if let TableCellContent::Paragraph(paragraph) = content {
                            text.push_str(&paragraph_text(paragraph));
                            text.push('\n');
                        }
                    }
                }
            }
        }
    }

    Ok((text, paragraph_count, table_count))
}

fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut out = String::new();
    for child in &paragraph.children {
        if let ParagraphChild::Run(run) = child {
            for run_child in &run.children {
                if let RunChild::Text(text) = run_child {
                    out.push_str(&text.text);
                }
            }
        }
    }
    out
}
