//! PDF text extraction.
//!
//! Turns raw PDF bytes into ordered per-page text units. Extraction itself is
//! delegated to `pdf-extract`; pages come back separated by form feeds.

use crate::types::{AppError, Result};

const PAGE_BREAK: char = '\x0C';

pub struct PdfLoader;

impl PdfLoader {
    /// Extract the text of every page of `bytes`.
    ///
    /// Runs on the blocking pool. A document without page breaks is returned
    /// as a single unit.
    pub async fn load(bytes: Vec<u8>) -> Result<Vec<String>> {
        let text = tokio::task::spawn_blocking(move || Self::extract_text(&bytes))
            .await
            .map_err(|e| AppError::Extraction(format!("extraction task failed: {}", e)))??;

        Ok(split_pages(&text))
    }

    /// Synchronous extraction of the whole text layer.
    pub fn extract_text(bytes: &[u8]) -> Result<String> {
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| AppError::Extraction(e.to_string()))
    }
}

/// Split extracted text into page units on form feeds.
///
/// A trailing form feed does not produce an extra empty page.
pub fn split_pages(text: &str) -> Vec<String> {
    let trimmed = text.strip_suffix(PAGE_BREAK).unwrap_or(text);
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split(PAGE_BREAK).map(str::to_string).collect()
}
