//! Page-by-page document loading
//!
//! Source documents are loaded as a sequence of pages so that every chunk
//! can cite the page it came from.

use crate::error::{Result, TutorError};
use crate::utils::get_file_extension;
use lopdf::Document;
use std::path::Path;

/// One page of extracted text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// 1-based page number
    pub number: u32,
    pub text: String,
}

/// Loads a document into pages
pub trait PageLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<Vec<Page>>;
}

/// PDF loader backed by lopdf
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfLoader;

impl PageLoader for PdfLoader {
    fn load(&self, path: &Path) -> Result<Vec<Page>> {
        let document = Document::load(path)
            .map_err(|e| TutorError::Pdf(format!("Failed to open {}: {}", path.display(), e)))?;

        let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();
        let pages = collect_pages(path, &page_numbers, |n| {
            document.extract_text(&[n]).map_err(TutorError::from)
        })?;

        log::debug!("Loaded {} pages from {}", pages.len(), path.display());
        Ok(pages)
    }
}

/// Extract every page, keeping unreadable ones as empty pages
///
/// Fails only when no page at all could be read.
fn collect_pages<F>(path: &Path, page_numbers: &[u32], mut extract: F) -> Result<Vec<Page>>
where
    F: FnMut(u32) -> Result<String>,
{
    let mut pages = Vec::with_capacity(page_numbers.len());
    let mut failed = 0;

    for &number in page_numbers {
        let text = match extract(number) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Failed to extract page {} of {}: {}", number, path.display(), e);
                failed += 1;
                String::new()
            }
        };
        pages.push(Page { number, text });
    }

    if !pages.is_empty() && failed == pages.len() {
        return Err(TutorError::Pdf(format!(
            "No page of {} could be extracted",
            path.display()
        )));
    }
    Ok(pages)
}

/// Plain-text loader; form feeds (`\x0c`) separate pages
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextLoader;

impl PageLoader for PlainTextLoader {
    fn load(&self, path: &Path) -> Result<Vec<Page>> {
        let content = std::fs::read_to_string(path)?;
        Ok(content
            .split('\x0c')
            .enumerate()
            .map(|(i, text)| Page {
                number: i as u32 + 1,
                text: text.to_string(),
            })
            .collect())
    }
}

/// Pick a loader by file extension
pub fn loader_for(path: &Path) -> Option<&'static dyn PageLoader> {
    match get_file_extension(path)?.as_str() {
        "pdf" => Some(&PdfLoader),
        "txt" => Some(&PlainTextLoader),
        _ => None,
    }
}
