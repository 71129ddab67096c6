use crate::error::DocumentError;
use crate::models::PageRecord;
use lopdf::Document;
use std::path::Path;
use tracing::warn;

pub trait PdfExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<PageRecord>, DocumentError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfExtractor;

impl PdfExtractor for LopdfExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<PageRecord>, DocumentError> {
        if !path.is_file() {
            return Err(DocumentError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no such file: {}", path.display()),
            )));
        }

        let document =
            Document::load(path).map_err(|error| DocumentError::PdfParse(error.to_string()))?;

        // get_pages is keyed by 1-based physical page number, in order.
        let page_numbers: Vec<u32> = document.get_pages().into_keys().collect();
        Ok(collect_pages(&page_numbers, |page_no| document.extract_text(&[page_no])))
    }
}

/// Extracts every page on its own; a page whose text cannot be decoded is
/// skipped like a blank one.
fn collect_pages<F, E>(page_numbers: &[u32], mut extract: F) -> Vec<PageRecord>
where
    F: FnMut(u32) -> Result<String, E>,
    E: std::fmt::Display,
{
    let mut pages = Vec::new();
    for &page_no in page_numbers {
        match extract(page_no) {
            Ok(text) => {
                if let Some(record) = page_record(page_no, &text) {
                    pages.push(record);
                }
            }
            Err(error) => warn!(page = page_no, %error, "skipping page with unreadable text"),
        }
    }
    pages
}

pub fn extract_page_records(path: &Path) -> Result<Vec<PageRecord>, DocumentError> {
    LopdfExtractor.extract_pages(path)
}

fn page_record(page: u32, raw: &str) -> Option<PageRecord> {
    let text = raw.trim();
    if text.is_empty() {
        None
    } else {
        Some(PageRecord {
            page,
            text: text.to_string(),
        })
    }
}
