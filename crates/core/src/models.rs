use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One non-blank page of the loaded document, numbered by physical position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    pub page: u32,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub document_id: String,
    pub file_name: String,
    pub source_path: String,
    pub checksum: String,
    pub page_count: usize,
    pub loaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub page: u32,
    pub count: usize,
    pub preview: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Nothing has been uploaded yet.
    NoDocument,
    Results(Vec<SearchResult>),
}

impl SearchOutcome {
    pub fn results(&self) -> Option<&[SearchResult]> {
        match self {
            SearchOutcome::NoDocument => None,
            SearchOutcome::Results(results) => Some(results),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    pub top_k: usize,
    pub preview_chars: usize,
}

pub const DEFAULT_TOP_K: usize = 3;
pub const DEFAULT_PREVIEW_CHARS: usize = 300;

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            preview_chars: DEFAULT_PREVIEW_CHARS,
        }
    }
}
