use crate::embeddings::Embedder;
use crate::session::{LoadedDocument, Session};
use crate::{SearchError, SearchOptions, SearchOutcome, SearchResult};
use regex::{Regex, RegexBuilder};
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct SearchCoordinator {
    embedder: Arc<dyn Embedder>,
    options: SearchOptions,
}

impl SearchCoordinator {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            options: SearchOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SearchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> SearchOptions {
        self.options
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Ranks the document's pages against `query`. Result order is ascending
    /// vector distance; the distance itself is not reported.
    pub fn search(
        &self,
        document: &LoadedDocument,
        query: &str,
        k: usize,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let query_vector = self.embedder.embed(query)?;
        let hits = document.nearest_pages(&query_vector, k)?;
        let pattern = whole_word_pattern(query)?;

        debug!(query = %query, hits = hits.len(), "vector search done");

        Ok(hits
            .into_iter()
            .map(|(record, _)| SearchResult {
                page: record.page,
                count: pattern.find_iter(&record.text).count(),
                preview: preview(&record.text, self.options.preview_chars),
            })
            .collect())
    }

    /// Searches whatever document the session holds right now. Encoding runs
    /// on the blocking pool against a snapshot, so a concurrent upload cannot
    /// change the pages under it.
    pub async fn search_session(
        &self,
        session: &Session,
        query: &str,
        k: Option<usize>,
    ) -> Result<SearchOutcome, SearchError> {
        let Some(document) = session.current().await else {
            return Ok(SearchOutcome::NoDocument);
        };

        let coordinator = self.clone();
        let query = query.to_string();
        let k = k.unwrap_or(self.options.top_k);

        let results = tokio::task::spawn_blocking(move || coordinator.search(&document, &query, k))
            .await
            .map_err(|error| SearchError::Worker(error.to_string()))??;

        Ok(SearchOutcome::Results(results))
    }
}

/// Case-insensitive whole-word matcher for `query` taken literally.
pub fn whole_word_pattern(query: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&format!(r"\b{}\b", regex::escape(query)))
        .case_insensitive(true)
        .build()
}

pub fn count_whole_word(text: &str, query: &str) -> Result<usize, regex::Error> {
    Ok(whole_word_pattern(query)?.find_iter(text).count())
}

/// First `max_chars` characters followed by `...`, whether or not anything was cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut preview: String = text.chars().take(max_chars).collect();
    preview.push_str("...");
    preview
}
