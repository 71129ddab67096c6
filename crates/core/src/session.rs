use crate::error::IndexError;
use crate::index::{FlatL2Index, Neighbor};
use crate::models::{DocumentInfo, PageRecord};
use std::sync::Arc;
use tokio::sync::RwLock;

/// A fully indexed document: page records and their vectors, built together.
///
/// Position `i` in the index always refers to `pages[i]`; construction rejects
/// any other shape.
#[derive(Debug)]
pub struct LoadedDocument {
    info: DocumentInfo,
    pages: Vec<PageRecord>,
    index: FlatL2Index,
}

impl LoadedDocument {
    pub fn new(
        info: DocumentInfo,
        pages: Vec<PageRecord>,
        vectors: Vec<Vec<f32>>,
    ) -> Result<Self, IndexError> {
        if pages.len() != vectors.len() {
            return Err(IndexError::CountMismatch {
                pages: pages.len(),
                vectors: vectors.len(),
            });
        }

        let index = FlatL2Index::build(
            pages
                .iter()
                .map(|record| record.page)
                .zip(vectors)
                .collect(),
        )?;
        Ok(Self { info, pages, index })
    }

    pub fn info(&self) -> &DocumentInfo {
        &self.info
    }

    pub fn pages(&self) -> &[PageRecord] {
        &self.pages
    }

    pub fn index(&self) -> &FlatL2Index {
        &self.index
    }

    /// Nearest pages to `query`, paired with their records.
    pub fn nearest_pages(
        &self,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<(&PageRecord, Neighbor)>, IndexError> {
        let hits = self.index.search(query, k)?;
        Ok(hits
            .into_iter()
            .filter_map(|hit| {
                self.pages
                    .get(hit.position)
                    .filter(|record| record.page == hit.page)
                    .map(|record| (record, hit))
            })
            .collect())
    }
}

/// The single document the process serves. Starts empty; every upload swaps
/// in a complete new snapshot, readers keep whichever snapshot they cloned.
#[derive(Debug, Default)]
pub struct Session {
    current: RwLock<Option<Arc<LoadedDocument>>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn replace(&self, document: LoadedDocument) -> Option<Arc<LoadedDocument>> {
        let next = Arc::new(document);
        let mut guard = self.current.write().await;
        guard.replace(next)
    }

    pub async fn current(&self) -> Option<Arc<LoadedDocument>> {
        self.current.read().await.clone()
    }
}
