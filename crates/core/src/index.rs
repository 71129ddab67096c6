use crate::error::IndexError;

/// One hit from [`FlatL2Index::search`]: the insertion position of the stored
/// vector, the page it was built from and its squared Euclidean distance to
/// the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub position: usize,
    pub page: u32,
    pub distance: f32,
}

#[derive(Debug, Clone)]
struct IndexedVector {
    page: u32,
    vector: Vec<f32>,
}

/// Exact nearest-neighbour index. Every query scans all stored vectors.
#[derive(Debug, Clone, Default)]
pub struct FlatL2Index {
    dimension: usize,
    entries: Vec<IndexedVector>,
}

impl FlatL2Index {
    /// Builds from `(page number, vector)` pairs; insertion order is kept.
    pub fn build(vectors: Vec<(u32, Vec<f32>)>) -> Result<Self, IndexError> {
        let dimension = vectors
            .first()
            .map(|(_, vector)| vector.len())
            .unwrap_or_default();

        let mut entries = Vec::with_capacity(vectors.len());
        for (position, (page, vector)) in vectors.into_iter().enumerate() {
            if vector.len() != dimension {
                return Err(IndexError::DimensionMismatch {
                    position,
                    expected: dimension,
                    found: vector.len(),
                });
            }
            entries.push(IndexedVector { page, vector });
        }

        Ok(Self { dimension, entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// The `k` closest vectors, ascending by distance, ties broken by lower
    /// position. An empty index answers every query with no hits.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, IndexError> {
        if k == 0 {
            return Err(IndexError::InvalidK);
        }
        if self.entries.is_empty() {
            return Ok(Vec::new());
        }
        if query.len() != self.dimension {
            return Err(IndexError::QueryDimension {
                expected: self.dimension,
                found: query.len(),
            });
        }

        let mut scored: Vec<Neighbor> = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, entry)| Neighbor {
                position,
                page: entry.page,
                distance: squared_l2(&entry.vector, query),
            })
            .collect();

        // stable sort keeps insertion order among equal distances
        scored.sort_by(|left, right| left.distance.total_cmp(&right.distance));
        scored.truncate(k);
        Ok(scored)
    }
}

fn squared_l2(left: &[f32], right: &[f32]) -> f32 {
    left.iter()
        .zip(right)
        .map(|(a, b)| {
            let diff = a - b;
            diff * diff
        })
        .sum()
}
