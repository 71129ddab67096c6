use crate::error::EncodingError;

const DEFAULT: usize = 128;

pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = DEFAULT;

/// Maps text to a fixed-length vector. Implementations must be deterministic
/// for a given model version.
pub trait Embedder: Send + Sync {
    fn model_name(&self) -> &str;

    fn dimensions(&self) -> usize;

    fn embed(&self, text: &str) -> Result<Vec<f32>, EncodingError>;

    /// Batch form; output order follows input order.
    fn embed_all(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EncodingError> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}

fn ensure_non_empty(text: &str) -> Result<(), EncodingError> {
    if text.trim().is_empty() {
        Err(EncodingError::EmptyInput)
    } else {
        Ok(())
    }
}

/// Hashed character-trigram embedder. Needs no model files, used offline and in tests.
#[derive(Debug, Clone, Copy)]
pub struct CharacterNgramEmbedder {
    pub dimensions: usize,
}

impl Default for CharacterNgramEmbedder {
    fn default() -> Self {
        Self {
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
        }
    }
}

impl Embedder for CharacterNgramEmbedder {
    fn model_name(&self) -> &str {
        "char-trigram"
    }

    fn dimensions(&self) -> usize {
        self.dimensions.max(1)
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EncodingError> {
        ensure_non_empty(text)?;

        let mut vector = vec![0f32; self.dimensions()];
        let lowered = text.to_lowercase();
        let chars: Vec<char> = lowered.chars().collect();

        for window in chars.windows(3) {
            let token = window.iter().collect::<String>();
            let mut hash = 1469598103934665603u64;
            for byte in token.bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(1099511628211);
            }
            let bucket = (hash % vector.len() as u64) as usize;
            vector[bucket] += 1.0;
        }

        let magnitude = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut vector {
                *value /= magnitude;
            }
        }

        Ok(vector)
    }
}

#[cfg(feature = "fastembed")]
pub use minilm::MiniLmEmbedder;

#[cfg(feature = "fastembed")]
mod minilm {
    use super::{ensure_non_empty, Embedder};
    use crate::error::EncodingError;
    use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
    use std::path::PathBuf;
    use std::sync::Mutex;

    pub const MINILM_DIMENSIONS: usize = 384;

    /// all-MiniLM-L6-v2 sentence embeddings through ONNX runtime.
    ///
    /// The model is loaded once when constructed; the first construction on a
    /// machine downloads the weights into the cache directory.
    pub struct MiniLmEmbedder {
        model: Mutex<TextEmbedding>,
    }

    impl MiniLmEmbedder {
        pub fn load(cache_dir: Option<PathBuf>) -> Result<Self, EncodingError> {
            let mut options =
                InitOptions::new(EmbeddingModel::AllMiniLML6V2).with_show_download_progress(false);
            if let Some(dir) = cache_dir {
                options = options.with_cache_dir(dir);
            }

            let model = TextEmbedding::try_new(options)
                .map_err(|error| EncodingError::ModelUnavailable(error.to_string()))?;

            Ok(Self {
                model: Mutex::new(model),
            })
        }

        fn run(&self, texts: Vec<&str>) -> Result<Vec<Vec<f32>>, EncodingError> {
            let requested = texts.len();
            let model = self
                .model
                .lock()
                .map_err(|_| EncodingError::ModelUnavailable("model lock poisoned".to_string()))?;
            let vectors = model
                .embed(texts, None)
                .map_err(|error| EncodingError::Model(error.to_string()))?;

            if vectors.len() != requested {
                return Err(EncodingError::BatchSize {
                    requested,
                    returned: vectors.len(),
                });
            }
            Ok(vectors)
        }
    }

    impl Embedder for MiniLmEmbedder {
        fn model_name(&self) -> &str {
            "all-MiniLM-L6-v2"
        }

        fn dimensions(&self) -> usize {
            MINILM_DIMENSIONS
        }

        fn embed(&self, text: &str) -> Result<Vec<f32>, EncodingError> {
            ensure_non_empty(text)?;
            self.run(vec![text])?
                .pop()
                .ok_or(EncodingError::BatchSize {
                    requested: 1,
                    returned: 0,
                })
        }

        fn embed_all(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EncodingError> {
            if texts.is_empty() {
                return Ok(Vec::new());
            }
            for text in texts {
                ensure_non_empty(text)?;
            }
            self.run(texts.iter().map(String::as_str).collect())
        }
    }
}
