pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod index;
pub mod ingest;
pub mod models;
pub mod orchestrator;
pub mod session;

#[cfg(feature = "fastembed")]
pub use embeddings::MiniLmEmbedder;
pub use embeddings::{CharacterNgramEmbedder, Embedder, DEFAULT_EMBEDDING_DIMENSIONS};
pub use error::{DocumentError, EncodingError, IndexError, IngestError, SearchError};
pub use extractor::{extract_page_records, LopdfExtractor, PdfExtractor};
pub use index::{FlatL2Index, Neighbor};
pub use ingest::{digest_file, is_pdf_file_name, sanitize_file_name, stored_file_name, Ingestor};
pub use models::{
    DocumentInfo, PageRecord, SearchOptions, SearchOutcome, SearchResult, DEFAULT_PREVIEW_CHARS,
    DEFAULT_TOP_K,
};
pub use orchestrator::{count_whole_word, preview, whole_word_pattern, SearchCoordinator};
pub use session::{LoadedDocument, Session};
