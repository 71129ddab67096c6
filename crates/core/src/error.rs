use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf parse error: {0}")]
    PdfParse(String),
}

#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("cannot encode empty text")]
    EmptyInput,

    #[error("embedding model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("embedding model failed: {0}")]
    Model(String),

    #[error("embedding model returned {returned} vectors for {requested} inputs")]
    BatchSize { requested: usize, returned: usize },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexError {
    #[error("vector {position} has dimension {found}, expected {expected}")]
    DimensionMismatch {
        position: usize,
        expected: usize,
        found: usize,
    },

    #[error("query vector has dimension {found}, index holds dimension {expected}")]
    QueryDimension { expected: usize, found: usize },

    #[error("page count {pages} doesn't match vector count {vectors}")]
    CountMismatch { pages: usize, vectors: usize },

    #[error("k must be at least 1")]
    InvalidK,
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("not a pdf file name: {0}")]
    NotPdf(String),

    #[error("path has no file name: {0}")]
    MissingFileName(String),

    #[error("ingestion worker failed: {0}")]
    Worker(String),
}

impl From<std::io::Error> for IngestError {
    fn from(value: std::io::Error) -> Self {
        Self::Document(DocumentError::Io(value))
    }
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("search worker failed: {0}")]
    Worker(String),
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;
