use crate::embeddings::Embedder;
use crate::extractor::{LopdfExtractor, PdfExtractor};
use crate::session::{LoadedDocument, Session};
use crate::{DocumentInfo, IngestError};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

const PDF_SUFFIX: &str = ".pdf";

/// Literal, case-sensitive suffix check on the client-supplied name.
pub fn is_pdf_file_name(name: &str) -> bool {
    name.ends_with(PDF_SUFFIX)
}

/// Reduces a client file name to `[A-Za-z0-9._-]`, with path separators and
/// whitespace turned into `_` and leading/trailing dots and underscores removed.
pub fn sanitize_file_name(name: &str) -> String {
    let spaced = name.replace(['/', '\\'], " ");
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    kept.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Name under which an upload is written to the upload directory.
pub fn stored_file_name(client_name: &str) -> Result<String, IngestError> {
    if !is_pdf_file_name(client_name) {
        return Err(IngestError::NotPdf(client_name.to_string()));
    }

    let sanitized = sanitize_file_name(client_name);
    if sanitized.len() > PDF_SUFFIX.len() && is_pdf_file_name(&sanitized) {
        Ok(sanitized)
    } else {
        Ok(format!("upload-{}{PDF_SUFFIX}", Uuid::new_v4()))
    }
}

pub fn digest_file(path: &Path) -> Result<String, IngestError> {
    let bytes = fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

/// Turns an uploaded PDF into a [`LoadedDocument`] and publishes it to the
/// session.
#[derive(Clone)]
pub struct Ingestor {
    embedder: Arc<dyn Embedder>,
    upload_dir: PathBuf,
}

impl Ingestor {
    pub fn new(embedder: Arc<dyn Embedder>, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            embedder,
            upload_dir: upload_dir.into(),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Writes the upload to disk. Files are kept after indexing.
    pub fn save_upload(&self, client_name: &str, bytes: &[u8]) -> Result<PathBuf, IngestError> {
        let file_name = stored_file_name(client_name)?;
        fs::create_dir_all(&self.upload_dir)?;
        let path = self.upload_dir.join(&file_name);
        fs::write(&path, bytes)?;
        info!(file = %file_name, bytes = bytes.len(), "PDF uploaded: {file_name}");
        Ok(path)
    }

    /// Extracts, embeds and indexes one PDF. Blocking.
    pub fn index_file(&self, path: &Path) -> Result<LoadedDocument, IngestError> {
        self.index_file_with(&LopdfExtractor, path)
    }

    pub fn index_file_with(
        &self,
        extractor: &dyn PdfExtractor,
        path: &Path,
    ) -> Result<LoadedDocument, IngestError> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| IngestError::MissingFileName(path.display().to_string()))?
            .to_string();
        let checksum = digest_file(path)?;

        let pages = extractor.extract_pages(path)?;
        if pages.is_empty() {
            warn!(file = %file_name, "pdf has no readable page text");
        }

        let texts: Vec<String> = pages.iter().map(|page| page.text.clone()).collect();
        let vectors = self.embedder.embed_all(&texts)?;

        let info = DocumentInfo {
            document_id: Uuid::new_v4().to_string(),
            file_name,
            source_path: path.to_string_lossy().to_string(),
            checksum,
            page_count: pages.len(),
            loaded_at: Utc::now(),
        };
        let document = LoadedDocument::new(info, pages, vectors)?;

        info!(
            model = self.embedder.model_name(),
            "built index with {} vectors",
            document.index().len()
        );
        Ok(document)
    }

    /// Saves, indexes and publishes an upload. On any failure the session
    /// keeps its previous document.
    pub async fn upload(
        &self,
        session: &Session,
        client_name: &str,
        bytes: Vec<u8>,
    ) -> Result<DocumentInfo, IngestError> {
        let ingestor = self.clone();
        let client_name = client_name.to_string();

        let document = tokio::task::spawn_blocking(move || {
            let path = ingestor.save_upload(&client_name, &bytes)?;
            ingestor.index_file(&path)
        })
        .await
        .map_err(|error| IngestError::Worker(error.to_string()))??;

        let info = document.info().clone();
        session.replace(document).await;
        Ok(info)
    }
}
