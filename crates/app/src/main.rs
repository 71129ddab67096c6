mod routes;
mod views;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, ValueEnum};
use pdf_page_search_core::{
    CharacterNgramEmbedder, Embedder, Ingestor, SearchCoordinator, SearchOptions, Session,
    DEFAULT_PREVIEW_CHARS, DEFAULT_TOP_K,
};
use std::fs::OpenOptions;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "pdf-page-search", version, about = "Upload a PDF and search its pages")]
struct Cli {
    /// Address to bind the HTTP server to (host:port).
    #[arg(long, env = "PDF_SEARCH_BIND", default_value = "127.0.0.1:5000")]
    bind: SocketAddr,

    /// Directory uploaded PDFs are written to.
    #[arg(long, env = "PDF_SEARCH_UPLOAD_DIR", default_value = "uploads")]
    upload_dir: PathBuf,

    /// Append-only log file.
    #[arg(long, env = "PDF_SEARCH_LOG_FILE", default_value = "logs/app.log")]
    log_file: PathBuf,

    /// Pages returned per query.
    #[arg(long, env = "PDF_SEARCH_TOP_K", default_value_t = DEFAULT_TOP_K)]
    top_k: usize,

    /// Embedding model used for pages and queries.
    #[arg(
        long,
        env = "PDF_SEARCH_EMBEDDER",
        value_enum,
        default_value_t = EmbedderKind::default()
    )]
    embedder: EmbedderKind,

    /// Where downloaded model weights are cached.
    #[arg(long, env = "PDF_SEARCH_MODEL_CACHE")]
    model_cache_dir: Option<PathBuf>,

    /// Largest accepted upload, in megabytes.
    #[arg(long, default_value_t = 64)]
    max_upload_mb: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EmbedderKind {
    /// all-MiniLM-L6-v2 sentence embeddings.
    Minilm,
    /// Hashed character trigrams; no model download.
    Ngram,
}

impl Default for EmbedderKind {
    fn default() -> Self {
        if cfg!(feature = "fastembed") {
            EmbedderKind::Minilm
        } else {
            EmbedderKind::Ngram
        }
    }
}

fn load_embedder(
    kind: EmbedderKind,
    cache_dir: Option<PathBuf>,
) -> anyhow::Result<Arc<dyn Embedder>> {
    match kind {
        EmbedderKind::Ngram => Ok(Arc::new(CharacterNgramEmbedder::default())),
        #[cfg(feature = "fastembed")]
        EmbedderKind::Minilm => {
            let model = pdf_page_search_core::MiniLmEmbedder::load(cache_dir)
                .context("loading sentence embedding model")?;
            Ok(Arc::new(model))
        }
        #[cfg(not(feature = "fastembed"))]
        EmbedderKind::Minilm => {
            let _ = cache_dir;
            anyhow::bail!("built without the `fastembed` feature; use --embedder ngram")
        }
    }
}

fn init_logging(log_file: &Path) -> anyhow::Result<()> {
    if let Some(parent) = log_file.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("opening log file {}", log_file.display()))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_file)?;

    std::fs::create_dir_all(&cli.upload_dir)
        .with_context(|| format!("creating upload directory {}", cli.upload_dir.display()))?;

    let embedder = load_embedder(cli.embedder, cli.model_cache_dir.clone())?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        model = embedder.model_name(),
        dimensions = embedder.dimensions(),
        started_at = %Utc::now().to_rfc3339(),
        "pdf-page-search boot"
    );

    let options = SearchOptions {
        top_k: cli.top_k.max(1),
        preview_chars: DEFAULT_PREVIEW_CHARS,
    };
    let state = routes::AppState {
        session: Arc::new(Session::new()),
        ingestor: Ingestor::new(embedder.clone(), cli.upload_dir.clone()),
        coordinator: SearchCoordinator::new(embedder).with_options(options),
    };

    let app = routes::router(Arc::new(state), cli.max_upload_mb * 1024 * 1024);
    let listener = tokio::net::TcpListener::bind(cli.bind)
        .await
        .with_context(|| format!("binding {}", cli.bind))?;
    info!(addr = %cli.bind, upload_dir = %cli.upload_dir.display(), "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
