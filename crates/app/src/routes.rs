use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use pdf_page_search_core::{
    is_pdf_file_name, DocumentError, DocumentInfo, EncodingError, IndexError, IngestError,
    Ingestor, SearchCoordinator, SearchError, SearchOutcome, SearchResult, Session,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::views;

pub const NOT_A_PDF: &str = "Please upload a PDF file.";

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Session>,
    pub ingestor: Ingestor,
    pub coordinator: SearchCoordinator,
}

pub fn router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(upload_page).post(handle_upload))
        .route("/search", post(handle_search))
        .route("/api/search", get(api_search))
        .route("/api/document", get(api_document))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

async fn upload_page(State(state): State<Arc<AppState>>) -> Html<String> {
    let current = state.session.current().await;
    Html(views::upload_page(current.as_ref().map(|document| document.info())))
}

async fn handle_upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Redirect, AppError> {
    let upload = extract_file(&mut multipart).await?;

    let file_name = upload.filename.unwrap_or_default();
    if !is_pdf_file_name(&file_name) {
        warn!(file = %file_name, "rejected non-pdf upload");
        return Err(AppError::bad_request(NOT_A_PDF));
    }

    let info = state
        .ingestor
        .upload(&state.session, &file_name, upload.data)
        .await?;
    info!(
        document_id = %info.document_id,
        file = %info.file_name,
        pages = info.page_count,
        "document loaded"
    );
    Ok(Redirect::to("/"))
}

#[derive(Debug, Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    query: String,
}

async fn handle_search(
    State(state): State<Arc<AppState>>,
    Form(form): Form<SearchForm>,
) -> Result<Response, AppError> {
    let outcome = state
        .coordinator
        .search_session(&state.session, &form.query, None)
        .await?;

    match outcome {
        SearchOutcome::NoDocument => Ok(Redirect::to("/").into_response()),
        SearchOutcome::Results(results) => {
            Ok(Html(views::results_page(&form.query, &results)).into_response())
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ApiSearchParams {
    query: String,
    k: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ApiSearchResponse {
    query: String,
    results: Vec<SearchResult>,
}

async fn api_search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ApiSearchParams>,
) -> Result<Json<ApiSearchResponse>, AppError> {
    let outcome = state
        .coordinator
        .search_session(&state.session, &params.query, params.k)
        .await?;

    match outcome {
        SearchOutcome::NoDocument => Err(AppError::NoDocument),
        SearchOutcome::Results(results) => Ok(Json(ApiSearchResponse {
            query: params.query,
            results,
        })),
    }
}

async fn api_document(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DocumentInfo>, AppError> {
    let document = state.session.current().await.ok_or(AppError::NotFound)?;
    Ok(Json(document.info().clone()))
}

struct UploadedFile {
    data: Vec<u8>,
    filename: Option<String>,
}

async fn extract_file(multipart: &mut Multipart) -> Result<UploadedFile, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(AppError::bad_request)?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().map(|s| s.to_string());
            let data = field.bytes().await.map_err(AppError::bad_request)?;
            return Ok(UploadedFile {
                data: data.to_vec(),
                filename,
            });
        }
    }
    Err(AppError::bad_request("missing file"))
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unprocessable(String),
    #[error("no document loaded; upload a PDF first")]
    NoDocument,
    #[error("no document loaded")]
    NotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn bad_request<E: ToString>(msg: E) -> Self {
        Self::BadRequest(msg.to_string())
    }

    fn internal<E: Into<anyhow::Error>>(err: E) -> Self {
        Self::Internal(err.into())
    }
}

impl From<IngestError> for AppError {
    fn from(value: IngestError) -> Self {
        match value {
            IngestError::NotPdf(_) => AppError::bad_request(NOT_A_PDF),
            IngestError::Document(DocumentError::PdfParse(details)) => {
                warn!(%details, "upload could not be parsed");
                AppError::Unprocessable(format!("Could not read the PDF: {details}"))
            }
            other => AppError::internal(other),
        }
    }
}

impl From<SearchError> for AppError {
    fn from(value: SearchError) -> Self {
        match value {
            SearchError::Encoding(EncodingError::EmptyInput) => {
                AppError::bad_request("Please enter a search query.")
            }
            SearchError::Index(IndexError::InvalidK) => {
                AppError::bad_request("k must be at least 1")
            }
            other => AppError::internal(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AppError::Unprocessable(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, msg).into_response()
            }
            AppError::NoDocument => json_error(StatusCode::CONFLICT, message),
            AppError::NotFound => json_error(StatusCode::NOT_FOUND, message),
            AppError::Internal(err) => {
                error!("internal_error" = %err);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
            }
        }
    }
}

fn json_error(status: StatusCode, message: String) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};
    use pdf_page_search_core::CharacterNgramEmbedder;
    use tempfile::{tempdir, TempDir};
    use tower::ServiceExt;

    const BOUNDARY: &str = "pagesearchboundary";

    fn test_app() -> (Router, TempDir) {
        let dir = tempdir().expect("temp dir");
        let embedder = Arc::new(CharacterNgramEmbedder::default());
        let state = AppState {
            session: Arc::new(Session::new()),
            ingestor: Ingestor::new(embedder.clone(), dir.path().join("uploads")),
            coordinator: SearchCoordinator::new(embedder),
        };
        (router(Arc::new(state), 8 * 1024 * 1024), dir)
    }

    fn one_page_pdf(text: &str) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let encoded = content.encode().expect("content encodes");
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::from(page_id)],
                "Count" => 1,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).expect("pdf serializes");
        bytes
    }

    fn upload_request(file_name: &str, data: &[u8]) -> Request<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; \
filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("valid request")
    }

    fn search_form(query: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/search")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(format!("query={query}")))
            .expect("valid request")
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("valid request")
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn search_before_upload_redirects_to_upload_page() {
        let (app, _dir) = test_app();
        let response = app.oneshot(search_form("cat")).await.unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");
    }

    #[tokio::test]
    async fn document_endpoint_is_not_found_before_upload() {
        let (app, _dir) = test_app();
        let response = app.oneshot(get("/api/document")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn non_pdf_upload_is_rejected_with_message() {
        let (app, dir) = test_app();
        let response = app
            .clone()
            .oneshot(upload_request("notes.txt", b"plain text"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, NOT_A_PDF);
        assert!(!dir.path().join("uploads").join("notes.txt").exists());

        let document = app.oneshot(get("/api/document")).await.unwrap();
        assert_eq!(document.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn upload_redirects_and_enables_search() {
        let (app, dir) = test_app();
        let pdf = one_page_pdf("The cat sat on the mat");

        let response = app
            .clone()
            .oneshot(upload_request("pets.pdf", &pdf))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");
        assert!(dir.path().join("uploads").join("pets.pdf").is_file());

        let page = body_text(app.clone().oneshot(get("/")).await.unwrap()).await;
        assert!(page.contains("class=\"uploaded\""));

        let results = app.clone().oneshot(search_form("cat")).await.unwrap();
        assert_eq!(results.status(), StatusCode::OK);
        let html = body_text(results).await;
        assert!(html.contains("Page 1"));
        assert!(html.contains("Occurrences: 1"));

        let document = app.oneshot(get("/api/document")).await.unwrap();
        assert_eq!(document.status(), StatusCode::OK);
        let info: serde_json::Value =
            serde_json::from_str(&body_text(document).await).unwrap();
        assert_eq!(info["file_name"], "pets.pdf");
        assert_eq!(info["page_count"], 1);
    }

    #[tokio::test]
    async fn zero_k_is_a_client_error() {
        let (app, _dir) = test_app();
        let pdf = one_page_pdf("The cat sat on the mat");
        let uploaded = app
            .clone()
            .oneshot(upload_request("pets.pdf", &pdf))
            .await
            .unwrap();
        assert_eq!(uploaded.status(), StatusCode::SEE_OTHER);

        let response = app
            .clone()
            .oneshot(get("/api/search?query=cat&k=0"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let ok = app.oneshot(get("/api/search?query=cat&k=1")).await.unwrap();
        assert_eq!(ok.status(), StatusCode::OK);
        let value: serde_json::Value = serde_json::from_str(&body_text(ok).await).unwrap();
        assert_eq!(value["results"][0]["page"], 1);
        assert_eq!(value["results"][0]["count"], 1);
    }

    #[test]
    fn non_pdf_ingest_errors_use_the_upload_message() {
        let error = AppError::from(IngestError::NotPdf("notes.txt".to_string()));
        assert!(matches!(error, AppError::BadRequest(ref msg) if msg == NOT_A_PDF));
    }

    #[test]
    fn parse_failures_are_unprocessable() {
        let error = AppError::from(IngestError::Document(DocumentError::PdfParse(
            "bad xref".to_string(),
        )));
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn empty_query_is_a_bad_request() {
        let error = AppError::from(SearchError::Encoding(EncodingError::EmptyInput));
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_document_is_reported_as_json_conflict() {
        let response = AppError::NoDocument.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(value["error"].as_str().unwrap().contains("upload a PDF"));
    }
}
