use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::application::use_cases::documents::export_book::{BundleExport, ExportSequence};
use crate::application::use_cases::documents::reconcile_outline::{
    ReconcileOutline, ReconcileReport,
};
use crate::bootstrap::app_context::AppContext;
use crate::domain::documents::book::Book;
use crate::domain::documents::document::ROOT_PARENT_ID;
use crate::domain::documents::error::DocumentError;
use crate::presentation::http::documents::Document;
use crate::presentation::http::error::{ApiError, ErrorBody};
use crate::presentation::http::member::Member;

/// Resolves the `{book}` path segment: a book identifier, or its numeric id.
pub async fn load_book(ctx: &AppContext, key: &str) -> Result<Book, ApiError> {
    let repo = ctx.book_repo();
    let book = match key.parse::<i64>() {
        Ok(id) => repo.get_by_id(id).await?,
        Err(_) => repo.find_by_identifier(key).await?,
    };
    book.ok_or(ApiError(DocumentError::NotFound("book")))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReconcileRequest {
    /// Rendered HTML of the outline document.
    pub html: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReconcileFailureItem {
    pub identifier: String,
    pub reason: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReconcileResponse {
    pub html: String,
    pub created: Vec<Document>,
    pub linked: u64,
    pub failures: Vec<ReconcileFailureItem>,
    pub unresolved_links: Vec<String>,
}

impl From<ReconcileReport> for ReconcileResponse {
    fn from(r: ReconcileReport) -> Self {
        ReconcileResponse {
            html: r.html,
            created: r.created.into_iter().map(Document::from).collect(),
            linked: r.linked,
            failures: r
                .failures
                .into_iter()
                .map(|f| ReconcileFailureItem {
                    identifier: f.identifier,
                    reason: f.reason.as_str().to_string(),
                })
                .collect(),
            unresolved_links: r.unresolved_links,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub parent_id: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExportItem {
    pub sequence: usize,
    pub depth: usize,
    pub file_name: String,
    pub hash: String,
    pub document: Document,
    pub html: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExportResponse {
    pub items: Vec<ExportItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExportBundleResponse {
    pub path: String,
    pub url: String,
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub documents: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExportLocationResponse {
    pub path: String,
    pub url: String,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}

#[utoipa::path(post, path = "/api/books/{book}/outline", tag = "Books",
    params(("book" = String, Path, description = "Book identifier")),
    request_body = ReconcileRequest,
    responses((status = 200, body = ReconcileResponse), (status = 404, body = ErrorBody)))]
pub async fn reconcile_outline(
    State(ctx): State<AppContext>,
    Path(book): Path<String>,
    member: Member,
    Json(req): Json<ReconcileRequest>,
) -> Result<Json<ReconcileResponse>, ApiError> {
    let book = load_book(&ctx, &book).await?;
    let documents = ctx.document_repo();
    let books = ctx.book_repo();
    let addresses = ctx.address_builder();
    let uc = ReconcileOutline {
        documents: documents.as_ref(),
        books: books.as_ref(),
        addresses: addresses.as_ref(),
    };
    let report = uc.execute(&book, &req.html, member.0).await?;
    Ok(Json(ReconcileResponse::from(report)))
}

#[utoipa::path(get, path = "/api/books/{book}/export", tag = "Books",
    params(
        ("book" = String, Path, description = "Book identifier"),
        ("parent_id" = Option<i64>, Query, description = "Export only the subtree below this document")
    ),
    responses((status = 200, body = ExportResponse), (status = 404, body = ErrorBody)))]
pub async fn export_sequence(
    State(ctx): State<AppContext>,
    Path(book): Path<String>,
    q: Option<Query<ExportQuery>>,
) -> Result<Json<ExportResponse>, ApiError> {
    let book = load_book(&ctx, &book).await?;
    let start = q
        .and_then(|Query(v)| v.parent_id)
        .unwrap_or(ROOT_PARENT_ID);
    let documents = ctx.document_repo();
    let uc = ExportSequence {
        documents: documents.as_ref(),
    };
    let artifacts = uc
        .execute(&book, ctx.cfg.public_base_url.as_deref(), start)
        .await?;
    let items = artifacts
        .into_iter()
        .map(|a| ExportItem {
            sequence: a.sequence,
            depth: a.depth,
            file_name: a.file_name,
            hash: a.hash,
            document: Document::from(a.document),
            html: a.html,
        })
        .collect();
    Ok(Json(ExportResponse { items }))
}

#[utoipa::path(post, path = "/api/books/{book}/export", tag = "Books",
    params(("book" = String, Path, description = "Book identifier")),
    responses(
        (status = 200, body = ExportBundleResponse),
        (status = 502, body = ErrorBody, description = "Blob store rejected the bundle")
    ))]
pub async fn export_bundle(
    State(ctx): State<AppContext>,
    Path(book): Path<String>,
) -> Result<Json<ExportBundleResponse>, ApiError> {
    let book = load_book(&ctx, &book).await?;
    let documents = ctx.document_repo();
    let books = ctx.book_repo();
    let storage = ctx.storage_port();
    let uc = BundleExport {
        documents: documents.as_ref(),
        books: books.as_ref(),
        storage: storage.as_ref(),
    };
    let bundle = uc
        .execute(&book, ctx.cfg.public_base_url.as_deref())
        .await?;
    Ok(Json(ExportBundleResponse {
        path: bundle.path,
        url: bundle.url,
        generated_at: bundle.generated_at,
        documents: bundle.documents,
    }))
}

#[utoipa::path(get, path = "/api/books/{book}/export/location", tag = "Books",
    params(("book" = String, Path, description = "Book identifier")),
    responses(
        (status = 200, body = ExportLocationResponse),
        (status = 404, body = ErrorBody, description = "No bundle generated yet")
    ))]
pub async fn export_location(
    State(ctx): State<AppContext>,
    Path(book): Path<String>,
) -> Result<Json<ExportLocationResponse>, ApiError> {
    let book = load_book(&ctx, &book).await?;
    let documents = ctx.document_repo();
    let books = ctx.book_repo();
    let storage = ctx.storage_port();
    let uc = BundleExport {
        documents: documents.as_ref(),
        books: books.as_ref(),
        storage: storage.as_ref(),
    };
    let location = uc
        .location(&book)
        .await?
        .ok_or(ApiError(DocumentError::NotFound("export bundle")))?;
    Ok(Json(ExportLocationResponse {
        path: location.path,
        url: location.url,
        generated_at: location.generated_at,
    }))
}

pub fn routes(ctx: AppContext) -> Router {
    Router::new()
        .route("/books/:book/outline", post(reconcile_outline))
        .route(
            "/books/:book/export",
            get(export_sequence).post(export_bundle),
        )
        .route("/books/:book/export/location", get(export_location))
        .with_state(ctx)
}
