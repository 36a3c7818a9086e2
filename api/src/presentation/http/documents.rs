use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::application::ports::address_builder::AddressBuilder;
use crate::application::use_cases::documents::create_document::{
    CreateDocument, CreateDocumentInput,
};
use crate::application::use_cases::documents::create_many::CreateMany;
use crate::application::use_cases::documents::delete_document::{
    DeleteDocument, remove_blob_folders,
};
use crate::application::use_cases::documents::get_content::GetContent;
use crate::application::use_cases::documents::list_documents::ListDocuments;
use crate::application::use_cases::documents::save_content::{SaveContent, SaveContentInput};
use crate::bootstrap::app_context::AppContext;
use crate::domain::documents::book::Book;
use crate::domain::documents::document::{self as domain, ROOT_PARENT_ID};
use crate::presentation::http::books::{ReconcileResponse, load_book};
use crate::presentation::http::error::{ApiError, ErrorBody};
use crate::presentation::http::member::Member;

#[derive(Debug, Serialize, ToSchema)]
pub struct Document {
    pub id: i64,
    pub book_id: i64,
    pub parent_id: i64,
    pub identifier: String,
    pub name: String,
    pub order_index: i32,
    pub version: i64,
    pub view_count: i64,
    pub member_id: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl From<domain::Document> for Document {
    fn from(d: domain::Document) -> Self {
        Document {
            id: d.id,
            book_id: d.book_id,
            parent_id: d.parent_id,
            identifier: d.identifier,
            name: d.name,
            order_index: d.order_index,
            version: d.version,
            view_count: d.view_count,
            member_id: d.member_id,
            created_at: d.created_at,
            updated_at: d.updated_at,
            address: None,
        }
    }
}

impl Document {
    pub fn addressed(d: domain::Document, book: &Book, addresses: &dyn AddressBuilder) -> Self {
        let address = addresses.document_address(&book.identifier, &d.address_segment());
        Document {
            address: Some(address),
            ..Document::from(d)
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DocumentListResponse {
    pub items: Vec<Document>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDocumentRequest {
    pub identifier: Option<String>,
    pub name: String,
    pub parent_id: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateManyRequest {
    /// One `identifier [name]` per line.
    pub lines: String,
    pub parent_id: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateManyResponse {
    pub created: Vec<Document>,
    pub updated: Vec<Document>,
    pub skipped: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteDocumentResponse {
    pub deleted: Vec<i64>,
    pub doc_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DocumentContentResponse {
    pub document: Document,
    pub markdown: String,
    pub content: String,
    pub release: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SaveContentRequest {
    pub version: i64,
    pub markdown: String,
    pub html: String,
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SaveContentResponse {
    pub document: Document,
    pub markdown: String,
    pub content: String,
    pub tree_changed: bool,
    pub reconcile: Option<ReconcileResponse>,
    pub unresolved_links: Vec<String>,
    pub history_id: Option<i64>,
    pub history_error: Option<String>,
}

#[utoipa::path(get, path = "/api/books/{book}/documents", tag = "Documents",
    params(("book" = String, Path, description = "Book identifier")),
    responses((status = 200, body = DocumentListResponse), (status = 404, body = ErrorBody)))]
pub async fn list_documents(
    State(ctx): State<AppContext>,
    Path(book): Path<String>,
) -> Result<Json<DocumentListResponse>, ApiError> {
    let book = load_book(&ctx, &book).await?;
    let repo = ctx.document_repo();
    let addresses = ctx.address_builder();
    let uc = ListDocuments {
        repo: repo.as_ref(),
    };
    let items = uc
        .execute(&book)
        .await?
        .into_iter()
        .map(|d| Document::addressed(d, &book, addresses.as_ref()))
        .collect();
    Ok(Json(DocumentListResponse { items }))
}

#[utoipa::path(post, path = "/api/books/{book}/documents", tag = "Documents",
    params(("book" = String, Path, description = "Book identifier")),
    request_body = CreateDocumentRequest,
    responses((status = 201, body = Document), (status = 422, body = ErrorBody)))]
pub async fn create_document(
    State(ctx): State<AppContext>,
    Path(book): Path<String>,
    member: Member,
    Json(req): Json<CreateDocumentRequest>,
) -> Result<(StatusCode, Json<Document>), ApiError> {
    let book = load_book(&ctx, &book).await?;
    let documents = ctx.document_repo();
    let books = ctx.book_repo();
    let uc = CreateDocument {
        documents: documents.as_ref(),
        books: books.as_ref(),
    };
    let doc = uc
        .execute(
            &book,
            CreateDocumentInput {
                identifier: req.identifier,
                name: req.name,
                parent_id: req.parent_id.unwrap_or(ROOT_PARENT_ID),
                member_id: member.0,
            },
        )
        .await?;
    let addresses = ctx.address_builder();
    Ok((
        StatusCode::CREATED,
        Json(Document::addressed(doc, &book, addresses.as_ref())),
    ))
}

#[utoipa::path(post, path = "/api/books/{book}/documents/batch", tag = "Documents",
    params(("book" = String, Path, description = "Book identifier")),
    request_body = CreateManyRequest,
    responses((status = 200, body = CreateManyResponse)))]
pub async fn create_many(
    State(ctx): State<AppContext>,
    Path(book): Path<String>,
    member: Member,
    Json(req): Json<CreateManyRequest>,
) -> Result<Json<CreateManyResponse>, ApiError> {
    let book = load_book(&ctx, &book).await?;
    let documents = ctx.document_repo();
    let books = ctx.book_repo();
    let uc = CreateMany {
        documents: documents.as_ref(),
        books: books.as_ref(),
    };
    let report = uc
        .execute(
            &book,
            &req.lines,
            req.parent_id.unwrap_or(ROOT_PARENT_ID),
            member.0,
        )
        .await?;
    Ok(Json(CreateManyResponse {
        created: report.created.into_iter().map(Document::from).collect(),
        updated: report.updated.into_iter().map(Document::from).collect(),
        skipped: report.skipped,
    }))
}

#[utoipa::path(delete, path = "/api/books/{book}/documents/{id}", tag = "Documents",
    params(
        ("book" = String, Path, description = "Book identifier"),
        ("id" = i64, Path, description = "Document ID")
    ),
    responses((status = 200, body = DeleteDocumentResponse), (status = 404, body = ErrorBody)))]
pub async fn delete_document(
    State(ctx): State<AppContext>,
    Path((book, id)): Path<(String, i64)>,
) -> Result<Json<DeleteDocumentResponse>, ApiError> {
    let book = load_book(&ctx, &book).await?;
    let documents = ctx.document_repo();
    let books = ctx.book_repo();
    let uc = DeleteDocument {
        documents: documents.as_ref(),
        books: books.as_ref(),
    };
    let outcome = uc.execute(&book, id).await?;

    let storage = ctx.storage_port();
    let folders = outcome.blob_folders;
    tokio::spawn(async move {
        remove_blob_folders(storage.as_ref(), &folders).await;
    });

    Ok(Json(DeleteDocumentResponse {
        deleted: outcome.deleted,
        doc_count: outcome.doc_count,
    }))
}

#[utoipa::path(get, path = "/api/books/{book}/documents/{id}/content", tag = "Documents",
    params(
        ("book" = String, Path, description = "Book identifier"),
        ("id" = i64, Path, description = "Document ID")
    ),
    responses((status = 200, body = DocumentContentResponse), (status = 404, body = ErrorBody)))]
pub async fn get_document_content(
    State(ctx): State<AppContext>,
    Path((book, id)): Path<(String, i64)>,
) -> Result<Json<DocumentContentResponse>, ApiError> {
    let book = load_book(&ctx, &book).await?;
    let documents = ctx.document_repo();
    let books = ctx.book_repo();
    let addresses = ctx.address_builder();
    let uc = GetContent {
        documents: documents.as_ref(),
        books: books.as_ref(),
    };
    let (doc, content) = uc.execute(&book, id).await?;
    Ok(Json(DocumentContentResponse {
        document: Document::addressed(doc, &book, addresses.as_ref()),
        markdown: content.markdown,
        content: content.content,
        release: content.release,
    }))
}

#[utoipa::path(post, path = "/api/books/{book}/documents/{id}/content", tag = "Documents",
    params(
        ("book" = String, Path, description = "Book identifier"),
        ("id" = i64, Path, description = "Document ID")
    ),
    request_body = SaveContentRequest,
    responses(
        (status = 200, body = SaveContentResponse),
        (status = 409, body = ErrorBody, description = "Submitted version is stale"),
        (status = 404, body = ErrorBody)
    ))]
pub async fn save_document_content(
    State(ctx): State<AppContext>,
    Path((book, id)): Path<(String, i64)>,
    member: Member,
    Json(req): Json<SaveContentRequest>,
) -> Result<Json<SaveContentResponse>, ApiError> {
    let book = load_book(&ctx, &book).await?;
    let documents = ctx.document_repo();
    let books = ctx.book_repo();
    let history = ctx.history_repo();
    let addresses = ctx.address_builder();
    let uc = SaveContent {
        documents: documents.as_ref(),
        books: books.as_ref(),
        history: history.as_ref(),
        addresses: addresses.as_ref(),
        record_history: ctx.cfg.enable_document_history,
    };
    let outcome = uc
        .execute(
            &book,
            SaveContentInput {
                document_id: id,
                version: req.version,
                markdown: req.markdown,
                html: req.html,
                force: req.force,
                member_id: member.0,
            },
        )
        .await?;
    Ok(Json(SaveContentResponse {
        document: Document::addressed(outcome.document, &book, addresses.as_ref()),
        markdown: outcome.markdown,
        content: outcome.content,
        tree_changed: outcome.tree_changed,
        reconcile: outcome.reconcile.map(ReconcileResponse::from),
        unresolved_links: outcome.unresolved_links,
        history_id: outcome.history_id,
        history_error: outcome.history_error,
    }))
}

pub fn routes(ctx: AppContext) -> Router {
    Router::new()
        .route(
            "/books/:book/documents",
            get(list_documents).post(create_document),
        )
        .route("/books/:book/documents/batch", post(create_many))
        .route(
            "/books/:book/documents/:id",
            delete(delete_document),
        )
        .route(
            "/books/:book/documents/:id/content",
            get(get_document_content).post(save_document_content),
        )
        .with_state(ctx)
}
