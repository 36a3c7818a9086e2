use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::application::services::history::{DiffLine, DiffLineType};
use crate::application::use_cases::history::compare_history::CompareHistory;
use crate::application::use_cases::history::delete_history::DeleteHistory;
use crate::application::use_cases::history::list_history::ListHistory;
use crate::application::use_cases::history::restore_history::RestoreHistory;
use crate::bootstrap::app_context::AppContext;
use crate::domain::documents::history::DocumentHistory;
use crate::presentation::http::books::load_book;
use crate::presentation::http::documents::Document;
use crate::presentation::http::error::{ApiError, ErrorBody};
use crate::presentation::http::member::Member;

#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryItem {
    pub id: i64,
    pub document_id: i64,
    pub document_name: String,
    pub parent_id: i64,
    pub version: i64,
    pub action: String,
    pub action_name: String,
    pub member_id: i64,
    pub modified_by: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<DocumentHistory> for HistoryItem {
    fn from(h: DocumentHistory) -> Self {
        HistoryItem {
            id: h.id,
            document_id: h.document_id,
            document_name: h.document_name,
            parent_id: h.parent_id,
            version: h.version,
            action: h.action,
            action_name: h.action_name,
            member_id: h.member_id,
            modified_by: h.modified_by,
            created_at: h.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryListResponse {
    pub items: Vec<HistoryItem>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

#[derive(Debug, Deserialize)]
pub struct HistoryListQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema, Clone)]
#[serde(rename_all = "lowercase")]
pub enum HistoryDiffLineType {
    Added,
    Deleted,
    Context,
}

impl From<DiffLineType> for HistoryDiffLineType {
    fn from(value: DiffLineType) -> Self {
        match value {
            DiffLineType::Added => HistoryDiffLineType::Added,
            DiffLineType::Deleted => HistoryDiffLineType::Deleted,
            DiffLineType::Context => HistoryDiffLineType::Context,
        }
    }
}

#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct HistoryDiffLine {
    pub line_type: HistoryDiffLineType,
    pub old_line_number: Option<u32>,
    pub new_line_number: Option<u32>,
    pub content: String,
}

impl From<DiffLine> for HistoryDiffLine {
    fn from(value: DiffLine) -> Self {
        Self {
            line_type: value.line_type.into(),
            old_line_number: value.old_line_number,
            new_line_number: value.new_line_number,
            content: value.content,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryCompareResponse {
    pub history: HistoryItem,
    pub history_markdown: String,
    pub current_markdown: String,
    pub diff_lines: Vec<HistoryDiffLine>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RestoreResponse {
    pub document: Document,
    pub markdown: String,
    pub content: String,
    pub history_id: Option<i64>,
    pub history_error: Option<String>,
}

#[utoipa::path(get, path = "/api/books/{book}/documents/{id}/history", tag = "History",
    params(
        ("book" = String, Path, description = "Book identifier"),
        ("id" = i64, Path, description = "Document ID"),
        ("page" = Option<i64>, Query, description = "1-based page"),
        ("page_size" = Option<i64>, Query, description = "Entries per page")
    ),
    responses((status = 200, body = HistoryListResponse), (status = 404, body = ErrorBody)))]
pub async fn list_history(
    State(ctx): State<AppContext>,
    Path((book, id)): Path<(String, i64)>,
    q: Option<Query<HistoryListQuery>>,
) -> Result<Json<HistoryListResponse>, ApiError> {
    let book = load_book(&ctx, &book).await?;
    let (page, page_size) = q
        .map(|Query(v)| (v.page, v.page_size))
        .unwrap_or((None, None));
    let documents = ctx.document_repo();
    let history = ctx.history_repo();
    let uc = ListHistory {
        documents: documents.as_ref(),
        history: history.as_ref(),
    };
    let result = uc
        .execute(
            &book,
            id,
            page.unwrap_or(1),
            page_size.unwrap_or(ctx.cfg.history_page_size),
        )
        .await?;
    Ok(Json(HistoryListResponse {
        items: result.items.into_iter().map(HistoryItem::from).collect(),
        total: result.total,
        page: result.page,
        page_size: result.page_size,
    }))
}

#[utoipa::path(delete, path = "/api/books/{book}/documents/{id}/history/{history_id}", tag = "History",
    params(
        ("book" = String, Path, description = "Book identifier"),
        ("id" = i64, Path, description = "Document ID"),
        ("history_id" = i64, Path, description = "History entry ID")
    ),
    responses((status = 204), (status = 404, body = ErrorBody)))]
pub async fn delete_history(
    State(ctx): State<AppContext>,
    Path((book, id, history_id)): Path<(String, i64, i64)>,
) -> Result<StatusCode, ApiError> {
    let book = load_book(&ctx, &book).await?;
    let documents = ctx.document_repo();
    let history = ctx.history_repo();
    let uc = DeleteHistory {
        documents: documents.as_ref(),
        history: history.as_ref(),
    };
    uc.execute(&book, id, history_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(get, path = "/api/books/{book}/documents/{id}/history/{history_id}/compare", tag = "History",
    params(
        ("book" = String, Path, description = "Book identifier"),
        ("id" = i64, Path, description = "Document ID"),
        ("history_id" = i64, Path, description = "History entry ID")
    ),
    responses((status = 200, body = HistoryCompareResponse), (status = 404, body = ErrorBody)))]
pub async fn compare_history(
    State(ctx): State<AppContext>,
    Path((book, id, history_id)): Path<(String, i64, i64)>,
) -> Result<Json<HistoryCompareResponse>, ApiError> {
    let book = load_book(&ctx, &book).await?;
    let documents = ctx.document_repo();
    let history = ctx.history_repo();
    let uc = CompareHistory {
        documents: documents.as_ref(),
        history: history.as_ref(),
    };
    let comparison = uc.execute(&book, id, history_id).await?;
    let history_markdown = comparison.history.markdown.clone();
    Ok(Json(HistoryCompareResponse {
        history: HistoryItem::from(comparison.history),
        history_markdown,
        current_markdown: comparison.current_markdown,
        diff_lines: comparison
            .diff_lines
            .into_iter()
            .map(HistoryDiffLine::from)
            .collect(),
    }))
}

#[utoipa::path(post, path = "/api/books/{book}/documents/{id}/history/{history_id}/restore", tag = "History",
    params(
        ("book" = String, Path, description = "Book identifier"),
        ("id" = i64, Path, description = "Document ID"),
        ("history_id" = i64, Path, description = "History entry ID")
    ),
    responses((status = 200, body = RestoreResponse), (status = 404, body = ErrorBody)))]
pub async fn restore_history(
    State(ctx): State<AppContext>,
    Path((book, id, history_id)): Path<(String, i64, i64)>,
    member: Member,
) -> Result<Json<RestoreResponse>, ApiError> {
    let book = load_book(&ctx, &book).await?;
    let documents = ctx.document_repo();
    let history = ctx.history_repo();
    let uc = RestoreHistory {
        documents: documents.as_ref(),
        history: history.as_ref(),
        record_history: ctx.cfg.enable_document_history,
    };
    let outcome = uc.execute(&book, id, history_id, member.0).await?;
    Ok(Json(RestoreResponse {
        document: Document::from(outcome.document),
        markdown: outcome.markdown,
        content: outcome.content,
        history_id: outcome.history_id,
        history_error: outcome.history_error,
    }))
}

pub fn routes(ctx: AppContext) -> Router {
    Router::new()
        .route("/books/:book/documents/:id/history", get(list_history))
        .route(
            "/books/:book/documents/:id/history/:history_id",
            delete(delete_history),
        )
        .route(
            "/books/:book/documents/:id/history/:history_id/compare",
            get(compare_history),
        )
        .route(
            "/books/:book/documents/:id/history/:history_id/restore",
            post(restore_history),
        )
        .with_state(ctx)
}
