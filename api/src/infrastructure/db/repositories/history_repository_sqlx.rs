use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;

use crate::application::ports::history_repository::HistoryRepository;
use crate::domain::documents::history::{DocumentHistory, NewHistory, page_offset};
use crate::infrastructure::db::PgPool;

const HISTORY_COLUMNS: &str = "id, document_id, document_name, parent_id, version, markdown, \
                               content, action, action_name, member_id, modified_by, created_at";

pub struct SqlxHistoryRepository {
    pub pool: PgPool,
}

impl SqlxHistoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_history(r: &PgRow) -> DocumentHistory {
    DocumentHistory {
        id: r.get("id"),
        document_id: r.get("document_id"),
        document_name: r.get("document_name"),
        parent_id: r.get("parent_id"),
        version: r.get("version"),
        markdown: r.get("markdown"),
        content: r.get("content"),
        action: r.get("action"),
        action_name: r.get("action_name"),
        member_id: r.get("member_id"),
        modified_by: r.get("modified_by"),
        created_at: r.get("created_at"),
    }
}

#[async_trait]
impl HistoryRepository for SqlxHistoryRepository {
    async fn insert(&self, entry: NewHistory) -> anyhow::Result<DocumentHistory> {
        let row = sqlx::query(&format!(
            "INSERT INTO document_histories
                (document_id, document_name, parent_id, version, markdown, content,
                 action, action_name, member_id, modified_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {HISTORY_COLUMNS}"
        ))
        .bind(entry.document_id)
        .bind(&entry.document_name)
        .bind(entry.parent_id)
        .bind(entry.version)
        .bind(&entry.markdown)
        .bind(&entry.content)
        .bind(entry.action.as_str())
        .bind(entry.action.label())
        .bind(entry.member_id)
        .bind(entry.modified_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(map_history(&row))
    }

    async fn get(&self, history_id: i64) -> anyhow::Result<Option<DocumentHistory>> {
        let row = sqlx::query(&format!(
            "SELECT {HISTORY_COLUMNS} FROM document_histories WHERE id = $1"
        ))
        .bind(history_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(map_history))
    }

    async fn list_page(
        &self,
        document_id: i64,
        page: i64,
        page_size: i64,
    ) -> anyhow::Result<(Vec<DocumentHistory>, i64)> {
        let total: i64 =
            sqlx::query("SELECT COUNT(*) AS n FROM document_histories WHERE document_id = $1")
                .bind(document_id)
                .fetch_one(&self.pool)
                .await?
                .get("n");
        let rows = sqlx::query(&format!(
            "SELECT {HISTORY_COLUMNS} FROM document_histories WHERE document_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        ))
        .bind(document_id)
        .bind(page_size)
        .bind(page_offset(page, page_size))
        .fetch_all(&self.pool)
        .await?;
        Ok((rows.iter().map(map_history).collect(), total))
    }

    async fn delete(&self, history_id: i64, document_id: i64) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM document_histories WHERE id = $1 AND document_id = $2")
            .bind(history_id)
            .bind(document_id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
