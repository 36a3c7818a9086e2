use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;

use crate::application::ports::document_repository::DocumentRepository;
use crate::domain::documents::document::{
    ContentCommit, Document as DomainDocument, DocumentContent, NewDocument, TreePosition,
};
use crate::infrastructure::db::PgPool;

const DOCUMENT_COLUMNS: &str = "id, book_id, parent_id, identifier, name, order_index, version, \
                                view_count, member_id, created_at, updated_at";

pub struct SqlxDocumentRepository {
    pub pool: PgPool,
}

impl SqlxDocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_document(r: &PgRow) -> DomainDocument {
    DomainDocument {
        id: r.get("id"),
        book_id: r.get("book_id"),
        parent_id: r.get("parent_id"),
        identifier: r.get("identifier"),
        name: r.get("name"),
        order_index: r.get("order_index"),
        version: r.get("version"),
        view_count: r.get("view_count"),
        member_id: r.get("member_id"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }
}

fn map_content(r: &PgRow) -> DocumentContent {
    DocumentContent {
        document_id: r.get("document_id"),
        markdown: r.get("markdown"),
        content: r.get("content"),
        release: r.try_get("release").ok().flatten(),
    }
}

#[async_trait]
impl DocumentRepository for SqlxDocumentRepository {
    async fn get_by_id(&self, id: i64) -> anyhow::Result<Option<DomainDocument>> {
        let row = sqlx::query(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(map_document))
    }

    async fn find_by_identifier(
        &self,
        book_id: i64,
        identifier: &str,
    ) -> anyhow::Result<Option<DomainDocument>> {
        let row = sqlx::query(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE book_id = $1 AND identifier = $2"
        ))
        .bind(book_id)
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(map_document))
    }

    async fn list_for_book(&self, book_id: i64) -> anyhow::Result<Vec<DomainDocument>> {
        let rows = sqlx::query(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE book_id = $1
             ORDER BY parent_id, order_index, id"
        ))
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(map_document).collect())
    }

    async fn list_children(
        &self,
        book_id: i64,
        parent_id: i64,
    ) -> anyhow::Result<Vec<DomainDocument>> {
        let rows = sqlx::query(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE book_id = $1 AND parent_id = $2
             ORDER BY order_index, id"
        ))
        .bind(book_id)
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(map_document).collect())
    }

    async fn insert(&self, doc: NewDocument) -> anyhow::Result<DomainDocument> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(&format!(
            "INSERT INTO documents (book_id, parent_id, identifier, name, member_id, version)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {DOCUMENT_COLUMNS}"
        ))
        .bind(doc.book_id)
        .bind(doc.parent_id)
        .bind(&doc.identifier)
        .bind(&doc.name)
        .bind(doc.member_id)
        .bind(doc.version)
        .fetch_one(&mut *tx)
        .await?;
        let created = map_document(&row);
        sqlx::query(
            "INSERT INTO document_contents (document_id, markdown, content) VALUES ($1, $2, $3)",
        )
        .bind(created.id)
        .bind(&doc.markdown)
        .bind(&doc.content)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(created)
    }

    async fn update_meta(
        &self,
        id: i64,
        book_id: i64,
        name: Option<String>,
        parent_id: Option<i64>,
    ) -> anyhow::Result<Option<DomainDocument>> {
        let row = sqlx::query(&format!(
            "UPDATE documents SET name = COALESCE($3, name), parent_id = COALESCE($4, parent_id),
                    updated_at = now()
             WHERE id = $1 AND book_id = $2
             RETURNING {DOCUMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(book_id)
        .bind(name)
        .bind(parent_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(map_document))
    }

    async fn apply_tree_positions(
        &self,
        book_id: i64,
        positions: &[TreePosition],
    ) -> anyhow::Result<u64> {
        if positions.is_empty() {
            return Ok(0);
        }
        let mut tx = self.pool.begin().await?;
        let mut touched = 0;
        for p in positions {
            let res = sqlx::query(
                r#"UPDATE documents
                   SET parent_id = $3, order_index = $4, name = COALESCE($5, name), updated_at = now()
                   WHERE id = $1 AND book_id = $2"#,
            )
            .bind(p.document_id)
            .bind(book_id)
            .bind(p.parent_id)
            .bind(p.order_index)
            .bind(p.name.as_deref())
            .execute(&mut *tx)
            .await?;
            touched += res.rows_affected();
        }
        tx.commit().await?;
        Ok(touched)
    }

    async fn get_content(&self, id: i64) -> anyhow::Result<Option<DocumentContent>> {
        let row = sqlx::query(
            "SELECT document_id, markdown, content, release FROM document_contents WHERE document_id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(map_content))
    }

    async fn list_contents_for_book(&self, book_id: i64) -> anyhow::Result<Vec<DocumentContent>> {
        let rows = sqlx::query(
            r#"SELECT c.document_id, c.markdown, c.content, c.release
               FROM document_contents c
               JOIN documents d ON d.id = c.document_id
               WHERE d.book_id = $1"#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(map_content).collect())
    }

    async fn commit_content(
        &self,
        commit: &ContentCommit,
    ) -> anyhow::Result<Option<DomainDocument>> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(&format!(
            "UPDATE documents SET version = $3, updated_at = now()
             WHERE id = $1 AND ($2::BIGINT IS NULL OR version = $2)
             RETURNING {DOCUMENT_COLUMNS}"
        ))
        .bind(commit.document_id)
        .bind(commit.expected_version)
        .bind(commit.new_version)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(None);
        };
        sqlx::query(
            r#"INSERT INTO document_contents (document_id, markdown, content, release)
               VALUES ($1, $2, $3, NULL)
               ON CONFLICT (document_id) DO UPDATE
               SET markdown = EXCLUDED.markdown, content = EXCLUDED.content, release = NULL"#,
        )
        .bind(commit.document_id)
        .bind(&commit.markdown)
        .bind(&commit.content)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(Some(map_document(&row)))
    }

    async fn delete_many(&self, book_id: i64, ids: &[i64]) -> anyhow::Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"DELETE FROM document_histories
               WHERE document_id IN (SELECT id FROM documents WHERE book_id = $1 AND id = ANY($2))"#,
        )
        .bind(book_id)
        .bind(ids)
        .execute(&mut *tx)
        .await?;
        sqlx::query(
            r#"DELETE FROM document_contents
               WHERE document_id IN (SELECT id FROM documents WHERE book_id = $1 AND id = ANY($2))"#,
        )
        .bind(book_id)
        .bind(ids)
        .execute(&mut *tx)
        .await?;
        let res = sqlx::query("DELETE FROM documents WHERE book_id = $1 AND id = ANY($2)")
            .bind(book_id)
            .bind(ids)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(res.rows_affected())
    }

    async fn count_for_book(&self, book_id: i64) -> anyhow::Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM documents WHERE book_id = $1")
            .bind(book_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }

    async fn increment_views(&self, id: i64) -> anyhow::Result<Option<i64>> {
        let row = sqlx::query(
            "UPDATE documents SET view_count = view_count + 1 WHERE id = $1 RETURNING view_count",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| r.get("view_count")))
    }
}
