use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::postgres::PgRow;

use crate::application::ports::book_repository::BookRepository;
use crate::domain::documents::book::Book;
use crate::infrastructure::db::PgPool;

pub struct SqlxBookRepository {
    pub pool: PgPool,
}

impl SqlxBookRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_book(r: &PgRow) -> Book {
    Book {
        id: r.get("id"),
        identifier: r.get("identifier"),
        name: r.get("name"),
        member_id: r.get("member_id"),
        doc_count: r.get("doc_count"),
        view_count: r.get("view_count"),
        generated_at: r.get("generated_at"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }
}

#[async_trait]
impl BookRepository for SqlxBookRepository {
    async fn get_by_id(&self, id: i64) -> anyhow::Result<Option<Book>> {
        let row = sqlx::query(
            r#"SELECT id, identifier, name, member_id, doc_count, view_count, generated_at, created_at, updated_at
               FROM books WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(map_book))
    }

    async fn find_by_identifier(&self, identifier: &str) -> anyhow::Result<Option<Book>> {
        let row = sqlx::query(
            r#"SELECT id, identifier, name, member_id, doc_count, view_count, generated_at, created_at, updated_at
               FROM books WHERE identifier = $1"#,
        )
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(map_book))
    }

    async fn set_document_count(&self, book_id: i64, count: i64) -> anyhow::Result<()> {
        sqlx::query("UPDATE books SET doc_count = $2, updated_at = now() WHERE id = $1")
            .bind(book_id)
            .bind(count)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_generated_at(&self, book_id: i64, at: DateTime<Utc>) -> anyhow::Result<()> {
        sqlx::query("UPDATE books SET generated_at = $2 WHERE id = $1")
            .bind(book_id)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn increment_views(&self, book_id: i64) -> anyhow::Result<()> {
        sqlx::query("UPDATE books SET view_count = view_count + 1 WHERE id = $1")
            .bind(book_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
