use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::documents::book::Book;

#[async_trait]
pub trait BookRepository: Send + Sync {
    async fn get_by_id(&self, id: i64) -> anyhow::Result<Option<Book>>;

    async fn find_by_identifier(&self, identifier: &str) -> anyhow::Result<Option<Book>>;

    async fn set_document_count(&self, book_id: i64, count: i64) -> anyhow::Result<()>;

    async fn set_generated_at(&self, book_id: i64, at: DateTime<Utc>) -> anyhow::Result<()>;

    async fn increment_views(&self, book_id: i64) -> anyhow::Result<()>;
}
