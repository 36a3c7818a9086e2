use async_trait::async_trait;

use crate::domain::documents::history::{DocumentHistory, NewHistory};

#[async_trait]
pub trait HistoryRepository: Send + Sync {
    async fn insert(&self, entry: NewHistory) -> anyhow::Result<DocumentHistory>;

    async fn get(&self, history_id: i64) -> anyhow::Result<Option<DocumentHistory>>;

    // Newest first; returns the page and the total number of entries
    async fn list_page(
        &self,
        document_id: i64,
        page: i64,
        page_size: i64,
    ) -> anyhow::Result<(Vec<DocumentHistory>, i64)>;

    async fn delete(&self, history_id: i64, document_id: i64) -> anyhow::Result<bool>;
}
