use async_trait::async_trait;

use crate::domain::documents::document::{
    ContentCommit, Document as DomainDocument, DocumentContent, NewDocument, TreePosition,
};

#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn get_by_id(&self, id: i64) -> anyhow::Result<Option<DomainDocument>>;

    async fn find_by_identifier(
        &self,
        book_id: i64,
        identifier: &str,
    ) -> anyhow::Result<Option<DomainDocument>>;

    // Ordered by (parent_id, order_index, id)
    async fn list_for_book(&self, book_id: i64) -> anyhow::Result<Vec<DomainDocument>>;

    async fn list_children(
        &self,
        book_id: i64,
        parent_id: i64,
    ) -> anyhow::Result<Vec<DomainDocument>>;

    /// Inserts the metadata row and its content row together.
    async fn insert(&self, doc: NewDocument) -> anyhow::Result<DomainDocument>;

    // parent_id/name: None => keep current value
    async fn update_meta(
        &self,
        id: i64,
        book_id: i64,
        name: Option<String>,
        parent_id: Option<i64>,
    ) -> anyhow::Result<Option<DomainDocument>>;

    /// Applies all positions in one transaction; returns the number of rows touched.
    async fn apply_tree_positions(
        &self,
        book_id: i64,
        positions: &[TreePosition],
    ) -> anyhow::Result<u64>;

    async fn get_content(&self, id: i64) -> anyhow::Result<Option<DocumentContent>>;

    async fn list_contents_for_book(&self, book_id: i64) -> anyhow::Result<Vec<DocumentContent>>;

    /// Writes content and bumps the version in one transaction. Returns None when
    /// `expected_version` no longer matches the stored stamp.
    async fn commit_content(&self, commit: &ContentCommit)
    -> anyhow::Result<Option<DomainDocument>>;

    /// Deletes documents with their content and history in one transaction.
    async fn delete_many(&self, book_id: i64, ids: &[i64]) -> anyhow::Result<u64>;

    async fn count_for_book(&self, book_id: i64) -> anyhow::Result<i64>;

    /// Bumps the read counter; returns the new value, None when the row is gone.
    async fn increment_views(&self, id: i64) -> anyhow::Result<Option<i64>>;
}
