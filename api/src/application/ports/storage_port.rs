use async_trait::async_trait;
use std::path::Path;

/// Blob store for generated artifacts and per-document folders. Remote paths
/// are `/`-separated and relative to the store root.
#[async_trait]
pub trait StoragePort: Send + Sync {
    async fn move_to_store(&self, local_path: &Path, remote_path: &str) -> anyhow::Result<()>;
    async fn object_exists(&self, remote_path: &str) -> anyhow::Result<bool>;
    // Returns the number of objects removed
    async fn delete_folder(&self, remote_path: &str) -> anyhow::Result<usize>;
    fn public_url(&self, remote_path: &str) -> String;
}
