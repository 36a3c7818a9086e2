use std::path::{Path, PathBuf};

use crate::application::ports::storage_port::StoragePort;
use crate::infrastructure::storage::{join_url, normalize_key};

/// Blob store rooted in a local directory.
pub struct FsStoragePort {
    pub root: PathBuf,
    /// URL prefix the root is served under.
    pub public_base: String,
}

impl FsStoragePort {
    pub fn new(root: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base: public_base.into(),
        }
    }

    fn absolute(&self, remote_path: &str) -> anyhow::Result<PathBuf> {
        Ok(self.root.join(normalize_key(remote_path)?))
    }
}

#[async_trait::async_trait]
impl StoragePort for FsStoragePort {
    async fn move_to_store(&self, local_path: &Path, remote_path: &str) -> anyhow::Result<()> {
        let target = self.absolute(remote_path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        // rename fails across filesystems (tmp is often tmpfs)
        if tokio::fs::rename(local_path, &target).await.is_err() {
            tokio::fs::copy(local_path, &target).await?;
            let _ = tokio::fs::remove_file(local_path).await;
        }
        Ok(())
    }

    async fn object_exists(&self, remote_path: &str) -> anyhow::Result<bool> {
        let target = self.absolute(remote_path)?;
        Ok(tokio::fs::try_exists(&target).await?)
    }

    async fn delete_folder(&self, remote_path: &str) -> anyhow::Result<usize> {
        let target = self.absolute(remote_path)?;
        if !tokio::fs::try_exists(&target).await? {
            return Ok(0);
        }
        let removed = count_files(&target).await?;
        tokio::fs::remove_dir_all(&target).await?;
        Ok(removed)
    }

    fn public_url(&self, remote_path: &str) -> String {
        let key = normalize_key(remote_path).unwrap_or_default();
        join_url(&self.public_base, &key)
    }
}

async fn count_files(dir: &Path) -> anyhow::Result<usize> {
    let mut count = 0;
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&current).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                pending.push(entry.path());
            } else {
                count += 1;
            }
        }
    }
    Ok(count)
}
