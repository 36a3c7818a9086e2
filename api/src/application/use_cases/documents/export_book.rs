use std::collections::HashMap;
use std::io::Write;

use chrono::{DateTime, Utc};

use crate::application::ports::book_repository::BookRepository;
use crate::application::ports::document_repository::DocumentRepository;
use crate::application::ports::storage_port::StoragePort;
use crate::application::services::tree::export::{ExportArtifact, StandaloneRenderer, export_walk};
use crate::domain::documents::book::Book;
use crate::domain::documents::document::ROOT_PARENT_ID;
use crate::domain::documents::error::DocumentError;

/// Ordered export of a book (or the subtree below `start_parent`).
pub struct ExportSequence<'a, D: DocumentRepository + ?Sized> {
    pub documents: &'a D,
}

impl<'a, D: DocumentRepository + ?Sized> ExportSequence<'a, D> {
    pub async fn execute(
        &self,
        book: &Book,
        base_url: Option<&str>,
        start_parent: i64,
    ) -> Result<Vec<ExportArtifact>, DocumentError> {
        let docs = self.documents.list_for_book(book.id).await?;
        let contents: HashMap<_, _> = self
            .documents
            .list_contents_for_book(book.id)
            .await?
            .into_iter()
            .map(|c| (c.document_id, c))
            .collect();
        let renderer = StandaloneRenderer {
            book,
            base_url,
            contents: &contents,
        };
        let mut artifacts = Vec::with_capacity(docs.len());
        export_walk(&docs, start_parent, &renderer, &mut artifacts)?;
        Ok(artifacts)
    }
}

#[derive(Debug, Clone)]
pub struct ExportBundle {
    pub path: String,
    pub url: String,
    pub generated_at: DateTime<Utc>,
    pub documents: usize,
}

#[derive(Debug, Clone)]
pub struct ExportLocation {
    pub path: String,
    pub url: String,
    pub generated_at: DateTime<Utc>,
}

/// Packs the ordered export into a zip archive inside the blob store.
pub struct BundleExport<'a, D, B, S>
where
    D: DocumentRepository + ?Sized,
    B: BookRepository + ?Sized,
    S: StoragePort + ?Sized,
{
    pub documents: &'a D,
    pub books: &'a B,
    pub storage: &'a S,
}

impl<'a, D, B, S> BundleExport<'a, D, B, S>
where
    D: DocumentRepository + ?Sized,
    B: BookRepository + ?Sized,
    S: StoragePort + ?Sized,
{
    pub async fn execute(
        &self,
        book: &Book,
        base_url: Option<&str>,
    ) -> Result<ExportBundle, DocumentError> {
        let artifacts = ExportSequence {
            documents: self.documents,
        }
        .execute(book, base_url, ROOT_PARENT_ID)
        .await?;

        let bytes = pack(&book.identifier, &artifacts).map_err(DocumentError::Storage)?;
        let staging = tempfile::tempdir().map_err(|e| DocumentError::Storage(e.into()))?;
        let local = staging.path().join(format!("{}.zip", book.identifier));
        tokio::fs::write(&local, &bytes)
            .await
            .map_err(|e| DocumentError::Storage(e.into()))?;

        let generated_at = Utc::now();
        let path = book.export_path(generated_at);
        self.storage
            .move_to_store(&local, &path)
            .await
            .map_err(DocumentError::Storage)?;
        self.books.set_generated_at(book.id, generated_at).await?;

        tracing::info!(book_id = book.id, path = %path, documents = artifacts.len(), "book_export_stored");
        Ok(ExportBundle {
            url: self.storage.public_url(&path),
            path,
            generated_at,
            documents: artifacts.len(),
        })
    }

    /// Location of the last bundle, when one was generated and still exists.
    pub async fn location(&self, book: &Book) -> Result<Option<ExportLocation>, DocumentError> {
        let Some(generated_at) = book.generated_at else {
            return Ok(None);
        };
        let path = book.export_path(generated_at);
        if !self
            .storage
            .object_exists(&path)
            .await
            .map_err(DocumentError::Storage)?
        {
            return Ok(None);
        }
        Ok(Some(ExportLocation {
            url: self.storage.public_url(&path),
            path,
            generated_at,
        }))
    }
}

fn pack(book_identifier: &str, artifacts: &[ExportArtifact]) -> anyhow::Result<Vec<u8>> {
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut cursor);
        let options = zip::write::FileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .unix_permissions(0o644);
        for artifact in artifacts {
            zip.start_file(format!("{}/{}", book_identifier, artifact.file_name), options)?;
            zip.write_all(artifact.html.as_bytes())?;
        }
        zip.finish()?;
    }
    Ok(cursor.into_inner())
}
