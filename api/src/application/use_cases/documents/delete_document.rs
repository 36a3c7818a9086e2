use super::load_in_book;
use crate::application::ports::book_repository::BookRepository;
use crate::application::ports::document_repository::DocumentRepository;
use crate::application::ports::storage_port::StoragePort;
use crate::application::services::tree::cascade::collect_subtree;
use crate::domain::documents::book::Book;
use crate::domain::documents::error::DocumentError;

#[derive(Debug, Clone)]
pub struct DeleteOutcome {
    pub deleted: Vec<i64>,
    pub doc_count: i64,
    /// Blob folders of the removed documents, for best-effort cleanup.
    pub blob_folders: Vec<String>,
}

pub struct DeleteDocument<'a, D, B>
where
    D: DocumentRepository + ?Sized,
    B: BookRepository + ?Sized,
{
    pub documents: &'a D,
    pub books: &'a B,
}

impl<'a, D, B> DeleteDocument<'a, D, B>
where
    D: DocumentRepository + ?Sized,
    B: BookRepository + ?Sized,
{
    /// Removes the document and every descendant in one transaction.
    pub async fn execute(&self, book: &Book, id: i64) -> Result<DeleteOutcome, DocumentError> {
        load_in_book(self.documents, book.id, id).await?;
        let docs = self.documents.list_for_book(book.id).await?;
        let ids = collect_subtree(&docs, id);
        let removed = self.documents.delete_many(book.id, &ids).await?;

        let doc_count = self.documents.count_for_book(book.id).await?;
        if let Err(e) = self.books.set_document_count(book.id, doc_count).await {
            tracing::warn!(book_id = book.id, error = ?e, "book_doc_count_update_failed");
        }
        tracing::info!(book_id = book.id, document_id = id, removed, "document_subtree_deleted");

        let blob_folders = ids.iter().map(|d| book.document_folder(*d)).collect();
        Ok(DeleteOutcome {
            deleted: ids,
            doc_count,
            blob_folders,
        })
    }
}

/// Best-effort removal of blob folders; failures are logged and ignored.
pub async fn remove_blob_folders<S>(storage: &S, folders: &[String])
where
    S: StoragePort + ?Sized,
{
    for folder in folders {
        match storage.delete_folder(folder).await {
            Ok(0) => {}
            Ok(removed) => tracing::debug!(folder = %folder, removed, "blob_folder_removed"),
            Err(e) => tracing::warn!(folder = %folder, error = ?e, "blob_folder_cleanup_failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{
        BOOK_ID, MemoryBooks, MemoryDocuments, MemoryStorage, book, child, doc,
    };

    #[tokio::test]
    async fn deletes_exactly_the_subtree() {
        // R(1) -> X(2) -> Y(3); R -> Z(4); sibling S(5)
        let docs = MemoryDocuments::with(vec![
            child(1, 0, 0),
            child(2, 1, 1),
            child(3, 2, 2),
            child(4, 1, 3),
            child(5, 0, 4),
        ]);
        let books = MemoryBooks::with(vec![book(BOOK_ID, "guide")]);
        let uc = DeleteDocument {
            documents: &docs,
            books: &books,
        };
        let out = uc.execute(&book(BOOK_ID, "guide"), 1).await.unwrap();
        let mut deleted = out.deleted.clone();
        deleted.sort();
        assert_eq!(deleted, vec![1, 2, 3, 4]);
        assert_eq!(out.doc_count, 1);
        assert_eq!(books.get(BOOK_ID).unwrap().doc_count, 1);
        assert_eq!(docs.snapshot().iter().map(|d| d.id).collect::<Vec<_>>(), vec![5]);
        assert!(docs.content(2).is_none());
        assert!(out.blob_folders.contains(&"projects/guide/3".to_string()));
    }

    #[tokio::test]
    async fn documents_of_other_books_are_not_found() {
        let docs = MemoryDocuments::with(vec![doc(1, 99, "x", "X")]);
        let books = MemoryBooks::default();
        let uc = DeleteDocument {
            documents: &docs,
            books: &books,
        };
        let err = uc.execute(&book(BOOK_ID, "guide"), 1).await.unwrap_err();
        assert!(matches!(err, DocumentError::NotFound(_)));
        assert_eq!(docs.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn blob_cleanup_removes_only_listed_folders() {
        let storage = MemoryStorage::with(&[
            "projects/guide/1/a.png",
            "projects/guide/2/b.png",
            "projects/guide/12/c.png",
        ]);
        remove_blob_folders(
            &storage,
            &["projects/guide/1".to_string(), "projects/guide/9".to_string()],
        )
        .await;
        assert_eq!(
            storage.keys(),
            vec!["projects/guide/12/c.png", "projects/guide/2/b.png"]
        );
    }
}
