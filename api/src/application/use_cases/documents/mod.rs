pub mod create_document;
pub mod create_many;
pub mod delete_document;
pub mod export_book;
pub mod get_content;
pub mod list_documents;
pub mod reconcile_outline;
pub mod save_content;

use crate::application::ports::document_repository::DocumentRepository;
use crate::domain::documents::document::Document;
use crate::domain::documents::error::DocumentError;

/// Loads a document, treating one that lives in another book as missing.
pub(crate) async fn load_in_book<D>(
    documents: &D,
    book_id: i64,
    id: i64,
) -> Result<Document, DocumentError>
where
    D: DocumentRepository + ?Sized,
{
    documents
        .get_by_id(id)
        .await?
        .filter(|d| d.book_id == book_id)
        .ok_or(DocumentError::NotFound("document"))
}
