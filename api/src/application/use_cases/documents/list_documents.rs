use crate::application::ports::document_repository::DocumentRepository;
use crate::domain::documents::book::Book;
use crate::domain::documents::document::Document as DomainDocument;

pub struct ListDocuments<'a, R: DocumentRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: DocumentRepository + ?Sized> ListDocuments<'a, R> {
    /// Flat listing ordered by (parent, order index, id).
    pub async fn execute(&self, book: &Book) -> anyhow::Result<Vec<DomainDocument>> {
        self.repo.list_for_book(book.id).await
    }
}
