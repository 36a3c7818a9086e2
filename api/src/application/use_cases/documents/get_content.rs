use super::load_in_book;
use crate::application::ports::book_repository::BookRepository;
use crate::application::ports::document_repository::DocumentRepository;
use crate::domain::documents::book::Book;
use crate::domain::documents::document::{Document, DocumentContent};
use crate::domain::documents::error::DocumentError;

/// Reads a document for display. Each read counts as a view of the document
/// and of its book.
pub struct GetContent<'a, D, B>
where
    D: DocumentRepository + ?Sized,
    B: BookRepository + ?Sized,
{
    pub documents: &'a D,
    pub books: &'a B,
}

impl<'a, D, B> GetContent<'a, D, B>
where
    D: DocumentRepository + ?Sized,
    B: BookRepository + ?Sized,
{
    pub async fn execute(
        &self,
        book: &Book,
        id: i64,
    ) -> Result<(Document, DocumentContent), DocumentError> {
        let mut doc = load_in_book(self.documents, book.id, id).await?;
        let content = self
            .documents
            .get_content(id)
            .await?
            .ok_or(DocumentError::NotFound("document content"))?;

        match self.documents.increment_views(id).await {
            Ok(Some(views)) => doc.view_count = views,
            Ok(None) => {}
            Err(e) => tracing::warn!(document_id = id, error = ?e, "document_view_count_failed"),
        }
        if let Err(e) = self.books.increment_views(book.id).await {
            tracing::warn!(book_id = book.id, error = ?e, "book_view_count_failed");
        }
        Ok((doc, content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{BOOK_ID, MemoryBooks, MemoryDocuments, book, doc};

    #[tokio::test]
    async fn documents_of_other_books_are_not_found() {
        let docs = MemoryDocuments::with(vec![
            doc(1, BOOK_ID, "intro", "Intro"),
            doc(2, 99, "other", "Other"),
        ]);
        docs.set_content(1, "# Intro", "<h1>Intro</h1>");
        let books = MemoryBooks::with(vec![book(BOOK_ID, "guide")]);
        let uc = GetContent {
            documents: &docs,
            books: &books,
        };
        let b = book(BOOK_ID, "guide");
        let (d, c) = uc.execute(&b, 1).await.unwrap();
        assert_eq!(d.identifier, "intro");
        assert_eq!(c.markdown, "# Intro");
        assert!(matches!(
            uc.execute(&b, 2).await,
            Err(DocumentError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn reads_count_as_views_of_document_and_book() {
        let docs = MemoryDocuments::with(vec![
            doc(1, BOOK_ID, "intro", "Intro"),
            doc(2, BOOK_ID, "setup", "Setup"),
        ]);
        let books = MemoryBooks::with(vec![book(BOOK_ID, "guide")]);
        let uc = GetContent {
            documents: &docs,
            books: &books,
        };
        let b = book(BOOK_ID, "guide");
        uc.execute(&b, 1).await.unwrap();
        let (d, _) = uc.execute(&b, 1).await.unwrap();
        uc.execute(&b, 2).await.unwrap();

        assert_eq!(d.view_count, 2);
        assert_eq!(docs.get(1).unwrap().view_count, 2);
        assert_eq!(docs.get(2).unwrap().view_count, 1);
        assert_eq!(books.get(BOOK_ID).unwrap().view_count, 3);

        // failed reads are not counted
        assert!(uc.execute(&b, 9).await.is_err());
        assert_eq!(books.get(BOOK_ID).unwrap().view_count, 3);
    }
}
