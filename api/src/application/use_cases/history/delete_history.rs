use crate::application::ports::document_repository::DocumentRepository;
use crate::application::ports::history_repository::HistoryRepository;
use crate::application::services::history::HistoryRecorder;
use crate::application::use_cases::documents::load_in_book;
use crate::domain::documents::book::Book;
use crate::domain::documents::error::DocumentError;

pub struct DeleteHistory<'a, D, H>
where
    D: DocumentRepository + ?Sized,
    H: HistoryRepository + ?Sized,
{
    pub documents: &'a D,
    pub history: &'a H,
}

impl<'a, D, H> DeleteHistory<'a, D, H>
where
    D: DocumentRepository + ?Sized,
    H: HistoryRepository + ?Sized,
{
    pub async fn execute(
        &self,
        book: &Book,
        document_id: i64,
        history_id: i64,
    ) -> Result<(), DocumentError> {
        load_in_book(self.documents, book.id, document_id).await?;
        let removed = HistoryRecorder { repo: self.history }
            .delete(history_id, document_id)
            .await?;
        if !removed {
            return Err(DocumentError::NotFound("history entry"));
        }
        Ok(())
    }
}
