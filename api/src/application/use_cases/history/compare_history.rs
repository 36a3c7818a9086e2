use crate::application::ports::document_repository::DocumentRepository;
use crate::application::ports::history_repository::HistoryRepository;
use crate::application::services::history::{self, HistoryComparison, HistoryRecorder};
use crate::application::use_cases::documents::load_in_book;
use crate::domain::documents::book::Book;
use crate::domain::documents::error::DocumentError;

pub struct CompareHistory<'a, D, H>
where
    D: DocumentRepository + ?Sized,
    H: HistoryRepository + ?Sized,
{
    pub documents: &'a D,
    pub history: &'a H,
}

impl<'a, D, H> CompareHistory<'a, D, H>
where
    D: DocumentRepository + ?Sized,
    H: HistoryRepository + ?Sized,
{
    pub async fn execute(
        &self,
        book: &Book,
        document_id: i64,
        history_id: i64,
    ) -> Result<HistoryComparison, DocumentError> {
        load_in_book(self.documents, book.id, document_id).await?;
        let entry = HistoryRecorder { repo: self.history }
            .get(history_id, document_id)
            .await?
            .ok_or(DocumentError::NotFound("history entry"))?;
        let current = self
            .documents
            .get_content(document_id)
            .await?
            .map(|c| c.markdown)
            .unwrap_or_default();
        Ok(history::compare(entry, &current))
    }
}
