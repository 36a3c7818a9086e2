use crate::application::ports::document_repository::DocumentRepository;
use crate::application::ports::history_repository::HistoryRepository;
use crate::application::services::history::HistoryRecorder;
use crate::application::use_cases::documents::load_in_book;
use crate::domain::documents::book::Book;
use crate::domain::documents::error::DocumentError;
use crate::domain::documents::history::DocumentHistory;

#[derive(Debug, Clone)]
pub struct HistoryPage {
    pub items: Vec<DocumentHistory>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

pub struct ListHistory<'a, D, H>
where
    D: DocumentRepository + ?Sized,
    H: HistoryRepository + ?Sized,
{
    pub documents: &'a D,
    pub history: &'a H,
}

impl<'a, D, H> ListHistory<'a, D, H>
where
    D: DocumentRepository + ?Sized,
    H: HistoryRepository + ?Sized,
{
    pub async fn execute(
        &self,
        book: &Book,
        document_id: i64,
        page: i64,
        page_size: i64,
    ) -> Result<HistoryPage, DocumentError> {
        load_in_book(self.documents, book.id, document_id).await?;
        let page = page.max(1);
        let page_size = page_size.clamp(1, 100);
        let (items, total) = HistoryRecorder { repo: self.history }
            .list(document_id, page, page_size)
            .await?;
        Ok(HistoryPage {
            items,
            total,
            page,
            page_size,
        })
    }
}
