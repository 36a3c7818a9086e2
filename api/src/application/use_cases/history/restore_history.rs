use crate::application::ports::document_repository::DocumentRepository;
use crate::application::ports::history_repository::HistoryRepository;
use crate::application::services::history::HistoryRecorder;
use crate::application::services::versioning::{CommitResult, ContentEdit, VersionGuard};
use crate::application::use_cases::documents::load_in_book;
use crate::domain::documents::book::Book;
use crate::domain::documents::document::Document;
use crate::domain::documents::error::DocumentError;
use crate::domain::documents::history::HistoryAction;

#[derive(Debug, Clone)]
pub struct RestoreOutcome {
    pub document: Document,
    pub markdown: String,
    pub content: String,
    pub history_id: Option<i64>,
    pub history_error: Option<String>,
}

/// Writes a history snapshot back as the current content. Goes through the
/// version guard as a forced save, so the version moves forward.
pub struct RestoreHistory<'a, D, H>
where
    D: DocumentRepository + ?Sized,
    H: HistoryRepository + ?Sized,
{
    pub documents: &'a D,
    pub history: &'a H,
    pub record_history: bool,
}

impl<'a, D, H> RestoreHistory<'a, D, H>
where
    D: DocumentRepository + ?Sized,
    H: HistoryRepository + ?Sized,
{
    pub async fn execute(
        &self,
        book: &Book,
        document_id: i64,
        history_id: i64,
        member_id: i64,
    ) -> Result<RestoreOutcome, DocumentError> {
        let doc = load_in_book(self.documents, book.id, document_id).await?;
        let entry = HistoryRecorder { repo: self.history }
            .get(history_id, document_id)
            .await?
            .ok_or(DocumentError::NotFound("history entry"))?;

        let guard = VersionGuard {
            documents: self.documents,
            history: self.history,
            record_history: self.record_history,
        };
        let edit = ContentEdit {
            submitted_version: doc.version,
            markdown: entry.markdown.clone(),
            content: entry.content.clone(),
            force: true,
            member_id,
            action: HistoryAction::Restore,
        };
        match guard.commit(&doc, edit).await? {
            CommitResult::Committed {
                document,
                history_id: new_history_id,
                history_error,
            } => {
                tracing::info!(document_id, history_id, version = document.version, "history_restored");
                Ok(RestoreOutcome {
                    document,
                    markdown: entry.markdown,
                    content: entry.content,
                    history_id: new_history_id,
                    history_error,
                })
            }
            // forced commits only conflict when the row vanished meanwhile
            CommitResult::Conflict { .. } => Err(DocumentError::NotFound("document")),
        }
    }
}
