use chrono::Utc;

use crate::application::ports::book_repository::BookRepository;
use crate::application::ports::document_repository::DocumentRepository;
use crate::domain::documents::book::Book;
use crate::domain::documents::document::{DEFAULT_MARKDOWN, Document, NewDocument, ROOT_PARENT_ID};
use crate::domain::documents::error::DocumentError;
use crate::domain::documents::identifier;

#[derive(Debug, Default)]
pub struct CreateManyReport {
    pub created: Vec<Document>,
    pub updated: Vec<Document>,
    /// Lines rejected because of their identifier.
    pub skipped: Vec<String>,
}

/// Batch creation from `identifier name...` lines. Existing identifiers get
/// their name updated.
pub struct CreateMany<'a, D, B>
where
    D: DocumentRepository + ?Sized,
    B: BookRepository + ?Sized,
{
    pub documents: &'a D,
    pub books: &'a B,
}

impl<'a, D, B> CreateMany<'a, D, B>
where
    D: DocumentRepository + ?Sized,
    B: BookRepository + ?Sized,
{
    pub async fn execute(
        &self,
        book: &Book,
        lines: &str,
        parent_id: i64,
        member_id: i64,
    ) -> Result<CreateManyReport, DocumentError> {
        if parent_id != ROOT_PARENT_ID {
            let parent = self.documents.get_by_id(parent_id).await?;
            if !parent.is_some_and(|p| p.book_id == book.id) {
                return Err(DocumentError::validation(
                    "parent_not_found",
                    "parent document does not exist in this book",
                ));
            }
        }

        let mut report = CreateManyReport::default();
        for line in lines.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let (ident, rest) = match line.split_once(char::is_whitespace) {
                Some((ident, rest)) => (ident, rest.trim()),
                None => (line, ""),
            };
            if identifier::validate(ident).is_err() {
                report.skipped.push(line.to_string());
                continue;
            }
            let name = if rest.is_empty() { ident } else { rest };

            match self.documents.find_by_identifier(book.id, ident).await? {
                Some(existing) => {
                    if let Some(doc) = self
                        .documents
                        .update_meta(existing.id, book.id, Some(name.to_string()), None)
                        .await?
                    {
                        report.updated.push(doc);
                    }
                }
                None => {
                    let doc = self
                        .documents
                        .insert(NewDocument {
                            book_id: book.id,
                            parent_id,
                            identifier: ident.to_string(),
                            name: name.to_string(),
                            member_id,
                            version: Utc::now().timestamp(),
                            markdown: DEFAULT_MARKDOWN.to_string(),
                            content: String::new(),
                        })
                        .await?;
                    report.created.push(doc);
                }
            }
        }

        if !report.created.is_empty() {
            let count = self.documents.count_for_book(book.id).await?;
            if let Err(e) = self.books.set_document_count(book.id, count).await {
                tracing::warn!(book_id = book.id, error = ?e, "book_doc_count_update_failed");
            }
        }
        Ok(report)
    }
}
