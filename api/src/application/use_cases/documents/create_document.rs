use chrono::Utc;

use crate::application::ports::book_repository::BookRepository;
use crate::application::ports::document_repository::DocumentRepository;
use crate::domain::documents::book::Book;
use crate::domain::documents::document::{
    DEFAULT_MARKDOWN, Document as DomainDocument, NewDocument, ROOT_PARENT_ID,
};
use crate::domain::documents::error::DocumentError;
use crate::domain::documents::identifier;

#[derive(Debug, Clone)]
pub struct CreateDocumentInput {
    pub identifier: Option<String>,
    pub name: String,
    pub parent_id: i64,
    pub member_id: i64,
}

pub struct CreateDocument<'a, D, B>
where
    D: DocumentRepository + ?Sized,
    B: BookRepository + ?Sized,
{
    pub documents: &'a D,
    pub books: &'a B,
}

impl<'a, D, B> CreateDocument<'a, D, B>
where
    D: DocumentRepository + ?Sized,
    B: BookRepository + ?Sized,
{
    pub async fn execute(
        &self,
        book: &Book,
        input: CreateDocumentInput,
    ) -> Result<DomainDocument, DocumentError> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(DocumentError::validation(
                "missing_name",
                "document name is required",
            ));
        }

        let now = Utc::now();
        let ident = match input.identifier.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => identifier::generated(now),
        };
        identifier::validate(&ident)?;
        if self
            .documents
            .find_by_identifier(book.id, &ident)
            .await?
            .is_some()
        {
            return Err(DocumentError::validation(
                "identifier_taken",
                format!("identifier '{ident}' is already used in this book"),
            ));
        }

        if input.parent_id != ROOT_PARENT_ID {
            let parent = self.documents.get_by_id(input.parent_id).await?;
            if !parent.is_some_and(|p| p.book_id == book.id) {
                return Err(DocumentError::validation(
                    "parent_not_found",
                    "parent document does not exist in this book",
                ));
            }
        }

        let doc = self
            .documents
            .insert(NewDocument {
                book_id: book.id,
                parent_id: input.parent_id,
                identifier: ident,
                name: name.to_string(),
                member_id: input.member_id,
                version: now.timestamp(),
                markdown: DEFAULT_MARKDOWN.to_string(),
                content: String::new(),
            })
            .await?;

        let count = self.documents.count_for_book(book.id).await?;
        if let Err(e) = self.books.set_document_count(book.id, count).await {
            tracing::warn!(book_id = book.id, error = ?e, "book_doc_count_update_failed");
        }
        tracing::info!(book_id = book.id, document_id = doc.id, identifier = %doc.identifier, "document_created");
        Ok(doc)
    }
}
