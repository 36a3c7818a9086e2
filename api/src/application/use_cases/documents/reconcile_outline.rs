//! Keeps a book's tree in line with its outline document.
//!
//! Stages, in order: resolve links against the current map, ensure every
//! listed identifier has a row, resolve again if rows were created, then
//! link parents and apply all positions in one transaction.

use std::collections::HashSet;

use chrono::Utc;

use crate::application::linkgraph::{self, IdentifierMap, ResolvedHtml};
use crate::application::ports::address_builder::AddressBuilder;
use crate::application::ports::book_repository::BookRepository;
use crate::application::ports::document_repository::DocumentRepository;
use crate::application::services::outline;
use crate::application::services::tree::reconcile::{
    FailureReason, ReconcileFailure, link_parents,
};
use crate::domain::documents::book::Book;
use crate::domain::documents::document::{DEFAULT_MARKDOWN, Document, NewDocument, ROOT_PARENT_ID};
use crate::domain::documents::error::DocumentError;
use crate::domain::documents::identifier;

#[derive(Debug, Clone, Default)]
pub struct ReconcileReport {
    /// Outline HTML with every resolvable link rewritten.
    pub html: String,
    pub created: Vec<Document>,
    pub linked: u64,
    pub failures: Vec<ReconcileFailure>,
    pub unresolved_links: Vec<String>,
}

pub struct ReconcileOutline<'a, D, B, A>
where
    D: DocumentRepository + ?Sized,
    B: BookRepository + ?Sized,
    A: AddressBuilder + ?Sized,
{
    pub documents: &'a D,
    pub books: &'a B,
    pub addresses: &'a A,
}

impl<'a, D, B, A> ReconcileOutline<'a, D, B, A>
where
    D: DocumentRepository + ?Sized,
    B: BookRepository + ?Sized,
    A: AddressBuilder + ?Sized,
{
    pub async fn execute(
        &self,
        book: &Book,
        html: &str,
        member_id: i64,
    ) -> Result<ReconcileReport, DocumentError> {
        let (mut map, mut resolved) = self.resolve(book, html).await?;
        let mut report = ReconcileReport::default();

        self.ensure(book, &resolved, &map, member_id, &mut report)
            .await?;
        if !report.created.is_empty() {
            (map, resolved) = self.resolve(book, html).await?;
        }

        let plan = link_parents(&resolved, &map);
        report.failures.extend(plan.failures);
        report.linked = self
            .documents
            .apply_tree_positions(book.id, &plan.positions)
            .await?;

        if !report.created.is_empty() {
            let count = self.documents.count_for_book(book.id).await?;
            if let Err(e) = self.books.set_document_count(book.id, count).await {
                tracing::warn!(book_id = book.id, error = ?e, "book_doc_count_update_failed");
            }
        }

        report.unresolved_links = resolved
            .broken_links()
            .filter_map(|a| a.href.clone())
            .collect();
        report.html = resolved.html;
        tracing::info!(
            book_id = book.id,
            created = report.created.len(),
            linked = report.linked,
            failures = report.failures.len(),
            "outline_reconciled"
        );
        Ok(report)
    }

    async fn resolve(
        &self,
        book: &Book,
        html: &str,
    ) -> Result<(IdentifierMap, ResolvedHtml), DocumentError> {
        let docs = self.documents.list_for_book(book.id).await?;
        let map = IdentifierMap::build(&book.identifier, &docs, self.addresses);
        let resolved = linkgraph::resolve(html, &map);
        Ok((map, resolved))
    }

    /// Creates a row for every listed identifier the map does not know yet.
    async fn ensure(
        &self,
        book: &Book,
        resolved: &ResolvedHtml,
        map: &IdentifierMap,
        member_id: i64,
        report: &mut ReconcileReport,
    ) -> Result<(), DocumentError> {
        let mut seen = HashSet::new();
        for entry in outline::entries(&resolved.anchors) {
            if map.lookup(&entry.identifier).is_some()
                || !seen.insert(entry.identifier.to_lowercase())
            {
                continue;
            }
            if let Err(e) = identifier::validate(&entry.identifier) {
                let reason = match e.code() {
                    "numeric_identifier" => FailureReason::NumericIdentifier,
                    _ => FailureReason::InvalidIdentifier,
                };
                tracing::warn!(identifier = %entry.identifier, reason = reason.as_str(), "outline_entry_rejected");
                report.failures.push(ReconcileFailure {
                    identifier: entry.identifier,
                    reason,
                });
                continue;
            }
            let name = if entry.display_text.is_empty() {
                entry.identifier.clone()
            } else {
                entry.display_text.clone()
            };
            let created = self
                .documents
                .insert(NewDocument {
                    book_id: book.id,
                    parent_id: ROOT_PARENT_ID,
                    identifier: entry.identifier.clone(),
                    name,
                    member_id,
                    version: Utc::now().timestamp(),
                    markdown: DEFAULT_MARKDOWN.to_string(),
                    content: String::new(),
                })
                .await;
            match created {
                Ok(doc) => report.created.push(doc),
                Err(e) => {
                    tracing::warn!(identifier = %entry.identifier, error = ?e, "outline_entry_create_failed");
                    report.failures.push(ReconcileFailure {
                        identifier: entry.identifier,
                        reason: FailureReason::Storage,
                    });
                }
            }
        }
        Ok(())
    }
}
