use super::load_in_book;
use super::reconcile_outline::{ReconcileOutline, ReconcileReport};
use crate::application::linkgraph::{self, IdentifierMap, LINK_SIGIL};
use crate::application::ports::address_builder::AddressBuilder;
use crate::application::ports::book_repository::BookRepository;
use crate::application::ports::document_repository::DocumentRepository;
use crate::application::ports::history_repository::HistoryRepository;
use crate::application::services::outline;
use crate::application::services::versioning::{CommitResult, ContentEdit, VersionGuard};
use crate::domain::documents::book::Book;
use crate::domain::documents::document::Document;
use crate::domain::documents::error::DocumentError;
use crate::domain::documents::history::HistoryAction;

/// Replaced by a listing of the document's children.
pub const AUTO_TAGS: [&str; 2] = [
    "<bookwiki-auto></bookwiki-auto>",
    "<DocStack-auto></DocStack-auto>",
];
/// Self-closing form kept in the stored source; marks the document as an
/// auto listing on every save.
pub const AUTO_MARKERS: [&str; 2] = ["<bookwiki-auto/>", "<DocStack-auto/>"];

#[derive(Debug, Clone)]
pub struct SaveContentInput {
    pub document_id: i64,
    pub version: i64,
    pub markdown: String,
    pub html: String,
    pub force: bool,
    pub member_id: i64,
}

#[derive(Debug, Clone)]
pub struct SaveOutcome {
    pub document: Document,
    pub markdown: String,
    pub content: String,
    /// A control tag took effect; clients should reload the tree.
    pub tree_changed: bool,
    pub reconcile: Option<ReconcileReport>,
    pub unresolved_links: Vec<String>,
    pub history_id: Option<i64>,
    pub history_error: Option<String>,
}

pub struct SaveContent<'a, D, B, H, A>
where
    D: DocumentRepository + ?Sized,
    B: BookRepository + ?Sized,
    H: HistoryRepository + ?Sized,
    A: AddressBuilder + ?Sized,
{
    pub documents: &'a D,
    pub books: &'a B,
    pub history: &'a H,
    pub addresses: &'a A,
    pub record_history: bool,
}

impl<'a, D, B, H, A> SaveContent<'a, D, B, H, A>
where
    D: DocumentRepository + ?Sized,
    B: BookRepository + ?Sized,
    H: HistoryRepository + ?Sized,
    A: AddressBuilder + ?Sized,
{
    pub async fn execute(
        &self,
        book: &Book,
        input: SaveContentInput,
    ) -> Result<SaveOutcome, DocumentError> {
        let doc = load_in_book(self.documents, book.id, input.document_id).await?;
        let stored = self
            .documents
            .get_content(doc.id)
            .await?
            .unwrap_or_default();

        // Stale editors are turned away before the outline touches the tree.
        if !input.force && input.version != doc.version {
            return Err(DocumentError::VersionConflict {
                document: Box::new(doc),
                markdown: stored.markdown,
            });
        }

        let mut markdown = input.markdown;
        let mut html = input.html;
        if markdown.trim().is_empty() && !html.trim().is_empty() {
            markdown = html.clone();
        }

        let drives_tree = outline::drives_tree(&doc.identifier, &markdown, &stored.markdown);
        let mut tree_changed = drives_tree;
        markdown = outline::strip_summary_tag(&markdown);
        html = outline::strip_summary_tag(&html);

        let auto_listing = AUTO_TAGS
            .iter()
            .any(|tag| markdown.contains(tag) || html.contains(tag))
            || AUTO_MARKERS.iter().any(|tag| stored.markdown.contains(tag));
        if auto_listing {
            let children = self.documents.list_children(book.id, doc.id).await?;
            let listing_md = children_markdown(&children);
            let listing_html = children_html(&children);
            for tag in AUTO_TAGS {
                markdown = markdown.replace(tag, &listing_md);
                html = html.replace(tag, &listing_html);
            }
            tree_changed = true;
        }

        let (content, unresolved_links, reconcile) = if drives_tree {
            let report = ReconcileOutline {
                documents: self.documents,
                books: self.books,
                addresses: self.addresses,
            }
            .execute(book, &html, input.member_id)
            .await?;
            (
                report.html.clone(),
                report.unresolved_links.clone(),
                Some(report),
            )
        } else {
            let docs = self.documents.list_for_book(book.id).await?;
            let map = IdentifierMap::build(&book.identifier, &docs, self.addresses);
            let resolved = linkgraph::resolve(&html, &map);
            let broken = resolved
                .broken_links()
                .filter_map(|a| a.href.clone())
                .collect();
            (resolved.html, broken, None)
        };

        let guard = VersionGuard {
            documents: self.documents,
            history: self.history,
            record_history: self.record_history,
        };
        let edit = ContentEdit {
            submitted_version: input.version,
            markdown: markdown.clone(),
            content: content.clone(),
            force: input.force,
            member_id: input.member_id,
            action: HistoryAction::Modify,
        };
        match guard.commit(&doc, edit).await? {
            CommitResult::Committed {
                document,
                history_id,
                history_error,
            } => Ok(SaveOutcome {
                document,
                markdown,
                content,
                tree_changed,
                reconcile,
                unresolved_links,
                history_id,
                history_error,
            }),
            CommitResult::Conflict { current, markdown } => Err(DocumentError::VersionConflict {
                document: Box::new(current),
                markdown,
            }),
        }
    }
}

fn children_markdown(children: &[Document]) -> String {
    children
        .iter()
        .map(|c| format!("- [{}]({}{})", c.name, LINK_SIGIL, c.address_segment()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn children_html(children: &[Document]) -> String {
    if children.is_empty() {
        return String::new();
    }
    let items: String = children
        .iter()
        .map(|c| {
            format!(
                "<li><a href=\"{}{}\">{}</a></li>",
                LINK_SIGIL,
                htmlescape::encode_attribute(&c.address_segment()),
                htmlescape::encode_minimal(&c.name)
            )
        })
        .collect();
    format!("<ul>{items}</ul>")
}
