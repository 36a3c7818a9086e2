//! In-memory port fakes and fixtures shared by unit tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use crate::application::ports::address_builder::AddressBuilder;
use crate::application::ports::book_repository::BookRepository;
use crate::application::ports::document_repository::DocumentRepository;
use crate::application::ports::history_repository::HistoryRepository;
use crate::application::ports::storage_port::StoragePort;
use crate::domain::documents::book::Book;
use crate::domain::documents::document::{
    ContentCommit, Document, DocumentContent, NewDocument, TreePosition,
};
use crate::domain::documents::history::{DocumentHistory, NewHistory, page_offset};

pub const BOOK_ID: i64 = 10;

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

pub fn doc(id: i64, book_id: i64, identifier: &str, name: &str) -> Document {
    Document {
        id,
        book_id,
        parent_id: 0,
        identifier: identifier.to_string(),
        name: name.to_string(),
        order_index: 0,
        version: 1,
        view_count: 0,
        member_id: 1,
        created_at: epoch(),
        updated_at: epoch(),
    }
}

pub fn child(id: i64, parent_id: i64, order_index: i32) -> Document {
    Document {
        parent_id,
        order_index,
        ..doc(id, BOOK_ID, &format!("doc-{id}"), &format!("Doc {id}"))
    }
}

pub fn book(id: i64, identifier: &str) -> Book {
    Book {
        id,
        identifier: identifier.to_string(),
        name: format!("Book {identifier}"),
        member_id: 1,
        doc_count: 0,
        view_count: 0,
        generated_at: None,
        created_at: epoch(),
        updated_at: epoch(),
    }
}

#[derive(Debug, Clone)]
pub struct PrefixAddresses {
    pub prefix: String,
}

impl Default for PrefixAddresses {
    fn default() -> Self {
        Self {
            prefix: "/docs".into(),
        }
    }
}

impl AddressBuilder for PrefixAddresses {
    fn document_address(&self, book_identifier: &str, document: &str) -> String {
        format!("{}/{}/{}", self.prefix, book_identifier, document)
    }
}

#[derive(Default)]
struct DocumentState {
    docs: BTreeMap<i64, Document>,
    contents: HashMap<i64, DocumentContent>,
    next_id: i64,
}

#[derive(Default)]
pub struct MemoryDocuments {
    state: Mutex<DocumentState>,
    /// Makes `apply_tree_positions` fail before touching any row.
    pub fail_tree_updates: AtomicBool,
}

impl MemoryDocuments {
    pub fn with(docs: Vec<Document>) -> Self {
        let repo = Self::default();
        {
            let mut state = repo.state.lock().unwrap();
            for d in docs {
                state.next_id = state.next_id.max(d.id);
                state.contents.insert(
                    d.id,
                    DocumentContent {
                        document_id: d.id,
                        ..Default::default()
                    },
                );
                state.docs.insert(d.id, d);
            }
        }
        repo
    }

    pub fn set_content(&self, id: i64, markdown: &str, content: &str) {
        let mut state = self.state.lock().unwrap();
        state.contents.insert(
            id,
            DocumentContent {
                document_id: id,
                markdown: markdown.to_string(),
                content: content.to_string(),
                release: Some("cached".into()),
            },
        );
    }

    pub fn snapshot(&self) -> Vec<Document> {
        self.state.lock().unwrap().docs.values().cloned().collect()
    }

    pub fn get(&self, id: i64) -> Option<Document> {
        self.state.lock().unwrap().docs.get(&id).cloned()
    }

    pub fn content(&self, id: i64) -> Option<DocumentContent> {
        self.state.lock().unwrap().contents.get(&id).cloned()
    }

    pub fn by_identifier(&self, identifier: &str) -> Option<Document> {
        self.state
            .lock()
            .unwrap()
            .docs
            .values()
            .find(|d| d.identifier == identifier)
            .cloned()
    }
}

fn sorted(mut docs: Vec<Document>) -> Vec<Document> {
    docs.sort_by_key(|d| (d.parent_id, d.order_index, d.id));
    docs
}

#[async_trait]
impl DocumentRepository for MemoryDocuments {
    async fn get_by_id(&self, id: i64) -> anyhow::Result<Option<Document>> {
        Ok(self.get(id))
    }

    async fn find_by_identifier(
        &self,
        book_id: i64,
        identifier: &str,
    ) -> anyhow::Result<Option<Document>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .docs
            .values()
            .find(|d| d.book_id == book_id && d.identifier == identifier)
            .cloned())
    }

    async fn list_for_book(&self, book_id: i64) -> anyhow::Result<Vec<Document>> {
        let state = self.state.lock().unwrap();
        Ok(sorted(
            state
                .docs
                .values()
                .filter(|d| d.book_id == book_id)
                .cloned()
                .collect(),
        ))
    }

    async fn list_children(&self, book_id: i64, parent_id: i64) -> anyhow::Result<Vec<Document>> {
        let state = self.state.lock().unwrap();
        Ok(sorted(
            state
                .docs
                .values()
                .filter(|d| d.book_id == book_id && d.parent_id == parent_id)
                .cloned()
                .collect(),
        ))
    }

    async fn insert(&self, new: NewDocument) -> anyhow::Result<Document> {
        let mut state = self.state.lock().unwrap();
        if state
            .docs
            .values()
            .any(|d| d.book_id == new.book_id && d.identifier == new.identifier)
        {
            anyhow::bail!("duplicate identifier {}", new.identifier);
        }
        state.next_id += 1;
        let id = state.next_id;
        let row = Document {
            id,
            book_id: new.book_id,
            parent_id: new.parent_id,
            identifier: new.identifier,
            name: new.name,
            order_index: 0,
            version: new.version,
            view_count: 0,
            member_id: new.member_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        state.docs.insert(id, row.clone());
        state.contents.insert(
            id,
            DocumentContent {
                document_id: id,
                markdown: new.markdown,
                content: new.content,
                release: None,
            },
        );
        Ok(row)
    }

    async fn update_meta(
        &self,
        id: i64,
        book_id: i64,
        name: Option<String>,
        parent_id: Option<i64>,
    ) -> anyhow::Result<Option<Document>> {
        let mut state = self.state.lock().unwrap();
        let Some(d) = state.docs.get_mut(&id).filter(|d| d.book_id == book_id) else {
            return Ok(None);
        };
        if let Some(name) = name {
            d.name = name;
        }
        if let Some(parent_id) = parent_id {
            d.parent_id = parent_id;
        }
        d.updated_at = Utc::now();
        Ok(Some(d.clone()))
    }

    async fn apply_tree_positions(
        &self,
        book_id: i64,
        positions: &[TreePosition],
    ) -> anyhow::Result<u64> {
        if self.fail_tree_updates.load(Ordering::SeqCst) {
            anyhow::bail!("connection reset");
        }
        let mut state = self.state.lock().unwrap();
        let mut touched = 0;
        for p in positions {
            if let Some(d) = state
                .docs
                .get_mut(&p.document_id)
                .filter(|d| d.book_id == book_id)
            {
                d.parent_id = p.parent_id;
                d.order_index = p.order_index;
                if let Some(name) = &p.name {
                    d.name = name.clone();
                }
                d.updated_at = Utc::now();
                touched += 1;
            }
        }
        Ok(touched)
    }

    async fn get_content(&self, id: i64) -> anyhow::Result<Option<DocumentContent>> {
        Ok(self.content(id))
    }

    async fn list_contents_for_book(&self, book_id: i64) -> anyhow::Result<Vec<DocumentContent>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .docs
            .values()
            .filter(|d| d.book_id == book_id)
            .filter_map(|d| state.contents.get(&d.id).cloned())
            .collect())
    }

    async fn commit_content(&self, commit: &ContentCommit) -> anyhow::Result<Option<Document>> {
        let mut state = self.state.lock().unwrap();
        let Some(d) = state.docs.get_mut(&commit.document_id) else {
            return Ok(None);
        };
        if commit.expected_version.is_some_and(|v| v != d.version) {
            return Ok(None);
        }
        d.version = commit.new_version;
        d.updated_at = Utc::now();
        let row = d.clone();
        state.contents.insert(
            commit.document_id,
            DocumentContent {
                document_id: commit.document_id,
                markdown: commit.markdown.clone(),
                content: commit.content.clone(),
                release: None,
            },
        );
        Ok(Some(row))
    }

    async fn delete_many(&self, book_id: i64, ids: &[i64]) -> anyhow::Result<u64> {
        let mut state = self.state.lock().unwrap();
        let mut removed = 0;
        for id in ids {
            if state.docs.get(id).is_some_and(|d| d.book_id == book_id) {
                state.docs.remove(id);
                state.contents.remove(id);
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn count_for_book(&self, book_id: i64) -> anyhow::Result<i64> {
        let state = self.state.lock().unwrap();
        Ok(state.docs.values().filter(|d| d.book_id == book_id).count() as i64)
    }

    async fn increment_views(&self, id: i64) -> anyhow::Result<Option<i64>> {
        let mut state = self.state.lock().unwrap();
        Ok(state.docs.get_mut(&id).map(|d| {
            d.view_count += 1;
            d.view_count
        }))
    }
}

#[derive(Default)]
pub struct MemoryBooks {
    books: Mutex<HashMap<i64, Book>>,
}

impl MemoryBooks {
    pub fn with(books: Vec<Book>) -> Self {
        Self {
            books: Mutex::new(books.into_iter().map(|b| (b.id, b)).collect()),
        }
    }

    pub fn get(&self, id: i64) -> Option<Book> {
        self.books.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl BookRepository for MemoryBooks {
    async fn get_by_id(&self, id: i64) -> anyhow::Result<Option<Book>> {
        Ok(self.get(id))
    }

    async fn find_by_identifier(&self, identifier: &str) -> anyhow::Result<Option<Book>> {
        let books = self.books.lock().unwrap();
        Ok(books.values().find(|b| b.identifier == identifier).cloned())
    }

    async fn set_document_count(&self, book_id: i64, count: i64) -> anyhow::Result<()> {
        if let Some(b) = self.books.lock().unwrap().get_mut(&book_id) {
            b.doc_count = count;
        }
        Ok(())
    }

    async fn set_generated_at(&self, book_id: i64, at: DateTime<Utc>) -> anyhow::Result<()> {
        if let Some(b) = self.books.lock().unwrap().get_mut(&book_id) {
            b.generated_at = Some(at);
        }
        Ok(())
    }

    async fn increment_views(&self, book_id: i64) -> anyhow::Result<()> {
        if let Some(b) = self.books.lock().unwrap().get_mut(&book_id) {
            b.view_count += 1;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryHistories {
    entries: Mutex<Vec<DocumentHistory>>,
    pub fail_inserts: AtomicBool,
}

impl MemoryHistories {
    pub fn failing() -> Self {
        let h = Self::default();
        h.fail_inserts.store(true, Ordering::SeqCst);
        h
    }

    pub fn all(&self) -> Vec<DocumentHistory> {
        self.entries.lock().unwrap().clone()
    }
}

#[async_trait]
impl HistoryRepository for MemoryHistories {
    async fn insert(&self, entry: NewHistory) -> anyhow::Result<DocumentHistory> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            anyhow::bail!("history table unavailable");
        }
        let mut entries = self.entries.lock().unwrap();
        let id = entries.iter().map(|h| h.id).max().unwrap_or(0) + 1;
        // strictly increasing so newest-first ordering is stable in tests
        let created_at = epoch() + chrono::Duration::seconds(id);
        let row = DocumentHistory {
            id,
            document_id: entry.document_id,
            document_name: entry.document_name,
            parent_id: entry.parent_id,
            version: entry.version,
            markdown: entry.markdown,
            content: entry.content,
            action: entry.action.as_str().to_string(),
            action_name: entry.action.label().to_string(),
            member_id: entry.member_id,
            modified_by: entry.modified_by,
            created_at,
        };
        entries.push(row.clone());
        Ok(row)
    }

    async fn get(&self, history_id: i64) -> anyhow::Result<Option<DocumentHistory>> {
        let entries = self.entries.lock().unwrap();
        Ok(entries.iter().find(|h| h.id == history_id).cloned())
    }

    async fn list_page(
        &self,
        document_id: i64,
        page: i64,
        page_size: i64,
    ) -> anyhow::Result<(Vec<DocumentHistory>, i64)> {
        let entries = self.entries.lock().unwrap();
        let mut rows: Vec<_> = entries
            .iter()
            .filter(|h| h.document_id == document_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        let total = rows.len() as i64;
        let skip = usize::try_from(page_offset(page, page_size)).unwrap_or(usize::MAX);
        Ok((
            rows.into_iter().skip(skip).take(page_size as usize).collect(),
            total,
        ))
    }

    async fn delete(&self, history_id: i64, document_id: i64) -> anyhow::Result<bool> {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|h| !(h.id == history_id && h.document_id == document_id));
        Ok(entries.len() != before)
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<HashSet<String>>,
}

impl MemoryStorage {
    pub fn with(keys: &[&str]) -> Self {
        Self {
            objects: Mutex::new(keys.iter().map(|k| k.to_string()).collect()),
        }
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.objects.lock().unwrap().iter().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl StoragePort for MemoryStorage {
    async fn move_to_store(&self, local_path: &Path, remote_path: &str) -> anyhow::Result<()> {
        if !local_path.exists() {
            anyhow::bail!("missing staged file {}", local_path.display());
        }
        self.objects
            .lock()
            .unwrap()
            .insert(remote_path.trim_start_matches('/').to_string());
        Ok(())
    }

    async fn object_exists(&self, remote_path: &str) -> anyhow::Result<bool> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .contains(remote_path.trim_start_matches('/')))
    }

    async fn delete_folder(&self, remote_path: &str) -> anyhow::Result<usize> {
        let prefix = format!("{}/", remote_path.trim_matches('/'));
        let mut objects = self.objects.lock().unwrap();
        let before = objects.len();
        objects.retain(|k| !k.starts_with(&prefix));
        Ok(before - objects.len())
    }

    fn public_url(&self, remote_path: &str) -> String {
        format!("/uploads/{}", remote_path.trim_start_matches('/'))
    }
}
