use chrono::{DateTime, Utc};

/// Parent id of top-level documents.
pub const ROOT_PARENT_ID: i64 = 0;

/// Source body given to freshly created documents.
pub const DEFAULT_MARKDOWN: &str = "[TOC]\n\r\n\r";

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: i64,
    pub book_id: i64,
    pub parent_id: i64,
    pub identifier: String,
    pub name: String,
    pub order_index: i32,
    pub version: i64,
    pub view_count: i64,
    pub member_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn is_top_level(&self) -> bool {
        self.parent_id == ROOT_PARENT_ID
    }

    /// Path segment used when building the public address: the identifier
    /// when set, the numeric id otherwise.
    pub fn address_segment(&self) -> String {
        if self.identifier.is_empty() {
            self.id.to_string()
        } else {
            self.identifier.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentContent {
    pub document_id: i64,
    pub markdown: String,
    pub content: String,
    /// Cached rendered artifact; cleared whenever the version changes.
    pub release: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewDocument {
    pub book_id: i64,
    pub parent_id: i64,
    pub identifier: String,
    pub name: String,
    pub member_id: i64,
    pub version: i64,
    pub markdown: String,
    pub content: String,
}

/// Tree placement computed by outline reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreePosition {
    pub document_id: i64,
    pub parent_id: i64,
    pub name: Option<String>,
    pub order_index: i32,
}

/// A content write guarded by the version stamp. `expected_version` is
/// `None` for forced overwrites.
#[derive(Debug, Clone)]
pub struct ContentCommit {
    pub document_id: i64,
    pub expected_version: Option<i64>,
    pub new_version: i64,
    pub markdown: String,
    pub content: String,
}
