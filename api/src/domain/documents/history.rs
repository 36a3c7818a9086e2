use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryAction {
    Modify,
    Restore,
}

impl HistoryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryAction::Modify => "modify",
            HistoryAction::Restore => "restore",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HistoryAction::Modify => "Modified document",
            HistoryAction::Restore => "Restored from history",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentHistory {
    pub id: i64,
    pub document_id: i64,
    pub document_name: String,
    pub parent_id: i64,
    pub version: i64,
    pub markdown: String,
    pub content: String,
    pub action: String,
    pub action_name: String,
    pub member_id: i64,
    pub modified_by: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewHistory {
    pub document_id: i64,
    pub document_name: String,
    pub parent_id: i64,
    pub version: i64,
    pub markdown: String,
    pub content: String,
    pub action: HistoryAction,
    pub member_id: i64,
    pub modified_by: i64,
}

/// Row offset of a 1-based page. Saturates instead of overflowing on
/// absurd page numbers.
pub fn page_offset(page: i64, page_size: i64) -> i64 {
    (page.max(1) - 1).saturating_mul(page_size.max(0))
}
