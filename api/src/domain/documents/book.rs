use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    pub id: i64,
    pub identifier: String,
    pub name: String,
    pub member_id: i64,
    pub doc_count: i64,
    pub view_count: i64,
    /// Set when an export bundle was last generated.
    pub generated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// Blob folder holding everything stored for this book.
    pub fn storage_prefix(&self) -> String {
        format!("projects/{}", self.identifier)
    }

    pub fn export_path(&self, generated_at: DateTime<Utc>) -> String {
        format!(
            "{}/books/{}.zip",
            self.storage_prefix(),
            generated_at.timestamp()
        )
    }

    pub fn document_folder(&self, document_id: i64) -> String {
        format!("{}/{}", self.storage_prefix(), document_id)
    }
}
