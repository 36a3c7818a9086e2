use super::document::Document;

#[derive(thiserror::Error, Debug)]
pub enum DocumentError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("document {} was modified concurrently (server version {})", .document.id, .document.version)]
    VersionConflict {
        document: Box<Document>,
        markdown: String,
    },
    #[error("{message}")]
    Validation { code: &'static str, message: String },
    #[error("blob storage failure")]
    Storage(#[source] anyhow::Error),
    #[error("database failure")]
    Database(#[source] anyhow::Error),
}

impl DocumentError {
    pub fn validation(code: &'static str, message: impl Into<String>) -> Self {
        DocumentError::Validation {
            code,
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            DocumentError::NotFound(_) => "not_found",
            DocumentError::VersionConflict { .. } => "version_conflict",
            DocumentError::Validation { code, .. } => *code,
            DocumentError::Storage(_) => "storage_error",
            DocumentError::Database(_) => "internal_error",
        }
    }
}

impl From<anyhow::Error> for DocumentError {
    fn from(err: anyhow::Error) -> Self {
        DocumentError::Database(err)
    }
}
