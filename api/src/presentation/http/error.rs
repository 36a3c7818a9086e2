use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::documents::error::DocumentError;
use crate::presentation::http::documents::Document;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    /// Server copy of the document on a version conflict.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<Document>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
}

#[derive(Debug)]
pub struct ApiError(pub DocumentError);

impl From<DocumentError> for ApiError {
    fn from(err: DocumentError) -> Self {
        ApiError(err)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError(DocumentError::Database(err))
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            DocumentError::NotFound(_) => StatusCode::NOT_FOUND,
            DocumentError::VersionConflict { .. } => StatusCode::CONFLICT,
            DocumentError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            DocumentError::Storage(_) => StatusCode::BAD_GATEWAY,
            DocumentError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.0.code().to_string();
        let body = match self.0 {
            DocumentError::VersionConflict { document, markdown } => ErrorBody {
                code,
                message: format!(
                    "document was modified concurrently (server version {})",
                    document.version
                ),
                current: Some(Document::from(*document)),
                markdown: Some(markdown),
            },
            DocumentError::Storage(e) => {
                tracing::error!(error = ?e, "storage_failed");
                ErrorBody {
                    code,
                    message: "blob storage failure".into(),
                    current: None,
                    markdown: None,
                }
            }
            DocumentError::Database(e) => {
                tracing::error!(error = ?e, "request_failed");
                ErrorBody {
                    code,
                    message: "internal error".into(),
                    current: None,
                    markdown: None,
                }
            }
            other => ErrorBody {
                code,
                message: other.to_string(),
                current: None,
                markdown: None,
            },
        };
        (status, Json(body)).into_response()
    }
}
