pub mod book_repository_sqlx;
pub mod document_repository_sqlx;
pub mod history_repository_sqlx;
