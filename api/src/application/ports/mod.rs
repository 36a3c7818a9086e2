pub mod address_builder;
pub mod book_repository;
pub mod document_repository;
pub mod history_repository;
pub mod storage_port;
