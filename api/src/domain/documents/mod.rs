pub mod book;
pub mod document;
pub mod error;
pub mod history;
pub mod identifier;
