pub mod books;
pub mod documents;
pub mod error;
pub mod health;
pub mod history;
pub mod member;
