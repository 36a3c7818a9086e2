pub mod documents;
pub mod history;
