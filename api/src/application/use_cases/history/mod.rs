pub mod compare_history;
pub mod delete_history;
pub mod list_history;
pub mod restore_history;
