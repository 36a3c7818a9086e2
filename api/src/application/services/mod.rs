pub mod history;
pub mod html;
pub mod outline;
pub mod tree;
pub mod versioning;
