pub mod addressing;
pub mod db;
pub mod storage;
