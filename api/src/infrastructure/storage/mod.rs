//! Blob stores behind `StoragePort`: a local directory or an S3 bucket,
//! selected by `STORAGE_BACKEND`.
mod core;
mod s3_port_impl;
mod storage_port_impl;

pub use core::{join_key, join_url, normalize_key, normalize_prefix};

pub mod port_impl {
    pub use super::storage_port_impl::FsStoragePort;
}
pub mod s3 {
    pub use super::s3_port_impl::S3StoragePort;
}
