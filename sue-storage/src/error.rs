//! Error types for the storage engines

use std::path::PathBuf;
use thiserror::Error;

use crate::types::{MAX_MOUNTED_ARCHIVES, NAMESPACE_CAPACITY};

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Container format error: {0}")]
    Format(#[from] sue_format::Error),

    #[error("Mount table full: {MAX_MOUNTED_ARCHIVES} archives already mounted")]
    MountTableFull,

    #[error(
        "Namespace full: {needed} incoming items, {available} of \
         {NAMESPACE_CAPACITY} slots free"
    )]
    NamespaceFull { needed: usize, available: usize },

    #[error("No namespace entry at index {0}")]
    UnknownEntry(usize),

    #[error("Item {0:?} is already open")]
    AlreadyOpen(String),

    #[error("Item {0:?} is not open")]
    NotOpen(String),

    #[error("Invalid descriptor for {name:?}: {reason}")]
    InvalidDescriptor { name: String, reason: &'static str },

    #[error("Block {block} out of range for a {count}-entry offset table")]
    BlockOutOfRange { block: u32, count: usize },

    #[error("Block inflated to {actual} bytes, expected {expected}")]
    ShortBlock { expected: usize, actual: usize },

    #[error("Cannot enumerate directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
