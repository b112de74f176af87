//! On-disk container format for SUE archives
//!
//! A SUE container is a fixed header, concatenated item payloads, and three
//! trailing metadata blocks (item descriptor table, name blob, chunk offset
//! table), each stored as a self-describing deflate-compressed record. This
//! crate provides the byte-exact codec shared by the writer and the reader;
//! it performs no filesystem traversal and holds no runtime state.

pub mod descriptor;
pub mod error;
pub mod header;
pub mod metadata;
pub mod names;

pub use descriptor::{ITEM_DESCRIPTOR_SIZE, ItemDescriptor, ItemKind};
pub use error::{Error, Result};
pub use header::{ARCHIVE_HEADER_SIZE, ArchiveHeader};
pub use metadata::{
    METADATA_HEADER_SIZE, compression_level, decode_offset_table, encode_offset_table,
    read_metadata_block, write_metadata_block,
};
pub use names::NameBlob;

/// Container magic, `"FZFS"` when written little-endian
pub const SUE_MAGIC: u32 = 0x5346_5A46;
