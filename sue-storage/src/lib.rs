//! SUE archive engines
//!
//! Two complementary engines over the [`sue_format`] container codec:
//!
//! - [`Packer`] walks files and directories and emits a single container,
//!   storing each source either verbatim or as independently compressed
//!   fixed-size blocks.
//! - [`SueStorage`] mounts one or more containers into a unified,
//!   hash-indexed namespace and serves random-access reads, decompressing
//!   whole blocks on demand through a small fixed-slot cache.
//!
//! Everything is synchronous, single-threaded, and owned by the caller;
//! there is no process-global state.

pub mod archive;
pub mod cache;
pub mod error;
pub mod index;
pub mod storage;
pub mod types;
pub mod writer;

pub use error::{Result, StorageError};
pub use storage::SueStorage;
pub use types::{
    CHUNK_CACHE_SLOTS, DEFAULT_BLOCK_SIZE, EntryId, ItemLocation, MAX_MOUNTED_ARCHIVES,
    NAMESPACE_CAPACITY,
};
pub use writer::{PackOptions, PackStats, Packer};
