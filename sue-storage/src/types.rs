//! Common types and fixed capacities of the reader side

/// Maximum number of simultaneously mounted containers
pub const MAX_MOUNTED_ARCHIVES: usize = 16;

/// Namespace slot count; a power of two comfortably above the expected
/// total item count across all mounts
pub const NAMESPACE_CAPACITY: usize = 4096;

/// Mask applied to the name checksum to find the home slot
pub const NAMESPACE_MASK: u32 = 0x0FFF;

/// Decompressed-block cache slots; a power of two
pub const CHUNK_CACHE_SLOTS: usize = 8;

/// Default block size for block-compressed items
pub const DEFAULT_BLOCK_SIZE: u32 = 16384;

/// Index of a namespace entry, as returned by lookup
pub type EntryId = usize;

/// Where an item's bytes live.
///
/// The on-disk descriptor overloads one offset field across kinds; in
/// memory each kind carries its own data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemLocation {
    /// Loose file resolved relative to the owning container's directory
    Loose,
    /// Verbatim bytes inside the container
    Packed { offset: u32, size: u32 },
    /// Independently compressed blocks; `first_block` indexes the
    /// container-wide chunk offset table
    Compressed { first_block: u32, size: u32, chunk: u32 },
}
