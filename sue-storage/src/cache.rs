//! Fixed-slot cache of decompressed blocks
//!
//! Insertion is round-robin over the slots, not LRU: eviction is O(1) and
//! memory is bounded at the cost of hit rate. A slot's previous buffer is
//! dropped before reuse.

use tracing::trace;

use crate::types::{CHUNK_CACHE_SLOTS, EntryId};

#[derive(Debug)]
struct CachedChunk {
    entry: EntryId,
    block: u32,
    data: Vec<u8>,
}

#[derive(Debug, Default)]
pub(crate) struct ChunkCache {
    slots: [Option<CachedChunk>; CHUNK_CACHE_SLOTS],
    next: usize,
}

impl ChunkCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Linear scan for a block tagged `(entry, block)`
    pub(crate) fn lookup(&self, entry: EntryId, block: u32) -> Option<&[u8]> {
        self.slots.iter().flatten().find_map(|chunk| {
            (chunk.entry == entry && chunk.block == block).then_some(chunk.data.as_slice())
        })
    }

    /// Store a decompressed block in the next slot, wrapping around
    pub(crate) fn insert(&mut self, entry: EntryId, block: u32, data: Vec<u8>) {
        trace!(entry, block, slot = self.next, len = data.len(), "caching block");

        self.slots[self.next] = Some(CachedChunk { entry, block, data });
        self.next = (self.next + 1) & (CHUNK_CACHE_SLOTS - 1);
    }
}
