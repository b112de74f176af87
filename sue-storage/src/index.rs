//! The namespace index: a fixed-capacity open-addressing hash table
//!
//! Home slot is the CRC-32 of the case-folded name (terminator included)
//! masked to the table size; collisions probe linearly with wraparound.
//! Entries from later mounts never displace earlier ones, so a name mounted
//! twice is ambiguous but deterministic per mount order.

use std::fs::File;
use tracing::trace;

use crate::error::{Result, StorageError};
use crate::types::{ItemLocation, NAMESPACE_CAPACITY, NAMESPACE_MASK};

/// One resolved item in the merged namespace
#[derive(Debug)]
pub(crate) struct NamespaceEntry {
    pub name: String,
    /// Index of the owning archive in the mount table
    pub archive: usize,
    pub location: ItemLocation,
    /// Read cursor for `Packed`/`Compressed` items
    pub cursor: u64,
    /// Single-reader-at-a-time flag for `Packed`/`Compressed` items
    pub active: bool,
    /// Open filesystem handle for `Loose` items
    pub handle: Option<File>,
}

impl NamespaceEntry {
    pub(crate) fn new(name: String, archive: usize, location: ItemLocation) -> Self {
        Self {
            name,
            archive,
            location,
            cursor: 0,
            active: false,
            handle: None,
        }
    }
}

/// Fixed-capacity table keyed by item name
pub(crate) struct NameIndex {
    slots: Vec<Option<NamespaceEntry>>,
    used: usize,
}

/// CRC-32 over the case-folded name bytes, NUL terminator included.
///
/// Folding before hashing is what makes lookups case-insensitive for
/// arbitrary-case queries, not just along one probe chain.
fn home_slot(name: &str) -> usize {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(name.to_ascii_lowercase().as_bytes());
    hasher.update(&[0]);
    (hasher.finalize() & NAMESPACE_MASK) as usize
}

impl NameIndex {
    pub(crate) fn new() -> Self {
        let mut slots = Vec::with_capacity(NAMESPACE_CAPACITY);
        slots.resize_with(NAMESPACE_CAPACITY, || None);
        Self { slots, used: 0 }
    }

    pub(crate) fn available(&self) -> usize {
        NAMESPACE_CAPACITY - self.used
    }

    /// Insert an entry at the first free slot along its probe chain.
    ///
    /// A full table is an explicit error, never a silent drop.
    pub(crate) fn insert(&mut self, entry: NamespaceEntry) -> Result<usize> {
        if self.used == NAMESPACE_CAPACITY {
            return Err(StorageError::NamespaceFull {
                needed: 1,
                available: 0,
            });
        }

        let mut slot = home_slot(&entry.name);

        for _ in 0..NAMESPACE_CAPACITY {
            if self.slots[slot].is_none() {
                trace!(name = %entry.name, slot, "namespace insert");
                self.slots[slot] = Some(entry);
                self.used += 1;
                return Ok(slot);
            }
            slot = (slot + 1) & NAMESPACE_MASK as usize;
        }

        Err(StorageError::NamespaceFull {
            needed: 1,
            available: 0,
        })
    }

    /// Probe for `name`, case-insensitively.
    ///
    /// Stops at the first empty slot or after one full wrap of the table.
    pub(crate) fn find(&self, name: &str) -> Option<usize> {
        let mut slot = home_slot(name);

        for _ in 0..NAMESPACE_CAPACITY {
            match &self.slots[slot] {
                None => return None,
                Some(entry) if entry.name.eq_ignore_ascii_case(name) => return Some(slot),
                Some(_) => slot = (slot + 1) & NAMESPACE_MASK as usize,
            }
        }

        None
    }

    pub(crate) fn get(&self, index: usize) -> Option<&NamespaceEntry> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut NamespaceEntry> {
        self.slots.get_mut(index).and_then(Option::as_mut)
    }

    /// Occupied slots in slot order
    pub(crate) fn iter(&self) -> impl Iterator<Item = (usize, &NamespaceEntry)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, entry)| entry.as_ref().map(|e| (slot, e)))
    }
}
