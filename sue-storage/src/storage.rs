//! Mounting, name resolution, and random-access reads
//!
//! [`SueStorage`] is the reader-side context object: it owns the mount
//! table, the merged namespace index, and the decompressed-block cache.
//! Containers are mounted into one namespace; entries are resolved by name
//! and then read through a per-entry cursor.

use flate2::read::ZlibDecoder;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::{debug, info, warn};

use sue_format::{
    ARCHIVE_HEADER_SIZE, ArchiveHeader, ItemDescriptor, ItemKind, NameBlob, decode_offset_table,
    read_metadata_block,
};

use crate::archive::MountedArchive;
use crate::cache::ChunkCache;
use crate::error::{Result, StorageError};
use crate::index::{NameIndex, NamespaceEntry};
use crate::types::{EntryId, ItemLocation, MAX_MOUNTED_ARCHIVES};

/// One or more mounted containers merged into a hash-indexed namespace
pub struct SueStorage {
    archives: Vec<MountedArchive>,
    index: NameIndex,
    cache: ChunkCache,
}

impl SueStorage {
    pub fn new() -> Self {
        Self {
            archives: Vec::new(),
            index: NameIndex::new(),
            cache: ChunkCache::new(),
        }
    }

    /// Number of mounted containers
    pub fn mounted(&self) -> usize {
        self.archives.len()
    }

    /// Occupied namespace entries in slot order
    pub fn entries(&self) -> impl Iterator<Item = (EntryId, &str)> {
        self.index.iter().map(|(slot, entry)| (slot, entry.name.as_str()))
    }

    /// Mount a container, merging its items into the namespace.
    ///
    /// Either the whole container is merged or nothing is: capacity and
    /// every descriptor are checked before the first insertion.
    pub fn mount<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();

        if self.archives.len() >= MAX_MOUNTED_ARCHIVES {
            return Err(StorageError::MountTableFull);
        }

        let mut reader = BufReader::new(File::open(path)?);
        let header = ArchiveHeader::read_from(&mut reader)?;

        reader.seek(SeekFrom::Start(
            ARCHIVE_HEADER_SIZE + u64::from(header.trailer_offset),
        ))?;

        let (item_payload, item_count) = read_metadata_block(&mut reader)?;
        let (name_payload, _) = read_metadata_block(&mut reader)?;
        let (offset_payload, _) = read_metadata_block(&mut reader)?;
        drop(reader);

        let descriptors = ItemDescriptor::decode_all(&item_payload)?;
        let names = NameBlob::from_bytes(name_payload);
        let offsets = decode_offset_table(&offset_payload)?;

        debug!(
            container = %path.display(),
            items = item_count,
            offsets = offsets.len(),
            "read container trailer"
        );

        if descriptors.len() > self.index.available() {
            return Err(StorageError::NamespaceFull {
                needed: descriptors.len(),
                available: self.index.available(),
            });
        }

        // Resolve every name and location before touching the namespace so
        // a bad descriptor publishes nothing.
        let mut resolved = Vec::with_capacity(descriptors.len());
        for descriptor in &descriptors {
            let name = names.get(descriptor.name)?.to_string();
            let location = match descriptor.kind {
                ItemKind::File => ItemLocation::Loose,
                ItemKind::Packed => ItemLocation::Packed {
                    offset: descriptor.offset,
                    size: descriptor.size,
                },
                ItemKind::Compressed => {
                    if descriptor.chunk == 0 && descriptor.size > 0 {
                        return Err(StorageError::InvalidDescriptor {
                            name,
                            reason: "compressed item with zero block size",
                        });
                    }
                    ItemLocation::Compressed {
                        first_block: descriptor.offset,
                        size: descriptor.size,
                        chunk: descriptor.chunk,
                    }
                }
            };
            resolved.push((name, location));
        }

        let archive = self.archives.len();
        self.archives
            .push(MountedArchive::new(path.to_path_buf(), offsets));

        for (name, location) in resolved {
            self.index
                .insert(NamespaceEntry::new(name, archive, location))?;
        }

        info!(container = %path.display(), items = descriptors.len(), "mounted");

        Ok(())
    }

    /// Resolve a name to its namespace entry, case-insensitively
    pub fn lookup(&self, name: &str) -> Option<EntryId> {
        self.index.find(name)
    }

    /// Open an entry for reading.
    ///
    /// `Packed`/`Compressed` entries enforce single-reader-at-a-time and
    /// reset their cursor; `Loose` entries open a fresh filesystem handle
    /// each time and tolerate re-entry.
    pub fn open(&mut self, id: EntryId) -> Result<()> {
        let entry = self
            .index
            .get_mut(id)
            .ok_or(StorageError::UnknownEntry(id))?;

        match entry.location {
            ItemLocation::Loose => {
                let archive = self
                    .archives
                    .get(entry.archive)
                    .ok_or(StorageError::UnknownEntry(id))?;
                let path = archive.directory().join(&entry.name);
                debug!(name = %entry.name, path = %path.display(), "opening loose file");
                entry.handle = Some(File::open(path)?);
            }
            ItemLocation::Packed { .. } | ItemLocation::Compressed { .. } => {
                if entry.active {
                    return Err(StorageError::AlreadyOpen(entry.name.clone()));
                }
                entry.cursor = 0;
                entry.active = true;
            }
        }

        Ok(())
    }

    /// Whether an entry is currently open
    pub fn is_open(&self, id: EntryId) -> bool {
        self.index.get(id).is_some_and(|entry| match entry.location {
            ItemLocation::Loose => entry.handle.is_some(),
            _ => entry.active,
        })
    }

    /// Uncompressed size of an entry
    pub fn size(&self, id: EntryId) -> Result<u64> {
        let entry = self.index.get(id).ok_or(StorageError::UnknownEntry(id))?;

        match entry.location {
            ItemLocation::Loose => {
                let archive = self
                    .archives
                    .get(entry.archive)
                    .ok_or(StorageError::UnknownEntry(id))?;
                Ok(std::fs::metadata(archive.directory().join(&entry.name))?.len())
            }
            ItemLocation::Packed { size, .. } | ItemLocation::Compressed { size, .. } => {
                Ok(u64::from(size))
            }
        }
    }

    /// Read from an entry at its cursor, advancing by the bytes produced.
    ///
    /// Never reads past the end of the item; a short result means no more
    /// data is available from this source.
    pub fn read(&mut self, id: EntryId, buf: &mut [u8]) -> Result<usize> {
        let entry = self
            .index
            .get_mut(id)
            .ok_or(StorageError::UnknownEntry(id))?;

        match entry.location {
            ItemLocation::Loose => {
                let handle = entry
                    .handle
                    .as_mut()
                    .ok_or_else(|| StorageError::NotOpen(entry.name.clone()))?;
                Ok(handle.read(buf)?)
            }
            ItemLocation::Packed { offset, size } => {
                if !entry.active {
                    return Err(StorageError::NotOpen(entry.name.clone()));
                }

                let cursor = entry.cursor;
                let remaining = u64::from(size).saturating_sub(cursor);
                let n = buf.len().min(remaining as usize);
                if n == 0 {
                    return Ok(0);
                }

                let archive = self
                    .archives
                    .get_mut(entry.archive)
                    .ok_or(StorageError::UnknownEntry(id))?;
                let file = archive.handle()?;
                file.seek(SeekFrom::Start(u64::from(offset) + cursor))?;

                // A container shorter than the descriptor claims surfaces
                // as a short read, not an error.
                let mut filled = 0;
                while filled < n {
                    let m = file.read(&mut buf[filled..n])?;
                    if m == 0 {
                        break;
                    }
                    filled += m;
                }

                entry.cursor += filled as u64;
                Ok(filled)
            }
            ItemLocation::Compressed {
                first_block,
                size,
                chunk,
            } => {
                if !entry.active {
                    return Err(StorageError::NotOpen(entry.name.clone()));
                }

                let cursor = entry.cursor;
                let archive_index = entry.archive;

                let copied =
                    self.read_compressed(id, archive_index, first_block, size, chunk, cursor, buf)?;

                let entry = self
                    .index
                    .get_mut(id)
                    .ok_or(StorageError::UnknownEntry(id))?;
                entry.cursor += copied as u64;
                Ok(copied)
            }
        }
    }

    /// Close an entry; cached blocks survive for later opens
    pub fn close(&mut self, id: EntryId) -> Result<()> {
        let entry = self
            .index
            .get_mut(id)
            .ok_or(StorageError::UnknownEntry(id))?;

        match entry.location {
            ItemLocation::Loose => entry.handle = None,
            ItemLocation::Packed { .. } | ItemLocation::Compressed { .. } => entry.active = false,
        }

        Ok(())
    }

    /// Block-wise read of a compressed item starting at `cursor`.
    ///
    /// Materializes each touched block through the cache; a block that
    /// fails to materialize stops the loop, returning what was copied.
    fn read_compressed(
        &mut self,
        id: EntryId,
        archive_index: usize,
        first_block: u32,
        size: u32,
        chunk: u32,
        cursor: u64,
        buf: &mut [u8],
    ) -> Result<usize> {
        let item_remaining = u64::from(size).saturating_sub(cursor);
        let target = (buf.len() as u64).min(item_remaining) as usize;
        if target == 0 {
            return Ok(0);
        }

        let mut block = (cursor / u64::from(chunk)) as u32;
        let mut start = (cursor % u64::from(chunk)) as usize;
        let mut copied = 0usize;

        while copied < target {
            if self.cache.lookup(id, block).is_none() {
                let archive = self
                    .archives
                    .get_mut(archive_index)
                    .ok_or(StorageError::UnknownEntry(id))?;

                match load_block(archive, first_block, size, chunk, block) {
                    Ok(data) => self.cache.insert(id, block, data),
                    Err(error) => {
                        warn!(block, %error, "could not materialize block");
                        break;
                    }
                }
            }

            let Some(data) = self.cache.lookup(id, block) else {
                break;
            };

            let available = data.len().saturating_sub(start);
            let n = available.min(target - copied);
            if n == 0 {
                break;
            }

            buf[copied..copied + n].copy_from_slice(&data[start..start + n]);
            copied += n;

            // Subsequent blocks are consumed from their beginning.
            start = 0;
            block += 1;
        }

        Ok(copied)
    }
}

impl Default for SueStorage {
    fn default() -> Self {
        Self::new()
    }
}

/// Read and inflate one block of a compressed item.
///
/// The compressed extent is bounded by consecutive chunk offset table
/// entries; the inflate target is the item's block size, clamped at its
/// total remaining size for the final block.
fn load_block(
    archive: &mut MountedArchive,
    first_block: u32,
    size: u32,
    chunk: u32,
    block: u32,
) -> Result<Vec<u8>> {
    let offsets = archive.offsets();
    let Some(index) = first_block.checked_add(block).map(|i| i as usize) else {
        return Err(StorageError::BlockOutOfRange {
            block,
            count: offsets.len(),
        });
    };

    if index + 1 >= offsets.len() || offsets[index + 1] < offsets[index] {
        return Err(StorageError::BlockOutOfRange {
            block,
            count: offsets.len(),
        });
    }

    let lo = u64::from(offsets[index]);
    let compressed_len = (offsets[index + 1] - offsets[index]) as usize;

    let expected = u64::from(chunk)
        .min(u64::from(size).saturating_sub(u64::from(block) * u64::from(chunk)))
        as usize;

    let mut compressed = vec![0u8; compressed_len];
    let file = archive.handle()?;
    file.seek(SeekFrom::Start(lo))?;
    file.read_exact(&mut compressed)?;

    let mut data = Vec::with_capacity(expected);
    ZlibDecoder::new(compressed.as_slice()).read_to_end(&mut data)?;

    if data.len() != expected {
        return Err(StorageError::ShortBlock {
            expected,
            actual: data.len(),
        });
    }

    Ok(data)
}
