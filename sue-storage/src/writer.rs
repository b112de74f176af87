//! Archive writer: packs files and directories into one container
//!
//! An input path with a trailing separator is a directory to enumerate;
//! anything else is a single file archived under its base name. Directory recursion is
//! depth-first; archive names are built from a growing prefix unless the
//! structure is flattened.

use flate2::read::MultiGzDecoder;
use flate2::write::ZlibEncoder;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::{debug, info, warn};

use sue_format::{
    ARCHIVE_HEADER_SIZE, ArchiveHeader, ITEM_DESCRIPTOR_SIZE, ItemDescriptor, ItemKind, NameBlob,
    compression_level, encode_offset_table, write_metadata_block,
};

use crate::error::{Result, StorageError};
use crate::types::DEFAULT_BLOCK_SIZE;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Buffer size for verbatim copies
const COPY_BUFFER_SIZE: usize = 0x40000;

/// Knobs for one packing run
#[derive(Debug, Clone, Copy)]
pub struct PackOptions {
    /// Deflate level, 0 (store) through 9 (best); values above 9 clamp
    pub level: u32,
    /// Uncompressed bytes per block; 0 stores every file verbatim
    pub block_size: u32,
    pub include_subdirectories: bool,
    /// Archive subdirectory contents under the parent prefix instead of
    /// their own
    pub flatten: bool,
    /// Store already-gzip-compressed sources as-is instead of
    /// pre-decompressing them
    pub skip_gzip_extraction: bool,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            level: 9,
            block_size: DEFAULT_BLOCK_SIZE,
            include_subdirectories: true,
            flatten: false,
            skip_gzip_extraction: false,
        }
    }
}

/// Totals reported after a packing run
#[derive(Debug, Clone, Copy, Default)]
pub struct PackStats {
    pub files: u32,
    pub bytes_read: u64,
    pub bytes_written: u64,
}

/// One packing session producing one container.
///
/// Create, add paths, then [`Packer::finish`] — dropping a packer without
/// finishing leaves the placeholder trailer offset unpatched and the
/// container invalid.
pub struct Packer {
    file: BufWriter<File>,
    options: PackOptions,
    items: Vec<ItemDescriptor>,
    names: NameBlob,
    offsets: Vec<u32>,
    position: u64,
    stats: PackStats,
}

impl Packer {
    /// Create the output container and write the header placeholder
    pub fn create<P: AsRef<Path>>(path: P, options: PackOptions) -> Result<Self> {
        let path = path.as_ref();
        let mut file = BufWriter::new(File::create(path)?);

        info!(output = %path.display(), "creating container");

        // Trailer offset is patched in finish().
        ArchiveHeader { trailer_offset: 0 }.write_to(&mut file)?;

        Ok(Self {
            file,
            options,
            items: Vec::new(),
            names: NameBlob::new(),
            offsets: Vec::new(),
            position: ARCHIVE_HEADER_SIZE,
            stats: PackStats::default(),
        })
    }

    /// Archive one input path.
    ///
    /// A trailing `/` or `\` marks a directory to enumerate; anything else
    /// is a single file archived under its base name.
    pub fn add_path(&mut self, input: &str) -> Result<()> {
        info!(input, block_size = self.options.block_size, "adding");

        if input.ends_with('/') || input.ends_with('\\') {
            self.add_directory(Path::new(input), "")
        } else {
            let path = Path::new(input);
            let name = path
                .file_name()
                .map_or_else(|| input.to_string(), |n| n.to_string_lossy().into_owned());
            self.add_file(path, &name)
        }
    }

    /// Recursively enumerate a directory.
    ///
    /// An unreadable directory is fatal; an empty one is only a warning.
    fn add_directory(&mut self, dir: &Path, prefix: &str) -> Result<()> {
        let wrap = |source: io::Error| StorageError::Directory {
            path: dir.to_path_buf(),
            source,
        };

        let mut entries = std::fs::read_dir(dir)
            .map_err(wrap)?
            .collect::<io::Result<Vec<_>>>()
            .map_err(wrap)?;
        entries.sort_by_key(std::fs::DirEntry::file_name);

        if entries.is_empty() {
            warn!(directory = %dir.display(), "no files in directory");
            return Ok(());
        }

        for entry in entries {
            let name = entry.file_name().to_string_lossy().into_owned();
            let file_type = entry.file_type().map_err(wrap)?;

            if file_type.is_dir() {
                if self.options.include_subdirectories {
                    let child_prefix = if self.options.flatten {
                        prefix.to_string()
                    } else {
                        format!("{prefix}{name}/")
                    };
                    self.add_directory(&entry.path(), &child_prefix)?;
                }
            } else {
                self.add_file(&entry.path(), &format!("{prefix}{name}"))?;
            }
        }

        Ok(())
    }

    /// Archive a single file under `name`.
    ///
    /// An unopenable source is logged and skipped; the run continues.
    pub fn add_file(&mut self, path: &Path, name: &str) -> Result<()> {
        let mut source = match self.open_source(path) {
            Ok(source) => source,
            Err(error) => {
                warn!(source = %path.display(), %error, "could not open source, skipping");
                return Ok(());
            }
        };

        let packed = self.options.block_size == 0 || self.options.level == 0;

        let (kind, offset, read, written) = if packed {
            let (offset, read, written) = self.write_packed(&mut source)?;
            (ItemKind::Packed, offset, read, written)
        } else {
            let (first_block, read, written) = self.write_compressed(&mut source)?;
            (ItemKind::Compressed, first_block, read, written)
        };

        self.items.push(ItemDescriptor {
            name: self.names.push(name),
            kind,
            offset,
            size: read as u32,
            chunk: if packed { 0 } else { self.options.block_size },
        });

        self.stats.files += 1;
        self.stats.bytes_read += read;
        self.stats.bytes_written += written;

        info!("{} -> {} {} -> {}", path.display(), name, read, written);

        Ok(())
    }

    /// Open a source, transparently pre-decompressing gzip unless disabled
    fn open_source(&self, path: &Path) -> io::Result<Box<dyn Read>> {
        let mut file = File::open(path)?;

        if !self.options.skip_gzip_extraction {
            let mut magic = [0u8; 2];
            let n = read_full(&mut file, &mut magic)?;
            file.seek(SeekFrom::Start(0))?;

            if n == 2 && magic == GZIP_MAGIC {
                debug!(source = %path.display(), "pre-decompressing gzip source");
                return Ok(Box::new(MultiGzDecoder::new(BufReader::new(file))));
            }
        }

        Ok(Box::new(BufReader::new(file)))
    }

    /// Copy a source verbatim, returning its start offset and byte totals
    fn write_packed(&mut self, source: &mut dyn Read) -> Result<(u32, u64, u64)> {
        let offset = self.position as u32;
        let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
        let mut read = 0u64;

        loop {
            let n = source.read(&mut buffer)?;
            if n == 0 {
                break;
            }
            self.file.write_all(&buffer[..n])?;
            self.position += n as u64;
            read += n as u64;
        }

        Ok((offset, read, read))
    }

    /// Compress a source block by block.
    ///
    /// Each block's container offset is appended to the global chunk offset
    /// table before the block is written; one closing offset after the last
    /// block records its exclusive upper bound. The loop stops on a
    /// zero-length read, so an exact-multiple source emits no empty
    /// trailing block.
    fn write_compressed(&mut self, source: &mut dyn Read) -> Result<(u32, u64, u64)> {
        let first_block = self.offsets.len() as u32;
        let mut block = vec![0u8; self.options.block_size as usize];
        let mut read = 0u64;
        let mut written = 0u64;

        loop {
            let n = read_full(source, &mut block)?;
            if n == 0 {
                break;
            }

            let mut encoder = ZlibEncoder::new(Vec::new(), compression_level(self.options.level));
            encoder.write_all(&block[..n])?;
            let compressed = encoder.finish()?;

            self.offsets.push(self.position as u32);
            self.file.write_all(&compressed)?;
            self.position += compressed.len() as u64;

            read += n as u64;
            written += compressed.len() as u64;
        }

        self.offsets.push(self.position as u32);

        Ok((first_block, read, written))
    }

    /// Write the trailing metadata blocks, patch the trailer offset, and
    /// close the container
    pub fn finish(mut self) -> Result<PackStats> {
        let trailer_offset = (self.position - ARCHIVE_HEADER_SIZE) as u32;
        let level = compression_level(self.options.level);

        let items = ItemDescriptor::encode_all(&self.items)?;
        write_metadata_block(
            &mut self.file,
            &items,
            self.items.len() as u32,
            ITEM_DESCRIPTOR_SIZE,
            level,
        )?;
        write_metadata_block(
            &mut self.file,
            self.names.as_bytes(),
            1,
            self.names.len() as u32,
            level,
        )?;
        let offsets = encode_offset_table(&self.offsets);
        write_metadata_block(&mut self.file, &offsets, self.offsets.len() as u32, 4, level)?;

        self.file.seek(SeekFrom::Start(4))?;
        self.file.write_all(&trailer_offset.to_le_bytes())?;
        self.file.flush()?;

        info!(files = self.stats.files, "container complete");

        Ok(self.stats)
    }
}

/// Read until `buf` is full or the source is exhausted
fn read_full<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        let n = reader.read(&mut buf[total..])?;
        if n == 0 {
            break;
        }
        total += n;
    }
    Ok(total)
}
