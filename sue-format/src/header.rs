//! Container header parsing and serialization

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

use crate::error::{Error, Result};
use crate::SUE_MAGIC;

/// Size of the container header in bytes
pub const ARCHIVE_HEADER_SIZE: u64 = 8;

/// Fixed header at the start of every container.
///
/// `trailer_offset` is the byte count from the end of the header to the
/// first trailing metadata block; the writer patches it in after the last
/// payload byte is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveHeader {
    pub trailer_offset: u32,
}

impl ArchiveHeader {
    /// Read and validate a header
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let magic = reader.read_u32::<LittleEndian>()?;

        if magic != SUE_MAGIC {
            return Err(Error::BadMagic {
                expected: SUE_MAGIC,
                actual: magic,
            });
        }

        let trailer_offset = reader.read_u32::<LittleEndian>()?;

        Ok(Self { trailer_offset })
    }

    /// Write the header
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LittleEndian>(SUE_MAGIC)?;
        writer.write_u32::<LittleEndian>(self.trailer_offset)?;
        Ok(())
    }
}
