//! Trailing metadata blocks
//!
//! Each of the three trailing tables (item descriptors, name blob, chunk
//! offsets) is stored as a 12-byte record header — compressed length,
//! element count, element size — followed by the deflate-compressed payload.
//! The uncompressed size is `count * element_size`, so every block is
//! independently recoverable without knowing its length in advance.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use std::io::{Read, Write};
use tracing::trace;

use crate::error::{Error, Result};

/// Size of the metadata record header in bytes
pub const METADATA_HEADER_SIZE: u64 = 12;

/// Clamp a 0-9 level onto a flate2 setting
pub fn compression_level(level: u32) -> Compression {
    Compression::new(level.min(9))
}

/// Compress `payload` and write it as a metadata block.
///
/// Returns the total number of bytes written, header included.
pub fn write_metadata_block<W: Write>(
    writer: &mut W,
    payload: &[u8],
    count: u32,
    element_size: u32,
    level: Compression,
) -> Result<u64> {
    debug_assert_eq!(payload.len(), count as usize * element_size as usize);

    let mut encoder = ZlibEncoder::new(Vec::new(), level);
    encoder.write_all(payload)?;
    let compressed = encoder.finish()?;

    trace!(
        count,
        element_size,
        compressed = compressed.len(),
        "writing metadata block"
    );

    writer.write_u32::<LittleEndian>(compressed.len() as u32)?;
    writer.write_u32::<LittleEndian>(count)?;
    writer.write_u32::<LittleEndian>(element_size)?;
    writer.write_all(&compressed)?;

    Ok(METADATA_HEADER_SIZE + compressed.len() as u64)
}

/// Read one metadata block, returning the inflated payload and element count.
///
/// Fails unless inflate produces exactly `count * element_size` bytes.
pub fn read_metadata_block<R: Read>(reader: &mut R) -> Result<(Vec<u8>, u32)> {
    let compressed_len = reader.read_u32::<LittleEndian>()? as usize;
    let count = reader.read_u32::<LittleEndian>()?;
    let element_size = reader.read_u32::<LittleEndian>()?;

    let expected = count as usize * element_size as usize;

    trace!(
        count,
        element_size,
        compressed = compressed_len,
        "reading metadata block"
    );

    let mut compressed = vec![0u8; compressed_len];
    reader.read_exact(&mut compressed)?;

    let mut payload = Vec::with_capacity(expected);
    ZlibDecoder::new(compressed.as_slice()).read_to_end(&mut payload)?;

    if payload.len() != expected {
        return Err(Error::MetadataShortfall {
            expected,
            actual: payload.len(),
        });
    }

    Ok((payload, count))
}

/// Encode a chunk offset table into a metadata-block payload
pub fn encode_offset_table(offsets: &[u32]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(offsets.len() * 4);
    for &offset in offsets {
        payload.extend_from_slice(&offset.to_le_bytes());
    }
    payload
}

/// Decode a chunk offset table from a metadata-block payload
pub fn decode_offset_table(payload: &[u8]) -> Result<Vec<u32>> {
    if payload.len() % 4 != 0 {
        return Err(Error::MisalignedMetadata {
            length: payload.len(),
            element_size: 4,
        });
    }

    Ok(payload
        .chunks_exact(4)
        .map(|bytes| u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
        .collect())
}
