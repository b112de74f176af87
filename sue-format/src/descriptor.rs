//! Item descriptors: the fixed-size records of the trailing item table

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

use crate::error::{Error, Result};

/// On-disk size of one item descriptor in bytes
pub const ITEM_DESCRIPTOR_SIZE: u32 = 20;

/// How an item's bytes are stored.
///
/// The writer only ever emits `Packed` and `Compressed`; `File` marks a
/// loose file resolved from the filesystem at read time, synthesized by the
/// runtime rather than recorded by the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ItemKind {
    /// Loose file next to the container, not embedded
    File = 1,
    /// Stored verbatim inside the container
    Packed = 2,
    /// Stored as independently deflate-compressed blocks
    Compressed = 8,
}

impl ItemKind {
    pub fn from_u32(value: u32) -> Result<Self> {
        match value {
            1 => Ok(Self::File),
            2 => Ok(Self::Packed),
            8 => Ok(Self::Compressed),
            other => Err(Error::UnknownItemKind(other)),
        }
    }
}

/// One archived entry, as recorded in the trailing item table.
///
/// `offset` depends on `kind`: for `Packed` it is the byte offset of the raw
/// data within the container, for `Compressed` the index of the item's first
/// block in the container-wide chunk offset table. That overloading is an
/// on-disk compatibility concern only; the runtime maps descriptors onto a
/// tagged location type before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemDescriptor {
    /// Byte offset of the item's name within the name blob
    pub name: u32,
    pub kind: ItemKind,
    pub offset: u32,
    /// Uncompressed size in bytes
    pub size: u32,
    /// Block size for `Compressed` items, 0 otherwise
    pub chunk: u32,
}

impl ItemDescriptor {
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let name = reader.read_u32::<LittleEndian>()?;
        let kind = ItemKind::from_u32(reader.read_u32::<LittleEndian>()?)?;
        let offset = reader.read_u32::<LittleEndian>()?;
        let size = reader.read_u32::<LittleEndian>()?;
        let chunk = reader.read_u32::<LittleEndian>()?;

        Ok(Self {
            name,
            kind,
            offset,
            size,
            chunk,
        })
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LittleEndian>(self.name)?;
        writer.write_u32::<LittleEndian>(self.kind as u32)?;
        writer.write_u32::<LittleEndian>(self.offset)?;
        writer.write_u32::<LittleEndian>(self.size)?;
        writer.write_u32::<LittleEndian>(self.chunk)?;
        Ok(())
    }

    /// Decode every descriptor in a metadata-block payload
    pub fn decode_all(payload: &[u8]) -> Result<Vec<Self>> {
        if payload.len() % ITEM_DESCRIPTOR_SIZE as usize != 0 {
            return Err(Error::MisalignedMetadata {
                length: payload.len(),
                element_size: ITEM_DESCRIPTOR_SIZE as usize,
            });
        }

        payload
            .chunks_exact(ITEM_DESCRIPTOR_SIZE as usize)
            .map(|mut record| Self::read_from(&mut record))
            .collect()
    }

    /// Encode a descriptor table into a metadata-block payload
    pub fn encode_all(descriptors: &[Self]) -> Result<Vec<u8>> {
        let mut payload = Vec::with_capacity(descriptors.len() * ITEM_DESCRIPTOR_SIZE as usize);
        for descriptor in descriptors {
            descriptor.write_to(&mut payload)?;
        }
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_round_trip() {
        let descriptor = ItemDescriptor {
            name: 17,
            kind: ItemKind::Compressed,
            offset: 3,
            size: 5000,
            chunk: 2048,
        };

        let mut buf = Vec::new();
        descriptor.write_to(&mut buf).unwrap();
        assert_eq!(buf.len() as u32, ITEM_DESCRIPTOR_SIZE);

        let parsed = ItemDescriptor::read_from(&mut buf.as_slice()).unwrap();
        assert_eq!(parsed, descriptor);
    }

    #[test]
    fn decode_all_round_trips_a_table() {
        let table = vec![
            ItemDescriptor {
                name: 0,
                kind: ItemKind::Packed,
                offset: 8,
                size: 3,
                chunk: 0,
            },
            ItemDescriptor {
                name: 6,
                kind: ItemKind::Compressed,
                offset: 0,
                size: 5000,
                chunk: 2048,
            },
        ];

        let payload = ItemDescriptor::encode_all(&table).unwrap();
        assert_eq!(ItemDescriptor::decode_all(&payload).unwrap(), table);
    }

    #[test]
    fn rejects_unknown_kind() {
        assert!(matches!(
            ItemKind::from_u32(3),
            Err(Error::UnknownItemKind(3))
        ));
    }

    #[test]
    fn rejects_misaligned_payload() {
        let err = ItemDescriptor::decode_all(&[0u8; 21]).unwrap_err();
        assert!(matches!(err, Error::MisalignedMetadata { .. }));
    }
}
