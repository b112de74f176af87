//! The name blob: NUL-terminated item names referenced by byte offset

use crate::error::{Error, Result};

/// Concatenated NUL-terminated names, in archiving order.
///
/// Descriptors reference names by byte offset, never by index, so offset
/// reuse across descriptors is legal. The blob is stored as one owned
/// buffer; lookups are length-checked.
#[derive(Debug, Default, Clone)]
pub struct NameBlob {
    bytes: Vec<u8>,
}

impl NameBlob {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a decoded name-blob payload
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Append a name, returning its offset for use in a descriptor
    pub fn push(&mut self, name: &str) -> u32 {
        let offset = self.bytes.len() as u32;
        self.bytes.extend_from_slice(name.as_bytes());
        self.bytes.push(0);
        offset
    }

    /// Resolve the name stored at `offset`
    pub fn get(&self, offset: u32) -> Result<&str> {
        let start = offset as usize;
        if start >= self.bytes.len() {
            return Err(Error::NameOutOfRange {
                offset,
                length: self.bytes.len(),
            });
        }

        let end = self.bytes[start..]
            .iter()
            .position(|&b| b == 0)
            .ok_or(Error::UnterminatedName(offset))?;

        std::str::from_utf8(&self.bytes[start..start + end])
            .map_err(|_| Error::InvalidName(offset))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
