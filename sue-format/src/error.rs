//! Error types for container encoding and decoding

use thiserror::Error;

/// Result type for codec operations
pub type Result<T> = std::result::Result<T, Error>;

/// Container codec error types
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid container magic
    #[error("Invalid container magic: expected {expected:#010x}, got {actual:#010x}")]
    BadMagic { expected: u32, actual: u32 },

    /// Unknown item kind in a descriptor
    #[error("Unknown item kind: {0}")]
    UnknownItemKind(u32),

    /// Metadata payload is not a whole number of records
    #[error("Metadata payload of {length} bytes is not a multiple of {element_size}")]
    MisalignedMetadata { length: usize, element_size: usize },

    /// Inflate produced the wrong number of bytes for a metadata block
    #[error("Metadata block inflated to {actual} bytes, expected {expected}")]
    MetadataShortfall { expected: usize, actual: usize },

    /// Name offset outside the name blob
    #[error("Name offset {offset} out of range for a {length}-byte name blob")]
    NameOutOfRange { offset: u32, length: usize },

    /// Name is not terminated within the blob
    #[error("Unterminated name at offset {0}")]
    UnterminatedName(u32),

    /// Name bytes are not valid UTF-8
    #[error("Name at offset {0} is not valid UTF-8")]
    InvalidName(u32),
}
