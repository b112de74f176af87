//! State kept per mounted container

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A mounted container: its path, a lazily reopened handle, and the
/// decompressed chunk offset table shared by all of its compressed items.
///
/// The handle is closed after mount and between reads is fair game to stay
/// closed; every read path goes through [`MountedArchive::handle`] which
/// reopens it on demand.
#[derive(Debug)]
pub(crate) struct MountedArchive {
    path: PathBuf,
    file: Option<File>,
    offsets: Vec<u32>,
}

impl MountedArchive {
    pub(crate) fn new(path: PathBuf, offsets: Vec<u32>) -> Self {
        Self {
            path,
            file: None,
            offsets,
        }
    }

    /// The directory loose `File` entries resolve against
    pub(crate) fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    pub(crate) fn offsets(&self) -> &[u32] {
        &self.offsets
    }

    /// Borrow the container file, reopening it if it was closed
    pub(crate) fn handle(&mut self) -> io::Result<&mut File> {
        if self.file.is_none() {
            debug!(path = %self.path.display(), "reopening container");
            self.file = Some(File::open(&self.path)?);
        }

        // Populated just above.
        match self.file.as_mut() {
            Some(file) => Ok(file),
            None => Err(io::Error::other("container handle unavailable")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn handle_reopens_lazily() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.sue");
        File::create(&path).unwrap().write_all(b"stub").unwrap();

        let mut archive = MountedArchive::new(path, Vec::new());
        assert!(archive.file.is_none());

        archive.handle().unwrap();
        assert!(archive.file.is_some());
    }

    #[test]
    fn directory_is_container_parent() {
        let archive = MountedArchive::new(PathBuf::from("some/dir/data.sue"), Vec::new());
        assert_eq!(archive.directory(), Path::new("some/dir"));
    }
}
