//! Namespace index behavior: lookup semantics, capacity, loose entries

use std::fs;
use std::path::{Path, PathBuf};

use sue_storage::{MAX_MOUNTED_ARCHIVES, PackOptions, Packer, StorageError, SueStorage};

fn pack_one(dir: &Path, container_name: &str, file_name: &str, data: &[u8]) -> PathBuf {
    let source = dir.join(format!("src-{container_name}"));
    fs::create_dir_all(&source).unwrap();
    fs::write(source.join(file_name), data).unwrap();

    let container = dir.join(container_name);
    let mut packer = Packer::create(&container, PackOptions::default()).unwrap();
    packer.add_path(&format!("{}/", source.display())).unwrap();
    packer.finish().unwrap();
    container
}

fn read_all(storage: &mut SueStorage, id: usize) -> Vec<u8> {
    storage.open(id).unwrap();
    let mut out = Vec::new();
    let mut buf = [0u8; 512];
    loop {
        let n = storage.read(id, &mut buf).unwrap();
        if n == 0 {
            break;
        }
        out.extend_from_slice(&buf[..n]);
    }
    storage.close(id).unwrap();
    out
}

#[test]
fn lookup_is_case_insensitive() {
    let dir = tempfile::tempdir().unwrap();
    let container = pack_one(dir.path(), "test.sue", "Hello.TXT", b"greetings");

    let mut storage = SueStorage::new();
    storage.mount(&container).unwrap();

    let id = storage.lookup("Hello.TXT").expect("exact case");
    assert_eq!(storage.lookup("hello.txt"), Some(id));
    assert_eq!(storage.lookup("HELLO.TXT"), Some(id));
    assert_eq!(read_all(&mut storage, id), b"greetings");
}

#[test]
fn absent_names_are_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let container = pack_one(dir.path(), "test.sue", "present.txt", b"here");

    let mut storage = SueStorage::new();
    storage.mount(&container).unwrap();

    assert!(storage.lookup("absent.txt").is_none());
}

#[test]
fn duplicate_names_across_mounts_coexist() {
    let dir = tempfile::tempdir().unwrap();
    let first = pack_one(dir.path(), "first.sue", "dup.txt", b"from first");
    let second = pack_one(dir.path(), "second.sue", "dup.txt", b"from second");

    let mut storage = SueStorage::new();
    storage.mount(&first).unwrap();
    storage.mount(&second).unwrap();

    // Both insertions landed in valid, distinct slots.
    let duplicates: Vec<usize> = storage
        .entries()
        .filter(|(_, name)| *name == "dup.txt")
        .map(|(id, _)| id)
        .collect();
    assert_eq!(duplicates.len(), 2);

    // Probe order exposes the earlier mount.
    let id = storage.lookup("dup.txt").unwrap();
    assert_eq!(read_all(&mut storage, id), b"from first");
}

#[test]
fn mount_table_caps_out() {
    let dir = tempfile::tempdir().unwrap();
    let container = pack_one(dir.path(), "test.sue", "file.txt", b"data");

    let mut storage = SueStorage::new();
    for _ in 0..MAX_MOUNTED_ARCHIVES {
        storage.mount(&container).unwrap();
    }

    assert!(matches!(
        storage.mount(&container),
        Err(StorageError::MountTableFull)
    ));
    assert_eq!(storage.mounted(), MAX_MOUNTED_ARCHIVES);
}

#[test]
fn embedded_items_enforce_single_reader() {
    let dir = tempfile::tempdir().unwrap();
    let container = pack_one(dir.path(), "test.sue", "file.txt", b"data");

    let mut storage = SueStorage::new();
    storage.mount(&container).unwrap();
    let id = storage.lookup("file.txt").unwrap();

    storage.open(id).unwrap();
    assert!(storage.is_open(id));
    assert!(matches!(
        storage.open(id),
        Err(StorageError::AlreadyOpen(_))
    ));

    storage.close(id).unwrap();
    assert!(!storage.is_open(id));
    storage.open(id).unwrap();
    storage.close(id).unwrap();
}

#[test]
fn reading_without_open_fails() {
    let dir = tempfile::tempdir().unwrap();
    let container = pack_one(dir.path(), "test.sue", "file.txt", b"data");

    let mut storage = SueStorage::new();
    storage.mount(&container).unwrap();
    let id = storage.lookup("file.txt").unwrap();

    let mut buf = [0u8; 16];
    assert!(matches!(
        storage.read(id, &mut buf),
        Err(StorageError::NotOpen(_))
    ));
}

/// Hand-build a container whose only item is a loose `File` entry, resolved
/// from the filesystem next to the container at read time.
fn build_loose_container(dir: &Path) -> PathBuf {
    use sue_format::{
        ArchiveHeader, ITEM_DESCRIPTOR_SIZE, ItemDescriptor, ItemKind, NameBlob,
        compression_level, write_metadata_block,
    };

    let container = dir.join("loose.sue");
    let mut file = fs::File::create(&container).unwrap();

    // No embedded payload, so the trailer starts right after the header.
    ArchiveHeader { trailer_offset: 0 }.write_to(&mut file).unwrap();

    let mut names = NameBlob::new();
    let descriptor = ItemDescriptor {
        name: names.push("loose.txt"),
        kind: ItemKind::File,
        offset: 0,
        size: 0,
        chunk: 0,
    };

    let level = compression_level(9);
    let items = ItemDescriptor::encode_all(&[descriptor]).unwrap();
    write_metadata_block(&mut file, &items, 1, ITEM_DESCRIPTOR_SIZE, level).unwrap();
    write_metadata_block(&mut file, names.as_bytes(), 1, names.len() as u32, level).unwrap();
    write_metadata_block(&mut file, &[], 0, 4, level).unwrap();

    container
}

#[test]
fn loose_file_entries_resolve_beside_the_container() {
    let dir = tempfile::tempdir().unwrap();
    let container = build_loose_container(dir.path());
    fs::write(dir.path().join("loose.txt"), b"on the filesystem").unwrap();

    let mut storage = SueStorage::new();
    storage.mount(&container).unwrap();

    let id = storage.lookup("loose.txt").expect("loose entry");
    storage.open(id).unwrap();
    assert_eq!(storage.size(id).unwrap(), 17);

    // Loose entries tolerate re-entry; each open gets a fresh handle.
    storage.open(id).unwrap();

    let mut buf = [0u8; 64];
    let n = storage.read(id, &mut buf).unwrap();
    assert_eq!(&buf[..n], b"on the filesystem");

    storage.close(id).unwrap();
    assert!(!storage.is_open(id));
}
