//! Random-access reads into compressed items and chunk cache behavior

use std::fs;
use std::path::Path;

use sue_storage::{CHUNK_CACHE_SLOTS, PackOptions, Packer, SueStorage};

const BLOCK_SIZE: u32 = 512;

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i * 37 + 11) % 253) as u8).collect()
}

fn build_container(dir: &Path, files: &[(&str, &[u8])]) -> std::path::PathBuf {
    let source = dir.join("input");
    fs::create_dir_all(&source).unwrap();
    for (name, data) in files {
        fs::write(source.join(name), data).unwrap();
    }

    let container = dir.join("test.sue");
    let mut packer = Packer::create(
        &container,
        PackOptions {
            block_size: BLOCK_SIZE,
            ..PackOptions::default()
        },
    )
    .unwrap();
    packer.add_path(&format!("{}/", source.display())).unwrap();
    packer.finish().unwrap();
    container
}

/// Read exactly `skip + len` bytes from the cursor, returning the last `len`
fn read_slice(storage: &mut SueStorage, name: &str, skip: u64, len: usize) -> Vec<u8> {
    let id = storage.lookup(name).expect("entry should resolve");
    storage.open(id).unwrap();

    let mut remaining = skip;
    let mut scratch = [0u8; 333];
    while remaining > 0 {
        let want = (remaining as usize).min(scratch.len());
        let n = storage.read(id, &mut scratch[..want]).unwrap();
        assert!(n > 0, "skip ran past end of item");
        remaining -= n as u64;
    }

    let mut out = vec![0u8; len];
    let mut filled = 0;
    while filled < len {
        let n = storage.read(id, &mut out[filled..]).unwrap();
        if n == 0 {
            break;
        }
        filled += n;
    }
    out.truncate(filled);

    storage.close(id).unwrap();
    out
}

#[test]
fn arbitrary_ranges_match_sequential_content() {
    let dir = tempfile::tempdir().unwrap();
    let data = pattern(40_997);
    let container = build_container(dir.path(), &[("big.bin", &data)]);

    let mut storage = SueStorage::new();
    storage.mount(&container).unwrap();

    let cases = [
        (0u64, 1usize),
        (511, 2),
        (512, 512),
        (5_000, 37),
        (40_000, 900),
        (40_996, 1),
    ];

    for (k, n) in cases {
        let slice = read_slice(&mut storage, "big.bin", k, n);
        assert_eq!(
            slice,
            &data[k as usize..k as usize + n],
            "range [{k}, {})",
            k + n as u64
        );
    }
}

#[test]
fn results_are_independent_of_cache_state() {
    let dir = tempfile::tempdir().unwrap();
    let data = pattern(20_000);
    let container = build_container(dir.path(), &[("big.bin", &data)]);

    let mut storage = SueStorage::new();
    storage.mount(&container).unwrap();

    // Thrash the cache between probes of the same range.
    for _ in 0..3 {
        let head = read_slice(&mut storage, "big.bin", 100, 200);
        assert_eq!(head, &data[100..300]);

        let tail = read_slice(&mut storage, "big.bin", 19_000, 700);
        assert_eq!(tail, &data[19_000..19_700]);

        let whole = read_slice(&mut storage, "big.bin", 0, data.len());
        assert_eq!(whole, data);
    }
}

#[test]
fn evicted_blocks_are_re_decompressed_correctly() {
    let dir = tempfile::tempdir().unwrap();
    // Three times as many blocks as cache slots.
    let block_count = CHUNK_CACHE_SLOTS * 3;
    let data = pattern(block_count * BLOCK_SIZE as usize);
    let container = build_container(dir.path(), &[("big.bin", &data)]);

    let mut storage = SueStorage::new();
    storage.mount(&container).unwrap();

    // Touch every block once, evicting the early ones.
    let whole = read_slice(&mut storage, "big.bin", 0, data.len());
    assert_eq!(whole, data);

    // The first blocks were evicted; they must come back from disk intact.
    let head = read_slice(&mut storage, "big.bin", 0, BLOCK_SIZE as usize * 2);
    assert_eq!(head, &data[..BLOCK_SIZE as usize * 2]);
}

#[test]
fn interleaved_items_do_not_cross_contaminate_the_cache() {
    let dir = tempfile::tempdir().unwrap();
    let first = pattern(6_000);
    let second: Vec<u8> = pattern(6_000).iter().map(|b| b.wrapping_add(128)).collect();
    let container =
        build_container(dir.path(), &[("one.bin", &first), ("two.bin", &second)]);

    let mut storage = SueStorage::new();
    storage.mount(&container).unwrap();

    for _ in 0..2 {
        assert_eq!(read_slice(&mut storage, "one.bin", 0, 1500), &first[..1500]);
        assert_eq!(read_slice(&mut storage, "two.bin", 0, 1500), &second[..1500]);
        assert_eq!(
            read_slice(&mut storage, "one.bin", 4_000, 2_000),
            &first[4_000..]
        );
        assert_eq!(
            read_slice(&mut storage, "two.bin", 4_000, 2_000),
            &second[4_000..]
        );
    }
}

#[test]
fn read_past_end_returns_zero() {
    let dir = tempfile::tempdir().unwrap();
    let data = pattern(1_000);
    let container = build_container(dir.path(), &[("small.bin", &data)]);

    let mut storage = SueStorage::new();
    storage.mount(&container).unwrap();

    let id = storage.lookup("small.bin").unwrap();
    storage.open(id).unwrap();

    let mut buf = vec![0u8; 4_096];
    assert_eq!(storage.read(id, &mut buf).unwrap(), 1_000);
    assert_eq!(storage.read(id, &mut buf).unwrap(), 0);
    assert_eq!(&buf[..1_000], &data[..]);

    storage.close(id).unwrap();
}
