//! `sue unpack`: extract every item of a container into a directory tree

use anyhow::Context;
use clap::Args;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use sue_storage::SueStorage;

const EXTRACT_BUFFER_SIZE: usize = 4096;

#[derive(Args)]
pub struct UnpackArgs {
    /// Container file to extract
    archive: PathBuf,

    /// Output directory; defaults to the container's base name prefixed
    /// with underscores
    outdir: Option<PathBuf>,
}

/// `__` + the container's base file name
fn default_outdir(archive: &Path) -> PathBuf {
    let base = archive
        .file_name()
        .map_or_else(|| "archive".to_string(), |n| n.to_string_lossy().into_owned());
    PathBuf::from(format!("__{base}"))
}

pub fn handle(args: UnpackArgs) -> anyhow::Result<()> {
    let mut storage = SueStorage::new();
    storage
        .mount(&args.archive)
        .with_context(|| format!("could not open resource file {}", args.archive.display()))?;

    let outdir = args
        .outdir
        .unwrap_or_else(|| default_outdir(&args.archive));
    std::fs::create_dir_all(&outdir)
        .with_context(|| format!("could not create {}", outdir.display()))?;

    let entries: Vec<(usize, String)> = storage
        .entries()
        .map(|(id, name)| (id, name.to_string()))
        .collect();

    for (id, name) in entries {
        extract_entry(&mut storage, id, &name, &outdir)
            .with_context(|| format!("cannot write {name}"))?;
    }

    Ok(())
}

fn extract_entry(
    storage: &mut SueStorage,
    id: usize,
    name: &str,
    outdir: &Path,
) -> anyhow::Result<()> {
    storage.open(id)?;
    let size = storage.size(id)?;

    info!("{name} {size}");

    let target = outdir.join(name.replace('\\', "/"));
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut output = File::create(&target)?;
    let mut buffer = [0u8; EXTRACT_BUFFER_SIZE];
    let mut remaining = size;

    while remaining > 0 {
        let n = storage.read(id, &mut buffer)?;
        if n == 0 {
            break;
        }
        output.write_all(&buffer[..n])?;
        remaining -= n as u64;
    }

    storage.close(id)?;

    Ok(())
}
