//! `sue pack`: build a container from files and directories

use anyhow::Context;
use clap::Args;
use std::path::PathBuf;
use tracing::info;

use sue_storage::{DEFAULT_BLOCK_SIZE, PackOptions, Packer};

#[derive(Args)]
pub struct PackArgs {
    /// Compression level: 0 none, 1 fast, 9 best
    #[arg(short = 'm', long = "level", default_value_t = 9)]
    level: u32,

    /// Disable pre-decompressing of gzip-compressed sources
    #[arg(short = 'n', long = "no-gunzip")]
    no_gunzip: bool,

    /// Compression block size in bytes; 0 stores files verbatim
    #[arg(short = 'b', long = "block-size", default_value_t = DEFAULT_BLOCK_SIZE)]
    block_size: u32,

    /// Do not descend into subdirectories
    #[arg(short = 's', long = "no-subdirectories")]
    no_subdirectories: bool,

    /// Flatten directory structure into the archive root
    #[arg(short = 'f', long)]
    flatten: bool,

    /// Output container file
    archive: PathBuf,

    /// Files to archive; directory names must end with a separator
    #[arg(required = true)]
    inputs: Vec<String>,
}

pub fn handle(args: PackArgs) -> anyhow::Result<()> {
    let options = PackOptions {
        level: args.level.min(9),
        block_size: args.block_size,
        include_subdirectories: !args.no_subdirectories,
        flatten: args.flatten,
        skip_gzip_extraction: args.no_gunzip,
    };

    let mut packer = Packer::create(&args.archive, options)
        .with_context(|| format!("could not create output file {}", args.archive.display()))?;

    for input in &args.inputs {
        packer
            .add_path(input)
            .with_context(|| format!("could not archive {input}"))?;
    }

    let stats = packer.finish().context("could not finish container")?;

    info!(
        "Total files: {} ({} -> {} bytes)",
        stats.files, stats.bytes_read, stats.bytes_written
    );

    Ok(())
}
