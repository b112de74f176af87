use clap::{Parser, Subcommand};
use tracing::Level;

mod commands;

use commands::{pack, unpack};

#[derive(Parser)]
#[command(
    name = "sue",
    about = "Pack files into SUE archive containers and extract them again",
    version
)]
struct Cli {
    /// Set the logging level
    #[arg(long, value_enum, global = true, default_value = "info")]
    log_level: LogLevel,

    /// Quiet (no per-file output)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Pack files and directories into a container
    Pack(pack::PackArgs),

    /// Extract every item of a container
    Unpack(unpack::UnpackArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        Level::WARN
    } else {
        Level::from(cli.log_level)
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Pack(args) => pack::handle(args),
        Commands::Unpack(args) => unpack::handle(args),
    }
}
