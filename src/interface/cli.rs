//! Command-line arguments.
//!
//! - `LIBRARY_CATALOG_FILE` - catalog file (default: `library.json`)

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Library catalog manager.
#[derive(Debug, Parser)]
#[command(name = "library-catalog")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Catalog JSON file.
    #[arg(
        long,
        short,
        env = "LIBRARY_CATALOG_FILE",
        default_value = "library.json"
    )]
    pub file: PathBuf,

    /// Mode to run in (default: interactive menu).
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Interactive text menu on stdin/stdout.
    Menu,
    /// MCP server over stdio.
    Serve,
}

/// 実行時設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub file: PathBuf,
    pub mode: Command,
}

impl Cli {
    pub fn config(&self) -> Config {
        Config {
            file: self.file.clone(),
            mode: self.command.unwrap_or(Command::Menu),
        }
    }
}
