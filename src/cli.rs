// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `relaunch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "relaunch",
    version,
    about = "Watch a source tree and rebuild/restart your app on changes.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to a config file (`.toml`, `.yaml` or `.yml`).
    ///
    /// When omitted, the configuration is assembled from the flags below.
    #[arg(short = 'c', long, value_name = "PATH")]
    pub config: Option<String>,

    /// Root path to watch.
    #[arg(short = 'p', long = "path", value_name = "ROOT", default_value = "./")]
    pub root_path: String,

    /// Commands to execute on changes, comma-separated.
    ///
    /// Every command runs as a blocking step except the last one, which is
    /// the primary (restarted) process.
    #[arg(short = 'e', long = "exec", value_name = "CMD", value_delimiter = ',')]
    pub exec: Vec<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RELAUNCH_LOG`, the config file, or `info` is used.
    #[arg(short = 'l', long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Directories to ignore, comma-separated.
    #[arg(long, value_name = "DIR", value_delimiter = ',')]
    pub ignore_dir: Vec<String>,

    /// File name patterns to ignore, comma-separated.
    #[arg(long, value_name = "FILE", value_delimiter = ',')]
    pub ignore_file: Vec<String>,

    /// Watched extensions (e.g. `*.go,.mod`), comma-separated.
    ///
    /// Empty means every file is watched.
    #[arg(long, value_name = "EXT", value_delimiter = ',')]
    pub watch_ext: Vec<String>,

    /// Debounce window in milliseconds.
    #[arg(short = 'd', long, value_name = "MS", default_value_t = 1000)]
    pub debounce: u64,

    /// Also ignore whatever `<root>/.gitignore` lists.
    #[arg(long)]
    pub git: bool,

    /// Parse + validate, print the pipeline, but don't execute anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
