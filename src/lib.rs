// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod process;
pub mod types;
pub mod watch;

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{default_config_path, from_cli_args, load_and_validate, ConfigFile};
use crate::engine::Engine;

/// Resolve the configuration for this invocation.
///
/// - `--config PATH` loads that file.
/// - Otherwise `relaunch.toml` in the current directory is used if present.
/// - Otherwise the configuration is assembled from the CLI flags.
pub fn load_config(args: &CliArgs) -> Result<ConfigFile> {
    if let Some(path) = &args.config {
        return load_and_validate(path).with_context(|| format!("loading config {path}"));
    }

    let default_path = default_config_path();
    if default_path.is_file() && args.exec.is_empty() {
        info!(path = ?default_path, "using default config file");
        return load_and_validate(&default_path)
            .with_context(|| format!("loading config {}", default_path.display()));
    }

    from_cli_args(args).context("building config from command-line flags")
}

/// High-level entry point used by `main.rs`.
///
/// Either prints the resolved pipeline (`--dry-run`) or builds an
/// [`Engine`] and runs it until interrupted.
pub async fn run(args: CliArgs, cfg: ConfigFile) -> Result<()> {
    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let mut engine = Engine::new(cfg)?;
    engine.start().await?;
    Ok(())
}

/// Print the pipeline and ignore rules without starting anything.
fn print_dry_run(cfg: &ConfigFile) {
    println!("relaunch dry-run");
    println!("  root_path = {}", display_path(cfg.root_path()));
    println!("  debounce = {}ms", cfg.debounce().as_millis());
    println!("  grace_period = {}ms", cfg.grace_period().as_millis());
    println!();

    let ignore = cfg.ignore();
    println!("ignore:");
    if !ignore.dir.is_empty() {
        println!("  dir: {:?}", ignore.dir);
    }
    if !ignore.file.is_empty() {
        println!("  file: {:?}", ignore.file);
    }
    if !ignore.watched_extension.is_empty() {
        println!("  watched_extension: {:?}", ignore.watched_extension);
    }
    if ignore.git {
        println!("  git: true");
    }
    println!();

    println!("executes ({}):", cfg.pipeline().len());
    for (idx, step) in cfg.pipeline().iter().enumerate() {
        println!("  {idx}. [{}] {}", step.kind(), step.command());
        if let Some(dir) = step.working_dir() {
            println!("      dir: {}", display_path(dir));
        }
        if !step.delay_next().is_zero() {
            println!("      delay_next: {}ms", step.delay_next().as_millis());
        }
    }

    debug!("dry-run complete (no execution)");
}

fn display_path(path: &Path) -> String {
    path.display().to_string()
}
