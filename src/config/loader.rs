// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::CliArgs;
use crate::config::model::{
    default_grace_period_ms, ConfigFile, ExecuteConfig, IgnoreSection, RawConfigFile,
};
use crate::errors::{RelaunchError, Result};
use crate::types::StepKind;

/// Supported on-disk formats, picked by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Toml,
    Yaml,
}

fn format_of(path: &Path) -> Result<Format> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => Ok(Format::Toml),
        Some("yaml") | Some("yml") => Ok(Format::Yaml),
        _ => Err(RelaunchError::ConfigError(format!(
            "unsupported config file {:?} (expected .toml, .yaml or .yml)",
            path
        ))),
    }
}

/// Load a configuration file and return the raw `RawConfigFile`.
///
/// This only performs deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let format = format_of(path)?;
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = match format {
        Format::Toml => toml::from_str(&contents)?,
        Format::Yaml => serde_yaml::from_str(&contents)?,
    };

    Ok(config)
}

/// Load a configuration file from path and validate it.
///
/// This is the recommended entry point for the rest of the application.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Assemble a configuration from command-line flags alone.
///
/// Every `--exec` entry becomes a blocking step, except the last which is the
/// primary process.
pub fn from_cli_args(args: &CliArgs) -> Result<ConfigFile> {
    let commands: Vec<&String> = args
        .exec
        .iter()
        .filter(|c| !c.trim().is_empty())
        .collect();
    let last = commands.len().saturating_sub(1);

    let executes = commands
        .into_iter()
        .enumerate()
        .map(|(idx, cmd)| ExecuteConfig {
            cmd: cmd.trim().to_string(),
            kind: if idx == last {
                StepKind::Primary
            } else {
                StepKind::Blocking
            },
            dir: None,
            delay_next: 0,
        })
        .collect();

    let raw = RawConfigFile {
        root_path: args.root_path.clone(),
        log_level: None,
        debounce: args.debounce,
        grace_period: default_grace_period_ms(),
        ignore: IgnoreSection {
            dir: non_empty(&args.ignore_dir),
            file: non_empty(&args.ignore_file),
            watched_extension: non_empty(&args.watch_ext),
            git: args.git,
        },
        executes,
    };

    ConfigFile::try_from(raw)
}

fn non_empty(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

/// Config file picked up when `--config` is not given and it exists.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("relaunch.toml")
}
