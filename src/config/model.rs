// src/config/model.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::process::ProcessSpec;
use crate::types::StepKind;

/// Top-level configuration as read from a TOML or YAML file.
///
/// ```toml
/// root_path = "./"
/// debounce = 1000
///
/// [ignore]
/// dir = [".git", "node_modules"]
/// watched_extension = ["*.go"]
///
/// [[executes]]
/// cmd = "go build -o ./bin/app"
/// type = "blocking"
///
/// [[executes]]
/// cmd = "./app"
/// type = "primary"
/// dir = "bin"
/// ```
///
/// This is the unvalidated form; see [`ConfigFile`] for the validated one.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// Directory to watch and to run steps in.
    #[serde(default)]
    pub root_path: String,

    /// Optional log level (`error`..`trace`).
    #[serde(default)]
    pub log_level: Option<String>,

    /// Debounce window in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce: u64,

    /// How long a superseded step gets to exit before it is killed, in ms.
    #[serde(default = "default_grace_period_ms")]
    pub grace_period: u64,

    #[serde(default)]
    pub ignore: IgnoreSection,

    /// The ordered pipeline.
    #[serde(default)]
    pub executes: Vec<ExecuteConfig>,
}

pub(crate) fn default_debounce_ms() -> u64 {
    1000
}

pub(crate) fn default_grace_period_ms() -> u64 {
    100
}

/// `[ignore]` section.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct IgnoreSection {
    /// Directory names or patterns; any matching path segment is ignored.
    #[serde(default)]
    pub dir: Vec<String>,

    /// File name patterns matched against the base name.
    #[serde(default)]
    pub file: Vec<String>,

    /// Allow-list of watched extensions (`.go`) or patterns (`*.go`).
    ///
    /// Empty means every file is watched.
    #[serde(default, alias = "extension")]
    pub watched_extension: Vec<String>,

    /// Also read `<root>/.gitignore`.
    #[serde(default)]
    pub git: bool,
}

/// One `[[executes]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecuteConfig {
    pub cmd: String,

    #[serde(rename = "type")]
    pub kind: StepKind,

    /// Working directory relative to `root_path`.
    #[serde(default)]
    pub dir: Option<String>,

    /// Milliseconds to wait after this step before starting the next one.
    #[serde(default)]
    pub delay_next: u64,
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>`, so holders can rely on
/// a non-empty root path and a non-empty, tokenized pipeline with at most one
/// primary step.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    root_path: PathBuf,
    log_level: Option<String>,
    debounce: Duration,
    grace_period: Duration,
    ignore: IgnoreSection,
    pipeline: Vec<ProcessSpec>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        root_path: PathBuf,
        log_level: Option<String>,
        debounce: Duration,
        grace_period: Duration,
        ignore: IgnoreSection,
        pipeline: Vec<ProcessSpec>,
    ) -> Self {
        Self {
            root_path,
            log_level,
            debounce,
            grace_period,
            ignore,
            pipeline,
        }
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn log_level(&self) -> Option<&str> {
        self.log_level.as_deref()
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    pub fn ignore(&self) -> &IgnoreSection {
        &self.ignore
    }

    pub fn pipeline(&self) -> &[ProcessSpec] {
        &self.pipeline
    }
}
