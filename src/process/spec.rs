// src/process/spec.rs

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::Result;
use crate::process::argv::split_command;
use crate::types::StepKind;

/// One declared pipeline step. Immutable once the config is loaded.
#[derive(Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    command: String,
    argv: Vec<String>,
    kind: StepKind,
    working_dir: Option<PathBuf>,
    delay_next: Duration,
}

impl fmt::Debug for ProcessSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessSpec")
            .field("command", &self.command)
            .field("kind", &self.kind)
            .field("working_dir", &self.working_dir)
            .finish_non_exhaustive()
    }
}

impl ProcessSpec {
    /// Tokenize `command` and build a spec.
    pub fn new(command: impl Into<String>, kind: StepKind) -> Result<Self> {
        let command = command.into();
        let argv = split_command(&command)?;
        Ok(Self {
            command,
            argv,
            kind,
            working_dir: None,
            delay_next: Duration::ZERO,
        })
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        self.working_dir = if dir.as_os_str().is_empty() {
            None
        } else {
            Some(dir)
        };
        self
    }

    pub fn with_delay_next(mut self, delay: Duration) -> Self {
        self.delay_next = delay;
        self
    }

    /// The command exactly as written in the config.
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn kind(&self) -> StepKind {
        self.kind
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    pub fn delay_next(&self) -> Duration {
        self.delay_next
    }

    /// Directory the step runs in: `working_dir` resolved against `root`.
    pub fn resolved_dir(&self, root: &Path) -> PathBuf {
        match &self.working_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => root.join(dir),
            None => root.to_path_buf(),
        }
    }

    /// Program to execute.
    ///
    /// A relative program path containing a separator (`./app`,
    /// `bin/server`) is anchored at the step's directory; bare names are
    /// left for `PATH` lookup.
    pub fn resolved_program(&self, root: &Path) -> PathBuf {
        let program = Path::new(&self.argv[0]);
        if program.is_relative() && program.components().count() > 1 {
            self.resolved_dir(root).join(program)
        } else {
            program.to_path_buf()
        }
    }
}
