#![allow(dead_code)]

use std::path::Path;

use relaunch::config::{ConfigFile, ExecuteConfig, IgnoreSection, RawConfigFile};
use relaunch::types::StepKind;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            config: RawConfigFile {
                root_path: root.as_ref().to_string_lossy().into_owned(),
                log_level: None,
                debounce: 0,
                grace_period: 100,
                ignore: IgnoreSection::default(),
                executes: Vec::new(),
            },
        }
    }

    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.config.debounce = ms;
        self
    }

    pub fn grace_ms(mut self, ms: u64) -> Self {
        self.config.grace_period = ms;
        self
    }

    pub fn ignore_dir(mut self, dir: &str) -> Self {
        self.config.ignore.dir.push(dir.to_string());
        self
    }

    pub fn ignore_file(mut self, pattern: &str) -> Self {
        self.config.ignore.file.push(pattern.to_string());
        self
    }

    pub fn watch_ext(mut self, ext: &str) -> Self {
        self.config.ignore.watched_extension.push(ext.to_string());
        self
    }

    pub fn git(mut self, enabled: bool) -> Self {
        self.config.ignore.git = enabled;
        self
    }

    pub fn step(mut self, step: ExecuteBuilder) -> Self {
        self.config.executes.push(step.build());
        self
    }

    pub fn blocking(self, cmd: &str) -> Self {
        self.step(ExecuteBuilder::new(cmd, StepKind::Blocking))
    }

    pub fn once(self, cmd: &str) -> Self {
        self.step(ExecuteBuilder::new(cmd, StepKind::Once))
    }

    pub fn background(self, cmd: &str) -> Self {
        self.step(ExecuteBuilder::new(cmd, StepKind::Background))
    }

    pub fn primary(self, cmd: &str) -> Self {
        self.step(ExecuteBuilder::new(cmd, StepKind::Primary))
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

/// Builder for one `[[executes]]` entry.
pub struct ExecuteBuilder {
    execute: ExecuteConfig,
}

impl ExecuteBuilder {
    pub fn new(cmd: &str, kind: StepKind) -> Self {
        Self {
            execute: ExecuteConfig {
                cmd: cmd.to_string(),
                kind,
                dir: None,
                delay_next: 0,
            },
        }
    }

    pub fn dir(mut self, dir: &str) -> Self {
        self.execute.dir = Some(dir.to_string());
        self
    }

    pub fn delay_next_ms(mut self, ms: u64) -> Self {
        self.execute.delay_next = ms;
        self
    }

    pub fn build(self) -> ExecuteConfig {
        self.execute
    }
}
