// src/config/validate.rs

use std::path::PathBuf;
use std::time::Duration;

use crate::config::model::{ConfigFile, ExecuteConfig, RawConfigFile};
use crate::errors::{RelaunchError, Result};
use crate::process::ProcessSpec;
use crate::types::StepKind;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = RelaunchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        ensure_root_path(&raw)?;
        ensure_has_executes(&raw)?;
        ensure_single_primary(&raw)?;
        let pipeline = build_pipeline(&raw.executes)?;

        Ok(ConfigFile::new_unchecked(
            PathBuf::from(raw.root_path.trim()),
            raw.log_level,
            Duration::from_millis(raw.debounce),
            Duration::from_millis(raw.grace_period),
            raw.ignore,
            pipeline,
        ))
    }
}

fn ensure_root_path(cfg: &RawConfigFile) -> Result<()> {
    if cfg.root_path.trim().is_empty() {
        return Err(RelaunchError::ConfigError(
            "required root_path is not set".to_string(),
        ));
    }
    Ok(())
}

fn ensure_has_executes(cfg: &RawConfigFile) -> Result<()> {
    if cfg.executes.is_empty() {
        return Err(RelaunchError::ConfigError(
            "config must contain at least one [[executes]] entry".to_string(),
        ));
    }
    Ok(())
}

fn ensure_single_primary(cfg: &RawConfigFile) -> Result<()> {
    let primaries = cfg
        .executes
        .iter()
        .filter(|e| e.kind == StepKind::Primary)
        .count();
    if primaries > 1 {
        return Err(RelaunchError::ConfigError(format!(
            "only one primary execute can be set (found {primaries})"
        )));
    }
    Ok(())
}

fn build_pipeline(executes: &[ExecuteConfig]) -> Result<Vec<ProcessSpec>> {
    executes
        .iter()
        .enumerate()
        .map(|(idx, exe)| {
            if exe.cmd.trim().is_empty() {
                return Err(RelaunchError::ConfigError(format!(
                    "executes[{idx}] has an empty cmd"
                )));
            }
            let spec = ProcessSpec::new(exe.cmd.trim(), exe.kind).map_err(|e| match e {
                RelaunchError::ConfigError(msg) => {
                    RelaunchError::ConfigError(format!("executes[{idx}]: {msg}"))
                }
                other => other,
            })?;
            Ok(spec
                .with_working_dir(exe.dir.clone().unwrap_or_default())
                .with_delay_next(Duration::from_millis(exe.delay_next)))
        })
        .collect()
}
