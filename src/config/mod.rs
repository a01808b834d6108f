// src/config/mod.rs

//! Configuration loading and validation for relaunch.
//!
//! Responsibilities:
//! - Define the serde data model (`model.rs`).
//! - Load a config file from disk as TOML or YAML, or assemble one from CLI
//!   flags (`loader.rs`).
//! - Validate the invariants the engine relies on (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, from_cli_args, load_and_validate, load_from_path};
pub use model::{ConfigFile, ExecuteConfig, IgnoreSection, RawConfigFile};
