// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Matching paths against shell-style patterns.
//! - Deciding which changed paths are ignored (dirs, files, extension
//!   allow-list, `.gitignore`).
//! - Debouncing bursts of accepted changes.
//! - Turning backend (`notify`) events into semantic kinds.
//!
//! It does **not** know about processes; the engine's router combines these
//! pieces and decides when to start a new generation.

pub mod debounce;
pub mod event_kind;
pub mod ignore;
pub mod path_utils;
pub mod pattern;
pub mod source;

pub use debounce::Debouncer;
pub use event_kind::{classify, EventKind};
pub use ignore::{parse_vcs_ignore, read_vcs_ignore, IgnoreEvaluator, IgnoreRuleSet};
pub use pattern::{matches, matches_any};
pub use source::{NotifyWatchSource, RawEvent, WatchSource};
