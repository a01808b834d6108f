// src/engine/callback.rs

use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use crate::watch::EventKind;

/// What the user callback wants done with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventHandle {
    /// Apply the normal ignore and debounce rules.
    #[default]
    Continue,
    /// Skip every filter and start a new generation.
    Bypass,
    /// Drop the event.
    Ignore,
}

/// Event details handed to the callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventCallback {
    pub kind: EventKind,
    /// Relative to the watch root.
    pub path: PathBuf,
    pub time: SystemTime,
}

pub type Callback = Arc<dyn Fn(&EventCallback) -> EventHandle + Send + Sync>;
