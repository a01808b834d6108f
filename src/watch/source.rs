// src/watch/source.rs

use std::fmt::Debug;
use std::path::{Path, PathBuf};

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::errors::Result;

/// One path touched by one backend event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub path: PathBuf,
    pub kind: notify::EventKind,
}

impl RawEvent {
    pub fn new(path: impl Into<PathBuf>, kind: notify::EventKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// Producer of raw filesystem events for a root and its subtree.
///
/// `watch` is called once at startup; `stop` on shutdown. After `stop` the
/// returned receiver drains and then yields `None`.
pub trait WatchSource: Send + Debug {
    fn watch(&mut self, root: &Path) -> Result<mpsc::UnboundedReceiver<RawEvent>>;
    fn stop(&mut self);
}

/// `notify`-backed source watching the root recursively.
#[derive(Default)]
pub struct NotifyWatchSource {
    watcher: Option<RecommendedWatcher>,
}

impl Debug for NotifyWatchSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyWatchSource")
            .field("active", &self.watcher.is_some())
            .finish()
    }
}

impl NotifyWatchSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WatchSource for NotifyWatchSource {
    fn watch(&mut self, root: &Path) -> Result<mpsc::UnboundedReceiver<RawEvent>> {
        let (tx, rx) = mpsc::unbounded_channel::<RawEvent>();

        // Called synchronously on notify's thread.
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    for path in event.paths {
                        if tx.send(RawEvent::new(path, event.kind)).is_err() {
                            debug!("event receiver dropped; discarding notify event");
                            return;
                        }
                    }
                }
                Err(err) => warn!("file watch error: {err}"),
            },
            Config::default(),
        )?;

        watcher.watch(root, RecursiveMode::Recursive)?;
        info!("file watcher started on {:?}", root);

        self.watcher = Some(watcher);
        Ok(rx)
    }

    fn stop(&mut self) {
        // Dropping the watcher drops the sender and closes the channel.
        if self.watcher.take().is_some() {
            debug!("file watcher stopped");
        }
    }
}
