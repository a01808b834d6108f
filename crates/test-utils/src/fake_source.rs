use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use notify::event::{DataChange, ModifyKind};
use notify::EventKind;
use relaunch::errors::{RelaunchError, Result};
use relaunch::watch::{RawEvent, WatchSource};
use tokio::sync::mpsc;

/// Watch source driven by the test instead of the filesystem.
///
/// Events pushed through the paired [`WatchFeed`] before `watch` is called
/// are buffered and delivered once the engine subscribes.
#[derive(Debug)]
pub struct ChannelWatchSource {
    shared: Arc<Mutex<Shared>>,
}

#[derive(Debug, Default)]
struct Shared {
    root: Option<PathBuf>,
    tx: Option<mpsc::UnboundedSender<RawEvent>>,
    pending: Vec<RawEvent>,
    stopped: bool,
}

/// Test-side handle of a [`ChannelWatchSource`].
#[derive(Debug, Clone)]
pub struct WatchFeed {
    shared: Arc<Mutex<Shared>>,
}

impl ChannelWatchSource {
    pub fn new() -> (Self, WatchFeed) {
        let shared = Arc::new(Mutex::new(Shared::default()));
        (
            Self {
                shared: Arc::clone(&shared),
            },
            WatchFeed { shared },
        )
    }
}

impl WatchSource for ChannelWatchSource {
    fn watch(&mut self, root: &Path) -> Result<mpsc::UnboundedReceiver<RawEvent>> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut shared = self.shared.lock().unwrap();
        for event in shared.pending.drain(..) {
            let _ = tx.send(event);
        }
        shared.root = Some(root.to_path_buf());
        shared.tx = Some(tx);
        Ok(rx)
    }

    fn stop(&mut self) {
        let mut shared = self.shared.lock().unwrap();
        shared.tx = None;
        shared.stopped = true;
    }
}

impl WatchFeed {
    /// Deliver a raw event.
    pub fn send(&self, event: RawEvent) {
        let mut shared = self.shared.lock().unwrap();
        match &shared.tx {
            Some(tx) => {
                let _ = tx.send(event);
            }
            None => shared.pending.push(event),
        }
    }

    /// Deliver a content write for `rel`, relative to the watched root.
    pub fn write(&self, rel: &str) {
        let root = self.root().expect("write() called before watch()");
        self.send(RawEvent::new(
            root.join(rel),
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
        ));
    }

    /// Drop the sender as if the backend died.
    pub fn close(&self) {
        self.shared.lock().unwrap().tx = None;
    }

    pub fn root(&self) -> Option<PathBuf> {
        self.shared.lock().unwrap().root.clone()
    }

    pub fn is_watching(&self) -> bool {
        self.shared.lock().unwrap().tx.is_some()
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.lock().unwrap().stopped
    }
}

/// Source whose subscription always fails.
#[derive(Debug, Default)]
pub struct FailingWatchSource;

impl WatchSource for FailingWatchSource {
    fn watch(&mut self, root: &Path) -> Result<mpsc::UnboundedReceiver<RawEvent>> {
        Err(RelaunchError::WatchError(format!(
            "cannot watch {}",
            root.display()
        )))
    }

    fn stop(&mut self) {}
}
