// src/engine/mod.rs

//! Top-level orchestration for relaunch.
//!
//! The [`Engine`] ties together:
//! - the watch source (raw filesystem events)
//! - the [`ChangeEventRouter`] (filtering and generation dispatch)
//! - the [`ProcessManager`] (pipeline steps and their processes)
//! - the interrupt trap and shutdown
//!
//! One cancellation token is the root of everything the engine starts.
//! Cancelling it through a [`StopHandle`] ends [`Engine::start`].

pub mod callback;
pub mod router;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::ConfigFile;
use crate::errors::{RelaunchError, Result};
use crate::fs::{FileSystem, RealFileSystem};
use crate::process::{platform_supervisor, LogSink, ProcessManager, ProcessSupervisor, StdoutSink};
use crate::watch::{Debouncer, IgnoreEvaluator, IgnoreRuleSet, NotifyWatchSource, WatchSource};

pub use callback::{Callback, EventCallback, EventHandle};
pub use router::{ChangeEventRouter, Decision, EventFilter};

/// Collaborators the engine talks to. `Default` gives the production set.
pub struct EngineParts {
    pub source: Box<dyn WatchSource>,
    pub sink: Arc<dyn LogSink>,
    pub supervisor: Arc<dyn ProcessSupervisor>,
    pub fs: Arc<dyn FileSystem>,
}

impl Default for EngineParts {
    fn default() -> Self {
        Self {
            source: Box::new(NotifyWatchSource::new()),
            sink: Arc::new(StdoutSink),
            supervisor: platform_supervisor(),
            fs: Arc::new(RealFileSystem),
        }
    }
}

/// Cloneable, idempotent shutdown trigger.
#[derive(Debug, Clone)]
pub struct StopHandle {
    scope: CancellationToken,
    manager: Arc<ProcessManager>,
    stopped: Arc<AtomicBool>,
}

impl StopHandle {
    /// Kill every tracked process tree and end the engine's event loop.
    /// Calls after the first are no-ops.
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("stopping");
        self.manager.kill_all();
        self.scope.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

pub struct Engine {
    root: PathBuf,
    source: Box<dyn WatchSource>,
    manager: Arc<ProcessManager>,
    router: ChangeEventRouter,
    scope: CancellationToken,
    stopped: Arc<AtomicBool>,
    started: bool,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("root", &self.root)
            .field("source", &self.source)
            .field("started", &self.started)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Engine with the production watch source, stdout sink and platform
    /// process supervisor.
    pub fn new(config: ConfigFile) -> Result<Self> {
        Self::with_parts(config, EngineParts::default())
    }

    pub fn with_parts(config: ConfigFile, parts: EngineParts) -> Result<Self> {
        let root = resolve_root(config.root_path())?;

        let rules = IgnoreRuleSet::load(config.ignore(), &root, parts.fs.as_ref())?;
        debug!(?rules, "ignore rules loaded");

        let scope = CancellationToken::new();
        let manager = Arc::new(
            ProcessManager::new(
                root.clone(),
                config.pipeline().to_vec(),
                scope.clone(),
                parts.supervisor,
                parts.sink,
            )
            .with_grace_period(config.grace_period()),
        );

        let filter = EventFilter::new(
            root.clone(),
            IgnoreEvaluator::new(rules),
            Debouncer::new(config.debounce()),
        );
        let router = ChangeEventRouter::new(filter, Arc::clone(&manager), scope.clone());

        Ok(Self {
            root,
            source: parts.source,
            manager,
            router,
            scope,
            stopped: Arc::new(AtomicBool::new(false)),
            started: false,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manager(&self) -> &Arc<ProcessManager> {
        &self.manager
    }

    /// Register the per-event intercept callback.
    pub fn attach_callback<F>(&mut self, callback: F)
    where
        F: Fn(&EventCallback) -> EventHandle + Send + Sync + 'static,
    {
        self.router.set_callback(Arc::new(callback));
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            scope: self.scope.clone(),
            manager: Arc::clone(&self.manager),
            stopped: Arc::clone(&self.stopped),
        }
    }

    /// Kill every tracked process and release the watch subscription.
    pub fn stop(&mut self) {
        self.stop_handle().stop();
        self.source.stop();
    }

    /// Watch the root and run generations until stopped.
    ///
    /// Returns `Ok(())` after a graceful stop (interrupt or [`StopHandle`]),
    /// or the error that ended the loop (watch subscription failure, event
    /// stream closed).
    pub async fn start(&mut self) -> Result<()> {
        if self.started {
            return Err(RelaunchError::ConfigError(
                "engine has already been started".to_string(),
            ));
        }
        self.started = true;

        let mut events = self.source.watch(&self.root).map_err(|err| match err {
            RelaunchError::WatchError(_) => err,
            other => RelaunchError::WatchError(other.to_string()),
        })?;

        let trap = self.spawn_interrupt_trap();
        self.manager
            .sink()
            .notice(&format!("watching {}", self.root.display()));

        if let Err(err) = self.router.start_initial().await {
            warn!(error = %err, "initial generation failed; waiting for changes");
        }

        let scope = self.scope.clone();
        let result = loop {
            tokio::select! {
                biased;
                _ = scope.cancelled() => break Ok(()),
                event = events.recv() => match event {
                    Some(event) => {
                        self.router.handle_event(&event).await;
                    }
                    None => {
                        error!("file watch stream closed");
                        break Err(RelaunchError::WatchError(
                            "file watch stream closed unexpectedly".to_string(),
                        ));
                    }
                },
            }
        };

        trap.abort();
        self.stop();
        self.manager.sink().notice("stopped");
        result
    }

    /// Stop on the first interrupt signal.
    fn spawn_interrupt_trap(&self) -> JoinHandle<()> {
        let stop = self.stop_handle();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("interrupt received");
                    stop.stop();
                }
                Err(err) => warn!("failed to listen for Ctrl+C: {err}"),
            }
        })
    }
}

fn resolve_root(root: &Path) -> Result<PathBuf> {
    let canonical = root.canonicalize().map_err(|err| {
        RelaunchError::ConfigError(format!("root_path {:?} is not accessible: {err}", root))
    })?;
    if !canonical.is_dir() {
        return Err(RelaunchError::ConfigError(format!(
            "root_path {:?} is not a directory",
            root
        )));
    }
    Ok(canonical)
}
