// src/engine/router.rs

//! From raw events to generations.
//!
//! [`EventFilter`] is the synchronous decision part (classify, callback,
//! reload flag, ignore rules, debounce). [`ChangeEventRouter`] owns the
//! filter and turns accepted events into generation starts.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Instant, SystemTime};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::engine::callback::{Callback, EventCallback, EventHandle};
use crate::errors::Result;
use crate::process::ProcessManager;
use crate::watch::path_utils::match_str;
use crate::watch::{classify, Debouncer, IgnoreEvaluator, RawEvent};

/// Outcome of evaluating one raw event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Backend code not in the classification table.
    Unknown,
    /// The callback returned [`EventHandle::Ignore`].
    Dropped,
    /// Kind does not trigger reloads (rename, attributes, ...).
    Inert,
    /// Matched an ignore rule.
    Ignored,
    /// Inside the debounce window of an earlier accepted event.
    Debounced,
    Reload,
    /// The callback forced a reload.
    Bypass,
}

impl Decision {
    pub fn triggers_generation(self) -> bool {
        matches!(self, Decision::Reload | Decision::Bypass)
    }
}

/// Single-consumer event evaluation. Owns the debounce state.
pub struct EventFilter {
    root: PathBuf,
    ignore: IgnoreEvaluator,
    debouncer: Debouncer,
    callback: Option<Callback>,
}

impl fmt::Debug for EventFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventFilter")
            .field("root", &self.root)
            .field("ignore", &self.ignore)
            .field("debouncer", &self.debouncer)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

impl EventFilter {
    pub fn new(root: impl Into<PathBuf>, ignore: IgnoreEvaluator, debouncer: Debouncer) -> Self {
        Self {
            root: root.into(),
            ignore,
            debouncer,
            callback: None,
        }
    }

    pub fn set_callback(&mut self, callback: Callback) {
        self.callback = Some(callback);
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn evaluate(&mut self, event: &RawEvent, now: Instant) -> Decision {
        let Some(kind) = classify(&event.kind) else {
            debug!(raw = ?event.kind, path = ?event.path, "unknown event kind; dropped");
            return Decision::Unknown;
        };
        let rel = match_str(&self.root, &event.path);

        if let Some(callback) = &self.callback {
            let info = EventCallback {
                kind,
                path: PathBuf::from(&rel),
                time: SystemTime::now(),
            };
            match callback(&info) {
                EventHandle::Ignore => {
                    trace!(path = %rel, %kind, "callback dropped event");
                    return Decision::Dropped;
                }
                EventHandle::Bypass => {
                    debug!(path = %rel, %kind, "callback forced reload");
                    return Decision::Bypass;
                }
                EventHandle::Continue => {}
            }
        }

        if !kind.triggers_reload() {
            trace!(path = %rel, %kind, "inert event");
            return Decision::Inert;
        }
        if self.ignore.should_ignore(&rel) {
            return Decision::Ignored;
        }
        if !self.debouncer.accept(now) {
            trace!(path = %rel, "debounced");
            return Decision::Debounced;
        }

        debug!(path = %rel, %kind, "change accepted");
        Decision::Reload
    }
}

/// Dispatches accepted events to the [`ProcessManager`] and tracks the
/// current generation's scope.
#[derive(Debug)]
pub struct ChangeEventRouter {
    filter: EventFilter,
    manager: Arc<ProcessManager>,
    engine_scope: CancellationToken,
    current: Option<CancellationToken>,
}

impl ChangeEventRouter {
    pub fn new(
        filter: EventFilter,
        manager: Arc<ProcessManager>,
        engine_scope: CancellationToken,
    ) -> Self {
        Self {
            filter,
            manager,
            engine_scope,
            current: None,
        }
    }

    pub fn set_callback(&mut self, callback: Callback) {
        self.filter.set_callback(callback);
    }

    /// Start the first generation.
    pub async fn start_initial(&mut self) -> Result<u64> {
        self.dispatch().await
    }

    /// Evaluate one event and start a generation if it is accepted.
    ///
    /// Generation failures are logged here; watching goes on.
    pub async fn handle_event(&mut self, event: &RawEvent) -> Decision {
        let decision = self.filter.evaluate(event, Instant::now());
        if decision.triggers_generation() {
            info!(path = ?event.path, "change detected; reloading");
            self.manager
                .sink()
                .notice(&format!("change detected: {}", event.path.display()));
            if let Err(err) = self.dispatch().await {
                if err.is_generation_failure() {
                    warn!(error = %err, "reload failed; still watching");
                } else {
                    warn!(error = ?err, "reload failed with unexpected error; still watching");
                }
            }
        }
        decision
    }

    /// Start a generation under a fresh scope. Only a generation that starts
    /// successfully replaces the current one; a failed one is cancelled and
    /// the previous generation stays in charge.
    async fn dispatch(&mut self) -> Result<u64> {
        let scope = self.engine_scope.child_token();
        match self.manager.start_generation(&scope).await {
            Ok(generation) => {
                if let Some(previous) = self.current.replace(scope) {
                    previous.cancel();
                }
                Ok(generation)
            }
            Err(err) => {
                scope.cancel();
                Err(err)
            }
        }
    }
}
