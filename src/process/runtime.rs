// src/process/runtime.rs

//! Per-step mutable state, kept for the whole life of the engine.
//!
//! ```text
//! Unstarted -> Starting -> Running -> Exited(outcome)
//!                  |           \----> Killed
//!                  \-> Exited(Failed(None))   (spawn error)
//! ```
//!
//! Every start bumps `spawn_id`; updates carrying an older id come from a
//! previous process of the same step and are dropped.
//!
//! A leader that exits on its own can leave members of its process group
//! behind. The group stays recorded as `exited_group` until it is killed.

use std::fmt;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::process::supervisor::ProcessHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    Success,
    /// Non-zero exit code, or `None` for a signal / spawn failure.
    Failed(Option<i32>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    Unstarted,
    Starting,
    Running,
    Exited(ExitOutcome),
    /// Torn down on purpose. Not an error.
    Killed,
}

impl StepState {
    pub fn is_terminal(self) -> bool {
        matches!(self, StepState::Exited(_) | StepState::Killed)
    }
}

impl fmt::Display for StepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepState::Unstarted => f.write_str("unstarted"),
            StepState::Starting => f.write_str("starting"),
            StepState::Running => f.write_str("running"),
            StepState::Exited(ExitOutcome::Success) => f.write_str("exited (ok)"),
            StepState::Exited(ExitOutcome::Failed(Some(code))) => {
                write!(f, "exited (code {code})")
            }
            StepState::Exited(ExitOutcome::Failed(None)) => f.write_str("exited (failed)"),
            StepState::Killed => f.write_str("killed"),
        }
    }
}

/// Everything needed to stop one live process of a step.
#[derive(Debug)]
pub struct Teardown {
    pub spawn_id: u64,
    pub handle: Option<ProcessHandle>,
    pub scope: Option<CancellationToken>,
    pub task: Option<JoinHandle<()>>,
}

#[derive(Debug)]
pub struct ProcessRuntime {
    state: StepState,
    handle: Option<ProcessHandle>,
    exited_group: Option<ProcessHandle>,
    scope: Option<CancellationToken>,
    task: Option<JoinHandle<()>>,
    generation: u64,
    spawn_id: u64,
}

impl Default for ProcessRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessRuntime {
    pub fn new() -> Self {
        Self {
            state: StepState::Unstarted,
            handle: None,
            exited_group: None,
            scope: None,
            task: None,
            generation: 0,
            spawn_id: 0,
        }
    }

    pub fn state(&self) -> StepState {
        self.state
    }

    pub fn handle(&self) -> Option<ProcessHandle> {
        self.handle
    }

    pub fn scope(&self) -> Option<&CancellationToken> {
        self.scope.as_ref()
    }

    /// Generation that last started this step (0 = never).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_live(&self) -> bool {
        matches!(self.state, StepState::Starting | StepState::Running)
    }

    /// Enter `Starting` for `generation` and return the new spawn id.
    pub fn begin_start(&mut self, generation: u64) -> u64 {
        self.spawn_id += 1;
        self.generation = generation;
        self.state = StepState::Starting;
        self.handle = None;
        self.scope = None;
        self.task = None;
        self.spawn_id
    }

    pub fn mark_running(&mut self, spawn_id: u64, handle: ProcessHandle, scope: CancellationToken) {
        if self.spawn_id != spawn_id || self.state != StepState::Starting {
            return;
        }
        self.state = StepState::Running;
        self.handle = Some(handle);
        self.scope = Some(scope);
    }

    /// Keep the supervising task so teardown can wait for it. Dropped if the
    /// process already finished.
    pub fn attach_task(&mut self, spawn_id: u64, task: JoinHandle<()>) {
        if self.spawn_id == spawn_id && self.is_live() {
            self.task = Some(task);
        }
    }

    /// Record a terminal state. Returns false for stale or repeated updates.
    pub fn finish(&mut self, spawn_id: u64, state: StepState) -> bool {
        if self.spawn_id != spawn_id || self.state.is_terminal() {
            return false;
        }
        self.state = state;
        let handle = self.handle.take();
        if let StepState::Exited(_) = state {
            self.exited_group = handle.or(self.exited_group);
        }
        self.scope = None;
        self.task = None;
        true
    }

    /// Group of a leader that exited on its own and has not been killed since.
    pub fn take_exited_group(&mut self) -> Option<ProcessHandle> {
        self.exited_group.take()
    }

    /// Take what is needed to stop the current process, if any. The handle
    /// stays recorded until the process is reaped.
    pub fn take_teardown(&mut self) -> Option<Teardown> {
        if !self.is_live() {
            return None;
        }
        Some(Teardown {
            spawn_id: self.spawn_id,
            handle: self.handle,
            scope: self.scope.clone(),
            task: self.task.take(),
        })
    }
}
