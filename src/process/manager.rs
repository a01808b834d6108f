// src/process/manager.rs

//! Pipeline orchestration: one generation start per trigger, plus teardown.
//!
//! Scope tree:
//!
//! ```text
//! engine
//! ├── generation N
//! │   ├── blocking / once step (own scope)
//! │   └── primary step (own scope)
//! └── background step (own scope)
//! ```
//!
//! Background steps hang off the engine scope so superseding a generation
//! leaves them alone. They still hold the scope of the generation that
//! started them and cancel it if they die.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::{RelaunchError, Result};
use crate::process::output::{forward_output, LogSink};
use crate::process::runtime::{ExitOutcome, ProcessRuntime, StepState, Teardown};
use crate::process::spec::ProcessSpec;
use crate::process::supervisor::{ProcessHandle, ProcessSupervisor};
use crate::types::StepKind;

/// Default wait for a process to exit on its own before it is killed.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_millis(100);

#[derive(Debug)]
struct Step {
    spec: ProcessSpec,
    runtime: Arc<Mutex<ProcessRuntime>>,
}

#[derive(Debug)]
struct PipelineState {
    first_run: bool,
    generation: u64,
}

/// Point-in-time view of one step, for logs and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSnapshot {
    pub command: String,
    pub kind: StepKind,
    pub state: StepState,
    pub pid: Option<u32>,
    pub generation: u64,
}

/// Owns the pipeline and every process it starts.
#[derive(Debug)]
pub struct ProcessManager {
    root: PathBuf,
    steps: Vec<Step>,
    engine_scope: CancellationToken,
    supervisor: Arc<dyn ProcessSupervisor>,
    sink: Arc<dyn LogSink>,
    grace: Duration,
    pipeline: tokio::sync::Mutex<PipelineState>,
}

fn lock(runtime: &Mutex<ProcessRuntime>) -> MutexGuard<'_, ProcessRuntime> {
    runtime.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ProcessManager {
    pub fn new(
        root: impl Into<PathBuf>,
        pipeline: Vec<ProcessSpec>,
        engine_scope: CancellationToken,
        supervisor: Arc<dyn ProcessSupervisor>,
        sink: Arc<dyn LogSink>,
    ) -> Self {
        let steps = pipeline
            .into_iter()
            .map(|spec| Step {
                spec,
                runtime: Arc::new(Mutex::new(ProcessRuntime::new())),
            })
            .collect();

        Self {
            root: root.into(),
            steps,
            engine_scope,
            supervisor,
            sink,
            grace: DEFAULT_GRACE_PERIOD,
            pipeline: tokio::sync::Mutex::new(PipelineState {
                first_run: true,
                generation: 0,
            }),
        }
    }

    pub fn with_grace_period(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn grace_period(&self) -> Duration {
        self.grace
    }

    pub fn sink(&self) -> &Arc<dyn LogSink> {
        &self.sink
    }

    /// True until a generation has started successfully.
    pub async fn is_first_run(&self) -> bool {
        self.pipeline.lock().await.first_run
    }

    pub fn snapshot(&self) -> Vec<StepSnapshot> {
        self.steps
            .iter()
            .map(|step| {
                let rt = lock(&step.runtime);
                StepSnapshot {
                    command: step.spec.command().to_string(),
                    kind: step.spec.kind(),
                    state: rt.state(),
                    pid: rt.handle().map(ProcessHandle::pid),
                    generation: rt.generation(),
                }
            })
            .collect()
    }

    /// Run one full generation under `scope` and return its number.
    ///
    /// Blocking and once steps are awaited; background and primary steps are
    /// handed to supervising tasks. On failure everything this generation
    /// started is torn down before the error is returned.
    pub async fn start_generation(&self, scope: &CancellationToken) -> Result<u64> {
        let mut pipeline = self.pipeline.lock().await;
        pipeline.generation += 1;
        let generation = pipeline.generation;
        let first_run = pipeline.first_run;

        info!(generation, first_run, "starting generation");

        match self.run_pipeline(generation, first_run, scope).await {
            Ok(()) => {
                pipeline.first_run = false;
                info!(generation, "generation started");
                Ok(generation)
            }
            Err(err) => {
                warn!(generation, error = %err, "generation failed");
                self.sink
                    .notice(&format!("generation {generation} failed: {err}"));
                self.teardown_generation(generation).await;
                Err(err)
            }
        }
    }

    async fn run_pipeline(
        &self,
        generation: u64,
        first_run: bool,
        scope: &CancellationToken,
    ) -> Result<()> {
        for step in &self.steps {
            let kind = step.spec.kind();
            if !first_run && !kind.runs_on_reload() {
                debug!(step = %step.spec.command(), %kind, "skipping after first run");
                continue;
            }
            if scope.is_cancelled() {
                return Err(RelaunchError::GenerationCancelled);
            }

            match kind {
                StepKind::Once | StepKind::Blocking => {
                    self.run_to_completion(step, generation, scope).await?;
                }
                StepKind::Primary => {
                    self.supersede_previous().await;
                    self.spawn_supervised(step, generation, scope)?;
                }
                StepKind::Background => {
                    if lock(&step.runtime).is_live() {
                        debug!(step = %step.spec.command(), "background step already running");
                    } else {
                        self.spawn_supervised(step, generation, scope)?;
                    }
                }
            }

            let delay = step.spec.delay_next();
            if !delay.is_zero() {
                debug!(step = %step.spec.command(), ?delay, "waiting before next step");
                tokio::select! {
                    _ = scope.cancelled() => return Err(RelaunchError::GenerationCancelled),
                    _ = sleep(delay) => {}
                }
            }
        }
        Ok(())
    }

    fn build_command(&self, spec: &ProcessSpec) -> Command {
        let mut cmd = Command::new(spec.resolved_program(&self.root));
        cmd.args(&spec.argv()[1..])
            .current_dir(spec.resolved_dir(&self.root))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        self.supervisor.isolate(&mut cmd);
        cmd
    }

    /// Spawn the step's process and record it as running under `own`.
    fn spawn_step(
        &self,
        step: &Step,
        generation: u64,
        own: &CancellationToken,
    ) -> Result<(Child, ProcessHandle, u64)> {
        let command = step.spec.command();
        self.kill_exited_group(step);
        let spawn_id = lock(&step.runtime).begin_start(generation);
        let mut cmd = self.build_command(&step.spec);

        let spawned = cmd.spawn().and_then(|child| match child.id() {
            Some(pid) => Ok((child, ProcessHandle::new(pid))),
            None => Err(std::io::Error::other("process exited before its pid was read")),
        });

        match spawned {
            Ok((mut child, handle)) => {
                info!(step = %command, pid = handle.pid(), generation, "process started");
                forward_output(&mut child, command, Arc::clone(&self.sink));
                lock(&step.runtime).mark_running(spawn_id, handle, own.clone());
                Ok((child, handle, spawn_id))
            }
            Err(source) => {
                lock(&step.runtime).finish(spawn_id, StepState::Exited(ExitOutcome::Failed(None)));
                let err = RelaunchError::SpawnError {
                    command: command.to_string(),
                    source,
                };
                self.sink.notice(&err.to_string());
                Err(err)
            }
        }
    }

    async fn run_to_completion(
        &self,
        step: &Step,
        generation: u64,
        scope: &CancellationToken,
    ) -> Result<()> {
        let own = scope.child_token();
        let (mut child, handle, spawn_id) = self.spawn_step(step, generation, &own)?;
        let command = step.spec.command();

        tokio::select! {
            biased;
            _ = own.cancelled() => {
                debug!(step = %command, "cancelled while running");
                if let Err(err) = self.supervisor.kill_tree(handle) {
                    debug!(step = %command, error = %err, "kill failed");
                }
                let _ = child.wait().await;
                lock(&step.runtime).finish(spawn_id, StepState::Killed);
                Err(RelaunchError::GenerationCancelled)
            }
            status = child.wait() => {
                let status = match status {
                    Ok(status) => status,
                    Err(err) => {
                        lock(&step.runtime)
                            .finish(spawn_id, StepState::Exited(ExitOutcome::Failed(None)));
                        return Err(err.into());
                    }
                };
                if status.success() {
                    info!(step = %command, "step finished");
                    lock(&step.runtime).finish(spawn_id, StepState::Exited(ExitOutcome::Success));
                    Ok(())
                } else {
                    lock(&step.runtime)
                        .finish(spawn_id, StepState::Exited(ExitOutcome::Failed(status.code())));
                    Err(RelaunchError::StepFailed {
                        command: command.to_string(),
                        status: describe_status(status),
                    })
                }
            }
        }
    }

    fn spawn_supervised(
        &self,
        step: &Step,
        generation: u64,
        scope: &CancellationToken,
    ) -> Result<()> {
        let own = match step.spec.kind() {
            StepKind::Background => self.engine_scope.child_token(),
            _ => scope.child_token(),
        };
        let (child, handle, spawn_id) = self.spawn_step(step, generation, &own)?;

        let task = tokio::spawn(supervise(Supervised {
            child,
            handle,
            spawn_id,
            command: step.spec.command().to_string(),
            own,
            generation_scope: scope.clone(),
            runtime: Arc::clone(&step.runtime),
            supervisor: Arc::clone(&self.supervisor),
            sink: Arc::clone(&self.sink),
            grace: self.grace,
        }));
        lock(&step.runtime).attach_task(spawn_id, task);
        Ok(())
    }

    /// Stop every non-background step before a new primary starts,
    /// including whatever is left of groups whose leader already exited.
    async fn supersede_previous(&self) {
        for step in &self.steps {
            if step.spec.kind() == StepKind::Background {
                continue;
            }
            let teardown = lock(&step.runtime).take_teardown();
            if let Some(teardown) = teardown {
                info!(step = %step.spec.command(), "stopping previous instance");
                self.stop_step(step, teardown).await;
            }
            self.kill_exited_group(step);
        }
    }

    fn kill_exited_group(&self, step: &Step) {
        let Some(group) = lock(&step.runtime).take_exited_group() else {
            return;
        };
        let command = step.spec.command();
        match self.supervisor.kill_tree(group) {
            Ok(()) => debug!(step = %command, pid = group.pid(), "killed leftover group"),
            // ESRCH: nothing was left in the group.
            Err(err) => debug!(step = %command, error = %err, "no leftover group"),
        }
    }

    /// Stop whatever a failed generation left running.
    async fn teardown_generation(&self, generation: u64) {
        for step in &self.steps {
            let teardown = {
                let mut rt = lock(&step.runtime);
                if rt.generation() != generation {
                    continue;
                }
                rt.take_teardown()
            };
            if let Some(teardown) = teardown {
                debug!(step = %step.spec.command(), generation, "tearing down");
                self.stop_step(step, teardown).await;
            }
            self.kill_exited_group(step);
        }
    }

    /// Cancel, give the process the grace window, then kill the tree.
    async fn stop_step(&self, step: &Step, teardown: Teardown) {
        let Teardown {
            spawn_id,
            handle,
            scope,
            task,
        } = teardown;

        if let Some(scope) = scope {
            scope.cancel();
        }
        let mut pending = task;
        if let Some(join) = pending.as_mut() {
            // The supervising task escalates on its own after one grace period.
            if timeout(self.grace * 2, join).await.is_ok() {
                pending = None;
            } else {
                debug!(step = %step.spec.command(), "supervising task still running after grace");
            }
        }
        if let Some(handle) = handle {
            if let Err(err) = self.supervisor.kill_tree(handle) {
                debug!(step = %step.spec.command(), error = %err, "kill after grace");
            }
        }
        if let Some(join) = pending {
            let _ = timeout(self.grace, join).await;
        }
        lock(&step.runtime).finish(spawn_id, StepState::Killed);
    }

    /// Force-kill every tracked process tree. Does not wait.
    pub fn kill_all(&self) {
        for step in &self.steps {
            let (handle, scope) = {
                let rt = lock(&step.runtime);
                (rt.handle(), rt.scope().cloned())
            };
            if let Some(scope) = scope {
                scope.cancel();
            }
            if let Some(handle) = handle {
                match self.supervisor.kill_tree(handle) {
                    Ok(()) => info!(step = %step.spec.command(), pid = handle.pid(), "killed"),
                    Err(err) => debug!(step = %step.spec.command(), error = %err, "kill failed"),
                }
            }
            self.kill_exited_group(step);
        }
    }
}

struct Supervised {
    child: Child,
    handle: ProcessHandle,
    spawn_id: u64,
    command: String,
    own: CancellationToken,
    generation_scope: CancellationToken,
    runtime: Arc<Mutex<ProcessRuntime>>,
    supervisor: Arc<dyn ProcessSupervisor>,
    sink: Arc<dyn LogSink>,
    grace: Duration,
}

/// Watch one asynchronous step until it is cancelled or exits.
async fn supervise(mut s: Supervised) {
    tokio::select! {
        biased;
        _ = s.own.cancelled() => {
            debug!(step = %s.command, pid = s.handle.pid(), "stopping");
            if let Err(err) = s.supervisor.terminate(s.handle) {
                debug!(step = %s.command, error = %err, "terminate failed");
            }
            let exited = timeout(s.grace, s.child.wait()).await.is_ok();
            if !exited {
                debug!(step = %s.command, "no exit within grace period; killing");
            }
            // Members that ignore SIGTERM outlive the leader.
            if let Err(err) = s.supervisor.kill_tree(s.handle) {
                debug!(step = %s.command, error = %err, "group already gone");
            }
            if !exited {
                let _ = s.child.wait().await;
            }
            lock(&s.runtime).finish(s.spawn_id, StepState::Killed);
        }
        status = s.child.wait() => {
            let outcome = match status {
                Ok(status) if status.success() => {
                    info!(step = %s.command, "process exited");
                    lock(&s.runtime).finish(s.spawn_id, StepState::Exited(ExitOutcome::Success));
                    return;
                }
                Ok(status) => (status.code(), describe_status(status)),
                Err(err) => (None, err.to_string()),
            };
            let (code, status) = outcome;
            let err = RelaunchError::RuntimeExit {
                command: s.command.clone(),
                status,
            };
            warn!(step = %s.command, error = %err, "process exited unexpectedly");
            s.sink.notice(&err.to_string());
            lock(&s.runtime).finish(s.spawn_id, StepState::Exited(ExitOutcome::Failed(code)));
            s.generation_scope.cancel();
        }
    }
}

fn describe_status(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit code {code}"),
        None => status.to_string(),
    }
}
