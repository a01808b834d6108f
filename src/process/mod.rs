// src/process/mod.rs

//! Process lifecycle: spawning pipeline steps, supervising them, and tearing
//! down whole process trees.

pub mod argv;
pub mod manager;
pub mod output;
pub mod runtime;
pub mod spec;
pub mod supervisor;

pub use argv::split_command;
pub use manager::{ProcessManager, StepSnapshot, DEFAULT_GRACE_PERIOD};
pub use output::{forward_output, LogSink, StdoutSink};
pub use runtime::{ExitOutcome, ProcessRuntime, StepState};
pub use spec::ProcessSpec;
pub use supervisor::{platform_supervisor, ProcessHandle, ProcessSupervisor};
