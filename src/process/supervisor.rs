// src/process/supervisor.rs

//! Platform process-tree control behind one capability trait.
//!
//! - Unix: every step is spawned as the leader of a new process group, and
//!   the whole group is signalled through the negative pgid.
//! - Windows: every step gets a new process group and is torn down with
//!   `taskkill /T`, which walks the PID tree.
//!
//! The rest of the crate only talks to [`ProcessSupervisor`].

use std::fmt::Debug;
use std::sync::Arc;

use tokio::process::Command;

use crate::errors::Result;

/// OS-level identity of a spawned step.
///
/// On Unix the pid doubles as the process group id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcessHandle {
    pid: u32,
}

impl ProcessHandle {
    pub fn new(pid: u32) -> Self {
        Self { pid }
    }

    pub fn pid(self) -> u32 {
        self.pid
    }
}

pub trait ProcessSupervisor: Send + Sync + Debug {
    /// Configure `cmd` so the spawned process heads its own tree.
    fn isolate(&self, cmd: &mut Command);

    /// Ask the whole tree to exit.
    fn terminate(&self, handle: ProcessHandle) -> Result<()>;

    /// Forcibly kill the whole tree.
    fn kill_tree(&self, handle: ProcessHandle) -> Result<()>;
}

/// Supervisor for the platform this binary was built for.
pub fn platform_supervisor() -> Arc<dyn ProcessSupervisor> {
    #[cfg(unix)]
    {
        Arc::new(unix::ProcessGroupSupervisor)
    }
    #[cfg(windows)]
    {
        Arc::new(windows::TaskKillSupervisor)
    }
}

#[cfg(unix)]
pub use unix::ProcessGroupSupervisor;

#[cfg(windows)]
pub use windows::TaskKillSupervisor;

#[cfg(unix)]
mod unix {
    use std::io;

    use tokio::process::Command;
    use tracing::trace;

    use super::{ProcessHandle, ProcessSupervisor};
    use crate::errors::{RelaunchError, Result};

    #[derive(Debug, Clone, Copy, Default)]
    pub struct ProcessGroupSupervisor;

    impl ProcessGroupSupervisor {
        fn signal_group(&self, handle: ProcessHandle, signal: libc::c_int) -> Result<()> {
            let pid = handle.pid();
            let pgid = libc::pid_t::try_from(pid).map_err(|_| RelaunchError::KillError {
                pid,
                source: io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"),
            })?;
            trace!(pgid, signal, "signalling process group");
            // SAFETY: kill(2) takes plain integers and has no memory-safety
            // requirements.
            let rc = unsafe { libc::kill(-pgid, signal) };
            if rc == 0 {
                Ok(())
            } else {
                Err(RelaunchError::KillError {
                    pid,
                    source: io::Error::last_os_error(),
                })
            }
        }
    }

    impl ProcessSupervisor for ProcessGroupSupervisor {
        fn isolate(&self, cmd: &mut Command) {
            cmd.process_group(0);
        }

        fn terminate(&self, handle: ProcessHandle) -> Result<()> {
            self.signal_group(handle, libc::SIGTERM)
        }

        fn kill_tree(&self, handle: ProcessHandle) -> Result<()> {
            self.signal_group(handle, libc::SIGKILL)
        }
    }
}

#[cfg(windows)]
mod windows {
    use std::io;

    use tokio::process::Command;
    use tracing::trace;

    use super::{ProcessHandle, ProcessSupervisor};
    use crate::errors::{RelaunchError, Result};

    const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;

    #[derive(Debug, Clone, Copy, Default)]
    pub struct TaskKillSupervisor;

    impl TaskKillSupervisor {
        fn taskkill(&self, handle: ProcessHandle, force: bool) -> Result<()> {
            let pid = handle.pid();
            let mut cmd = std::process::Command::new("taskkill");
            cmd.arg("/T");
            if force {
                cmd.arg("/F");
            }
            cmd.arg("/PID").arg(pid.to_string());
            trace!(pid, force, "running taskkill");

            let output = cmd
                .output()
                .map_err(|source| RelaunchError::KillError { pid, source })?;
            if output.status.success() {
                Ok(())
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                Err(RelaunchError::KillError {
                    pid,
                    source: io::Error::other(stderr),
                })
            }
        }
    }

    impl ProcessSupervisor for TaskKillSupervisor {
        fn isolate(&self, cmd: &mut Command) {
            cmd.creation_flags(CREATE_NEW_PROCESS_GROUP);
        }

        fn terminate(&self, handle: ProcessHandle) -> Result<()> {
            self.taskkill(handle, false)
        }

        fn kill_tree(&self, handle: ProcessHandle) -> Result<()> {
            self.taskkill(handle, true)
        }
    }
}
