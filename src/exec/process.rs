//! Spawned child processes and their termination status.

use super::error::ExecError;
use super::EXIT_FAILURE;
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::Pid;
use std::fmt;

/// How a child process terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// The child called `exit` with this code.
    Exited(i32),
    /// The child was killed by this signal number.
    Signaled(i32),
}

impl ExitStatus {
    /// The code handed back to callers: the exit code for a normal exit,
    /// [`EXIT_FAILURE`] for anything else.
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Exited(code) => code,
            ExitStatus::Signaled(_) => EXIT_FAILURE,
        }
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitStatus::Exited(code) => write!(f, "exited with code {code}"),
            ExitStatus::Signaled(signal) => write!(f, "terminated by signal {signal}"),
        }
    }
}

/// A spawned child that has not been reaped yet.
///
/// [`wait`](ProcessHandle::wait) consumes the handle, so a child is waited
/// for exactly once.
#[derive(Debug)]
#[must_use = "a child that is never waited for stays a zombie"]
pub struct ProcessHandle {
    pid: Pid,
}

impl ProcessHandle {
    pub(crate) fn new(pid: Pid) -> Self {
        Self { pid }
    }

    pub fn pid(&self) -> i32 {
        self.pid.as_raw()
    }

    /// Block until the child terminates and decode its status.
    pub fn wait(self) -> Result<ExitStatus, ExecError> {
        loop {
            match waitpid(self.pid, None) {
                Ok(WaitStatus::Exited(_, code)) => return Ok(ExitStatus::Exited(code)),
                Ok(WaitStatus::Signaled(_, signal, _)) => {
                    return Ok(ExitStatus::Signaled(signal as i32))
                }
                Ok(other) => {
                    tracing::debug!(status = ?other, "ignoring non-terminal wait status");
                }
                Err(Errno::EINTR) => {}
                Err(e) => return Err(ExecError::Wait(e.into())),
            }
        }
    }
}
