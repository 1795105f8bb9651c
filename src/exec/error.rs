//! Error taxonomy for command execution.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// One of the three standard streams a launcher may rewire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdStream {
    Input,
    Output,
    Error,
}

impl fmt::Display for StdStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StdStream::Input => write!(f, "stdin"),
            StdStream::Output => write!(f, "stdout"),
            StdStream::Error => write!(f, "stderr"),
        }
    }
}

/// Errors raised by the execution subsystem itself.
///
/// A nonzero exit of the target program is never an `ExecError`; it comes back
/// as [`RunOutput::code`](super::RunOutput::code).
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("empty command line")]
    EmptyCommand,

    #[error("argument {index} contains a NUL byte: {arg:?}")]
    InvalidArgument { index: usize, arg: String },

    #[error("pipe() for {stream} failed: {source}")]
    Pipe {
        stream: StdStream,
        #[source]
        source: io::Error,
    },

    /// The channel a child reports a failed exec through.
    #[error("pipe() for exec status failed: {0}")]
    StatusPipe(#[source] io::Error),

    #[error("fork() failed: {0}")]
    Fork(#[source] io::Error),

    #[error("cannot execute '{program}': {source}")]
    Exec {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("wait() failed: {0}")]
    Wait(#[source] io::Error),

    #[error("failed to start {stream} thread: {source}")]
    Thread {
        stream: StdStream,
        #[source]
        source: io::Error,
    },

    #[error("unsupported feature: input redirection with the {launcher} launcher")]
    InputUnsupported { launcher: &'static str },

    #[error("interpreter '{shell}' failed to run '{command}': {reason}")]
    Interpreter {
        shell: String,
        command: String,
        reason: String,
    },

    #[error("temporary file {}: {source}", path.display())]
    TempFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ExecError {
    /// Whether the error is one the subsystem treats as unrecoverable.
    ///
    /// Problems with the command line itself are caller errors and are always
    /// handed back; everything else is subject to the configured
    /// [`FatalPolicy`](crate::config::FatalPolicy).
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            ExecError::EmptyCommand | ExecError::InvalidArgument { .. }
        )
    }
}
