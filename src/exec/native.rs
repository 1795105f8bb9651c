//! Native launcher: fork, rewire the child's standard streams onto pipes, exec.
//!
//! The parent feeds input, drains output and drains error concurrently (one
//! thread each for input and error, output on the calling thread), then reaps
//! the child. Draining while feeding keeps a child that fills its output pipe
//! from blocking against a parent that is still writing input.

use super::command_line::CommandLine;
use super::error::{ExecError, StdStream};
use super::pipe::{self, PipeChannel};
use super::process::ProcessHandle;
use super::stream::{self, DEFAULT_CHUNK_SIZE};
use super::{Launcher, LauncherKind, RunOptions, RunOutput};
use nix::unistd::{fork, ForkResult};
use std::fs::File;
use std::io::{self, ErrorKind, Read};
use std::os::fd::RawFd;
use std::os::raw::c_char;
use std::thread;

/// Exit code of a child whose exec failed. The parent never reports it; it
/// returns [`ExecError::Exec`] instead.
const EXEC_FAILED: i32 = 127;

#[derive(Debug, Clone)]
pub struct NativeLauncher {
    chunk_size: usize,
}

impl NativeLauncher {
    pub fn new(chunk_size: usize) -> Self {
        Self { chunk_size }
    }
}

impl Default for NativeLauncher {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

/// One standard stream the child takes over from a pipe.
#[derive(Debug, Clone, Copy)]
struct Redirect {
    /// Child end, duplicated onto `target`.
    keep: RawFd,
    /// Parent end, closed in the child.
    close: RawFd,
    target: RawFd,
}

impl Launcher for NativeLauncher {
    fn launch(&self, line: &CommandLine, options: &RunOptions) -> Result<RunOutput, ExecError> {
        // Everything the child needs is allocated before fork; between fork
        // and exec only async-signal-safe calls are made.
        let argv = line.to_cstrings()?;
        let mut argv_ptrs: Vec<*const c_char> = argv.iter().map(|arg| arg.as_ptr()).collect();
        argv_ptrs.push(std::ptr::null());

        let stdin = match &options.input {
            Some(_) => Some(pipe::open_for(StdStream::Input)?),
            None => None,
        };
        let stdout = if options.capture_output {
            Some(pipe::open_for(StdStream::Output)?)
        } else {
            None
        };
        let stderr = if options.capture_error {
            Some(pipe::open_for(StdStream::Error)?)
        } else {
            None
        };
        let status = PipeChannel::open().map_err(ExecError::StatusPipe)?;

        let mut redirects = Vec::with_capacity(3);
        if let Some(channel) = &stdin {
            redirects.push(Redirect {
                keep: channel.read_fd(),
                close: channel.write_fd(),
                target: libc::STDIN_FILENO,
            });
        }
        if let Some(channel) = &stdout {
            redirects.push(Redirect {
                keep: channel.write_fd(),
                close: channel.read_fd(),
                target: libc::STDOUT_FILENO,
            });
        }
        if let Some(channel) = &stderr {
            redirects.push(Redirect {
                keep: channel.write_fd(),
                close: channel.read_fd(),
                target: libc::STDERR_FILENO,
            });
        }

        let pid = match unsafe { fork() } {
            Ok(ForkResult::Child) => unsafe {
                exec_child(&argv_ptrs, &redirects, status.read_fd(), status.write_fd())
            },
            Ok(ForkResult::Parent { child }) => child,
            Err(e) => return Err(ExecError::Fork(e.into())),
        };
        let handle = ProcessHandle::new(pid);
        tracing::debug!(pid = handle.pid(), program = line.program(), "spawned child");

        // Keep the parent ends; converting drops (closes) the child ends.
        let stdin = stdin.map(PipeChannel::into_writer);
        let stdout = stdout.map(PipeChannel::into_reader);
        let stderr = stderr.map(PipeChannel::into_reader);

        if let Some(errno) = read_exec_failure(status.into_reader()) {
            drop((stdin, stdout, stderr));
            let exit = handle.wait()?;
            tracing::debug!(%exit, errno, "exec failed in child");
            return Err(ExecError::Exec {
                program: line.program().to_owned(),
                source: io::Error::from_raw_os_error(errno),
            });
        }

        let chunk_size = self.chunk_size;
        let input = options.input.as_deref();
        let streamed = thread::scope(|scope| -> Result<_, ExecError> {
            let writer = match stdin.zip(input) {
                Some((sink, bytes)) => Some(spawn_stream(scope, StdStream::Input, move || {
                    stream::feed(sink, bytes)
                })?),
                None => None,
            };
            let error_reader = match stderr {
                Some(source) => Some(spawn_stream(scope, StdStream::Error, move || {
                    stream::drain(source, chunk_size)
                })?),
                None => None,
            };

            let output = stdout.map(|source| stream::drain(source, chunk_size));

            if let Some(writer) = writer {
                let written = join(writer);
                tracing::trace!(written, "input fed");
            }
            let error = error_reader.map(join);
            Ok((output, error))
        });

        // Reap before reporting a stream thread that failed to start.
        let exit = handle.wait()?;
        tracing::debug!(%exit, "child finished");
        let (captured_output, captured_error) = streamed?;

        Ok(RunOutput {
            code: exit.code(),
            stdout: captured_output,
            stderr: captured_error,
        })
    }

    fn kind(&self) -> LauncherKind {
        LauncherKind::Native
    }
}

fn spawn_stream<'scope, T, F>(
    scope: &'scope thread::Scope<'scope, '_>,
    stream: StdStream,
    f: F,
) -> Result<thread::ScopedJoinHandle<'scope, T>, ExecError>
where
    F: FnOnce() -> T + Send + 'scope,
    T: Send + 'scope,
{
    thread::Builder::new()
        .name(format!("cmdrun-{stream}"))
        .spawn_scoped(scope, f)
        .map_err(|source| ExecError::Thread { stream, source })
}

fn join<T>(handle: thread::ScopedJoinHandle<'_, T>) -> T {
    match handle.join() {
        Ok(value) => value,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

/// Wait for the child to either exec (the close-on-exec status channel closes
/// with no data) or report the errno of a failed exec.
fn read_exec_failure(mut status: File) -> Option<i32> {
    let mut buf = [0u8; 4];
    let mut filled = 0;

    while filled < buf.len() {
        match status.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(_) => break,
        }
    }

    (filled == buf.len()).then(|| i32::from_ne_bytes(buf))
}

/// Child side of the fork. Never returns.
///
/// # Safety
/// Must only be called in a freshly forked child. `argv` must be a
/// null-terminated array of pointers to live NUL-terminated strings.
unsafe fn exec_child(
    argv: &[*const c_char],
    redirects: &[Redirect],
    status_read: RawFd,
    status_write: RawFd,
) -> ! {
    libc::close(status_read);

    for redirect in redirects {
        libc::close(redirect.close);
        if redirect.keep == redirect.target {
            // dup2 onto itself would leave FD_CLOEXEC set
            if libc::fcntl(redirect.keep, libc::F_SETFD, 0) < 0 {
                report_and_exit(status_write);
            }
        } else if libc::dup2(redirect.keep, redirect.target) < 0 {
            report_and_exit(status_write);
        }
    }

    // Rust runtimes ignore SIGPIPE; the target gets the default back.
    libc::signal(libc::SIGPIPE, libc::SIG_DFL);

    libc::execvp(argv[0], argv.as_ptr());
    report_and_exit(status_write)
}

unsafe fn report_and_exit(status_write: RawFd) -> ! {
    let errno = io::Error::last_os_error().raw_os_error().unwrap_or(0);
    let bytes = errno.to_ne_bytes();
    libc::write(status_write, bytes.as_ptr().cast(), bytes.len());
    libc::_exit(EXEC_FAILED)
}
