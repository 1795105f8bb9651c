//! Unidirectional pipe channels between a parent and a spawned child.

use super::error::{ExecError, StdStream};
use std::fs::File;
use std::io;
use std::os::fd::{AsRawFd, OwnedFd, RawFd};

/// An owned read/write endpoint pair.
///
/// Both ends are close-on-exec, so a channel never leaks into an unrelated
/// program image even when other threads fork while it is open. A child keeps
/// its end across exec by `dup2`-ing it onto a standard stream, which clears
/// the flag on the duplicate.
#[derive(Debug)]
pub struct PipeChannel {
    read: OwnedFd,
    write: OwnedFd,
}

impl PipeChannel {
    /// Allocate a new channel.
    pub fn open() -> io::Result<Self> {
        let (read, write) = cloexec_pipe()?;
        Ok(Self { read, write })
    }

    pub fn read_fd(&self) -> RawFd {
        self.read.as_raw_fd()
    }

    pub fn write_fd(&self) -> RawFd {
        self.write.as_raw_fd()
    }

    /// Keep the read end, closing the write end.
    pub fn into_reader(self) -> File {
        File::from(self.read)
    }

    /// Keep the write end, closing the read end.
    pub fn into_writer(self) -> File {
        File::from(self.write)
    }

    /// Keep both ends as `(reader, writer)`.
    pub fn split(self) -> (File, File) {
        (File::from(self.read), File::from(self.write))
    }
}

/// Map a channel allocation failure onto the error for its stream.
pub fn open_for(stream: StdStream) -> Result<PipeChannel, ExecError> {
    PipeChannel::open().map_err(|source| ExecError::Pipe { stream, source })
}

#[cfg(any(
    target_os = "linux",
    target_os = "android",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "dragonfly",
    target_os = "illumos",
))]
fn cloexec_pipe() -> io::Result<(OwnedFd, OwnedFd)> {
    use nix::fcntl::OFlag;
    Ok(nix::unistd::pipe2(OFlag::O_CLOEXEC)?)
}

#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "dragonfly",
    target_os = "illumos",
)))]
fn cloexec_pipe() -> io::Result<(OwnedFd, OwnedFd)> {
    // No pipe2 here; a fork on another thread between these calls can still
    // inherit the ends until that child execs.
    let (read, write) = nix::unistd::pipe()?;
    for fd in [&read, &write] {
        if unsafe { libc::fcntl(fd.as_raw_fd(), libc::F_SETFD, libc::FD_CLOEXEC) } < 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok((read, write))
}
