//! Command line construction.
//!
//! A command line is built by splitting a formatted string on every single
//! space. There is no quoting, escaping or collapsing of repeated spaces, so
//! `echo "a b"` becomes three arguments and `a  b` carries an empty argument
//! between `a` and `b`. This is a known limitation, not a shell parser.

use super::error::ExecError;
use std::ffi::CString;
use std::fmt;

/// An immutable argument vector; the first element names the program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    source: String,
    args: Vec<String>,
}

impl CommandLine {
    /// Split `command` on single spaces.
    ///
    /// Every space is a separator, so tokens are not guaranteed non-empty:
    /// runs of spaces and a trailing space produce empty arguments
    /// (`"echo a "` is `["echo", "a", ""]`). Only the program name must be
    /// non-empty; [`ExecError::EmptyCommand`] is returned when the string is
    /// empty or starts with a space.
    pub fn parse(command: &str) -> Result<Self, ExecError> {
        // split() always yields at least one (possibly empty) piece
        let args: Vec<String> = command.split(' ').map(str::to_owned).collect();
        if args[0].is_empty() {
            return Err(ExecError::EmptyCommand);
        }
        Ok(Self {
            source: command.to_owned(),
            args,
        })
    }

    /// The program name or path.
    pub fn program(&self) -> &str {
        &self.args[0]
    }

    /// All arguments, program included.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The unsplit string this command line was built from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Convert to NUL-terminated strings for `execvp`.
    pub fn to_cstrings(&self) -> Result<Vec<CString>, ExecError> {
        self.args
            .iter()
            .enumerate()
            .map(|(index, arg)| {
                CString::new(arg.as_bytes()).map_err(|_| ExecError::InvalidArgument {
                    index,
                    arg: arg.clone(),
                })
            })
            .collect()
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
