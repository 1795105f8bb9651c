//! Fallback launcher for platforms without process duplication.
//!
//! The command string is handed to a shell interpreter unchanged, with
//! ` 2>FILE` and ` >FILE` appended for the requested captures. The temporary
//! files are read back after the interpreter returns and then removed.
//! Feeding input is not supported.

use super::command_line::CommandLine;
use super::error::ExecError;
use super::{Launcher, LauncherKind, RunOptions, RunOutput, EXIT_FAILURE};
use crate::config::{ConfigError, ExecConfig};
use shell_escape::escape;
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempPath;

/// Exit status a POSIX shell uses for "command not found".
const COMMAND_NOT_FOUND: i32 = 127;

/// An interpreter invocation such as `sh -c`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shell {
    program: String,
    args: Vec<String>,
}

impl Shell {
    /// `sh -c` on Unix, `cmd /C` on Windows.
    pub fn platform_default() -> Self {
        if cfg!(target_family = "unix") {
            Self::new("sh", ["-c"])
        } else {
            Self::new("cmd", ["/C"])
        }
    }

    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a whitespace-separated invocation like `"bash -c"`.
    pub fn parse(invocation: &str) -> Option<Self> {
        let mut words = invocation.split_whitespace();
        let program = words.next()?;
        Some(Self::new(program, words))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl std::fmt::Display for Shell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct FallbackLauncher {
    shell: Shell,
    temp_dir: Option<PathBuf>,
}

impl FallbackLauncher {
    /// `temp_dir` of `None` uses the system temporary directory.
    pub fn new(shell: Shell, temp_dir: Option<PathBuf>) -> Self {
        Self { shell, temp_dir }
    }

    pub fn from_config(config: &ExecConfig) -> Result<Self, ConfigError> {
        let shell = match &config.shell {
            Some(invocation) => Shell::parse(invocation)
                .ok_or_else(|| ConfigError::InvalidShell(invocation.clone()))?,
            None => Shell::platform_default(),
        };
        Ok(Self::new(shell, config.temp_dir.clone()))
    }

    pub fn shell(&self) -> &Shell {
        &self.shell
    }

    fn interpreter_error(&self, command: &str, reason: impl Into<String>) -> ExecError {
        ExecError::Interpreter {
            shell: self.shell.to_string(),
            command: command.to_string(),
            reason: reason.into(),
        }
    }

    /// Reserve a uniquely named, initially empty file for one stream.
    fn temp_path(&self, suffix: &str) -> Result<TempPath, ExecError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("cmdrun-").suffix(suffix);
        let file = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        };
        file.map(|file| file.into_temp_path())
            .map_err(|source| ExecError::TempFile {
                path: self
                    .temp_dir
                    .clone()
                    .unwrap_or_else(std::env::temp_dir),
                source,
            })
    }
}

impl Launcher for FallbackLauncher {
    fn launch(&self, line: &CommandLine, options: &RunOptions) -> Result<RunOutput, ExecError> {
        if options.input.is_some() {
            return Err(ExecError::InputUnsupported {
                launcher: "fallback",
            });
        }

        let interpreter = which::which(&self.shell.program)
            .map_err(|e| self.interpreter_error(line.as_str(), e.to_string()))?;

        let mut command = line.as_str().to_owned();
        let error_file = if options.capture_error {
            let path = self.temp_path(".err")?;
            command.push_str(&format!(" 2>{}", quote(&path)));
            Some(path)
        } else {
            None
        };
        let output_file = if options.capture_output {
            let path = self.temp_path(".out")?;
            command.push_str(&format!(" >{}", quote(&path)));
            Some(path)
        } else {
            None
        };

        tracing::debug!(shell = %self.shell, command, "invoking interpreter");
        let status = Command::new(&interpreter)
            .args(&self.shell.args)
            .arg(&command)
            .status()
            .map_err(|e| self.interpreter_error(&command, e.to_string()))?;

        let code = match status.code() {
            Some(COMMAND_NOT_FOUND) => {
                return Err(self.interpreter_error(
                    &command,
                    format!("exit status {COMMAND_NOT_FOUND} (command not found)"),
                ))
            }
            Some(code) => code,
            None => {
                tracing::debug!(%status, "interpreter terminated abnormally");
                EXIT_FAILURE
            }
        };

        let stderr = error_file.map(read_back).transpose()?;
        let stdout = output_file.map(read_back).transpose()?;

        Ok(RunOutput {
            code,
            stdout,
            stderr,
        })
    }

    fn kind(&self) -> LauncherKind {
        LauncherKind::Fallback
    }
}

fn quote(path: &Path) -> Cow<'_, str> {
    escape(path.to_string_lossy())
}

/// Read a capture file fully, then remove it. Removal is best effort.
fn read_back(path: TempPath) -> Result<Vec<u8>, ExecError> {
    let data = fs::read(&path).map_err(|source| ExecError::TempFile {
        path: path.to_path_buf(),
        source,
    })?;
    let shown = path.to_path_buf();
    if let Err(e) = path.close() {
        tracing::warn!(path = %shown.display(), error = %e, "failed to remove temporary file");
    }
    Ok(data)
}
