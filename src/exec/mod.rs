//! Command execution.
//!
//! Runs an external program, optionally feeding it input and capturing its
//! standard output and standard error as separate byte buffers, and returns
//! its exit code. Two launchers implement the same contract:
//!
//! - `native`: fork, rewire the standard streams onto pipes, exec (Unix)
//! - `fallback`: hand the command to a shell with output and error redirected
//!   to temporary files (no input redirection)
//!
//! The launcher is chosen once, when a [`Runner`] is built, from the platform's
//! capabilities and the [`ExecConfig`].

pub mod command_line;
pub mod error;
pub mod fallback;
#[cfg(unix)]
pub mod native;
#[cfg(unix)]
pub mod pipe;
#[cfg(unix)]
pub mod process;
pub mod stream;

pub use command_line::CommandLine;
pub use error::{ExecError, StdStream};

use crate::config::{ConfigError, ExecConfig, FatalPolicy};
use serde::Deserialize;
use std::fmt;
use std::sync::OnceLock;

/// Exit code reported when a child did not exit normally.
pub const EXIT_FAILURE: i32 = 1;

/// Whether this platform can fork and rewire file descriptors.
pub const NATIVE_AVAILABLE: bool = cfg!(unix);

/// Launcher selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LauncherKind {
    /// Native when the platform supports it, fallback otherwise
    #[default]
    Auto,
    /// Process duplication and pipes
    Native,
    /// Shell interpreter and temporary files
    Fallback,
}

impl LauncherKind {
    /// Resolve `Auto` against the platform's capabilities.
    pub fn resolve(self) -> LauncherKind {
        match self {
            LauncherKind::Auto if NATIVE_AVAILABLE => LauncherKind::Native,
            LauncherKind::Auto => LauncherKind::Fallback,
            kind => kind,
        }
    }
}

impl fmt::Display for LauncherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LauncherKind::Auto => write!(f, "auto"),
            LauncherKind::Native => write!(f, "native"),
            LauncherKind::Fallback => write!(f, "fallback"),
        }
    }
}

impl std::str::FromStr for LauncherKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(LauncherKind::Auto),
            "native" => Ok(LauncherKind::Native),
            "fallback" => Ok(LauncherKind::Fallback),
            _ => Err(ConfigError::UnknownLauncher(s.to_string())),
        }
    }
}

/// What to do with the child's standard streams.
///
/// Streams that are neither fed nor captured are inherited from the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Bytes written to the child's stdin, which is then closed.
    pub input: Option<Vec<u8>>,
    pub capture_output: bool,
    pub capture_error: bool,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.input = Some(input.into());
        self
    }

    pub fn capture_output(mut self) -> Self {
        self.capture_output = true;
        self
    }

    pub fn capture_error(mut self) -> Self {
        self.capture_error = true;
        self
    }
}

/// Result of running a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    /// The program's exit code, or [`EXIT_FAILURE`] if it did not exit normally.
    pub code: i32,
    /// Captured standard output; `Some` exactly when capture was requested.
    pub stdout: Option<Vec<u8>>,
    /// Captured standard error; `Some` exactly when capture was requested.
    pub stderr: Option<Vec<u8>>,
}

impl RunOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Trait for launch strategies
///
/// Implementations spawn the program named by a [`CommandLine`], wire up the
/// streams requested in [`RunOptions`], block until it terminates and release
/// every channel, temporary file and process handle before returning.
pub trait Launcher: Send + Sync {
    /// Run the command to completion.
    fn launch(&self, line: &CommandLine, options: &RunOptions) -> Result<RunOutput, ExecError>;

    /// Get the launcher type
    fn kind(&self) -> LauncherKind;
}

/// Create a launcher from configuration
pub fn create_launcher(config: &ExecConfig) -> Result<Box<dyn Launcher>, ConfigError> {
    match config.launcher.resolve() {
        LauncherKind::Native => native_launcher(config),
        _ => {
            let launcher = fallback::FallbackLauncher::from_config(config)?;
            Ok(Box::new(launcher))
        }
    }
}

#[cfg(unix)]
fn native_launcher(config: &ExecConfig) -> Result<Box<dyn Launcher>, ConfigError> {
    Ok(detected_launcher(config))
}

#[cfg(not(unix))]
fn native_launcher(_config: &ExecConfig) -> Result<Box<dyn Launcher>, ConfigError> {
    Err(ConfigError::NativeUnavailable)
}

/// The best launcher the platform supports, with platform defaults.
#[cfg(unix)]
fn detected_launcher(config: &ExecConfig) -> Box<dyn Launcher> {
    Box::new(native::NativeLauncher::new(config.chunk_size))
}

#[cfg(not(unix))]
fn detected_launcher(config: &ExecConfig) -> Box<dyn Launcher> {
    Box::new(fallback::FallbackLauncher::new(
        fallback::Shell::platform_default(),
        config.temp_dir.clone(),
    ))
}

/// A launcher bound to a fatal-error policy.
pub struct Runner {
    launcher: Box<dyn Launcher>,
    on_fatal: FatalPolicy,
}

impl Runner {
    /// Build a runner, selecting the launcher from `config`.
    pub fn new(config: &ExecConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let launcher = create_launcher(config)?;
        tracing::debug!(launcher = %launcher.kind(), on_fatal = ?config.on_fatal, "selected launcher");
        Ok(Self {
            launcher,
            on_fatal: config.on_fatal,
        })
    }

    pub fn with_launcher(launcher: Box<dyn Launcher>, on_fatal: FatalPolicy) -> Self {
        Self { launcher, on_fatal }
    }

    pub fn launcher_kind(&self) -> LauncherKind {
        self.launcher.kind()
    }

    /// Run `command`, split on single spaces, with the given stream options.
    ///
    /// Returns the program's exit code and whichever captures were requested.
    /// Errors the subsystem cannot recover from abort the process under
    /// [`FatalPolicy::Abort`] and are returned under [`FatalPolicy::Return`].
    pub fn run(&self, options: &RunOptions, command: &str) -> Result<RunOutput, ExecError> {
        let line = CommandLine::parse(command)?;
        tracing::debug!(launcher = %self.launcher.kind(), command, "running command");

        match self.launcher.launch(&line, options) {
            Err(err) if err.is_fatal() && self.on_fatal == FatalPolicy::Abort => {
                crate::fatal::abort(&err)
            }
            result => result,
        }
    }
}

impl fmt::Debug for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner")
            .field("launcher", &self.launcher.kind())
            .field("on_fatal", &self.on_fatal)
            .finish()
    }
}

static DEFAULT_RUNNER: OnceLock<Runner> = OnceLock::new();

/// The process-wide runner used by [`run`], built on first use.
pub fn default_runner() -> &'static Runner {
    DEFAULT_RUNNER.get_or_init(|| {
        let config = ExecConfig::default();
        Runner::with_launcher(detected_launcher(&config), config.on_fatal)
    })
}

/// Run `command` with the default runner.
pub fn run(options: &RunOptions, command: &str) -> Result<RunOutput, ExecError> {
    default_runner().run(options, command)
}
