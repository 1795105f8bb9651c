//! Run external programs, optionally feeding their standard input and
//! capturing their standard output and standard error as separate buffers.
//!
//! ```no_run
//! use cmdrun::{cmdf, RunOptions};
//!
//! let options = RunOptions::new().with_input("b\na\n").capture_output();
//! let output = cmdf!(&options, "sort -{}", "r")?;
//! assert_eq!(output.stdout.as_deref(), Some(&b"b\na\n"[..]));
//! # Ok::<(), cmdrun::ExecError>(())
//! ```

pub mod config;
pub mod exec;
pub mod fatal;
pub mod trace;

pub use config::{ConfigError, ExecConfig, FatalPolicy};
pub use exec::{run, ExecError, LauncherKind, RunOptions, RunOutput, Runner};

/// Format a command line and run it with the default runner.
///
/// `cmdf!(&options, "fmt", args...)` is `run(&options, &format!("fmt", args...))`.
/// The formatted string is split on single spaces; see
/// [`CommandLine`](exec::CommandLine).
#[macro_export]
macro_rules! cmdf {
    ($options:expr, $($fmt:tt)+) => {
        $crate::exec::run($options, &::std::format!($($fmt)+))
    };
}
