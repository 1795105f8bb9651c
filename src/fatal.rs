//! Process termination for errors the execution subsystem cannot recover from.
//!
//! Reached only through [`Runner::run`](crate::exec::Runner::run) when the
//! configured [`FatalPolicy`](crate::config::FatalPolicy) is `Abort`: channel
//! allocation, fork, exec, stream thread, wait and interpreter failures, plus input
//! redirection requested from the fallback launcher.

use colored::Colorize;
use std::error::Error;

/// Report `err` and abort the process.
pub fn abort(err: &dyn Error) -> ! {
    let message = format!("{}: {}", "aborting".red(), chain(err));
    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!("{message}");
    } else {
        eprintln!("{message}");
    }
    std::process::abort()
}

/// Render an error with its sources, outermost first.
pub fn chain(err: &dyn Error) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        // Display impls often already embed their source
        if !rendered.contains(&cause_text) {
            rendered.push_str(": ");
            rendered.push_str(&cause_text);
        }
        source = cause.source();
    }
    rendered
}
